use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::invoice::{
  errors::EmailError,
  ports::{EmailMessage, EmailSender},
};
use crate::infrastructure::config::EmailConfig;

/// Delivers notifications through the Resend HTTP API.
pub struct ResendEmailSender {
  client: Client,
  api_key: String,
  api_url: String,
  from: String,
}

#[derive(Debug, Serialize)]
struct ResendRequest<'a> {
  from: &'a str,
  to: &'a [String],
  #[serde(skip_serializing_if = "<[String]>::is_empty")]
  cc: &'a [String],
  subject: &'a str,
  html: &'a str,
  text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ResendResponse {
  id: Option<String>,
}

impl ResendEmailSender {
  pub fn new(
    api_key: impl Into<String>,
    api_url: impl Into<String>,
    from: impl Into<String>,
    timeout: Duration,
  ) -> Result<Self, EmailError> {
    let client = Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| EmailError::Transport(format!("Failed to build HTTP client: {}", e)))?;

    Ok(Self {
      client,
      api_key: api_key.into(),
      api_url: api_url.into().trim_end_matches('/').to_string(),
      from: from.into(),
    })
  }

  /// Returns `None` when email is disabled or no API key is configured.
  pub fn from_config(config: &EmailConfig) -> Result<Option<Self>, EmailError> {
    let Some(api_key) = config.api_key() else {
      return Ok(None);
    };

    let from = format!("{} <{}>", config.from_name, config.from_address);
    Self::new(
      api_key,
      config.api_url.clone(),
      from,
      Duration::from_secs(config.timeout_seconds),
    )
    .map(Some)
  }
}

#[async_trait]
impl EmailSender for ResendEmailSender {
  async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
    let request = ResendRequest {
      from: &self.from,
      to: &message.to,
      cc: &message.cc,
      subject: &message.subject,
      html: &message.body_html,
      text: &message.body_text,
    };

    let response = self
      .client
      .post(format!("{}/emails", self.api_url))
      .bearer_auth(&self.api_key)
      .json(&request)
      .send()
      .await
      .map_err(|e| EmailError::Transport(format!("Failed to reach Resend: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      let detail = format!("Resend returned {}: {}", status, body);
      return Err(if status.is_server_error() {
        EmailError::Transport(detail)
      } else {
        EmailError::Rejected(detail)
      });
    }

    let parsed: ResendResponse = response
      .json()
      .await
      .unwrap_or(ResendResponse { id: None });

    tracing::info!(
      to = ?message.to,
      message_id = ?parsed.id,
      "Email sent via Resend"
    );

    Ok(())
  }

  fn is_enabled(&self) -> bool {
    true
  }

  fn provider_name(&self) -> &'static str {
    "resend"
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use wiremock::matchers::{header, method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn message() -> EmailMessage {
    EmailMessage {
      to: vec!["cliente@example.com".to_string()],
      cc: vec![],
      subject: "Factura #0000000001 - ACME S.A.".to_string(),
      body_html: "<p>Hola</p>".to_string(),
      body_text: "Hola".to_string(),
    }
  }

  fn sender(server: &MockServer) -> ResendEmailSender {
    ResendEmailSender::new(
      "re_test",
      server.uri(),
      "ACME <facturas@acme.com>",
      Duration::from_secs(5),
    )
    .unwrap()
  }

  #[tokio::test]
  async fn test_send_posts_message_with_bearer_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/emails"))
      .and(header("authorization", "Bearer re_test"))
      .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "msg_1"})))
      .expect(1)
      .mount(&server)
      .await;

    sender(&server).send(&message()).await.unwrap();
  }

  #[tokio::test]
  async fn test_client_error_is_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(422).set_body_string("invalid `to` field"))
      .mount(&server)
      .await;

    let result = sender(&server).send(&message()).await;

    assert!(matches!(result, Err(EmailError::Rejected(_))));
  }

  #[tokio::test]
  async fn test_server_error_is_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .respond_with(ResponseTemplate::new(503))
      .mount(&server)
      .await;

    let result = sender(&server).send(&message()).await;

    assert!(matches!(result, Err(EmailError::Transport(_))));
  }

  #[test]
  fn test_from_config_requires_key() {
    let mut config = EmailConfig::default();
    config.enabled = true;
    assert!(ResendEmailSender::from_config(&config).unwrap().is_none());

    config.resend_api_key = Some("re_live".to_string());
    let sender = ResendEmailSender::from_config(&config).unwrap().unwrap();
    assert_eq!(sender.provider_name(), "resend");
    assert!(sender.from.contains(&config.from_address));
  }

  #[test]
  fn test_cc_is_omitted_when_empty() {
    let msg = message();
    let body = serde_json::to_value(ResendRequest {
      from: "a@b.c",
      to: &msg.to,
      cc: &msg.cc,
      subject: &msg.subject,
      html: &msg.body_html,
      text: &msg.body_text,
    })
    .unwrap();

    assert!(body.get("cc").is_none());
    assert_eq!(body["to"][0], "cliente@example.com");
  }
}
