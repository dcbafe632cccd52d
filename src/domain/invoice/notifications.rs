use std::sync::Arc;

use super::entities::InvoiceDocument;
use super::ports::{EmailMessage, EmailSender, InvoiceStore};
use super::value_objects::{ArtifactKind, EmailStatus};

/// Recipients replacing the customer address on a resend.
#[derive(Debug, Clone, Default)]
pub struct Recipients {
  pub to: Option<String>,
  pub cc: Vec<String>,
}

/// Best-effort customer notification. Delivery outcome is written to the
/// invoice email status; nothing here is retried automatically.
pub struct NotificationDispatcher {
  sender: Arc<dyn EmailSender>,
  store: Arc<dyn InvoiceStore>,
  public_base_url: String,
}

impl NotificationDispatcher {
  pub fn new(
    sender: Arc<dyn EmailSender>,
    store: Arc<dyn InvoiceStore>,
    public_base_url: impl Into<String>,
  ) -> Self {
    Self {
      sender,
      store,
      public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
    }
  }

  pub fn is_enabled(&self) -> bool {
    self.sender.is_enabled()
  }

  /// Public download link embedded in the email body.
  pub fn file_link(&self, document: &InvoiceDocument, kind: ArtifactKind) -> String {
    format!(
      "{}/v1/files/invoices/{}?file_type={}",
      self.public_base_url,
      document.invoice.id,
      kind.extension()
    )
  }

  pub fn compose(&self, document: &InvoiceDocument, recipients: &Recipients) -> EmailMessage {
    let invoice = &document.invoice;
    let emitter = &document.emitter;
    let customer = &document.customer;
    let date = invoice.created_at.format("%d/%m/%Y");
    let pdf_link = self.file_link(document, ArtifactKind::Pdf);
    let xml_link = self.file_link(document, ArtifactKind::Xml);

    let subject = format!("Factura #{} - {}", invoice.document_number, emitter.name);

    let body_html = format!(
      r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; color: #333;">
  <h2>{kind} #{number}</h2>
  <p>Estimado/a {customer},</p>
  <p>{emitter} le ha emitido el siguiente documento:</p>
  <table cellpadding="4">
    <tr><td><strong>Número:</strong></td><td>{number}</td></tr>
    <tr><td><strong>Fecha:</strong></td><td>{date}</td></tr>
    <tr><td><strong>Punto de facturación:</strong></td><td>{point}</td></tr>
    <tr><td><strong>Total:</strong></td><td>B/. {total:.2}</td></tr>
  </table>
  <p>
    <a href="{pdf_link}">Descargar PDF</a> |
    <a href="{xml_link}">Descargar XML</a>
  </p>
  <p style="font-size: 12px; color: #777;">{emitter} &middot; RUC {ruc}</p>
</body>
</html>"#,
      kind = invoice.document_kind.label(),
      number = invoice.document_number,
      customer = html_escape(&customer.name),
      emitter = html_escape(&emitter.name),
      date = date,
      point = invoice.issuing_point,
      total = invoice.total_amount,
      pdf_link = pdf_link,
      xml_link = xml_link,
      ruc = emitter.ruc_display(),
    );

    let body_text = format!(
      "{} #{}\nEmisor: {}\nFecha: {}\nTotal: B/. {:.2}\nPDF: {}\nXML: {}\n",
      invoice.document_kind.label(),
      invoice.document_number,
      emitter.name,
      date,
      invoice.total_amount,
      pdf_link,
      xml_link,
    );

    EmailMessage {
      to: vec![
        recipients
          .to
          .clone()
          .unwrap_or_else(|| customer.email.clone()),
      ],
      cc: recipients.cc.clone(),
      subject,
      body_html,
      body_text,
    }
  }

  /// Sends the invoice email and records the outcome. Returns the resulting
  /// email status.
  pub async fn dispatch(&self, document: &InvoiceDocument, recipients: &Recipients) -> EmailStatus {
    let invoice_id = document.invoice.id;
    let current = document.invoice.email_status;

    if !self.sender.is_enabled() {
      tracing::warn!(
        invoice_id = %invoice_id,
        "Email delivery disabled, leaving notification pending"
      );
      return current;
    }

    let message = self.compose(document, recipients);
    let outcome = match self.sender.send(&message).await {
      Ok(()) => {
        tracing::info!(
          invoice_id = %invoice_id,
          provider = self.sender.provider_name(),
          to = ?message.to,
          "Invoice email sent"
        );
        EmailStatus::Sent
      }
      Err(e) => {
        tracing::error!(
          invoice_id = %invoice_id,
          provider = self.sender.provider_name(),
          error = %e,
          "Invoice email failed"
        );
        EmailStatus::Failed
      }
    };

    if let Err(e) = self.store.update_email_status(invoice_id, outcome).await {
      tracing::error!(
        invoice_id = %invoice_id,
        email_status = %outcome,
        error = %e,
        "Failed to record email status"
      );
    }

    outcome
  }
}

fn html_escape(value: &str) -> String {
  value
    .replace('&', "&amp;")
    .replace('<', "&lt;")
    .replace('>', "&gt;")
    .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::testing::{Fixture, RecordingEmailSender};

  #[tokio::test]
  async fn test_compose_uses_number_and_public_links() {
    let fixture = Fixture::new().await;
    let document = fixture.committed_document().await;
    let dispatcher = NotificationDispatcher::new(
      Arc::new(RecordingEmailSender::default()),
      fixture.store.clone(),
      "https://api.example.com/",
    );

    let message = dispatcher.compose(&document, &Recipients::default());

    assert_eq!(
      message.subject,
      format!("Factura #{} - ACME S.A.", document.invoice.document_number)
    );
    assert_eq!(message.to, vec![document.customer.email.clone()]);
    assert!(message.body_html.contains(&format!(
      "https://api.example.com/v1/files/invoices/{}?file_type=pdf",
      document.invoice.id
    )));
    assert!(message.body_text.contains("26.40"));
  }

  #[tokio::test]
  async fn test_failed_delivery_marks_invoice_failed() {
    let fixture = Fixture::new().await;
    let document = fixture.committed_document().await;
    let sender = Arc::new(RecordingEmailSender::failing());
    let dispatcher = NotificationDispatcher::new(sender, fixture.store.clone(), "http://localhost");

    let status = dispatcher.dispatch(&document, &Recipients::default()).await;

    assert_eq!(status, EmailStatus::Failed);
    let stored = fixture
      .store
      .find_by_id(document.invoice.id)
      .await
      .unwrap()
      .unwrap();
    assert_eq!(stored.email_status, EmailStatus::Failed);
  }

  #[tokio::test]
  async fn test_disabled_sender_leaves_status_pending() {
    let fixture = Fixture::new().await;
    let document = fixture.committed_document().await;
    let sender = Arc::new(RecordingEmailSender::disabled());
    let dispatcher =
      NotificationDispatcher::new(sender.clone(), fixture.store.clone(), "http://localhost");

    let status = dispatcher.dispatch(&document, &Recipients::default()).await;

    assert_eq!(status, EmailStatus::Pending);
    assert!(sender.sent().is_empty());
  }

  #[tokio::test]
  async fn test_recipient_override() {
    let fixture = Fixture::new().await;
    let document = fixture.committed_document().await;
    let sender = Arc::new(RecordingEmailSender::default());
    let dispatcher =
      NotificationDispatcher::new(sender.clone(), fixture.store.clone(), "http://localhost");

    let recipients = Recipients {
      to: Some("contabilidad@example.com".to_string()),
      cc: vec!["copia@example.com".to_string()],
    };
    assert_eq!(
      dispatcher.dispatch(&document, &recipients).await,
      EmailStatus::Sent
    );

    let sent = sender.sent();
    assert_eq!(sent[0].to, vec!["contabilidad@example.com".to_string()]);
    assert_eq!(sent[0].cc, vec!["copia@example.com".to_string()]);
  }
}
