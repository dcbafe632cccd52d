use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::emitter::{EmitterError, EmitterService};

#[derive(Debug, Clone)]
pub struct CreateApiKeyCommand {
  pub emitter_id: Uuid,
  pub name: String,
}

/// Carries the plaintext key; it cannot be retrieved again.
#[derive(Debug, Clone, Serialize)]
pub struct CreateApiKeyResponse {
  pub id: Uuid,
  pub emitter_id: Uuid,
  pub name: String,
  pub api_key: String,
  pub created_at: DateTime<Utc>,
}

pub struct CreateApiKeyUseCase {
  emitter_service: Arc<EmitterService>,
}

impl CreateApiKeyUseCase {
  pub fn new(emitter_service: Arc<EmitterService>) -> Self {
    Self { emitter_service }
  }

  pub async fn execute(
    &self,
    command: CreateApiKeyCommand,
  ) -> Result<CreateApiKeyResponse, EmitterError> {
    let (key, secret) = self
      .emitter_service
      .issue_api_key(command.emitter_id, command.name)
      .await?;

    Ok(CreateApiKeyResponse {
      id: key.id,
      emitter_id: key.emitter_id,
      name: key.name,
      api_key: secret.expose().to_string(),
      created_at: key.created_at,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::testing::{InMemoryEmitters, sample_emitter};

  #[tokio::test]
  async fn test_issued_key_authenticates() {
    let store = Arc::new(InMemoryEmitters::default());
    let emitter = store.insert_emitter(sample_emitter("ACME"));
    let service = Arc::new(EmitterService::new(store.clone(), store.clone(), store));
    let use_case = CreateApiKeyUseCase::new(service.clone());

    let response = use_case
      .execute(CreateApiKeyCommand {
        emitter_id: emitter.id,
        name: "erp".to_string(),
      })
      .await
      .unwrap();

    assert!(response.api_key.starts_with("dgi_"));
    let authenticated = service.authenticate(&response.api_key).await.unwrap();
    assert_eq!(authenticated.id, emitter.id);
  }
}
