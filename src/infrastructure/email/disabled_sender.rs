use async_trait::async_trait;

use crate::domain::invoice::{
  errors::EmailError,
  ports::{EmailMessage, EmailSender},
};

/// Used when no email provider is configured; every send is refused.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledEmailSender;

#[async_trait]
impl EmailSender for DisabledEmailSender {
  async fn send(&self, _message: &EmailMessage) -> Result<(), EmailError> {
    Err(EmailError::Disabled)
  }

  fn is_enabled(&self) -> bool {
    false
  }

  fn provider_name(&self) -> &'static str {
    "disabled"
  }
}
