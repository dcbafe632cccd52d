use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use super::create_invoice::CustomerDto;
use crate::domain::invoice::{InvoiceError, InvoiceService};

#[derive(Debug, Clone)]
pub struct CreateCustomerCommand {
  pub emitter_id: Uuid,
  pub customer: CustomerDto,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateCustomerResponse {
  pub customer_id: Uuid,
  pub name: String,
  pub email: String,
}

pub struct CreateCustomerUseCase {
  invoice_service: Arc<InvoiceService>,
}

impl CreateCustomerUseCase {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(
    &self,
    command: CreateCustomerCommand,
  ) -> Result<CreateCustomerResponse, InvoiceError> {
    if command.customer.name.trim().is_empty() {
      return Err(InvoiceError::InvalidRequest(
        "Customer name cannot be empty".to_string(),
      ));
    }

    let customer = self
      .invoice_service
      .register_customer(command.emitter_id, command.customer.into())
      .await?;

    Ok(CreateCustomerResponse {
      customer_id: customer.id,
      name: customer.name,
      email: customer.email,
    })
  }
}
