use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::emitter::{
  BranchCode, Branding, EmitterError, EmitterService, Environment, FiscalCode, IssuingPoint,
  NewEmitter, Ruc,
};

#[derive(Debug, Clone, Default)]
pub struct CreateEmitterCommand {
  pub name: String,
  pub company_code: String,
  pub ruc_tipo: String,
  pub ruc_numero: String,
  pub ruc_dv: String,
  pub suc_em: String,
  pub pto_fac_default: String,
  pub iamb: i16,
  pub itpemis_default: String,
  pub idoc_default: String,
  pub email: String,
  pub phone: Option<String>,
  pub address_line: Option<String>,
  pub ubi_code: Option<String>,
  pub logo_url: Option<String>,
  pub primary_color: Option<String>,
  pub footer_html: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateEmitterResponse {
  pub emitter_id: Uuid,
  pub company_code: String,
  pub ruc: String,
  pub is_active: bool,
  pub created_at: DateTime<Utc>,
}

pub struct CreateEmitterUseCase {
  emitter_service: Arc<EmitterService>,
}

impl CreateEmitterUseCase {
  pub fn new(emitter_service: Arc<EmitterService>) -> Self {
    Self { emitter_service }
  }

  pub async fn execute(
    &self,
    command: CreateEmitterCommand,
  ) -> Result<CreateEmitterResponse, EmitterError> {
    let data = NewEmitter {
      name: command.name,
      company_code: command.company_code.trim().to_lowercase(),
      ruc: Ruc::new(&command.ruc_tipo, &command.ruc_numero, &command.ruc_dv)?,
      branch: BranchCode::new(&command.suc_em)?,
      default_issuing_point: IssuingPoint::new(&command.pto_fac_default)?,
      environment: Environment::from_code(command.iamb)?,
      default_emission_type: FiscalCode::new(&command.itpemis_default)?,
      default_document_code: FiscalCode::new(&command.idoc_default)?,
      email: command.email.trim().to_lowercase(),
      phone: command.phone,
      address_line: command.address_line,
      ubi_code: command.ubi_code,
      branding: Branding {
        logo_url: command.logo_url,
        primary_color: command.primary_color,
        footer_html: command.footer_html,
      },
    };

    let emitter = self.emitter_service.register_emitter(data).await?;

    Ok(CreateEmitterResponse {
      emitter_id: emitter.id,
      ruc: emitter.ruc_display(),
      company_code: emitter.company_code,
      is_active: emitter.is_active,
      created_at: emitter.created_at,
    })
  }
}
