use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::artifact_store::ArtifactStore;
use super::entities::{
  AuthorityResponse, Customer, CustomerDetails, GeneratedArtifacts, Invoice, InvoiceArtifacts,
  InvoiceDocument, InvoiceRequest, NewInvoice, Overrides,
};
use super::errors::{BlobStoreError, InvoiceError};
use super::idempotency::IdempotencyGuard;
use super::notifications::{NotificationDispatcher, Recipients};
use super::ports::{ArtifactGenerator, CustomerRepository, InvoiceStore};
use super::totals::TotalsCalculator;
use super::value_objects::{ArtifactKind, DocumentStatus, EmailStatus, RetryCheckpoint};
use crate::domain::emitter::{Emitter, EmitterRepository, FiscalCode, IssuingPoint};

pub struct InvoiceServiceDependencies {
  pub invoice_store: Arc<dyn InvoiceStore>,
  pub customer_repo: Arc<dyn CustomerRepository>,
  pub emitter_repo: Arc<dyn EmitterRepository>,
  pub artifact_generator: Arc<dyn ArtifactGenerator>,
  pub artifact_store: Arc<ArtifactStore>,
  pub notifier: Arc<NotificationDispatcher>,
}

/// Result of a successful creation. `post_commit` tracks the background
/// artifact/notification work; dropping it detaches the task.
pub struct IssuedInvoice {
  pub invoice: Invoice,
  pub emitter: Emitter,
  pub post_commit: JoinHandle<PostCommitOutcome>,
}

/// What the background step managed to do for a committed invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostCommitOutcome {
  pub artifacts_stored: bool,
  pub email_status: Option<EmailStatus>,
}

/// Overrides resolved against the emitter defaults, evaluated once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCodes {
  pub issuing_point: IssuingPoint,
  pub emission_type: FiscalCode,
  pub document_code: FiscalCode,
}

impl ResolvedCodes {
  pub fn resolve(emitter: &Emitter, overrides: &Overrides) -> Result<Self, InvoiceError> {
    let invalid = |e: crate::domain::emitter::ValueObjectError| {
      InvoiceError::InvalidRequest(format!("Invalid override: {}", e))
    };

    let issuing_point = match &overrides.issuing_point {
      Some(value) => IssuingPoint::new(value).map_err(invalid)?,
      None => emitter.default_issuing_point.clone(),
    };
    let emission_type = match &overrides.emission_type {
      Some(value) => FiscalCode::new(value).map_err(invalid)?,
      None => emitter.default_emission_type.clone(),
    };
    let document_code = match &overrides.document_code {
      Some(value) => FiscalCode::new(value).map_err(invalid)?,
      None => emitter.default_document_code.clone(),
    };

    Ok(Self {
      issuing_point,
      emission_type,
      document_code,
    })
  }
}

/// Cloneable handle to everything the post-commit task needs.
#[derive(Clone)]
struct PostCommit {
  invoice_store: Arc<dyn InvoiceStore>,
  artifact_generator: Arc<dyn ArtifactGenerator>,
  artifact_store: Arc<ArtifactStore>,
  notifier: Arc<NotificationDispatcher>,
}

impl PostCommit {
  async fn generate(&self, document: &InvoiceDocument) -> Result<GeneratedArtifacts, InvoiceError> {
    let generator = self.artifact_generator.clone();
    let document = document.clone();
    tokio::task::spawn_blocking(move || generator.generate(&document))
      .await
      .map_err(|e| InvoiceError::Internal(format!("Artifact task failed: {}", e)))?
      .map_err(InvoiceError::from)
  }

  async fn generate_and_store(
    &self,
    document: &InvoiceDocument,
  ) -> Result<(InvoiceArtifacts, GeneratedArtifacts), InvoiceError> {
    let generated = self.generate(document).await?;
    let stored = self
      .artifact_store
      .store(document.invoice.id, &generated)
      .await?;
    Ok((stored, generated))
  }

  async fn run(self, invoice_id: Uuid) -> PostCommitOutcome {
    let document = match self.invoice_store.find_document(invoice_id).await {
      Ok(Some(document)) => document,
      Ok(None) => {
        tracing::error!(invoice_id = %invoice_id, "Committed invoice vanished before post-commit");
        return PostCommitOutcome {
          artifacts_stored: false,
          email_status: None,
        };
      }
      Err(e) => {
        tracing::error!(invoice_id = %invoice_id, error = %e, "Failed to load committed invoice");
        return PostCommitOutcome {
          artifacts_stored: false,
          email_status: None,
        };
      }
    };

    let artifacts_stored = match self.generate_and_store(&document).await {
      Ok(_) => true,
      Err(e) => {
        tracing::error!(
          invoice_id = %invoice_id,
          error = %e,
          "Artifact generation failed, files will be generated on demand"
        );
        false
      }
    };

    let email_status = self
      .notifier
      .dispatch(&document, &Recipients::default())
      .await;

    PostCommitOutcome {
      artifacts_stored,
      email_status: Some(email_status),
    }
  }
}

/// The issuance pipeline: idempotency check, totals, number allocation and
/// commit, followed by asynchronous artifact generation and notification.
pub struct InvoiceService {
  invoice_store: Arc<dyn InvoiceStore>,
  customer_repo: Arc<dyn CustomerRepository>,
  emitter_repo: Arc<dyn EmitterRepository>,
  guard: IdempotencyGuard,
  post_commit: PostCommit,
}

impl InvoiceService {
  pub fn new(deps: InvoiceServiceDependencies) -> Self {
    Self {
      guard: IdempotencyGuard::new(deps.invoice_store.clone()),
      post_commit: PostCommit {
        invoice_store: deps.invoice_store.clone(),
        artifact_generator: deps.artifact_generator,
        artifact_store: deps.artifact_store,
        notifier: deps.notifier,
      },
      invoice_store: deps.invoice_store,
      customer_repo: deps.customer_repo,
      emitter_repo: deps.emitter_repo,
    }
  }

  async fn active_emitter(&self, emitter_id: Uuid) -> Result<Emitter, InvoiceError> {
    self
      .emitter_repo
      .find_by_id(emitter_id)
      .await?
      .filter(|e| e.is_active)
      .ok_or(InvoiceError::EmitterNotFound(emitter_id))
  }

  pub async fn create_invoice(&self, request: InvoiceRequest) -> Result<IssuedInvoice, InvoiceError> {
    self
      .guard
      .ensure_fresh(request.idempotency_key.as_deref())
      .await?;

    match (request.document_kind.requires_reference(), &request.reference) {
      (true, None) => {
        return Err(InvoiceError::InvalidRequest(format!(
          "A reference to the original document is required for {}",
          request.document_kind
        )));
      }
      (false, Some(_)) => {
        return Err(InvoiceError::InvalidRequest(format!(
          "{} documents do not take a reference",
          request.document_kind
        )));
      }
      _ => {}
    }

    let computed = TotalsCalculator::calculate(&request.items)?;
    TotalsCalculator::verify_payment(&computed.totals, request.payment.amount)?;

    let emitter = self.active_emitter(request.emitter_id).await?;
    let codes = ResolvedCodes::resolve(&emitter, &request.overrides)?;

    let invoice = self
      .invoice_store
      .commit(NewInvoice {
        id: Uuid::new_v4(),
        emitter_id: emitter.id,
        customer: request.customer,
        document_kind: request.document_kind,
        issuing_point: codes.issuing_point.into_inner(),
        environment: emitter.environment.code(),
        emission_type: codes.emission_type.into_inner(),
        document_code: codes.document_code.into_inner(),
        reference: request.reference,
        totals: computed.totals,
        idempotency_key: request.idempotency_key,
        items: computed.items,
      })
      .await?;

    tracing::info!(
      invoice_id = %invoice.id,
      emitter_id = %emitter.id,
      series_id = %invoice.series_id,
      document_number = %invoice.document_number,
      total = %invoice.total_amount,
      "Invoice committed"
    );

    let task = self.post_commit.clone();
    let post_commit = tokio::spawn(task.run(invoice.id));

    Ok(IssuedInvoice {
      invoice,
      emitter,
      post_commit,
    })
  }

  /// Loads an invoice with its joins, checking it belongs to `emitter_id`.
  pub async fn get_document(
    &self,
    invoice_id: Uuid,
    emitter_id: Option<Uuid>,
  ) -> Result<InvoiceDocument, InvoiceError> {
    let document = self
      .invoice_store
      .find_document(invoice_id)
      .await?
      .ok_or(InvoiceError::InvoiceNotFound(invoice_id))?;

    if let Some(emitter_id) = emitter_id {
      if document.invoice.emitter_id != emitter_id {
        return Err(InvoiceError::Forbidden(invoice_id));
      }
    }

    Ok(document)
  }

  /// Returns the artifact metadata, generating the artifacts if none exist.
  pub async fn ensure_artifacts(
    &self,
    invoice_id: Uuid,
    emitter_id: Option<Uuid>,
  ) -> Result<InvoiceArtifacts, InvoiceError> {
    let document = self.get_document(invoice_id, emitter_id).await?;

    if let Some(existing) = self.post_commit.artifact_store.find(invoice_id).await? {
      return Ok(existing);
    }

    tracing::info!(invoice_id = %invoice_id, "Generating artifacts on demand");
    let (stored, _) = self.post_commit.generate_and_store(&document).await?;
    Ok(stored)
  }

  /// Returns `(bytes, file name)` for one artifact. A blob that went missing
  /// is regenerated from the invoice.
  pub async fn download_artifact(
    &self,
    invoice_id: Uuid,
    kind: ArtifactKind,
    emitter_id: Option<Uuid>,
  ) -> Result<(Vec<u8>, String), InvoiceError> {
    let artifacts = self.ensure_artifacts(invoice_id, emitter_id).await?;

    let bytes = match self.post_commit.artifact_store.fetch(&artifacts, kind).await {
      Ok(bytes) => bytes,
      Err(InvoiceError::Storage(BlobStoreError::NotFound(key))) => {
        tracing::warn!(invoice_id = %invoice_id, key = %key, "Artifact blob missing, regenerating");
        let document = self.get_document(invoice_id, emitter_id).await?;
        let (_, generated) = self.post_commit.generate_and_store(&document).await?;
        generated.get(kind).to_vec()
      }
      Err(e) => return Err(e),
    };

    Ok((bytes, kind.file_name(invoice_id)))
  }

  /// Queues another delivery attempt of the invoice email.
  pub async fn resend_email(
    &self,
    invoice_id: Uuid,
    emitter_id: Uuid,
    recipients: Recipients,
  ) -> Result<EmailStatus, InvoiceError> {
    let mut document = self.get_document(invoice_id, Some(emitter_id)).await?;

    let next = document.invoice.email_status.next_attempt();
    if next != document.invoice.email_status {
      self
        .invoice_store
        .update_email_status(invoice_id, next)
        .await?;
      document.invoice.email_status = next;
    }

    let notifier = self.post_commit.notifier.clone();
    tokio::spawn(async move {
      notifier.dispatch(&document, &recipients).await;
    });

    tracing::info!(invoice_id = %invoice_id, email_status = %next, "Email resend enqueued");
    Ok(next)
  }

  /// Resumes a failed document from `checkpoint`. Only `ERROR` documents can
  /// be retried.
  pub async fn retry(
    &self,
    invoice_id: Uuid,
    emitter_id: Uuid,
    checkpoint: RetryCheckpoint,
  ) -> Result<Invoice, InvoiceError> {
    let document = self.get_document(invoice_id, Some(emitter_id)).await?;
    let current = document.invoice.status;
    let target = checkpoint.resume_status();

    if current != DocumentStatus::Error {
      return Err(InvoiceError::InvalidStatusTransition {
        from: current,
        to: target,
      });
    }

    let invoice = self
      .invoice_store
      .update_status(invoice_id, current, target, None)
      .await?;

    tracing::info!(
      invoice_id = %invoice_id,
      checkpoint = checkpoint.as_str(),
      "Invoice retry enqueued"
    );
    Ok(invoice)
  }

  /// Forward status move reported by the authority workflow.
  pub async fn update_status(
    &self,
    invoice_id: Uuid,
    new_status: DocumentStatus,
    response: Option<AuthorityResponse>,
  ) -> Result<Invoice, InvoiceError> {
    let invoice = self
      .invoice_store
      .find_by_id(invoice_id)
      .await?
      .ok_or(InvoiceError::InvoiceNotFound(invoice_id))?;

    if !invoice.status.can_transition_to(new_status) {
      return Err(InvoiceError::InvalidStatusTransition {
        from: invoice.status,
        to: new_status,
      });
    }

    let updated = self
      .invoice_store
      .update_status(invoice_id, invoice.status, new_status, response.as_ref())
      .await?;

    tracing::info!(
      invoice_id = %invoice_id,
      from = %invoice.status,
      to = %new_status,
      "Invoice status updated"
    );
    Ok(updated)
  }

  pub async fn register_customer(
    &self,
    emitter_id: Uuid,
    details: CustomerDetails,
  ) -> Result<Customer, InvoiceError> {
    self.active_emitter(emitter_id).await?;
    self.customer_repo.upsert(emitter_id, &details).await
  }

  /// Status tally of the emitter's invoices created at or after `since`.
  pub async fn status_counts(
    &self,
    emitter_id: Uuid,
    since: DateTime<Utc>,
  ) -> Result<Vec<(DocumentStatus, i64)>, InvoiceError> {
    self.invoice_store.count_by_status(emitter_id, since).await
  }
}
