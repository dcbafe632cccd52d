//! In-memory port implementations shared by the domain unit tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::domain::emitter::{
  ApiKey, ApiKeyRepository, BranchCode, Branding, DocumentNumber, Emitter, EmitterError,
  EmitterRepository, Environment, FiscalCode, IssuingPoint, NewEmitter, Ruc, Series,
  SeriesRepository,
};
use crate::domain::invoice::artifact_store::ArtifactStore;
use crate::domain::invoice::entities::{
  AuthorityResponse, Customer, CustomerDetails, GeneratedArtifacts, Invoice, InvoiceArtifacts,
  InvoiceDocument, InvoiceItem, InvoiceRequest, LineRequest, NewInvoice, Overrides,
};
use crate::domain::invoice::errors::{ArtifactError, BlobStoreError, EmailError, InvoiceError};
use crate::domain::invoice::notifications::NotificationDispatcher;
use crate::domain::invoice::ports::{
  ArtifactGenerator, ArtifactRepository, BlobStore, CustomerRepository, EmailMessage, EmailSender,
  InvoiceStore,
};
use crate::domain::invoice::services::{InvoiceService, InvoiceServiceDependencies};
use crate::domain::invoice::totals::TotalsCalculator;
use crate::domain::invoice::value_objects::{
  DocumentKind, DocumentStatus, EmailStatus, LineItemDescription, Payment, Quantity, UnitPrice,
};
use crate::domain::product::{Product, ProductError, ProductRepository};

pub fn sample_new_emitter(code: &str) -> NewEmitter {
  NewEmitter {
    name: format!("{} S.A.", code),
    company_code: code.to_lowercase(),
    ruc: Ruc::new("2", "155596713-2-2015", "59").unwrap(),
    branch: BranchCode::new("0000").unwrap(),
    default_issuing_point: IssuingPoint::new("001").unwrap(),
    environment: Environment::Test,
    default_emission_type: FiscalCode::new("01").unwrap(),
    default_document_code: FiscalCode::new("01").unwrap(),
    email: format!("facturacion@{}.com", code.to_lowercase()),
    phone: None,
    address_line: Some("Calle 50, Ciudad de Panamá".to_string()),
    ubi_code: Some("8-8-7".to_string()),
    branding: Branding::default(),
  }
}

pub fn sample_emitter(code: &str) -> Emitter {
  Emitter::new(sample_new_emitter(code))
}

pub fn sample_customer() -> CustomerDetails {
  CustomerDetails {
    name: "Cliente Ejemplo".to_string(),
    email: "cliente@example.com".to_string(),
    phone: None,
    address_line: None,
    ubi_code: None,
    tax_id: None,
  }
}

fn sample_line(quantity: Decimal, price: Decimal, tax: &str) -> LineRequest {
  LineRequest {
    sku: None,
    description: LineItemDescription::new("Servicio".to_string()).unwrap(),
    quantity: Quantity::new(quantity).unwrap(),
    unit_price: UnitPrice::new(price).unwrap(),
    tax_rate_code: tax.to_string(),
    cpbs_abr: None,
    cpbs_cmp: None,
  }
}

/// 2 x 10.00 at 7% plus 1 x 5.00 exempt: 25.00 + 1.40 = 26.40.
pub fn sample_request(
  emitter_id: Uuid,
  declared: Decimal,
  idempotency_key: Option<String>,
) -> InvoiceRequest {
  InvoiceRequest {
    emitter_id,
    document_kind: DocumentKind::Invoice,
    reference: None,
    customer: sample_customer(),
    items: vec![
      sample_line(dec!(2), dec!(10.00), "01"),
      sample_line(dec!(1), dec!(5.00), "00"),
    ],
    payment: Payment::new("02", declared).unwrap(),
    overrides: Overrides::default(),
    idempotency_key,
  }
}

/// A committed-looking document with `item_count` lines of 1 x 10.00 at 7%.
pub fn sample_document(item_count: usize) -> InvoiceDocument {
  let emitter = sample_emitter("ACME");
  let customer = Customer::new(emitter.id, sample_customer());
  let lines = (0..item_count)
    .map(|_| sample_line(dec!(1), dec!(10.00), "01"))
    .collect::<Vec<_>>();
  let computed = TotalsCalculator::calculate(&lines).unwrap();
  let now = Utc::now();
  let invoice = Invoice {
    id: Uuid::new_v4(),
    emitter_id: emitter.id,
    series_id: Uuid::new_v4(),
    customer_id: customer.id,
    document_kind: DocumentKind::Invoice,
    document_number: DocumentNumber::new(42).to_string(),
    issuing_point: "001".to_string(),
    status: DocumentStatus::Received,
    email_status: EmailStatus::Pending,
    reference: None,
    authority: AuthorityResponse::default(),
    environment: emitter.environment.code(),
    emission_type: "01".to_string(),
    document_code: "01".to_string(),
    subtotal: computed.totals.subtotal,
    itbms_amount: computed.totals.itbms_amount,
    total_amount: computed.totals.total_amount,
    idempotency_key: None,
    created_at: now,
    updated_at: now,
  };
  let items = computed
    .items
    .into_iter()
    .map(|item| item.into_item(invoice.id, now))
    .collect();

  InvoiceDocument {
    invoice,
    emitter,
    customer,
    items,
  }
}

#[derive(Default)]
struct EmitterState {
  emitters: Vec<Emitter>,
  series: Vec<Series>,
  keys: Vec<ApiKey>,
}

#[derive(Default)]
pub struct InMemoryEmitters {
  state: Mutex<EmitterState>,
}

impl InMemoryEmitters {
  pub fn insert_emitter(&self, emitter: Emitter) -> Emitter {
    self.state.lock().unwrap().emitters.push(emitter.clone());
    emitter
  }

  pub fn insert_series(&self, series: Series) -> Series {
    self.state.lock().unwrap().series.push(series.clone());
    series
  }

  pub fn emitter(&self, id: Uuid) -> Option<Emitter> {
    self
      .state
      .lock()
      .unwrap()
      .emitters
      .iter()
      .find(|e| e.id == id)
      .cloned()
  }

  pub fn series_by_id(&self, id: Uuid) -> Series {
    self
      .state
      .lock()
      .unwrap()
      .series
      .iter()
      .find(|s| s.id == id)
      .cloned()
      .unwrap()
  }

  fn allocate(&self, emitter_id: Uuid, issuing_point: &str, kind: DocumentKind) -> Option<(Uuid, i64)> {
    let mut state = self.state.lock().unwrap();
    let series = state.series.iter_mut().find(|s| {
      s.emitter_id == emitter_id
        && s.issuing_point.value() == issuing_point
        && s.document_kind == kind
        && s.is_active
    })?;
    let number = series.next_number;
    series.next_number += 1;
    series.issued_count += 1;
    Some((series.id, number))
  }

  fn record_outcome(&self, series_id: Uuid, status: DocumentStatus) {
    let mut state = self.state.lock().unwrap();
    if let Some(series) = state.series.iter_mut().find(|s| s.id == series_id) {
      match status {
        DocumentStatus::Authorized => series.authorized_count += 1,
        DocumentStatus::Rejected => series.rejected_count += 1,
        _ => {}
      }
    }
  }
}

#[async_trait]
impl EmitterRepository for InMemoryEmitters {
  async fn create(&self, emitter: Emitter) -> Result<Emitter, EmitterError> {
    let mut state = self.state.lock().unwrap();
    if state
      .emitters
      .iter()
      .any(|e| e.company_code == emitter.company_code)
    {
      return Err(EmitterError::EmitterAlreadyExists(emitter.company_code));
    }
    state.emitters.push(emitter.clone());
    Ok(emitter)
  }

  async fn find_by_id(&self, id: Uuid) -> Result<Option<Emitter>, EmitterError> {
    Ok(self.emitter(id))
  }
}

#[async_trait]
impl SeriesRepository for InMemoryEmitters {
  async fn create(&self, series: Series) -> Result<Series, EmitterError> {
    let mut state = self.state.lock().unwrap();
    if state.series.iter().any(|s| {
      s.emitter_id == series.emitter_id
        && s.issuing_point == series.issuing_point
        && s.document_kind == series.document_kind
    }) {
      return Err(EmitterError::SeriesAlreadyExists {
        issuing_point: series.issuing_point.to_string(),
        document_kind: series.document_kind,
      });
    }
    state.series.push(series.clone());
    Ok(series)
  }

  async fn list_by_emitter(&self, emitter_id: Uuid) -> Result<Vec<Series>, EmitterError> {
    Ok(
      self
        .state
        .lock()
        .unwrap()
        .series
        .iter()
        .filter(|s| s.emitter_id == emitter_id)
        .cloned()
        .collect(),
    )
  }

  async fn deactivate(&self, series_id: Uuid) -> Result<bool, EmitterError> {
    let mut state = self.state.lock().unwrap();
    match state.series.iter_mut().find(|s| s.id == series_id) {
      Some(series) => {
        series.is_active = false;
        Ok(true)
      }
      None => Ok(false),
    }
  }
}

#[async_trait]
impl ApiKeyRepository for InMemoryEmitters {
  async fn create(&self, key: ApiKey) -> Result<ApiKey, EmitterError> {
    self.state.lock().unwrap().keys.push(key.clone());
    Ok(key)
  }

  async fn find_active_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, EmitterError> {
    Ok(
      self
        .state
        .lock()
        .unwrap()
        .keys
        .iter()
        .find(|k| k.key_hash == key_hash && k.is_active)
        .cloned(),
    )
  }

  async fn touch(&self, id: Uuid) -> Result<(), EmitterError> {
    let mut state = self.state.lock().unwrap();
    if let Some(key) = state.keys.iter_mut().find(|k| k.id == id) {
      key.last_used_at = Some(Utc::now());
    }
    Ok(())
  }
}

#[derive(Default)]
pub struct InMemoryCustomers {
  customers: Mutex<Vec<Customer>>,
}

impl InMemoryCustomers {
  pub fn count(&self) -> usize {
    self.customers.lock().unwrap().len()
  }

  fn resolve(&self, emitter_id: Uuid, details: &CustomerDetails) -> Customer {
    let mut customers = self.customers.lock().unwrap();
    let email = details.email.to_lowercase();
    if let Some(existing) = customers
      .iter_mut()
      .find(|c| c.emitter_id == emitter_id && c.email == email)
    {
      existing.name = details.name.clone();
      existing.updated_at = Utc::now();
      return existing.clone();
    }
    let customer = Customer::new(emitter_id, details.clone());
    customers.push(customer.clone());
    customer
  }

  fn get(&self, id: Uuid) -> Option<Customer> {
    self
      .customers
      .lock()
      .unwrap()
      .iter()
      .find(|c| c.id == id)
      .cloned()
  }
}

#[async_trait]
impl CustomerRepository for InMemoryCustomers {
  async fn upsert(
    &self,
    emitter_id: Uuid,
    details: &CustomerDetails,
  ) -> Result<Customer, InvoiceError> {
    Ok(self.resolve(emitter_id, details))
  }

  async fn find_by_id(&self, id: Uuid) -> Result<Option<Customer>, InvoiceError> {
    Ok(self.get(id))
  }
}

#[derive(Default)]
pub struct InMemoryProducts {
  products: Mutex<Vec<Product>>,
}

#[async_trait]
impl ProductRepository for InMemoryProducts {
  async fn create(&self, product: Product) -> Result<Product, ProductError> {
    let mut products = self.products.lock().unwrap();
    if products
      .iter()
      .any(|p| p.emitter_id == product.emitter_id && p.sku == product.sku && p.is_active)
    {
      return Err(ProductError::SkuAlreadyExists(product.sku));
    }
    products.push(product.clone());
    Ok(product)
  }

  async fn find_by_sku(
    &self,
    emitter_id: Uuid,
    sku: &str,
  ) -> Result<Option<Product>, ProductError> {
    Ok(
      self
        .products
        .lock()
        .unwrap()
        .iter()
        .find(|p| p.emitter_id == emitter_id && p.sku == sku && p.is_active)
        .cloned(),
    )
  }
}

#[derive(Default)]
struct InvoiceState {
  invoices: Vec<Invoice>,
  items: Vec<InvoiceItem>,
}

/// Commits under one lock, which plays the role of the series row lock.
pub struct InMemoryInvoiceStore {
  emitters: Arc<InMemoryEmitters>,
  customers: Arc<InMemoryCustomers>,
  state: Mutex<InvoiceState>,
}

impl InMemoryInvoiceStore {
  pub fn new(emitters: Arc<InMemoryEmitters>, customers: Arc<InMemoryCustomers>) -> Self {
    Self {
      emitters,
      customers,
      state: Mutex::new(InvoiceState::default()),
    }
  }

  pub fn invoice_count(&self) -> usize {
    self.state.lock().unwrap().invoices.len()
  }
}

#[async_trait]
impl InvoiceStore for InMemoryInvoiceStore {
  async fn commit(&self, new: NewInvoice) -> Result<Invoice, InvoiceError> {
    let mut state = self.state.lock().unwrap();

    if let Some(key) = &new.idempotency_key {
      if let Some(existing) = state
        .invoices
        .iter()
        .find(|i| i.idempotency_key.as_ref() == Some(key))
      {
        return Err(InvoiceError::DuplicateIdempotencyKey {
          existing_id: existing.id,
        });
      }
    }

    let (series_id, number) = self
      .emitters
      .allocate(new.emitter_id, &new.issuing_point, new.document_kind)
      .ok_or_else(|| InvoiceError::SeriesNotFound {
        emitter_id: new.emitter_id,
        issuing_point: new.issuing_point.clone(),
        document_kind: new.document_kind,
      })?;
    let customer = self.customers.resolve(new.emitter_id, &new.customer);

    let now = Utc::now();
    let invoice = Invoice {
      id: new.id,
      emitter_id: new.emitter_id,
      series_id,
      customer_id: customer.id,
      document_kind: new.document_kind,
      document_number: DocumentNumber::new(number).to_string(),
      issuing_point: new.issuing_point,
      status: DocumentStatus::Received,
      email_status: EmailStatus::Pending,
      reference: new.reference,
      authority: AuthorityResponse::default(),
      environment: new.environment,
      emission_type: new.emission_type,
      document_code: new.document_code,
      subtotal: new.totals.subtotal,
      itbms_amount: new.totals.itbms_amount,
      total_amount: new.totals.total_amount,
      idempotency_key: new.idempotency_key,
      created_at: now,
      updated_at: now,
    };

    for item in new.items {
      state.items.push(item.into_item(invoice.id, now));
    }
    state.invoices.push(invoice.clone());
    Ok(invoice)
  }

  async fn find_by_id(&self, id: Uuid) -> Result<Option<Invoice>, InvoiceError> {
    Ok(
      self
        .state
        .lock()
        .unwrap()
        .invoices
        .iter()
        .find(|i| i.id == id)
        .cloned(),
    )
  }

  async fn find_document(&self, id: Uuid) -> Result<Option<InvoiceDocument>, InvoiceError> {
    let (invoice, items) = {
      let state = self.state.lock().unwrap();
      let Some(invoice) = state.invoices.iter().find(|i| i.id == id).cloned() else {
        return Ok(None);
      };
      let items = state
        .items
        .iter()
        .filter(|i| i.invoice_id == id)
        .cloned()
        .collect::<Vec<_>>();
      (invoice, items)
    };

    let emitter = self
      .emitters
      .emitter(invoice.emitter_id)
      .ok_or(InvoiceError::EmitterNotFound(invoice.emitter_id))?;
    let customer = self
      .customers
      .get(invoice.customer_id)
      .ok_or(InvoiceError::CustomerNotFound(invoice.customer_id))?;

    Ok(Some(InvoiceDocument {
      invoice,
      emitter,
      customer,
      items,
    }))
  }

  async fn find_by_idempotency_key(&self, key: &str) -> Result<Option<Invoice>, InvoiceError> {
    Ok(
      self
        .state
        .lock()
        .unwrap()
        .invoices
        .iter()
        .find(|i| i.idempotency_key.as_deref() == Some(key))
        .cloned(),
    )
  }

  async fn update_status(
    &self,
    id: Uuid,
    expected: DocumentStatus,
    new: DocumentStatus,
    response: Option<&AuthorityResponse>,
  ) -> Result<Invoice, InvoiceError> {
    let mut state = self.state.lock().unwrap();
    let invoice = state
      .invoices
      .iter_mut()
      .find(|i| i.id == id)
      .ok_or(InvoiceError::InvoiceNotFound(id))?;
    if invoice.status != expected {
      return Err(InvoiceError::ConcurrentModification(id));
    }
    invoice.status = new;
    if let Some(response) = response {
      invoice.authority = response.clone();
    }
    invoice.updated_at = Utc::now();
    if new.is_terminal() {
      self.emitters.record_outcome(invoice.series_id, new);
    }
    Ok(invoice.clone())
  }

  async fn update_email_status(&self, id: Uuid, status: EmailStatus) -> Result<(), InvoiceError> {
    let mut state = self.state.lock().unwrap();
    let invoice = state
      .invoices
      .iter_mut()
      .find(|i| i.id == id)
      .ok_or(InvoiceError::InvoiceNotFound(id))?;
    invoice.email_status = status;
    Ok(())
  }

  async fn count_by_status(
    &self,
    emitter_id: Uuid,
    since: DateTime<Utc>,
  ) -> Result<Vec<(DocumentStatus, i64)>, InvoiceError> {
    let state = self.state.lock().unwrap();
    let mut counts: HashMap<DocumentStatus, i64> = HashMap::new();
    for invoice in state
      .invoices
      .iter()
      .filter(|i| i.emitter_id == emitter_id && i.created_at >= since)
    {
      *counts.entry(invoice.status).or_default() += 1;
    }
    Ok(counts.into_iter().collect())
  }
}

#[derive(Default)]
pub struct InMemoryArtifacts {
  rows: Mutex<HashMap<Uuid, InvoiceArtifacts>>,
}

impl InMemoryArtifacts {
  pub fn len(&self) -> usize {
    self.rows.lock().unwrap().len()
  }
}

#[async_trait]
impl ArtifactRepository for InMemoryArtifacts {
  async fn upsert(&self, artifacts: InvoiceArtifacts) -> Result<InvoiceArtifacts, InvoiceError> {
    self
      .rows
      .lock()
      .unwrap()
      .insert(artifacts.invoice_id, artifacts.clone());
    Ok(artifacts)
  }

  async fn find_by_invoice_id(
    &self,
    invoice_id: Uuid,
  ) -> Result<Option<InvoiceArtifacts>, InvoiceError> {
    Ok(self.rows.lock().unwrap().get(&invoice_id).cloned())
  }
}

pub struct InMemoryBlobStore {
  objects: Mutex<HashMap<String, Vec<u8>>>,
  deleted: Mutex<Vec<String>>,
  available: bool,
  failing_suffix: Option<String>,
}

impl Default for InMemoryBlobStore {
  fn default() -> Self {
    Self {
      objects: Mutex::new(HashMap::new()),
      deleted: Mutex::new(Vec::new()),
      available: true,
      failing_suffix: None,
    }
  }
}

impl InMemoryBlobStore {
  pub fn unavailable() -> Self {
    Self {
      available: false,
      ..Default::default()
    }
  }

  /// Uploads of keys ending in `suffix` fail.
  pub fn failing_on(suffix: &str) -> Self {
    Self {
      failing_suffix: Some(suffix.to_string()),
      ..Default::default()
    }
  }

  pub fn contains(&self, key: &str) -> bool {
    self.objects.lock().unwrap().contains_key(key)
  }

  pub fn deleted(&self) -> Vec<String> {
    self.deleted.lock().unwrap().clone()
  }

  /// Drops an object behind the store's back.
  pub fn remove(&self, key: &str) {
    self.objects.lock().unwrap().remove(key);
  }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
  async fn put(&self, key: &str, data: Vec<u8>, _content_type: &str) -> Result<(), BlobStoreError> {
    if !self.available {
      return Err(BlobStoreError::Unavailable);
    }
    if let Some(suffix) = &self.failing_suffix {
      if key.ends_with(suffix.as_str()) {
        return Err(BlobStoreError::Upload {
          key: key.to_string(),
          message: "injected failure".to_string(),
        });
      }
    }
    self.objects.lock().unwrap().insert(key.to_string(), data);
    Ok(())
  }

  async fn get(&self, key: &str) -> Result<Vec<u8>, BlobStoreError> {
    if !self.available {
      return Err(BlobStoreError::Unavailable);
    }
    self
      .objects
      .lock()
      .unwrap()
      .get(key)
      .cloned()
      .ok_or_else(|| BlobStoreError::NotFound(key.to_string()))
  }

  async fn delete(&self, key: &str) -> Result<(), BlobStoreError> {
    self.deleted.lock().unwrap().push(key.to_string());
    self.objects.lock().unwrap().remove(key);
    Ok(())
  }
}

pub struct RecordingEmailSender {
  sent: Mutex<Vec<EmailMessage>>,
  enabled: bool,
  failing: bool,
}

impl Default for RecordingEmailSender {
  fn default() -> Self {
    Self {
      sent: Mutex::new(Vec::new()),
      enabled: true,
      failing: false,
    }
  }
}

impl RecordingEmailSender {
  pub fn failing() -> Self {
    Self {
      failing: true,
      ..Default::default()
    }
  }

  pub fn disabled() -> Self {
    Self {
      enabled: false,
      ..Default::default()
    }
  }

  pub fn sent(&self) -> Vec<EmailMessage> {
    self.sent.lock().unwrap().clone()
  }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
  async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
    if !self.enabled {
      return Err(EmailError::Disabled);
    }
    if self.failing {
      return Err(EmailError::Transport("connection refused".to_string()));
    }
    self.sent.lock().unwrap().push(message.clone());
    Ok(())
  }

  fn is_enabled(&self) -> bool {
    self.enabled
  }

  fn provider_name(&self) -> &'static str {
    "recording"
  }
}

#[derive(Default)]
pub struct StubArtifactGenerator {
  failing: AtomicBool,
}

impl StubArtifactGenerator {
  pub fn fail(&self, failing: bool) {
    self.failing.store(failing, Ordering::SeqCst);
  }
}

impl ArtifactGenerator for StubArtifactGenerator {
  fn generate(&self, document: &InvoiceDocument) -> Result<GeneratedArtifacts, ArtifactError> {
    if self.failing.load(Ordering::SeqCst) {
      return Err(ArtifactError::Pdf("renderer crashed".to_string()));
    }
    let number = &document.invoice.document_number;
    Ok(GeneratedArtifacts {
      pdf: format!("%PDF-1.5\n% factura {}", number).into_bytes(),
      xml: format!("<factura><numero>{}</numero></factura>", number).into_bytes(),
    })
  }
}

/// One emitter "ACME S.A." with an invoice series on point 001.
pub struct Fixture {
  pub emitter: Emitter,
  pub series: Series,
  pub emitters: Arc<InMemoryEmitters>,
  pub customers: Arc<InMemoryCustomers>,
  pub store: Arc<InMemoryInvoiceStore>,
  pub artifacts: Arc<InMemoryArtifacts>,
  pub blobs: Arc<InMemoryBlobStore>,
  pub generator: Arc<StubArtifactGenerator>,
  pub email: Arc<RecordingEmailSender>,
}

impl Fixture {
  pub async fn new() -> Self {
    Self::with_email(RecordingEmailSender::default())
  }

  pub async fn with_failing_email() -> Self {
    Self::with_email(RecordingEmailSender::failing())
  }

  fn with_email(email: RecordingEmailSender) -> Self {
    let emitters = Arc::new(InMemoryEmitters::default());
    let customers = Arc::new(InMemoryCustomers::default());
    let emitter = emitters.insert_emitter(sample_emitter("ACME"));
    let series = emitters.insert_series(Series::new(
      emitter.id,
      IssuingPoint::new("001").unwrap(),
      DocumentKind::Invoice,
    ));

    Self {
      emitter,
      series,
      store: Arc::new(InMemoryInvoiceStore::new(
        emitters.clone(),
        customers.clone(),
      )),
      emitters,
      customers,
      artifacts: Arc::new(InMemoryArtifacts::default()),
      blobs: Arc::new(InMemoryBlobStore::default()),
      generator: Arc::new(StubArtifactGenerator::default()),
      email: Arc::new(email),
    }
  }

  pub fn service(&self) -> InvoiceService {
    InvoiceService::new(InvoiceServiceDependencies {
      invoice_store: self.store.clone(),
      customer_repo: self.customers.clone(),
      emitter_repo: self.emitters.clone(),
      artifact_generator: self.generator.clone(),
      artifact_store: Arc::new(ArtifactStore::new(
        self.blobs.clone(),
        self.artifacts.clone(),
      )),
      notifier: Arc::new(NotificationDispatcher::new(
        self.email.clone(),
        self.store.clone(),
        "http://localhost:8080",
      )),
    })
  }

  /// Commits the 26.40 sample invoice straight through the store.
  pub async fn committed_document(&self) -> InvoiceDocument {
    let request = sample_request(self.emitter.id, dec!(26.40), None);
    let computed = TotalsCalculator::calculate(&request.items).unwrap();

    let invoice = self
      .store
      .commit(NewInvoice {
        id: Uuid::new_v4(),
        emitter_id: self.emitter.id,
        customer: request.customer,
        document_kind: DocumentKind::Invoice,
        issuing_point: "001".to_string(),
        environment: self.emitter.environment.code(),
        emission_type: "01".to_string(),
        document_code: "01".to_string(),
        reference: None,
        totals: computed.totals,
        idempotency_key: None,
        items: computed.items,
      })
      .await
      .unwrap();

    self.store.find_document(invoice.id).await.unwrap().unwrap()
  }
}
