pub mod create_customer;
pub mod create_invoice;
pub mod download_artifact;
pub mod get_invoice;
pub mod get_invoice_files;
pub mod resend_email;
pub mod retry_invoice;
pub mod update_invoice_status;

pub use create_customer::{CreateCustomerCommand, CreateCustomerResponse, CreateCustomerUseCase};
pub use create_invoice::{
  CreateInvoiceCommand, CreateInvoiceItemDto, CreateInvoiceResponse, CreateInvoiceUseCase,
  CustomerDto, LinksDto, ReferenceDto, TotalsDto,
};
pub use download_artifact::{
  DownloadArtifactCommand, DownloadArtifactResponse, DownloadArtifactUseCase,
};
pub use get_invoice::{EmitterInfoDto, GetInvoiceCommand, GetInvoiceUseCase, InvoiceStatusResponse};
pub use get_invoice_files::{GetInvoiceFilesCommand, GetInvoiceFilesUseCase, InvoiceFilesResponse};
pub use resend_email::{ResendEmailCommand, ResendEmailResponse, ResendEmailUseCase};
pub use retry_invoice::{RetryInvoiceCommand, RetryInvoiceResponse, RetryInvoiceUseCase};
pub use update_invoice_status::{
  UpdateInvoiceStatusCommand, UpdateInvoiceStatusResponse, UpdateInvoiceStatusUseCase,
};
