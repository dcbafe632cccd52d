pub mod api_key_repository;
pub mod artifact_repository;
pub mod customer_repository;
pub mod emitter_repository;
pub mod invoice_store;
pub mod product_repository;
pub mod series_repository;

#[cfg(test)]
pub(crate) mod test_support;

pub use api_key_repository::PostgresApiKeyRepository;
pub use artifact_repository::PostgresArtifactRepository;
pub use customer_repository::PostgresCustomerRepository;
pub use emitter_repository::PostgresEmitterRepository;
pub use invoice_store::PostgresInvoiceStore;
pub use product_repository::PostgresProductRepository;
pub use series_repository::PostgresSeriesRepository;
