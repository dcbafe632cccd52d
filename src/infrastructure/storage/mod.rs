pub mod noop_blob_store;
pub mod s3_blob_store;

pub use noop_blob_store::NoopBlobStore;
pub use s3_blob_store::S3BlobStore;
