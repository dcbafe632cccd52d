//! Infrastructure layer
//!
//! Concrete adapters behind the domain ports: Postgres persistence, S3 blob
//! storage, PDF/XML rendering, the Resend email client and configuration.

pub mod config;
pub mod documents;
pub mod email;
pub mod persistence;
pub mod storage;
