pub mod entities;
pub mod errors;
pub mod ports;
pub mod services;
pub mod value_objects;

pub use entities::{ApiKey, Branding, Emitter, NewEmitter, Series};
pub use errors::EmitterError;
pub use ports::{ApiKeyRepository, EmitterRepository, SeriesRepository};
pub use services::{EmitterService, SeriesPage};
pub use value_objects::{
  ApiKeySecret, BranchCode, DocumentNumber, Environment, FiscalCode, IssuingPoint, Ruc,
  ValueObjectError,
};
