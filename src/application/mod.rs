//! Application layer
//!
//! Use cases that turn primitive commands into domain calls and shape the
//! responses returned to the HTTP adapter.

pub mod emitter;
pub mod invoice;
pub mod product;
