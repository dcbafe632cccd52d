pub mod entities;
pub mod errors;
pub mod ports;
pub mod services;

pub use entities::{NewProduct, Product};
pub use errors::ProductError;
pub use ports::ProductRepository;
pub use services::ProductService;
