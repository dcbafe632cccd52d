pub mod dtos;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod routes;

pub use dtos::{ErrorResponse, FieldIssue};
pub use errors::ApiError;
pub use middleware::{
  AdminTokenMiddleware, ApiKeyMiddleware, AuthEmitter, AuthenticatedEmitter, RequestId,
  RequestIdExt, RequestIdMiddleware,
};
pub use routes::{ApiRouteDependencies, configure_api_routes, configure_health_routes};
