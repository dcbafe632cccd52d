pub mod admin;
pub mod api_key;
pub mod request_id;

pub use admin::AdminTokenMiddleware;
pub use api_key::{ApiKeyMiddleware, AuthEmitter, AuthenticatedEmitter};
pub use request_id::{RequestId, RequestIdExt, RequestIdMiddleware};
