use actix_web::{
  Error, HttpMessage, HttpRequest, ResponseError,
  body::EitherBody,
  dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::{
  future::{Ready, ready},
  rc::Rc,
  sync::Arc,
};
use uuid::Uuid;

use crate::{adapters::http::errors::ApiError, domain::emitter::EmitterService};

/// Emitter resolved from the request's API key.
#[derive(Debug, Clone)]
pub struct AuthenticatedEmitter {
  pub emitter_id: Uuid,
  pub company_code: String,
}

/// Authenticates `Authorization: Bearer <api key>` and attaches the owning
/// emitter to the request extensions. Rejects with 401 otherwise.
pub struct ApiKeyMiddleware {
  emitter_service: Arc<EmitterService>,
}

impl ApiKeyMiddleware {
  pub fn new(emitter_service: Arc<EmitterService>) -> Self {
    Self { emitter_service }
  }
}

impl<S, B> Transform<S, ServiceRequest> for ApiKeyMiddleware
where
  S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
  S::Future: 'static,
  B: 'static,
{
  type Response = ServiceResponse<EitherBody<B>>;
  type Error = Error;
  type Transform = ApiKeyMiddlewareService<S>;
  type InitError = ();
  type Future = Ready<Result<Self::Transform, Self::InitError>>;

  fn new_transform(&self, service: S) -> Self::Future {
    ready(Ok(ApiKeyMiddlewareService {
      service: Rc::new(service),
      emitter_service: self.emitter_service.clone(),
    }))
  }
}

pub struct ApiKeyMiddlewareService<S> {
  service: Rc<S>,
  emitter_service: Arc<EmitterService>,
}

impl<S, B> Service<ServiceRequest> for ApiKeyMiddlewareService<S>
where
  S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
  S::Future: 'static,
  B: 'static,
{
  type Response = ServiceResponse<EitherBody<B>>;
  type Error = Error;
  type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

  forward_ready!(service);

  fn call(&self, req: ServiceRequest) -> Self::Future {
    let service = Rc::clone(&self.service);
    let emitter_service = self.emitter_service.clone();

    Box::pin(async move {
      let api_key = match extract_bearer_token(&req) {
        Ok(key) => key,
        Err(e) => {
          let (request, _) = req.into_parts();
          let response = e.error_response().map_into_right_body();
          return Ok(ServiceResponse::new(request, response));
        }
      };

      let emitter = match emitter_service.authenticate(&api_key).await {
        Ok(emitter) => emitter,
        Err(e) => {
          tracing::warn!(path = %req.path(), error = %e, "API key rejected");
          let (request, _) = req.into_parts();
          let api_error: ApiError = e.into();
          let response = api_error.error_response().map_into_right_body();
          return Ok(ServiceResponse::new(request, response));
        }
      };

      req.extensions_mut().insert(AuthenticatedEmitter {
        emitter_id: emitter.id,
        company_code: emitter.company_code,
      });

      let res = service.call(req).await?;
      Ok(res.map_into_left_body())
    })
  }
}

fn extract_bearer_token(req: &ServiceRequest) -> Result<String, ApiError> {
  req
    .headers()
    .get("Authorization")
    .and_then(|h| h.to_str().ok())
    .and_then(|s| s.strip_prefix("Bearer "))
    .map(|s| s.trim().to_string())
    .filter(|s| !s.is_empty())
    .ok_or_else(|| ApiError::Unauthorized("Missing or malformed API key".to_string()))
}

/// Extension trait to read the authenticated emitter in handlers
pub trait AuthEmitter {
  /// Fails with 401 when the route is not behind [`ApiKeyMiddleware`].
  fn authenticated_emitter(&self) -> Result<AuthenticatedEmitter, ApiError>;
}

impl AuthEmitter for HttpRequest {
  fn authenticated_emitter(&self) -> Result<AuthenticatedEmitter, ApiError> {
    self
      .extensions()
      .get::<AuthenticatedEmitter>()
      .cloned()
      .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))
  }
}
