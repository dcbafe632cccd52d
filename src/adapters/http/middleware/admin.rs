use actix_web::{
  Error, ResponseError,
  body::EitherBody,
  dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use sha2::{Digest, Sha256};
use std::{
  future::{Ready, ready},
  rc::Rc,
  sync::Arc,
};

use crate::adapters::http::errors::ApiError;

pub const ADMIN_TOKEN_HEADER: &str = "X-Admin-Token";

/// Guards the admin scope with the shared `X-Admin-Token` secret.
pub struct AdminTokenMiddleware {
  token_digest: Arc<[u8; 32]>,
}

impl AdminTokenMiddleware {
  pub fn new(admin_token: &str) -> Self {
    Self {
      token_digest: Arc::new(digest(admin_token)),
    }
  }
}

// Digests are compared so the check does not leak the token length
fn digest(value: &str) -> [u8; 32] {
  Sha256::digest(value.as_bytes()).into()
}

fn constant_time_eq(a: &[u8; 32], b: &[u8; 32]) -> bool {
  a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

impl<S, B> Transform<S, ServiceRequest> for AdminTokenMiddleware
where
  S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
  S::Future: 'static,
  B: 'static,
{
  type Response = ServiceResponse<EitherBody<B>>;
  type Error = Error;
  type Transform = AdminTokenMiddlewareService<S>;
  type InitError = ();
  type Future = Ready<Result<Self::Transform, Self::InitError>>;

  fn new_transform(&self, service: S) -> Self::Future {
    ready(Ok(AdminTokenMiddlewareService {
      service: Rc::new(service),
      token_digest: self.token_digest.clone(),
    }))
  }
}

pub struct AdminTokenMiddlewareService<S> {
  service: Rc<S>,
  token_digest: Arc<[u8; 32]>,
}

impl<S, B> Service<ServiceRequest> for AdminTokenMiddlewareService<S>
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

    let authorized = req
      .headers()
      .get(ADMIN_TOKEN_HEADER)
      .and_then(|h| h.to_str().ok())
      .map(|token| constant_time_eq(&digest(token), &self.token_digest))
      .unwrap_or(false);

    Box::pin(async move {
      if !authorized {
        tracing::warn!(path = %req.path(), "Admin token rejected");
        let (request, _) = req.into_parts();
        let response = ApiError::Unauthorized("Invalid admin token".to_string())
          .error_response()
          .map_into_right_body();
        return Ok(ServiceResponse::new(request, response));
      }

      let res = service.call(req).await?;
      Ok(res.map_into_left_body())
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::{
    App, HttpResponse,
    http::StatusCode,
    test::{self, TestRequest},
    web,
  };

  #[actix_web::test]
  async fn test_admin_token_is_required() {
    let app = test::init_service(
      App::new()
        .wrap(AdminTokenMiddleware::new("s3cret"))
        .route("/", web::post().to(HttpResponse::Ok)),
    )
    .await;

    let ok = TestRequest::post()
      .uri("/")
      .insert_header((ADMIN_TOKEN_HEADER, "s3cret"))
      .to_request();
    assert_eq!(test::call_service(&app, ok).await.status(), StatusCode::OK);

    let wrong = TestRequest::post()
      .uri("/")
      .insert_header((ADMIN_TOKEN_HEADER, "guess"))
      .to_request();
    assert_eq!(
      test::call_service(&app, wrong).await.status(),
      StatusCode::UNAUTHORIZED
    );

    let missing = TestRequest::post().uri("/").to_request();
    assert_eq!(
      test::call_service(&app, missing).await.status(),
      StatusCode::UNAUTHORIZED
    );
  }
}
