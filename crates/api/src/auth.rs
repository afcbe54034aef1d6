use axum::{
    Json,
    extract::Request,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use data_encoding::BASE64;
use futures::future::BoxFuture;
use serde_json::json;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::info;

use crate::state::AppState;

/// Credentials from an `Authorization: Basic` header, or `None` when the
/// header is absent or malformed.
fn extract_basic_credentials<B>(request: &Request<B>) -> Option<(String, String)> {
    let auth_header = request.headers().get(header::AUTHORIZATION)?;
    let auth_value = auth_header.to_str().ok()?;
    let encoded = auth_value.strip_prefix("Basic ")?;

    let decoded = BASE64.decode(encoded.as_bytes()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Basic realm=\"crash-reports\"")],
        Json(json!({
            "result": "failed",
            "error": "unauthorized"
        })),
    )
        .into_response()
}

/// Enforces the shared operator credential pair on every route it wraps.
#[derive(Clone)]
pub struct BasicAuthLayer {
    app_state: AppState,
}

impl BasicAuthLayer {
    pub fn new(app_state: AppState) -> Self {
        Self { app_state }
    }
}

impl<S> Layer<S> for BasicAuthLayer {
    type Service = BasicAuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BasicAuthService {
            inner,
            app_state: self.app_state.clone(),
        }
    }
}

#[derive(Clone)]
pub struct BasicAuthService<S> {
    inner: S,
    app_state: AppState,
}

impl<S, B> Service<Request<B>> for BasicAuthService<S>
where
    S: Service<Request<B>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<B>) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let app_state = self.app_state.clone();

        Box::pin(async move {
            let Some((username, password)) = extract_basic_credentials(&request) else {
                info!("rejecting request without basic credentials");
                return Ok(unauthorized());
            };

            let auth = &app_state.settings.auth;
            if username != auth.username || password != auth.password {
                info!(username, "rejecting request with wrong credentials");
                return Ok(unauthorized());
            }

            inner.call(request).await
        })
    }
}
