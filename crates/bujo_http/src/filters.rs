//! Request filters.
//!
//! Applied in this order, outermost first:
//! 1. `RequestLogLayer`: method, path, status, duration.
//! 2. `RegistrationGateLayer`: closes `/register` unless enabled.
//! 3. `IdentityLayer`: resolves the acting user on protected routes only.

use crate::error::ApiError;
use crate::state::AppState;
use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Redirect, Response};
use bujo_core::ActingContext;
use log::{info, warn};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};

/// Path guarded by the registration gate.
pub const REGISTER_PATH: &str = "/register";
/// Where closed registration redirects to.
pub const LOGIN_PATH: &str = "/login";

type BoxFuture<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send>>;

/// Logs one metadata line per request.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLogLayer;

impl<S> Layer<S> for RequestLogLayer {
    type Service = RequestLogService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestLogService { inner }
    }
}

#[derive(Debug, Clone)]
pub struct RequestLogService<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for RequestLogService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let started_at = Instant::now();
        let future = self.inner.call(req);

        Box::pin(async move {
            let response = future.await?;
            let status = response.status();
            let outcome = if status.is_server_error() {
                "error"
            } else {
                "ok"
            };
            info!(
                "event=http_request module=http status={outcome} method={method} path={path} http_status={} duration_ms={}",
                status.as_u16(),
                started_at.elapsed().as_millis()
            );
            Ok(response)
        })
    }
}

/// Redirects `/register` to `/login` while registration is disabled.
#[derive(Debug, Clone, Copy)]
pub struct RegistrationGateLayer {
    enabled: bool,
}

impl RegistrationGateLayer {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl<S> Layer<S> for RegistrationGateLayer {
    type Service = RegistrationGateService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RegistrationGateService {
            inner,
            enabled: self.enabled,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegistrationGateService<S> {
    inner: S,
    enabled: bool,
}

impl<S> Service<Request<Body>> for RegistrationGateService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        if !self.enabled && req.uri().path() == REGISTER_PATH {
            info!("event=registration_gate module=http status=ok outcome=redirect");
            return Box::pin(async { Ok(Redirect::to(LOGIN_PATH).into_response()) });
        }
        Box::pin(self.inner.call(req))
    }
}

/// Resolves the acting user and inserts `ActingContext` into request
/// extensions. Requests without a known user get `401`.
#[derive(Clone)]
pub struct IdentityLayer {
    state: AppState,
}

impl IdentityLayer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl<S> Layer<S> for IdentityLayer {
    type Service = IdentityService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        IdentityService {
            inner,
            state: self.state.clone(),
        }
    }
}

#[derive(Clone)]
pub struct IdentityService<S> {
    inner: S,
    state: AppState,
}

impl<S> Service<Request<Body>> for IdentityService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        // The readied service goes into the future; a fresh clone stays behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let state = self.state.clone();

        Box::pin(async move {
            let headers = req.headers().clone();
            let provider = state.identity.clone();
            let resolved = state
                .store
                .run(move |conn| Ok(provider.identify(&headers, conn)?))
                .await;

            match resolved {
                Ok(Some(user_id)) => {
                    req.extensions_mut().insert(ActingContext::new(user_id));
                    inner.call(req).await
                }
                Ok(None) => {
                    warn!(
                        "event=identity_resolve module=http status=error error_code=unauthenticated path={}",
                        req.uri().path()
                    );
                    Ok(ApiError::Unauthenticated.into_response())
                }
                Err(err) => Ok(err.into_response()),
            }
        })
    }
}
