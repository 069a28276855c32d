use crate::client::RelayBody;
use crate::context::RelayContext;
use crate::errors::RelayError;
use crate::metrics_defs::STATUS_FALLBACK;
use crate::operation::Operation;
use crate::relay::relay_response;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::{CONTENT_TYPE, HeaderValue, USER_AGENT};
use hyper::{Request, Response, StatusCode};
use shared::counter;
use shared::http::make_error_response;
use std::sync::Arc;

/// Returned for status reads when the primary backend cannot be reached
pub const EMPTY_STATUS_PAYLOAD: &str = r#"{"data":{"grand_total":{"decimal":"","digital":"","hours":0,"minutes":0,"text":"","total_seconds":0},"categories":[],"dependencies":[],"editors":[],"languages":[],"machines":[],"operating_systems":[],"projects":[],"range":{"text":"Today","timezone":"UTC"}}}"#;

/// Router that maps incoming requests to relay operations
#[derive(Clone)]
pub struct Router {
    context: Arc<RelayContext>,
}

impl Router {
    pub fn new(context: Arc<RelayContext>) -> Self {
        Self { context }
    }

    /// Routes an incoming request and produces the response for the caller.
    ///
    /// Unknown paths get 404 and known paths with the wrong method get 405,
    /// both without contacting any backend.
    pub async fn route<B>(&self, req: Request<B>) -> Response<RelayBody>
    where
        B: hyper::body::Body + Send + 'static,
        B::Error: std::fmt::Display,
    {
        let Some(operation) = Operation::from_path(req.uri().path()) else {
            tracing::warn!(
                method = %req.method(),
                path = %req.uri().path(),
                "No route matched"
            );
            return make_error_response(StatusCode::NOT_FOUND);
        };

        if req.method() != operation.method() {
            tracing::debug!(method = %req.method(), %operation, "Method not allowed");
            return make_error_response(StatusCode::METHOD_NOT_ALLOWED);
        }

        let result = if operation.is_write() {
            self.handle_write(operation, req).await
        } else {
            Ok(self.handle_status(req).await)
        };

        result.unwrap_or_else(|e| {
            tracing::debug!(error = %e, %operation, "Request failed");
            make_error_response(e.status_code())
        })
    }

    /// Mirrors the body to every backend and relays the primary's response.
    async fn handle_write<B>(
        &self,
        operation: Operation,
        req: Request<B>,
    ) -> Result<Response<RelayBody>, RelayError>
    where
        B: hyper::body::Body + Send + 'static,
        B::Error: std::fmt::Display,
    {
        let user_agent = req.headers().get(USER_AGENT).cloned();
        let body = req
            .into_body()
            .collect()
            .await
            .map_err(|e| RelayError::RequestBodyError(e.to_string()))?
            .to_bytes();

        tracing::debug!(%operation, body = %String::from_utf8_lossy(&body), "Received heartbeat");

        match self.context.fan_out.dispatch(operation, body, user_agent).await {
            Ok(upstream) => Ok(relay_response(upstream)),
            Err(e) => {
                if e.is_transport_failure() {
                    tracing::warn!(error = %e, %operation, "Primary backend failed");
                }
                Err(e)
            }
        }
    }

    /// Reads today's status from the primary only, never from secondaries.
    async fn handle_status<B>(&self, req: Request<B>) -> Response<RelayBody> {
        let primary = self.context.backends.primary();
        let outcome = self
            .context
            .client
            .send(
                primary,
                Operation::StatusToday,
                Bytes::new(),
                req.headers().get(USER_AGENT),
            )
            .await;

        match outcome {
            Ok(upstream) => relay_response(upstream),
            Err(e) => {
                tracing::warn!(
                    backend = %primary.name,
                    error = %e,
                    "Primary backend error, returning empty status"
                );
                counter!(STATUS_FALLBACK).increment(1);
                empty_status_response()
            }
        }
    }
}

fn empty_status_response() -> Response<RelayBody> {
    let body = Full::new(Bytes::from_static(EMPTY_STATUS_PAYLOAD.as_bytes()))
        .map_err(|e| match e {})
        .boxed();

    let mut response = Response::new(body);
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
