use crate::config::RelayTimeouts;
use crate::errors::RelayError;
use crate::metrics_defs::BACKEND_REQUESTS;
use crate::operation::Operation;
use crate::registry::Backend;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::{CONTENT_TYPE, HeaderValue, USER_AGENT};
use hyper::{Response, StatusCode};
use shared::counter;
use std::time::Duration;
use url::Url;

/// Appended to the caller's User-Agent on every outbound call
pub const PRODUCT_SUFFIX: &str = "(JasonLovesDoggo/multitime)";

pub type RelayBody = BoxBody<Bytes, RelayError>;

/// Result of one outbound call to one backend
pub type CallOutcome = Result<Response<RelayBody>, RelayError>;

/// Builds the outbound User-Agent from the one the caller sent, if any.
pub fn relay_user_agent(caller: Option<&HeaderValue>) -> HeaderValue {
    let caller = caller.map(HeaderValue::as_bytes).unwrap_or_default();

    let mut value = caller.trim_ascii().to_vec();
    if !value.is_empty() {
        value.push(b' ');
    }
    value.extend_from_slice(PRODUCT_SUFFIX.as_bytes());

    HeaderValue::from_bytes(&value).unwrap_or(HeaderValue::from_static(PRODUCT_SUFFIX))
}

/// Performs single calls against single backends.
///
/// The underlying connection pool is shared by every clone, so one client is
/// built at startup and handed to all requests.
#[derive(Clone)]
pub struct RelayClient {
    client: reqwest::Client,
}

impl RelayClient {
    pub fn new(timeouts: &RelayTimeouts) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.http_timeout_secs))
            .build()?;
        Ok(Self { client })
    }

    /// Sends `operation` to `backend` and returns its response.
    ///
    /// Sets Basic auth with an empty username and the backend credential as
    /// password, the relay User-Agent, and for writes a JSON content type.
    /// The timeout covers the whole exchange including the response body.
    ///
    /// A write answered with anything other than `201 Created` has its body
    /// read in full for the debug log, then put back so the returned response
    /// is still readable from the start.
    pub async fn send(
        &self,
        backend: &Backend,
        operation: Operation,
        body: Bytes,
        user_agent: Option<&HeaderValue>,
    ) -> CallOutcome {
        let outcome = self.try_send(backend, operation, body, user_agent).await;

        let result = match &outcome {
            Ok(_) => "ok",
            Err(RelayError::UpstreamTimeout(_)) => "timeout",
            Err(_) => "error",
        };
        counter!(
            BACKEND_REQUESTS,
            "backend" => backend.name.clone(),
            "role" => backend.role(),
            "operation" => operation.name(),
            "result" => result
        )
        .increment(1);

        outcome
    }

    async fn try_send(
        &self,
        backend: &Backend,
        operation: Operation,
        body: Bytes,
        user_agent: Option<&HeaderValue>,
    ) -> CallOutcome {
        let url = Url::parse(&format!("{}{}", backend.base_url, operation.path()))
            .map_err(|e| RelayError::InvalidBackendUrl(backend.name.clone(), e))?;

        tracing::debug!(backend = %backend.name, %url, %operation, "Forwarding to backend");

        let mut request = self
            .client
            .request(operation.method(), url)
            .basic_auth("", Some(&backend.credential))
            .header(USER_AGENT, relay_user_agent(user_agent));
        if operation.is_write() {
            request = request
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(&backend.name, e))?;

        let status = response.status();
        let version = response.version();
        let headers = response.headers().clone();

        let body = if operation.is_write() && status != StatusCode::CREATED {
            let drained = response.bytes().await.map_err(|e| {
                if e.is_timeout() {
                    RelayError::UpstreamTimeout(backend.name.clone())
                } else {
                    RelayError::ResponseBodyError(e.to_string())
                }
            })?;
            tracing::debug!(
                backend = %backend.name,
                %status,
                body = %String::from_utf8_lossy(&drained),
                "Backend did not create heartbeat"
            );
            Full::new(drained).map_err(|e| match e {}).boxed()
        } else {
            reqwest::Body::from(response).map_err(RelayError::from).boxed()
        };

        let mut upstream = Response::new(body);
        *upstream.status_mut() = status;
        *upstream.version_mut() = version;
        *upstream.headers_mut() = headers;
        Ok(upstream)
    }
}

fn transport_error(backend: &str, e: reqwest::Error) -> RelayError {
    if e.is_timeout() {
        RelayError::UpstreamTimeout(backend.to_string())
    } else {
        RelayError::UpstreamRequestFailed(backend.to_string(), e.to_string())
    }
}
