use crate::config::BackendConfig;
use crate::registry::Backends;
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::header::HeaderMap;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// A request as seen by a test backend
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// What a test backend answers with
#[derive(Clone)]
pub struct CannedResponse {
    pub status: StatusCode,
    pub headers: Vec<(&'static str, &'static str)>,
    pub body: &'static str,
    pub delay: Duration,
}

impl CannedResponse {
    pub fn new(status: StatusCode, body: &'static str) -> Self {
        Self {
            status,
            headers: vec![("content-type", "application/json")],
            body,
            delay: Duration::ZERO,
        }
    }

    pub fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers.push((name, value));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

pub struct TestBackend {
    pub url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl TestBackend {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Polls until at least `count` requests arrived, giving up after two seconds.
    pub async fn wait_for_requests(&self, count: usize) -> Vec<RecordedRequest> {
        for _ in 0..200 {
            let requests = self.requests();
            if requests.len() >= count {
                return requests;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.requests()
    }
}

/// Starts a backend on an ephemeral port that records every request and
/// replies with `canned`.
pub async fn start_backend(canned: CannedResponse) -> TestBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let requests = Arc::new(Mutex::new(Vec::new()));

    let recorded = requests.clone();
    tokio::spawn(async move {
        loop {
            let (stream, _) = listener.accept().await.unwrap();
            let io = TokioIo::new(stream);
            let recorded = recorded.clone();
            let canned = canned.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    let recorded = recorded.clone();
                    let canned = canned.clone();
                    async move {
                        let (parts, body) = req.into_parts();
                        let body = body
                            .collect()
                            .await
                            .map(|collected| collected.to_bytes())
                            .unwrap_or_default();
                        recorded.lock().unwrap().push(RecordedRequest {
                            method: parts.method,
                            path: parts.uri.path().to_string(),
                            headers: parts.headers,
                            body,
                        });

                        tokio::time::sleep(canned.delay).await;

                        let mut builder = Response::builder().status(canned.status);
                        for (name, value) in &canned.headers {
                            builder = builder.header(*name, *value);
                        }
                        Ok::<_, Infallible>(
                            builder.body(Full::new(Bytes::from(canned.body))).unwrap(),
                        )
                    }
                });

                let _ = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                    .serve_connection(io, service)
                    .await;
            });
        }
    });

    TestBackend {
        url: format!("http://127.0.0.1:{port}"),
        requests,
    }
}

/// Returns a base URL nothing is listening on.
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

pub fn backend_config(name: &str, url: &str, is_primary: bool) -> BackendConfig {
    BackendConfig {
        name: name.to_string(),
        url: url.to_string(),
        api_key: format!("{name}-key"),
        is_primary,
    }
}

/// Registry with one primary and any number of secondaries, in that order.
pub fn test_backends(primary_url: &str, secondary_urls: &[&str]) -> Backends {
    let mut configs = vec![backend_config("primary", primary_url, true)];
    for (i, url) in secondary_urls.iter().enumerate() {
        let name = if i == 0 {
            "secondary".to_string()
        } else {
            format!("secondary-{i}")
        };
        configs.push(backend_config(&name, url, false));
    }
    Backends::try_new(configs).unwrap()
}

pub async fn body_bytes<B>(body: B) -> Bytes
where
    B: hyper::body::Body,
    B::Error: std::fmt::Debug,
{
    body.collect().await.unwrap().to_bytes()
}
