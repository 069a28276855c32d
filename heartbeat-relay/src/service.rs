use crate::client::RelayBody;
use crate::errors::RelayError;
use crate::metrics_defs::{REQUEST_DURATION, REQUESTS_INFLIGHT};
use crate::operation::Operation;
use crate::router::Router;
use hyper::body::Incoming;
use hyper::service::Service;
use hyper::{Request, Response};
use shared::{gauge, histogram};
use std::future::Future;
use std::pin::Pin;
use tokio::time::Instant;

/// Counts a request as in flight until dropped, including when the
/// connection goes away and hyper drops the request future.
struct InflightGuard;

impl InflightGuard {
    fn new() -> Self {
        gauge!(REQUESTS_INFLIGHT).increment(1.0);
        InflightGuard
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        gauge!(REQUESTS_INFLIGHT).decrement(1.0);
    }
}

pub struct RelayService {
    router: Router,
}

impl RelayService {
    pub fn new(router: Router) -> Self {
        Self { router }
    }
}

impl Service<Request<Incoming>> for RelayService {
    type Response = Response<RelayBody>;
    type Error = RelayError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let router = self.router.clone();

        Box::pin(async move {
            let started = Instant::now();
            let method = req.method().clone();
            let path = req.uri().path().to_string();
            let operation = Operation::from_path(&path).map_or("unknown", |op| op.name());

            let inflight = InflightGuard::new();
            let response = router.route(req).await;
            drop(inflight);

            histogram!(
                REQUEST_DURATION,
                "operation" => operation,
                "status" => response.status().as_str().to_string()
            )
            .record(started.elapsed().as_secs_f64());
            tracing::debug!(%method, %path, status = %response.status(), "Handled request");

            Ok(response)
        })
    }
}
