//! Fan-out of write requests to every configured backend.
//!
//! One task is spawned per backend, all carrying the same body and
//! User-Agent. Outcomes are collected in completion order:
//!
//! - the primary's outcome is captured and returned as soon as it arrives
//! - secondary outcomes are released on arrival, failures included
//!
//! The task group is owned by a background collector from the moment it is
//! spawned. The caller only waits for the primary's outcome, so it is never
//! held up by a slow secondary, and a caller that goes away does not cancel
//! calls already dispatched. There is no cancellation: the per-call timeout
//! bounds how long a call can run.

use crate::client::{CallOutcome, RelayClient};
use crate::errors::RelayError;
use crate::metrics_defs::SECONDARY_FAILURES;
use crate::operation::Operation;
use crate::registry::{Backend, Backends};
use hyper::body::Bytes;
use hyper::header::HeaderValue;
use serde::de::IgnoredAny;
use shared::counter;
use std::collections::HashMap;
use tokio::sync::oneshot;
use tokio::task::{Id, JoinError, JoinSet};

/// Result from a single backend task
struct BackendTaskResult {
    backend: Backend,
    outcome: CallOutcome,
}

/// Per-request task group.
///
/// Task ids are kept so a panicked task can still be attributed to its
/// backend.
struct SpawnedTasks {
    join_set: JoinSet<BackendTaskResult>,
    task_backends: HashMap<Id, Backend>,
}

pub struct FanOut {
    backends: Backends,
    client: RelayClient,
    report_secondary_failures: bool,
}

impl FanOut {
    pub fn new(backends: Backends, client: RelayClient, report_secondary_failures: bool) -> Self {
        Self {
            backends,
            client,
            report_secondary_failures,
        }
    }

    /// Mirrors a write to every backend and returns the primary's outcome.
    ///
    /// A body that is not well-formed JSON is rejected before any backend
    /// is contacted.
    pub async fn dispatch(
        &self,
        operation: Operation,
        body: Bytes,
        user_agent: Option<HeaderValue>,
    ) -> CallOutcome {
        serde_json::from_slice::<IgnoredAny>(&body)?;

        let tasks = self.spawn_backend_tasks(operation, body, user_agent);
        await_primary(tasks, self.report_secondary_failures).await
    }

    fn spawn_backend_tasks(
        &self,
        operation: Operation,
        body: Bytes,
        user_agent: Option<HeaderValue>,
    ) -> SpawnedTasks {
        let mut join_set = JoinSet::new();
        let mut task_backends = HashMap::new();

        for backend in self.backends.iter() {
            let client = self.client.clone();
            let body = body.clone();
            let user_agent = user_agent.clone();
            let task_backend = backend.clone();

            let abort_handle = join_set.spawn(async move {
                let outcome = client
                    .send(&task_backend, operation, body, user_agent.as_ref())
                    .await;
                BackendTaskResult {
                    backend: task_backend,
                    outcome,
                }
            });

            task_backends.insert(abort_handle.id(), backend.clone());
        }

        SpawnedTasks {
            join_set,
            task_backends,
        }
    }
}

/// Hands the task group to a background collector and waits for the primary's outcome.
///
/// The collector owns every backend task, so dropping this future only
/// drops the receiving end: calls already dispatched keep running. Fails
/// with [`RelayError::PrimaryUnavailable`] if every task finished without
/// a primary outcome, so a registry without a primary cannot hang a request.
async fn await_primary(tasks: SpawnedTasks, report_secondary_failures: bool) -> CallOutcome {
    let (primary_tx, primary_rx) = oneshot::channel();
    tokio::spawn(collect_outcomes(tasks, primary_tx, report_secondary_failures));

    primary_rx.await.unwrap_or(Err(RelayError::PrimaryUnavailable))
}

/// Joins every task. The primary's outcome is sent back as soon as it
/// arrives; secondary outcomes are released on arrival.
async fn collect_outcomes(
    mut tasks: SpawnedTasks,
    primary_tx: oneshot::Sender<CallOutcome>,
    report_secondary_failures: bool,
) {
    let mut primary_tx = Some(primary_tx);

    while let Some(join_result) = tasks.join_set.join_next_with_id().await {
        let Some((backend, outcome)) = resolve_task(join_result, &mut tasks.task_backends) else {
            continue;
        };

        if backend.is_primary
            && let Some(tx) = primary_tx.take()
        {
            if tx.send(outcome).is_err() {
                tracing::debug!(
                    backend = %backend.name,
                    "Caller went away before the primary answered"
                );
            }
            if !tasks.join_set.is_empty() {
                tracing::debug!(
                    pending = tasks.join_set.len(),
                    "Primary answered, leaving secondaries to finish in the background"
                );
            }
            continue;
        }
        discard_secondary(&backend, outcome, report_secondary_failures);
    }

    if let Some(tx) = primary_tx {
        let _ = tx.send(Err(RelayError::PrimaryUnavailable));
    }
}

/// Pairs a finished task with its backend; a panicked task becomes a failed outcome.
fn resolve_task(
    join_result: Result<(Id, BackendTaskResult), JoinError>,
    task_backends: &mut HashMap<Id, Backend>,
) -> Option<(Backend, CallOutcome)> {
    match join_result {
        Ok((id, result)) => {
            task_backends.remove(&id);
            Some((result.backend, result.outcome))
        }
        Err(e) => {
            let backend = task_backends.remove(&e.id());
            tracing::error!(
                backend = ?backend.as_ref().map(|b| &b.name),
                "Backend task failed: {}",
                e
            );
            backend.map(|backend| (backend, Err(RelayError::TaskFailed(e))))
        }
    }
}

/// Releases a secondary outcome. Its body is dropped unread.
fn discard_secondary(backend: &Backend, outcome: CallOutcome, report_secondary_failures: bool) {
    let failure = match outcome {
        Ok(response)
            if response.status().is_client_error() || response.status().is_server_error() =>
        {
            format!("status {}", response.status())
        }
        Ok(response) => {
            tracing::debug!(
                backend = %backend.name,
                status = %response.status(),
                "Discarding secondary response"
            );
            return;
        }
        Err(e) => e.to_string(),
    };

    counter!(SECONDARY_FAILURES, "backend" => backend.name.clone()).increment(1);
    if report_secondary_failures {
        tracing::warn!(backend = %backend.name, error = %failure, "Secondary backend failed");
    } else {
        tracing::debug!(backend = %backend.name, error = %failure, "Secondary backend failed");
    }
}
