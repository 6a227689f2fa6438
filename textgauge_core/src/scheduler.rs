use crate::text_diff::TextDiffEngine;
use serde::Serialize;
use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use textgauge_common::{ComputationFailure, DiffConfig, DiffResult, TextGaugeError};
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tracing::{debug, error, warn};

pub type RequestId = u64;

/// A unit of diff work that can run on a background worker
pub trait DiffComputation: Send + Sync + 'static {
    fn compute(&self, original: &str, modified: &str) -> DiffResult;
}

impl<F> DiffComputation for F
where
    F: Fn(&str, &str) -> DiffResult + Send + Sync + 'static,
{
    fn compute(&self, original: &str, modified: &str) -> DiffResult {
        self(original, modified)
    }
}

impl DiffComputation for TextDiffEngine {
    fn compute(&self, original: &str, modified: &str) -> DiffResult {
        self.compare(original, modified)
    }
}

/// Either the aligned rows or the failure that replaced them
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DiffOutcome {
    Completed(DiffResult),
    Failed { error: ComputationFailure },
}

impl DiffOutcome {
    pub fn into_result(self) -> Result<DiffResult, ComputationFailure> {
        match self {
            DiffOutcome::Completed(result) => Ok(result),
            DiffOutcome::Failed { error } => Err(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffResponse {
    pub request_id: RequestId,
    #[serde(flatten)]
    pub outcome: DiffOutcome,
}

impl DiffResponse {
    fn failed(request_id: RequestId, message: impl Into<String>) -> Self {
        Self {
            request_id,
            outcome: DiffOutcome::Failed {
                error: ComputationFailure::new(message),
            },
        }
    }
}

/// Pending result of one submitted comparison.
///
/// Await it from async code, or use [`DiffTicket::wait`] / [`DiffTicket::try_take`]
/// from a plain thread.
#[derive(Debug)]
pub struct DiffTicket {
    request_id: RequestId,
    submitted_at: Instant,
    indicator_delay: Duration,
    receiver: oneshot::Receiver<DiffResponse>,
}

impl DiffTicket {
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// True once the work has been pending longer than the indicator delay
    pub fn should_show_indicator(&self) -> bool {
        self.submitted_at.elapsed() >= self.indicator_delay
    }

    /// Non-blocking check; `None` while the worker is still running
    pub fn try_take(&mut self) -> Option<DiffResponse> {
        match self.receiver.try_recv() {
            Ok(response) => Some(response),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(self.worker_lost()),
        }
    }

    /// Block the current thread until the response arrives.
    ///
    /// Must not be called from inside an async runtime; await the ticket there.
    pub fn wait(self) -> DiffResponse {
        let request_id = self.request_id;
        self.receiver
            .blocking_recv()
            .unwrap_or_else(|_| DiffResponse::failed(request_id, WORKER_LOST))
    }

    fn worker_lost(&self) -> DiffResponse {
        DiffResponse::failed(self.request_id, WORKER_LOST)
    }
}

const WORKER_LOST: &str = "worker exited without a result";

impl Future for DiffTicket {
    type Output = DiffResponse;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(response)) => Poll::Ready(response),
            Poll::Ready(Err(_)) => Poll::Ready(self.worker_lost()),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Owned handle that runs comparisons off the caller's thread.
///
/// Every submission gets its own worker; nothing is queued behind earlier
/// work. Responses carry the request id so the caller can drop results that
/// were overtaken by a newer submission.
pub struct DiffScheduler<C: DiffComputation = TextDiffEngine> {
    computation: Arc<C>,
    generation: AtomicU64,
    indicator_delay: Duration,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl DiffScheduler<TextDiffEngine> {
    pub fn from_config(config: DiffConfig) -> Result<Self, TextGaugeError> {
        let delay = Duration::from_millis(config.indicator_delay_ms);
        let engine = TextDiffEngine::with_config(config)?;
        Ok(Self::new(engine).with_indicator_delay(delay))
    }
}

impl<C: DiffComputation> DiffScheduler<C> {
    pub fn new(computation: C) -> Self {
        Self {
            computation: Arc::new(computation),
            generation: AtomicU64::new(0),
            indicator_delay: Duration::from_millis(DiffConfig::default().indicator_delay_ms),
            workers: Mutex::new(Vec::new()),
        }
    }

    pub fn with_indicator_delay(mut self, delay: Duration) -> Self {
        self.indicator_delay = delay;
        self
    }

    pub fn indicator_delay(&self) -> Duration {
        self.indicator_delay
    }

    /// Start comparing two documents on a fresh worker thread
    pub fn submit(&self, original: impl Into<String>, modified: impl Into<String>) -> DiffTicket {
        let request_id = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let original = original.into();
        let modified = modified.into();
        let (sender, receiver) = oneshot::channel();
        let computation = Arc::clone(&self.computation);

        debug!(
            "Submitting diff request {} ({} vs {} bytes)",
            request_id,
            original.len(),
            modified.len()
        );

        let spawned = thread::Builder::new()
            .name(format!("textgauge-diff-{}", request_id))
            .spawn(move || {
                let started = Instant::now();
                let outcome = match panic::catch_unwind(AssertUnwindSafe(|| {
                    computation.compute(&original, &modified)
                })) {
                    Ok(result) => {
                        debug!(
                            "Diff request {} finished in {:?} ({})",
                            request_id,
                            started.elapsed(),
                            result.stats
                        );
                        DiffOutcome::Completed(result)
                    }
                    Err(payload) => {
                        let error = ComputationFailure::new(panic_message(payload.as_ref()));
                        warn!("Diff request {} failed: {}", request_id, error);
                        DiffOutcome::Failed { error }
                    }
                };

                if sender.send(DiffResponse { request_id, outcome }).is_err() {
                    debug!("Diff request {} was dropped before it finished", request_id);
                }
            });

        match spawned {
            Ok(handle) => {
                if let Ok(mut workers) = self.workers.lock() {
                    workers.retain(|worker| !worker.is_finished());
                    workers.push(handle);
                }
            }
            // The sender was dropped with the closure, so the ticket resolves
            // to a failure.
            Err(e) => error!("Failed to spawn diff worker for request {}: {}", request_id, e),
        }

        DiffTicket {
            request_id,
            submitted_at: Instant::now(),
            indicator_delay: self.indicator_delay,
            receiver,
        }
    }

    /// Id of the most recent submission, 0 before the first one
    pub fn latest_request_id(&self) -> RequestId {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_latest(&self, request_id: RequestId) -> bool {
        request_id == self.latest_request_id()
    }

    /// Keep a response only if no newer request has been submitted since
    pub fn accept(&self, response: DiffResponse) -> Option<DiffOutcome> {
        if !self.is_latest(response.request_id) {
            warn!(
                "Discarding stale diff response {} (latest is {})",
                response.request_id,
                self.latest_request_id()
            );
            return None;
        }
        Some(response.outcome)
    }

    /// Wait for every outstanding worker to finish
    pub fn shutdown(self) {
        let workers = match self.workers.into_inner() {
            Ok(workers) => workers,
            Err(poisoned) => poisoned.into_inner(),
        };

        for worker in workers {
            let name = worker.thread().name().unwrap_or("diff worker").to_string();
            if worker.join().is_err() {
                warn!("{} terminated abnormally", name);
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic in diff computation".to_string()
    }
}
