use std::{sync::Arc, time::Duration};

use futures::future::join_all;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use crate::domain::recognition::{
    entities::{BackendId, BackendOutput, BackendStatus, ImageInput},
    ports::Recognizer,
};

/// Runs every registered backend concurrently against the same image.
///
/// Each backend gets its own task and its own timeout. A backend that errors, panics or
/// times out contributes an empty candidate list and a non-`Ok` status; the others are
/// unaffected.
#[derive(Clone)]
pub struct RecognitionBackendPool {
    backends: Vec<Arc<dyn Recognizer>>,
    timeout: Duration,
}

impl RecognitionBackendPool {
    pub fn new(timeout: Duration) -> Self {
        Self {
            backends: Vec::new(),
            timeout,
        }
    }

    pub fn register(&mut self, backend: Arc<dyn Recognizer>) {
        debug!(backend = %backend.id(), "registering recognition backend");
        self.backends.push(backend);
    }

    pub fn with_backend(mut self, backend: Arc<dyn Recognizer>) -> Self {
        self.register(backend);
        self
    }

    pub fn backend_ids(&self) -> Vec<BackendId> {
        self.backends.iter().map(|b| b.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// One output per registered backend, in registration order.
    #[instrument(skip(self, image), fields(image_digest = %image.digest, backends = self.backends.len()))]
    pub async fn recognize(&self, image: Arc<ImageInput>) -> Vec<BackendOutput> {
        let runs = self.backends.iter().map(|backend| {
            let backend = Arc::clone(backend);
            let image = Arc::clone(&image);
            let limit = self.timeout;

            async move {
                let id = backend.id();
                let started = Instant::now();

                let handle = tokio::spawn(async move { backend.recognize(&image).await });
                let abort = handle.abort_handle();

                let (status, candidates) = match tokio::time::timeout(limit, handle).await {
                    Ok(Ok(Ok(candidates))) => (BackendStatus::Ok, candidates),
                    Ok(Ok(Err(e))) => (
                        BackendStatus::Failed {
                            reason: e.to_string(),
                        },
                        Vec::new(),
                    ),
                    Ok(Err(join_error)) => (
                        BackendStatus::Failed {
                            reason: format!("backend task aborted: {}", join_error),
                        },
                        Vec::new(),
                    ),
                    Err(_) => {
                        abort.abort();
                        (BackendStatus::TimedOut, Vec::new())
                    }
                };

                let elapsed_ms = started.elapsed().as_millis() as u64;
                match &status {
                    BackendStatus::Ok => {
                        debug!(backend = %id, candidates = candidates.len(), elapsed_ms, "backend finished")
                    }
                    BackendStatus::Failed { reason } => {
                        warn!(backend = %id, reason = %reason, elapsed_ms, "backend failed")
                    }
                    BackendStatus::TimedOut => {
                        warn!(backend = %id, elapsed_ms, "backend timed out")
                    }
                }

                BackendOutput {
                    backend: id,
                    status,
                    candidates,
                    elapsed_ms,
                }
            }
        });

        join_all(runs).await
    }
}
