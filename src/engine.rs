// src/engine.rs - Background execution boundary for duplicate detection runs
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

use crate::matching::batch::{BatchRunner, RunOutcome};
use crate::models::{EngineEvent, StartRequest};
use crate::utils::config::DetectionConfig;
use crate::utils::progress_bars::logging::{DetectionLogger, DetectionStage};

/// Invocation errors returned by [`DuplicateEngine::start`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StartError {
    /// The request lacks clients or advisors.
    #[error("start request must carry both clients and advisors")]
    MissingCollections,

    /// Another run is still in flight; it is left untouched.
    #[error("a detection run is already in progress (run ID: {run_id})")]
    Busy { run_id: Uuid },

    #[error("no Tokio runtime available to host the detection run")]
    NoRuntime,
}

/// State shared between the engine, the event stream and the worker.
struct RunShared {
    cancelled: AtomicBool,
    finished: AtomicBool,
    sender: Mutex<Option<UnboundedSender<EngineEvent>>>,
}

impl RunShared {
    fn new(sender: UnboundedSender<EngineEvent>) -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            sender: Mutex::new(Some(sender)),
        }
    }

    fn sender_slot(&self) -> MutexGuard<'_, Option<UnboundedSender<EngineEvent>>> {
        self.sender.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn is_in_flight(&self) -> bool {
        !self.finished.load(Ordering::SeqCst) && !self.is_cancelled()
    }

    /// Sends under the slot lock so nothing slips out after `cancel` returns.
    fn emit(&self, event: EngineEvent) -> bool {
        let slot = self.sender_slot();
        if self.is_cancelled() {
            return false;
        }
        match slot.as_ref() {
            Some(sender) => sender.send(event).is_ok(),
            None => false,
        }
    }

    /// Sends the terminal event and closes the channel.
    fn complete(&self, event: EngineEvent) {
        let mut slot = self.sender_slot();
        self.finished.store(true, Ordering::SeqCst);
        if let Some(sender) = slot.take() {
            if !self.is_cancelled() {
                let _ = sender.send(event);
            }
        }
    }

    fn cancel(&self) {
        let mut slot = self.sender_slot();
        self.cancelled.store(true, Ordering::SeqCst);
        slot.take();
    }
}

/// Receiving end of one run: progress events, then a single `Complete`.
pub struct RunEvents {
    run_id: Uuid,
    receiver: UnboundedReceiver<EngineEvent>,
    shared: Arc<RunShared>,
}

impl RunEvents {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Next event, or `None` once the run completed or was disposed.
    pub async fn recv(&mut self) -> Option<EngineEvent> {
        if self.shared.is_cancelled() {
            return None;
        }
        let event = self.receiver.recv().await;
        if self.shared.is_cancelled() {
            return None;
        }
        event
    }
}

struct ActiveRun {
    run_id: Uuid,
    shared: Arc<RunShared>,
}

/// Owns at most one detection run at a time.
///
/// Work happens on Tokio's blocking pool; the caller only ever awaits events.
/// Dropping the engine disposes any run still in flight.
pub struct DuplicateEngine {
    config: DetectionConfig,
    active: Option<ActiveRun>,
    logger: DetectionLogger,
}

impl DuplicateEngine {
    pub fn new(config: DetectionConfig) -> Self {
        Self {
            config,
            active: None,
            logger: DetectionLogger::new(DetectionStage::Engine),
        }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn is_busy(&self) -> bool {
        self.active
            .as_ref()
            .map_or(false, |run| run.shared.is_in_flight())
    }

    pub fn active_run_id(&self) -> Option<Uuid> {
        self.active
            .as_ref()
            .filter(|run| run.shared.is_in_flight())
            .map(|run| run.run_id)
    }

    /// Begins a run over `request`, moving the collections onto a blocking
    /// worker. Must be called from within a Tokio runtime.
    pub fn start(&mut self, request: StartRequest) -> Result<RunEvents, StartError> {
        if request.clients.is_empty() || request.advisors.is_empty() {
            self.logger
                .log_warning("Start ignored: clients and advisors are both required");
            return Err(StartError::MissingCollections);
        }
        if let Some(run_id) = self.active_run_id() {
            self.logger
                .log_warning(&format!("Start rejected: run {} still in progress", run_id));
            return Err(StartError::Busy { run_id });
        }
        let handle = Handle::try_current().map_err(|_| StartError::NoRuntime)?;

        let run_id = Uuid::new_v4();
        let (sender, receiver) = mpsc::unbounded_channel();
        let shared = Arc::new(RunShared::new(sender));

        self.logger
            .log_start(&run_id.to_string(), self.config.similarity_threshold);

        let config = self.config.clone();
        let worker_shared = Arc::clone(&shared);
        // Detached: cancellation goes through the shared flag, not the handle.
        let _worker = handle.spawn_blocking(move || {
            let runner = BatchRunner::new(&request.clients, &request.advisors, &config);
            let outcome = runner.run(
                |progress| {
                    worker_shared.emit(EngineEvent::Progress { progress });
                },
                || worker_shared.is_cancelled(),
            );
            match outcome {
                RunOutcome::Completed { groups, .. } => {
                    worker_shared.complete(EngineEvent::Complete { duplicates: groups });
                }
                RunOutcome::Cancelled { .. } => {
                    worker_shared.finished.store(true, Ordering::SeqCst);
                }
            }
        });

        self.active = Some(ActiveRun {
            run_id,
            shared: Arc::clone(&shared),
        });
        Ok(RunEvents {
            run_id,
            receiver,
            shared,
        })
    }

    /// Cancels the current run, if any. Safe to call repeatedly; once it
    /// returns no further event reaches the caller.
    pub fn dispose(&mut self) {
        if let Some(run) = self.active.take() {
            if run.shared.is_in_flight() {
                self.logger
                    .log_debug(&format!("Disposing run {}", run.run_id));
            }
            run.shared.cancel();
        }
    }
}

impl Default for DuplicateEngine {
    fn default() -> Self {
        Self::new(DetectionConfig::default())
    }
}

impl Drop for DuplicateEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}
