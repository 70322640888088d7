// crates/mockgate-dispatch/src/scheduler.rs
// ============================================================================
// Module: Dispatch Scheduler
// Description: Delayed, synchronous, and asynchronous execution of dispatch work.
// Purpose: Keep network threads unblocked while actions run on a bounded pool.
// Dependencies: mockgate-core, tokio
// ============================================================================

//! ## Overview
//! The [`Scheduler`] owns (or borrows) a tokio runtime. Units of work are
//! blocking closures: asynchronously they run on the runtime's blocking pool,
//! bounded by the configured thread count, after an optional timer delay;
//! synchronously they run on the calling thread after sleeping for the delay.
//! Invariants:
//! - A panicking unit of work never unwinds into the caller; it is reported as
//!   a warning event instead.
//! - Continuations registered with [`SchedulerHandle::on_completion`] run
//!   exactly once, with either the outcome or the timeout error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::panic::catch_unwind;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use mockgate_core::Delay;
use tokio::runtime::Builder;
use tokio::runtime::Handle;
use tokio::runtime::Runtime;

use crate::error::ForwardError;
use crate::error::SchedulerError;
use crate::forward_result::ResponseFuture;
use crate::forward_result::ResponseOutcome;
use crate::telemetry::ActionEvent;
use crate::telemetry::EventKind;
use crate::telemetry::EventLevel;
use crate::telemetry::EventSink;

// ============================================================================
// SECTION: Scheduler
// ============================================================================

/// Owner of the runtime used for dispatch work.
///
/// # Invariants
/// - An owned runtime is shut down in the background when the scheduler drops.
pub struct Scheduler {
    /// Runtime owned by this scheduler, if any.
    runtime: Option<Runtime>,
    /// Cloneable handle used to submit work.
    handle: SchedulerHandle,
}

impl Scheduler {
    /// Starts a dedicated multi-threaded runtime with `thread_count` workers.
    ///
    /// The blocking pool that runs dispatch work is capped at `thread_count` threads.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError`] when `thread_count` is zero or the runtime fails to start.
    pub fn new(thread_count: usize, sink: Arc<dyn EventSink>) -> Result<Self, SchedulerError> {
        if thread_count == 0 {
            return Err(SchedulerError::NoWorkers);
        }
        let runtime = Builder::new_multi_thread()
            .worker_threads(thread_count)
            .max_blocking_threads(thread_count)
            .thread_name("mockgate-action")
            .enable_all()
            .build()
            .map_err(|err| SchedulerError::Runtime(err.to_string()))?;
        let handle = SchedulerHandle {
            runtime: runtime.handle().clone(),
            sink,
        };
        Ok(Self {
            runtime: Some(runtime),
            handle,
        })
    }

    /// Wraps an existing runtime handle without owning the runtime.
    #[must_use]
    pub fn from_handle(runtime: Handle, sink: Arc<dyn EventSink>) -> Self {
        Self {
            runtime: None,
            handle: SchedulerHandle {
                runtime,
                sink,
            },
        }
    }

    /// Returns a cloneable handle for submitting work.
    #[must_use]
    pub const fn handle(&self) -> &SchedulerHandle {
        &self.handle
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

// ============================================================================
// SECTION: Scheduler Handle
// ============================================================================

/// Cloneable submission handle shared by dispatcher components.
#[derive(Clone)]
pub struct SchedulerHandle {
    /// Runtime that runs timers, network I/O, and blocking work.
    runtime: Handle,
    /// Sink receiving panic reports.
    sink: Arc<dyn EventSink>,
}

impl SchedulerHandle {
    /// Returns the tokio runtime handle.
    #[must_use]
    pub const fn runtime(&self) -> &Handle {
        &self.runtime
    }

    /// Runs `work` now, on the calling thread or the blocking pool.
    pub fn submit<F>(&self, work: F, synchronous: bool)
    where
        F: FnOnce() + Send + 'static,
    {
        self.schedule(work, synchronous, None);
    }

    /// Runs `work` after `delay`, on the calling thread or the blocking pool.
    pub fn schedule<F>(&self, work: F, synchronous: bool, delay: Option<Delay>)
    where
        F: FnOnce() + Send + 'static,
    {
        let delay = delay.filter(|delay| !delay.is_zero()).map(Delay::to_duration);
        if synchronous {
            if let Some(duration) = delay {
                std::thread::sleep(duration);
            }
            run_guarded(self.sink.as_ref(), work);
            return;
        }
        let sink = Arc::clone(&self.sink);
        match delay {
            None => {
                drop(self.runtime.spawn_blocking(move || run_guarded(sink.as_ref(), work)));
            }
            Some(duration) => {
                let runtime = self.runtime.clone();
                drop(self.runtime.spawn(async move {
                    tokio::time::sleep(duration).await;
                    drop(runtime.spawn_blocking(move || run_guarded(sink.as_ref(), work)));
                }));
            }
        }
    }

    /// Runs `continuation` once `future` resolves or `max_wait` elapses.
    ///
    /// Synchronously, the calling thread blocks until the continuation has run.
    pub fn on_completion<F>(
        &self,
        future: ResponseFuture,
        max_wait: Duration,
        continuation: F,
        synchronous: bool,
    ) where
        F: FnOnce(ResponseOutcome) + Send + 'static,
    {
        if synchronous {
            let outcome = match future.into_ready() {
                Ok(outcome) => outcome,
                Err(pending) => self.wait_blocking(pending, max_wait),
            };
            run_guarded(self.sink.as_ref(), move || continuation(outcome));
            return;
        }
        let sink = Arc::clone(&self.sink);
        let runtime = self.runtime.clone();
        drop(self.runtime.spawn(async move {
            let outcome = future.wait(max_wait).await;
            drop(runtime.spawn_blocking(move || run_guarded(sink.as_ref(), move || continuation(outcome))));
        }));
    }

    /// Spawns an async task on the runtime.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        drop(self.runtime.spawn(task));
    }

    /// Blocks the calling thread until a pending future resolves.
    fn wait_blocking(&self, future: ResponseFuture, max_wait: Duration) -> ResponseOutcome {
        let (sender, receiver) = mpsc::channel();
        drop(self.runtime.spawn(async move {
            let _ = sender.send(future.wait(max_wait).await);
        }));
        receiver.recv().unwrap_or_else(|_| {
            Err(ForwardError::SenderUnavailable("scheduler runtime shut down".to_string()))
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Runs `work`, converting a panic into a warning event.
fn run_guarded<F: FnOnce()>(sink: &dyn EventSink, work: F) {
    if let Err(payload) = catch_unwind(AssertUnwindSafe(work)) {
        sink.record(
            &ActionEvent::new(EventKind::Warn, EventLevel::Warn, "exception running scheduled action")
                .with_error(panic_message(payload.as_ref())),
        );
    }
}

/// Returns the message carried by a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
