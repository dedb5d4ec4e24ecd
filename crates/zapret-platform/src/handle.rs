//! Thread-safe front end to the supervisor
//!
//! Lifecycle requests block for the settle and probe delays, so they run on a
//! worker thread. At most one request is in flight; a request arriving while
//! another runs is refused with [`RequestOutcome::Busy`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, error, warn};
use zapret_core::CommandPlan;

use crate::supervisor::{RunFlag, StatusSnapshot, Supervisor, SupervisorState};

/// Lifecycle request
#[derive(Debug, Clone)]
pub enum Request {
    /// Start the plan
    Start(CommandPlan),
    /// Stop then start the plan
    Restart(CommandPlan),
    /// Stop
    Stop,
}

impl Request {
    fn name(&self) -> &'static str {
        match self {
            Self::Start(_) => "start",
            Self::Restart(_) => "restart",
            Self::Stop => "stop",
        }
    }
}

/// Result of submitting a request
#[derive(Debug)]
pub enum RequestOutcome {
    /// Running on a worker thread
    Accepted(JoinHandle<()>),
    /// Another request is still in flight
    Busy,
}

impl RequestOutcome {
    /// Whether the request was accepted
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    /// Block until an accepted request completes
    pub fn wait(self) {
        if let Self::Accepted(handle) = self {
            if handle.join().is_err() {
                error!("Supervisor worker panicked");
            }
        }
    }
}

/// Cloneable handle shared between the UI loop and request sources
#[derive(Clone)]
pub struct SupervisorHandle {
    inner: Arc<Mutex<Supervisor>>,
    in_flight: Arc<AtomicBool>,
    status_rx: watch::Receiver<StatusSnapshot>,
    running: RunFlag,
}

impl SupervisorHandle {
    /// Wrap a supervisor
    pub fn new(supervisor: Supervisor) -> Self {
        let status_rx = supervisor.subscribe();
        let running = supervisor.run_flag();
        Self {
            inner: Arc::new(Mutex::new(supervisor)),
            in_flight: Arc::new(AtomicBool::new(false)),
            status_rx,
            running,
        }
    }

    /// Run a request on a worker thread unless one is already in flight
    pub fn submit(&self, request: Request) -> RequestOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Supervisor busy, {} request ignored", request.name());
            return RequestOutcome::Busy;
        }

        let inner = Arc::clone(&self.inner);
        let in_flight = Arc::clone(&self.in_flight);
        let name = request.name();
        let spawned = thread::Builder::new()
            .name(format!("zapret-{name}"))
            .spawn(move || {
                {
                    let mut supervisor = inner.lock();
                    // Failures are already logged and notified by the supervisor
                    let _ = match &request {
                        Request::Start(plan) => supervisor.start(plan),
                        Request::Restart(plan) => supervisor.restart(plan),
                        Request::Stop => {
                            supervisor.stop();
                            Ok(())
                        }
                    };
                }
                in_flight.store(false, Ordering::SeqCst);
            });

        match spawned {
            Ok(handle) => {
                debug!("Supervisor {} request accepted", name);
                RequestOutcome::Accepted(handle)
            }
            Err(e) => {
                error!("Failed to spawn supervisor worker: {}", e);
                self.in_flight.store(false, Ordering::SeqCst);
                RequestOutcome::Busy
            }
        }
    }

    /// Crash check; skipped while a request holds the supervisor
    pub fn poll(&self) -> Option<SupervisorState> {
        self.inner.try_lock().map(|mut supervisor| supervisor.poll())
    }

    /// Stop on the calling thread, waiting for any in-flight request first
    pub fn stop_blocking(&self) {
        self.inner.lock().stop();
    }

    /// Whether a request is in flight
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Status receiver
    pub fn subscribe(&self) -> watch::Receiver<StatusSnapshot> {
        self.status_rx.clone()
    }

    /// Current status
    pub fn snapshot(&self) -> StatusSnapshot {
        self.status_rx.borrow().clone()
    }

    /// Shared running flag
    pub fn run_flag(&self) -> RunFlag {
        self.running.clone()
    }
}
