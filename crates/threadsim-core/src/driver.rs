//! Simulation driver: tick advancement and the paced run loop.
//!
//! A tick recomputes CPU shares for every running thread, accrues one
//! quantum of execution time, and completes threads that reach their
//! burst time. The whole tick runs under a single registry lock
//! acquisition; the inter-tick sleep holds no lock, so display and
//! export readers can interleave between ticks.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::registry::ThreadRegistry;
use crate::scheduler::{PriorityScheduling, SchedulingPolicy};
use crate::thread::{SimThread, ThreadState};

/// Default simulated time advanced per tick.
pub const DEFAULT_QUANTUM: Duration = Duration::from_millis(1000);

/// Drives the registry forward one quantum at a time.
pub struct SimulationDriver {
    registry: Arc<ThreadRegistry>,
    policy: Box<dyn SchedulingPolicy>,
    quantum: Duration,
    /// Real-time delay between loop iterations. `None` runs headless.
    pace: Option<Duration>,
    running: AtomicBool,
    rng: Mutex<StdRng>,
}

impl SimulationDriver {
    pub fn new(registry: Arc<ThreadRegistry>) -> Self {
        Self::with_rng(registry, StdRng::from_entropy())
    }

    /// Deterministic driver for tests and reproducible runs.
    pub fn seeded(registry: Arc<ThreadRegistry>, seed: u64) -> Self {
        Self::with_rng(registry, StdRng::seed_from_u64(seed))
    }

    fn with_rng(registry: Arc<ThreadRegistry>, rng: StdRng) -> Self {
        Self {
            registry,
            policy: Box::new(PriorityScheduling),
            quantum: DEFAULT_QUANTUM,
            pace: Some(DEFAULT_QUANTUM),
            running: AtomicBool::new(false),
            rng: Mutex::new(rng),
        }
    }

    pub fn set_policy(&mut self, policy: Box<dyn SchedulingPolicy>) {
        self.policy = policy;
    }

    pub fn policy(&self) -> &dyn SchedulingPolicy {
        self.policy.as_ref()
    }

    pub fn set_quantum(&mut self, quantum: Duration) {
        self.quantum = quantum;
    }

    pub fn quantum(&self) -> Duration {
        self.quantum
    }

    pub fn set_pace(&mut self, pace: Option<Duration>) {
        self.pace = pace;
    }

    /// Advance the simulation by one quantum. For every running thread:
    /// recompute the CPU share, accrue execution time, and on reaching
    /// the burst time transition to `Completed` with zero CPU usage and
    /// execution clamped to the burst.
    pub fn tick(&self) {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let mut inner = self.registry.lock();
        let snapshot = inner.threads.clone();
        let quantum_ms = self.quantum.as_millis() as u64;

        for thread in inner.threads.iter_mut() {
            if thread.state != ThreadState::Running {
                continue;
            }
            thread.cpu_usage = self.policy.compute_share(thread, &snapshot, &mut *rng);
            thread.execution_ms += quantum_ms;
            if thread.execution_ms >= thread.burst_ms {
                thread.execution_ms = thread.burst_ms;
                thread.state = ThreadState::Completed;
                thread.cpu_usage = 0.0;
                log::info!(
                    "thread '{}' (id {}) completed after {} ms",
                    thread.name,
                    thread.id,
                    thread.burst_ms
                );
            }
        }
    }

    /// Run up to `iterations` ticks, sleeping the configured pace
    /// between them. The running flag is checked before each tick, so
    /// [`stop`](Self::stop) cancels between iterations — a tick in
    /// progress always finishes.
    pub fn run_loop(&self, iterations: usize) {
        self.running.store(true, Ordering::SeqCst);
        log::info!("simulation loop started ({} iterations)", iterations);

        for _ in 0..iterations {
            if !self.running.load(Ordering::SeqCst) {
                break;
            }
            self.tick();
            if let Some(pace) = self.pace {
                std::thread::sleep(pace);
            }
        }

        self.running.store(false, Ordering::SeqCst);
        log::info!("simulation loop stopped");
    }

    /// Prevent the next tick from starting. Has no effect on a tick
    /// already in progress.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// The policy's pick for the next thread to run, over a fresh
    /// snapshot. For display collaborators.
    pub fn next_thread(&self) -> Option<SimThread> {
        let threads = self.registry.list();
        self.policy.select_next(&threads).cloned()
    }
}
