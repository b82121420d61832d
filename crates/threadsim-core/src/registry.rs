//! Thread registry: the single mutual-exclusion store for all simulated
//! threads.
//!
//! Every structural mutation goes through this type, and each operation
//! takes the one internal lock, so concurrent callers always observe a
//! consistent collection. Queries hand out cloned snapshots — internal
//! references never escape the lock.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::thread::{SimThread, ThreadPriority, ThreadSpec, ThreadState};

/// Random burst-time draw for threads created without one, in ms.
const BURST_RANGE_MS: std::ops::RangeInclusive<u64> = 10_000..=30_000;

/// Aggregate view over the whole registry, computed by a full scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemStats {
    pub total: usize,
    pub running: usize,
    pub paused: usize,
    pub stopped: usize,
    pub waiting: usize,
    pub completed: usize,
    /// Sum of `cpu_usage` over running threads only.
    pub total_cpu: f64,
    /// Sum of `memory_mb` over all threads.
    pub total_memory_mb: f64,
}

pub(crate) struct RegistryInner {
    pub(crate) threads: Vec<SimThread>,
    next_id: u64,
    rng: StdRng,
}

/// Authoritative store of all simulated threads.
pub struct ThreadRegistry {
    inner: Mutex<RegistryInner>,
}

impl ThreadRegistry {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic registry for tests and reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                threads: Vec::new(),
                next_id: 1,
                rng,
            }),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        // A poisoning panic cannot leave the collection half-mutated;
        // every write below is a single field store or push/remove.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a thread and return its id. Never fails: a missing name
    /// becomes `Thread-{id}` and a missing or zero burst time falls
    /// back to a random draw.
    pub fn create(&self, spec: ThreadSpec) -> u64 {
        let mut inner = self.lock();
        let id = inner.next_id;
        inner.next_id += 1;

        let name = spec.name.unwrap_or_else(|| format!("Thread-{}", id));
        let burst_ms = match spec.burst_ms {
            Some(ms) if ms > 0 => ms,
            _ => inner.rng.gen_range(BURST_RANGE_MS),
        };

        let thread = SimThread::new(id, name, spec.priority, burst_ms, spec.parent_id, &mut inner.rng);
        log::info!(
            "created thread '{}' (id {}, priority {}, burst {} ms)",
            thread.name,
            id,
            thread.priority,
            burst_ms
        );
        inner.threads.push(thread);
        id
    }

    /// Remove a thread. Returns whether it was found. Threads that
    /// reference the removed id as `parent_id` are left untouched.
    pub fn delete(&self, id: u64) -> bool {
        let mut inner = self.lock();
        match inner.threads.iter().position(|t| t.id == id) {
            Some(idx) => {
                let removed = inner.threads.remove(idx);
                log::info!("deleted thread '{}' (id {})", removed.name, id);
                true
            }
            None => false,
        }
    }

    /// Overwrite a thread's state. No transition table is enforced —
    /// any state is reachable from any state, including resuming a
    /// stopped thread. Entering `Stopped` or `Completed` zeroes the
    /// CPU usage.
    pub fn set_state(&self, id: u64, state: ThreadState) -> bool {
        let mut inner = self.lock();
        match inner.threads.iter_mut().find(|t| t.id == id) {
            Some(thread) => {
                let old = thread.state;
                thread.state = state;
                if matches!(state, ThreadState::Stopped | ThreadState::Completed) {
                    thread.cpu_usage = 0.0;
                }
                log::info!("thread '{}' state {} -> {}", thread.name, old, state);
                true
            }
            None => false,
        }
    }

    pub fn pause(&self, id: u64) -> bool {
        self.set_state(id, ThreadState::Paused)
    }

    pub fn resume(&self, id: u64) -> bool {
        self.set_state(id, ThreadState::Running)
    }

    pub fn stop(&self, id: u64) -> bool {
        self.set_state(id, ThreadState::Stopped)
    }

    pub fn set_priority(&self, id: u64, priority: ThreadPriority) -> bool {
        let mut inner = self.lock();
        match inner.threads.iter_mut().find(|t| t.id == id) {
            Some(thread) => {
                let old = thread.priority;
                thread.priority = priority;
                log::info!("thread '{}' priority {} -> {}", thread.name, old, priority);
                true
            }
            None => false,
        }
    }

    /// Pause every running thread. Other states are untouched.
    pub fn pause_all(&self) {
        let mut inner = self.lock();
        let mut affected = 0;
        for thread in inner.threads.iter_mut() {
            if thread.state == ThreadState::Running {
                thread.state = ThreadState::Paused;
                affected += 1;
            }
        }
        log::info!("paused {} running threads", affected);
    }

    /// Resume every paused thread. Other states are untouched.
    pub fn resume_all(&self) {
        let mut inner = self.lock();
        let mut affected = 0;
        for thread in inner.threads.iter_mut() {
            if thread.state == ThreadState::Paused {
                thread.state = ThreadState::Running;
                affected += 1;
            }
        }
        log::info!("resumed {} paused threads", affected);
    }

    /// Stop everything that has not already completed, zeroing CPU usage.
    pub fn stop_all(&self) {
        let mut inner = self.lock();
        let mut affected = 0;
        for thread in inner.threads.iter_mut() {
            if thread.state != ThreadState::Completed {
                thread.state = ThreadState::Stopped;
                thread.cpu_usage = 0.0;
                affected += 1;
            }
        }
        log::info!("stopped {} threads", affected);
    }

    /// Snapshot of all threads in insertion order.
    pub fn list(&self) -> Vec<SimThread> {
        self.lock().threads.clone()
    }

    /// Aggregate stats over the whole registry.
    pub fn stats(&self) -> SystemStats {
        let inner = self.lock();
        let mut stats = SystemStats::default();
        stats.total = inner.threads.len();
        for thread in &inner.threads {
            match thread.state {
                ThreadState::Running => {
                    stats.running += 1;
                    stats.total_cpu += thread.cpu_usage;
                }
                ThreadState::Paused => stats.paused += 1,
                ThreadState::Stopped => stats.stopped += 1,
                ThreadState::Waiting => stats.waiting += 1,
                ThreadState::Completed => stats.completed += 1,
            }
            stats.total_memory_mb += thread.memory_mb;
        }
        stats
    }

    pub fn len(&self) -> usize {
        self.lock().threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().threads.is_empty()
    }
}

impl Default for ThreadRegistry {
    fn default() -> Self {
        Self::new()
    }
}
