//! ThreadSim Core - Priority-Scheduling Thread Simulator
//!
//! Simulates priority-based CPU scheduling over a registry of logical
//! threads: lifecycle tracking, priority-weighted CPU shares, and a
//! tick-driven execution loop with completion detection. The threads
//! are simulation records, not OS threads.
//!
//! # Architecture
//!
//! - **Registry**: the single mutual-exclusion store of all threads;
//!   every structural mutation goes through it.
//! - **Scheduling policy**: pure computation over registry snapshots —
//!   CPU-share math and next-thread selection behind a swappable trait.
//! - **Driver**: advances simulated time one quantum per tick, applying
//!   policy results back to the registry and completing threads whose
//!   execution reaches their burst time.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use threadsim_core::prelude::*;
//!
//! let registry = Arc::new(ThreadRegistry::new());
//! registry.create(ThreadSpec {
//!     name: Some("worker".into()),
//!     priority: ThreadPriority::High,
//!     ..Default::default()
//! });
//!
//! let driver = SimulationDriver::new(registry.clone());
//! driver.run_loop(5);
//!
//! for thread in registry.list() {
//!     println!("{}: {} ({:.1}%)", thread.name, thread.state, thread.progress_percent());
//! }
//! ```

pub mod driver;
pub mod export;
pub mod registry;
pub mod scheduler;
pub mod thread;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::driver::SimulationDriver;
    pub use crate::registry::{SystemStats, ThreadRegistry};
    pub use crate::scheduler::{PriorityScheduling, SchedulingPolicy};
    pub use crate::thread::{SimThread, ThreadPriority, ThreadSpec, ThreadState};
}
