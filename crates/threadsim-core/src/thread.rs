//! Thread model types: state, priority, and the simulated thread record.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

/// Lifecycle state of a simulated thread.
///
/// `Waiting` currently has no producer in the engine — it is reserved
/// for blocking-I/O simulation and must remain a valid state value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThreadState {
    Running,
    Paused,
    Stopped,
    Waiting,
    Completed,
}

impl ThreadState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Paused => "PAUSED",
            Self::Stopped => "STOPPED",
            Self::Waiting => "WAITING",
            Self::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for ThreadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThreadState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RUNNING" => Ok(Self::Running),
            "PAUSED" => Ok(Self::Paused),
            "STOPPED" => Ok(Self::Stopped),
            "WAITING" => Ok(Self::Waiting),
            "COMPLETED" => Ok(Self::Completed),
            other => Err(format!("unknown thread state '{}'", other)),
        }
    }
}

/// Scheduling priority. Ordering follows urgency: `Low < Medium < High < Critical`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ThreadPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl ThreadPriority {
    /// Fixed weight used by the proportional-share computation.
    pub fn weight(self) -> u32 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Critical => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for ThreadPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThreadPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            "CRITICAL" => Ok(Self::Critical),
            other => Err(format!("unknown thread priority '{}'", other)),
        }
    }
}

/// Memory footprint draw at creation, in MB.
const MEMORY_RANGE_MB: std::ops::RangeInclusive<f64> = 50.0..=200.0;

/// A simulated thread record. Not an OS thread — a registry entry the
/// scheduler assigns simulated CPU share to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimThread {
    /// Unique, monotonically assigned. Never reused within a process.
    pub id: u64,
    /// Display label, not required to be unique.
    pub name: String,
    pub state: ThreadState,
    pub priority: ThreadPriority,
    /// Derived percentage, recomputed each tick while `Running`, zero otherwise.
    pub cpu_usage: f64,
    /// Fixed after creation.
    pub memory_mb: f64,
    /// Informational only.
    pub created_at: SystemTime,
    /// Cumulative simulated time consumed, in milliseconds.
    pub execution_ms: u64,
    /// Total simulated time required to complete, in milliseconds. Always > 0.
    pub burst_ms: u64,
    /// Back-reference to a creating thread. Relation only, no ownership.
    pub parent_id: Option<u64>,
}

impl SimThread {
    /// Build a fresh record in the `Running` state with a random memory draw.
    pub fn new(
        id: u64,
        name: String,
        priority: ThreadPriority,
        burst_ms: u64,
        parent_id: Option<u64>,
        rng: &mut impl rand::Rng,
    ) -> Self {
        Self {
            id,
            name,
            state: ThreadState::Running,
            priority,
            cpu_usage: 0.0,
            memory_mb: rng.gen_range(MEMORY_RANGE_MB),
            created_at: SystemTime::now(),
            execution_ms: 0,
            burst_ms,
            parent_id,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == ThreadState::Running
    }

    /// Completion progress in percent. `execution_ms` is clamped to
    /// `burst_ms` on completion, so this stays within [0, 100].
    pub fn progress_percent(&self) -> f64 {
        self.execution_ms as f64 / self.burst_ms as f64 * 100.0
    }
}

/// Creation parameters for [`SimThread`]. Unset fields fall back to
/// defaults or random draws at creation time.
#[derive(Debug, Clone, Default)]
pub struct ThreadSpec {
    /// Defaults to `Thread-{id}`.
    pub name: Option<String>,
    pub priority: ThreadPriority,
    /// `None` or `Some(0)` fall back to a random draw in [10000, 30000] ms.
    pub burst_ms: Option<u64>,
    pub parent_id: Option<u64>,
}
