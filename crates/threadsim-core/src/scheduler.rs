//! Scheduling policies: CPU-share computation and next-thread selection.
//!
//! Policies are pure with respect to storage — they read a snapshot of
//! the registry and return values; the simulation driver applies the
//! results. The trait is object-safe so alternative algorithms (plain
//! round-robin, multilevel feedback) can be swapped in without touching
//! the registry.

use rand::{Rng, RngCore};

use crate::thread::{SimThread, ThreadState};

/// Bound of the uniform perturbation added to each CPU share, in
/// percentage points. Models measurement noise.
pub const SHARE_JITTER: f64 = 5.0;

/// A pluggable scheduling algorithm.
pub trait SchedulingPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// CPU share in [0, 100] for `thread` given the full snapshot.
    /// Zero for anything not running, and zero when no runnable weight
    /// exists at all.
    fn compute_share(&self, thread: &SimThread, all: &[SimThread], rng: &mut dyn RngCore) -> f64;

    /// The thread that would run next, or `None` if nothing is runnable.
    fn select_next<'a>(&self, all: &'a [SimThread]) -> Option<&'a SimThread>;
}

/// Weighted proportional-share scheduling over the fixed priority
/// weights (LOW=1x .. CRITICAL=4x).
///
/// Shares are perturbed independently per thread, so across all running
/// threads they do not generally sum to exactly 100. That is an
/// accepted approximation; callers needing exact normalization must
/// post-process.
#[derive(Debug, Default, Clone, Copy)]
pub struct PriorityScheduling;

impl PriorityScheduling {
    /// Unperturbed proportional share: `100 * weight / total running weight`.
    pub fn base_share(&self, thread: &SimThread, all: &[SimThread]) -> f64 {
        if thread.state != ThreadState::Running {
            return 0.0;
        }
        let total_weight: u32 = all
            .iter()
            .filter(|t| t.state == ThreadState::Running)
            .map(|t| t.priority.weight())
            .sum();
        if total_weight == 0 {
            return 0.0;
        }
        f64::from(thread.priority.weight()) / f64::from(total_weight) * 100.0
    }
}

impl SchedulingPolicy for PriorityScheduling {
    fn name(&self) -> &'static str {
        "Priority Scheduling"
    }

    fn description(&self) -> &'static str {
        "Higher priority threads receive more CPU time. \
         Critical=4x, High=3x, Medium=2x, Low=1x time slices."
    }

    fn compute_share(&self, thread: &SimThread, all: &[SimThread], rng: &mut dyn RngCore) -> f64 {
        let base = self.base_share(thread, all);
        if base == 0.0 {
            return 0.0;
        }
        let jitter = rng.gen_range(-SHARE_JITTER..=SHARE_JITTER);
        (base + jitter).clamp(0.0, 100.0)
    }

    fn select_next<'a>(&self, all: &'a [SimThread]) -> Option<&'a SimThread> {
        let mut runnable: Vec<&SimThread> = all
            .iter()
            .filter(|t| t.state == ThreadState::Running)
            .collect();
        // Priority first, then least execution time so far — approximates
        // round-robin fairness within a priority band. Stable sort keeps
        // insertion order for full ties.
        runnable.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(a.execution_ms.cmp(&b.execution_ms))
        });
        runnable.first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thread::ThreadPriority;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn thread(id: u64, priority: ThreadPriority, state: ThreadState, execution_ms: u64) -> SimThread {
        let mut rng = StdRng::seed_from_u64(id);
        let mut t = SimThread::new(id, format!("t{}", id), priority, 20_000, None, &mut rng);
        t.state = state;
        t.execution_ms = execution_ms;
        t
    }

    #[test]
    fn test_share_zero_for_non_running() {
        let policy = PriorityScheduling;
        let mut rng = StdRng::seed_from_u64(0);
        let all = vec![
            thread(1, ThreadPriority::High, ThreadState::Paused, 0),
            thread(2, ThreadPriority::Low, ThreadState::Running, 0),
        ];
        assert_eq!(policy.compute_share(&all[0], &all, &mut rng), 0.0);
    }

    #[test]
    fn test_share_zero_when_nothing_runs() {
        let policy = PriorityScheduling;
        let mut rng = StdRng::seed_from_u64(0);
        let all = vec![
            thread(1, ThreadPriority::High, ThreadState::Stopped, 0),
            thread(2, ThreadPriority::Low, ThreadState::Completed, 0),
        ];
        for t in &all {
            assert_eq!(policy.compute_share(t, &all, &mut rng), 0.0);
        }
        assert_eq!(policy.base_share(&all[0], &all), 0.0);
    }

    #[test]
    fn test_share_always_within_bounds() {
        let policy = PriorityScheduling;
        let mut rng = StdRng::seed_from_u64(42);
        // A lone critical thread has base 100; a low one among many has
        // a small base. Both must stay clamped after perturbation.
        let lone = vec![thread(1, ThreadPriority::Critical, ThreadState::Running, 0)];
        let mut crowd = vec![thread(1, ThreadPriority::Low, ThreadState::Running, 0)];
        for id in 2..12 {
            crowd.push(thread(id, ThreadPriority::Critical, ThreadState::Running, 0));
        }
        for _ in 0..200 {
            let s = policy.compute_share(&lone[0], &lone, &mut rng);
            assert!((0.0..=100.0).contains(&s));
            let s = policy.compute_share(&crowd[0], &crowd, &mut rng);
            assert!((0.0..=100.0).contains(&s));
        }
    }

    #[test]
    fn test_equal_priorities_equal_base_share() {
        let policy = PriorityScheduling;
        let all = vec![
            thread(1, ThreadPriority::Medium, ThreadState::Running, 0),
            thread(2, ThreadPriority::Medium, ThreadState::Running, 500),
            thread(3, ThreadPriority::Medium, ThreadState::Running, 900),
            // A paused thread contributes no weight and takes no share.
            thread(4, ThreadPriority::Critical, ThreadState::Paused, 0),
        ];
        let base = policy.base_share(&all[0], &all);
        assert!((base - 100.0 / 3.0).abs() < 1e-9);
        for t in all.iter().filter(|t| t.state == ThreadState::Running) {
            assert!((policy.base_share(t, &all) - base).abs() < f64::EPSILON);
        }
        assert_eq!(policy.base_share(&all[3], &all), 0.0);
    }

    #[test]
    fn test_share_proportional_to_weight() {
        let policy = PriorityScheduling;
        let all = vec![
            thread(1, ThreadPriority::Low, ThreadState::Running, 0),
            thread(2, ThreadPriority::Critical, ThreadState::Running, 0),
        ];
        // Total weight 5: LOW gets 20, CRITICAL gets 80.
        assert!((policy.base_share(&all[0], &all) - 20.0).abs() < f64::EPSILON);
        assert!((policy.base_share(&all[1], &all) - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_jitter_stays_within_five_points() {
        let policy = PriorityScheduling;
        let mut rng = StdRng::seed_from_u64(7);
        let all = vec![
            thread(1, ThreadPriority::Medium, ThreadState::Running, 0),
            thread(2, ThreadPriority::Medium, ThreadState::Running, 0),
        ];
        for _ in 0..200 {
            let s = policy.compute_share(&all[0], &all, &mut rng);
            assert!((s - 50.0).abs() <= SHARE_JITTER);
        }
    }

    #[test]
    fn test_identical_rng_state_gives_identical_shares() {
        // StepRng with zero increment replays the same draw, so equal
        // priorities must come out with exactly equal shares.
        let policy = PriorityScheduling;
        let all = vec![
            thread(1, ThreadPriority::High, ThreadState::Running, 0),
            thread(2, ThreadPriority::High, ThreadState::Running, 0),
        ];
        let a = policy.compute_share(&all[0], &all, &mut StepRng::new(0, 0));
        let b = policy.compute_share(&all[1], &all, &mut StepRng::new(0, 0));
        assert_eq!(a, b);
    }

    #[test]
    fn test_select_next_prefers_priority() {
        let policy = PriorityScheduling;
        let all = vec![
            thread(1, ThreadPriority::High, ThreadState::Running, 500),
            thread(2, ThreadPriority::Critical, ThreadState::Running, 100),
            thread(3, ThreadPriority::High, ThreadState::Running, 100),
        ];
        assert_eq!(policy.select_next(&all).map(|t| t.id), Some(2));
    }

    #[test]
    fn test_select_next_ties_break_on_execution_time() {
        let policy = PriorityScheduling;
        let all = vec![
            thread(1, ThreadPriority::High, ThreadState::Running, 500),
            thread(3, ThreadPriority::High, ThreadState::Running, 100),
        ];
        assert_eq!(policy.select_next(&all).map(|t| t.id), Some(3));
    }

    #[test]
    fn test_select_next_skips_non_running() {
        let policy = PriorityScheduling;
        let all = vec![
            thread(1, ThreadPriority::Critical, ThreadState::Paused, 0),
            thread(2, ThreadPriority::Low, ThreadState::Running, 0),
        ];
        assert_eq!(policy.select_next(&all).map(|t| t.id), Some(2));
    }

    #[test]
    fn test_select_next_empty() {
        let policy = PriorityScheduling;
        assert!(policy.select_next(&[]).is_none());
        let all = vec![thread(1, ThreadPriority::High, ThreadState::Completed, 0)];
        assert!(policy.select_next(&all).is_none());
    }
}
