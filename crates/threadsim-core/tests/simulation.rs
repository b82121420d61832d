//! Integration tests for the full scheduling pipeline.
//!
//! Exercises: registry mutation → policy computation → tick driver
//! → completion detection → stats/CSV collaborators, end to end.

use std::sync::Arc;
use std::time::Duration;

use threadsim_core::export::{read_csv, write_csv};
use threadsim_core::prelude::*;

// ── Helpers ────────────────────────────────────────────────────────────

fn named(name: &str, priority: ThreadPriority, burst_ms: u64) -> ThreadSpec {
    ThreadSpec {
        name: Some(name.into()),
        priority,
        burst_ms: Some(burst_ms),
        ..Default::default()
    }
}

/// Registry seeded with the classic demo workload.
fn demo_registry() -> Arc<ThreadRegistry> {
    let registry = Arc::new(ThreadRegistry::seeded(42));
    registry.create(named("MainProcess", ThreadPriority::High, 15_000));
    registry.create(named("BackgroundTask", ThreadPriority::Low, 20_000));
    registry.create(named("IOHandler", ThreadPriority::Medium, 12_000));
    registry.create(named("CriticalService", ThreadPriority::Critical, 8_000));
    registry
}

fn headless_driver(registry: Arc<ThreadRegistry>) -> SimulationDriver {
    let mut driver = SimulationDriver::seeded(registry, 42);
    driver.set_pace(None);
    driver
}

// ── End-to-end runs ────────────────────────────────────────────────────

#[test]
fn full_run_completes_in_burst_order() {
    let registry = demo_registry();
    let driver = headless_driver(registry.clone());

    // Longest burst is 20 s at a 1 s quantum.
    driver.run_loop(20);

    let stats = registry.stats();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.completed, 4);
    assert_eq!(stats.running, 0);
    assert_eq!(stats.total_cpu, 0.0);

    for thread in registry.list() {
        assert_eq!(thread.state, ThreadState::Completed);
        assert_eq!(thread.execution_ms, thread.burst_ms);
        assert_eq!(thread.cpu_usage, 0.0);
        assert!((thread.progress_percent() - 100.0).abs() < f64::EPSILON);
    }
}

#[test]
fn partial_run_tracks_execution_per_thread() {
    let registry = demo_registry();
    let driver = headless_driver(registry.clone());

    driver.run_loop(5);

    let threads = registry.list();
    // CriticalService (8 s) is still mid-burst after 5 ticks; every
    // running thread advanced by exactly one quantum per tick.
    for thread in &threads {
        assert_eq!(thread.state, ThreadState::Running);
        assert_eq!(thread.execution_ms, 5_000);
        assert!(thread.cpu_usage >= 0.0 && thread.cpu_usage <= 100.0);
    }

    let stats = registry.stats();
    assert_eq!(stats.running, 4);
    assert!(stats.total_cpu > 0.0);
}

#[test]
fn paused_threads_survive_a_full_run_untouched() {
    let registry = demo_registry();
    let driver = headless_driver(registry.clone());

    registry.pause(2); // BackgroundTask
    driver.run_loop(20);

    let threads = registry.list();
    assert_eq!(threads[1].state, ThreadState::Paused);
    assert_eq!(threads[1].execution_ms, 0);
    // Everything else completed around it.
    assert_eq!(registry.stats().completed, 3);

    // Resuming afterwards lets the driver finish it too.
    registry.resume(2);
    driver.run_loop(20);
    assert_eq!(registry.stats().completed, 4);
}

#[test]
fn stopped_thread_can_be_resumed_and_finishes() {
    // Permissive state machine: STOPPED is not terminal against
    // explicit caller mutation.
    let registry = Arc::new(ThreadRegistry::seeded(7));
    let id = registry.create(named("revenant", ThreadPriority::Medium, 3_000));
    let driver = headless_driver(registry.clone());

    driver.tick();
    registry.stop(id);
    driver.tick();
    assert_eq!(registry.list()[0].execution_ms, 1_000);

    registry.resume(id);
    driver.run_loop(5);
    assert_eq!(registry.list()[0].state, ThreadState::Completed);
}

#[test]
fn quantum_smaller_than_burst_gap_still_completes_exactly() {
    let registry = Arc::new(ThreadRegistry::seeded(7));
    registry.create(named("odd", ThreadPriority::Medium, 2_500));
    let mut driver = SimulationDriver::seeded(registry.clone(), 7);
    driver.set_pace(None);
    driver.set_quantum(Duration::from_millis(1_000));

    driver.run_loop(3);
    let thread = &registry.list()[0];
    // Third tick overshoots 2.5 s; execution is clamped to the burst.
    assert_eq!(thread.state, ThreadState::Completed);
    assert_eq!(thread.execution_ms, 2_500);
}

// ── Scheduler interplay ────────────────────────────────────────────────

#[test]
fn next_thread_follows_completion_order() {
    let registry = demo_registry();
    let driver = headless_driver(registry.clone());

    // Before any tick, CriticalService wins on priority.
    assert_eq!(
        driver.next_thread().map(|t| t.name),
        Some("CriticalService".to_string())
    );

    // Once it completes (8 ticks), MainProcess (HIGH) is next.
    driver.run_loop(8);
    assert_eq!(
        driver.next_thread().map(|t| t.name),
        Some("MainProcess".to_string())
    );
}

#[test]
fn shares_reflect_priority_weights_over_a_run() {
    let registry = Arc::new(ThreadRegistry::seeded(3));
    registry.create(named("low", ThreadPriority::Low, 1_000_000));
    registry.create(named("critical", ThreadPriority::Critical, 1_000_000));
    let driver = headless_driver(registry.clone());

    let mut low_sum = 0.0;
    let mut critical_sum = 0.0;
    for _ in 0..100 {
        driver.tick();
        let threads = registry.list();
        low_sum += threads[0].cpu_usage;
        critical_sum += threads[1].cpu_usage;
    }

    // Bases are 20 and 80 with ±5 jitter per tick; averages over 100
    // ticks sit close to the bases and keep their ordering.
    assert!(critical_sum > low_sum);
    assert!((low_sum / 100.0 - 20.0).abs() < 3.0);
    assert!((critical_sum / 100.0 - 80.0).abs() < 3.0);
}

// ── Export collaborator ────────────────────────────────────────────────

#[test]
fn csv_roundtrip_matches_snapshot_at_export_time() {
    let registry = demo_registry();
    let driver = headless_driver(registry.clone());
    driver.run_loop(10);
    registry.pause_all();

    let snapshot = registry.list();
    let mut out = Vec::new();
    write_csv(&snapshot, &mut out).expect("export failed");
    let records = read_csv(&out[..]).expect("re-parse failed");

    let exported: Vec<(u64, u64, u64)> =
        records.iter().map(|r| (r.id, r.execution_ms, r.burst_ms)).collect();
    let expected: Vec<(u64, u64, u64)> =
        snapshot.iter().map(|t| (t.id, t.execution_ms, t.burst_ms)).collect();
    assert_eq!(exported, expected);
}
