//! ThreadSim Headless Validation Harness
//!
//! Exercises the scheduling engine end to end without a UI: seeds the
//! demo workload, sweeps the engine's invariants, and prints a
//! pass/fail summary.
//!
//! Usage:
//!   cargo run -p threadsim-simtest
//!   cargo run -p threadsim-simtest -- --verbose
//!   cargo run -p threadsim-simtest -- --json

use std::sync::Arc;

use threadsim_core::export::{read_csv, write_csv};
use threadsim_core::prelude::*;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(name: &str, passed: bool, detail: String) -> TestResult {
    TestResult {
        name: name.into(),
        passed,
        detail,
    }
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    let json = std::env::args().any(|a| a == "--json");
    println!("=== ThreadSim Simulation Harness ===\n");

    let mut results = Vec::new();

    // 1. Creation invariants
    results.extend(validate_creation(verbose));

    // 2. CPU-share bounds and proportionality
    results.extend(validate_shares(verbose));

    // 3. Next-thread selection order
    results.extend(validate_selection(verbose));

    // 4. Tick loop and completion detection
    results.extend(validate_tick_loop(verbose));

    // 5. Bulk operation filters
    results.extend(validate_bulk_ops(verbose));

    // 6. CSV export round-trip
    results.extend(validate_csv_roundtrip(verbose));

    // 7. Demo scenario sweep
    let final_stats = run_demo_scenario(verbose, &mut results);

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if json {
        match serde_json::to_string_pretty(&final_stats) {
            Ok(dump) => println!("\n{}", dump),
            Err(e) => eprintln!("stats serialization failed: {}", e),
        }
    }

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── Scenario helpers ────────────────────────────────────────────────────

fn named(name: &str, priority: ThreadPriority, burst_ms: u64) -> ThreadSpec {
    ThreadSpec {
        name: Some(name.into()),
        priority,
        burst_ms: Some(burst_ms),
        ..Default::default()
    }
}

/// The classic demo workload.
fn demo_registry(seed: u64) -> Arc<ThreadRegistry> {
    let registry = Arc::new(ThreadRegistry::seeded(seed));
    registry.create(named("MainProcess", ThreadPriority::High, 15_000));
    registry.create(named("BackgroundTask", ThreadPriority::Low, 20_000));
    registry.create(named("IOHandler", ThreadPriority::Medium, 12_000));
    registry.create(named("CriticalService", ThreadPriority::Critical, 8_000));
    registry
}

fn headless_driver(registry: Arc<ThreadRegistry>, seed: u64) -> SimulationDriver {
    let mut driver = SimulationDriver::seeded(registry, seed);
    driver.set_pace(None);
    driver
}

// ── 1. Creation invariants ──────────────────────────────────────────────

fn validate_creation(verbose: bool) -> Vec<TestResult> {
    println!("--- Creation Invariants ---");
    let mut results = Vec::new();

    let registry = ThreadRegistry::seeded(11);
    let defaulted = registry.create(ThreadSpec::default());
    let zero_burst = registry.create(ThreadSpec {
        burst_ms: Some(0),
        ..Default::default()
    });
    let threads = registry.list();

    results.push(check(
        "create_starts_running",
        threads.iter().all(|t| t.state == ThreadState::Running),
        format!("{} threads created, all RUNNING", threads.len()),
    ));

    results.push(check(
        "create_zero_execution",
        threads.iter().all(|t| t.execution_ms == 0),
        "execution starts at 0 ms".into(),
    ));

    results.push(check(
        "burst_always_positive",
        threads.iter().all(|t| t.burst_ms > 0),
        format!(
            "bursts: {:?} (zero caller value replaced by random draw)",
            threads.iter().map(|t| t.burst_ms).collect::<Vec<_>>()
        ),
    ));

    results.push(check(
        "memory_draw_in_range",
        threads.iter().all(|t| t.memory_mb >= 50.0 && t.memory_mb <= 200.0),
        "memory draws within [50, 200] MB".into(),
    ));

    results.push(check(
        "ids_sequential",
        defaulted == 1 && zero_burst == 2,
        format!("ids assigned: {}, {}", defaulted, zero_burst),
    ));

    results.push(check(
        "delete_unknown_is_noop",
        !registry.delete(999) && registry.len() == 2,
        "delete(999) returned false, registry size unchanged".into(),
    ));

    if verbose {
        println!("  created {:?}", threads.iter().map(|t| &t.name).collect::<Vec<_>>());
    }
    results
}

// ── 2. CPU shares ───────────────────────────────────────────────────────

fn validate_shares(_verbose: bool) -> Vec<TestResult> {
    println!("--- CPU Shares ---");
    let mut results = Vec::new();

    let registry = demo_registry(22);
    let driver = headless_driver(registry.clone(), 22);
    driver.tick();
    let threads = registry.list();

    results.push(check(
        "shares_within_bounds",
        threads.iter().all(|t| (0.0..=100.0).contains(&t.cpu_usage)),
        format!(
            "shares after one tick: {:?}",
            threads.iter().map(|t| format!("{:.1}", t.cpu_usage)).collect::<Vec<_>>()
        ),
    ));

    let policy = PriorityScheduling;
    let base_critical = policy.base_share(&threads[3], &threads);
    let base_low = policy.base_share(&threads[1], &threads);
    results.push(check(
        "base_share_proportional",
        (base_critical - 40.0).abs() < 1e-9 && (base_low - 10.0).abs() < 1e-9,
        format!(
            "total weight 10: CRITICAL base {:.1}, LOW base {:.1}",
            base_critical, base_low
        ),
    ));

    let paused = {
        let registry = demo_registry(23);
        registry.pause_all();
        let driver = headless_driver(registry.clone(), 23);
        driver.tick();
        registry.list()
    };
    results.push(check(
        "no_share_without_runnables",
        paused.iter().all(|t| t.cpu_usage == 0.0),
        "all paused: every share is zero".into(),
    ));

    results
}

// ── 3. Next-thread selection ────────────────────────────────────────────

fn validate_selection(_verbose: bool) -> Vec<TestResult> {
    println!("--- Next-Thread Selection ---");
    let mut results = Vec::new();

    let registry = demo_registry(33);
    let driver = headless_driver(registry.clone(), 33);

    let first = driver.next_thread().map(|t| t.name);
    results.push(check(
        "critical_beats_high",
        first.as_deref() == Some("CriticalService"),
        format!("next thread: {:?}", first),
    ));

    // Drain CriticalService (8 s); HIGH is next in line.
    driver.run_loop(8);
    let second = driver.next_thread().map(|t| t.name);
    results.push(check(
        "high_after_critical_completes",
        second.as_deref() == Some("MainProcess"),
        format!("next thread after 8 ticks: {:?}", second),
    ));

    registry.stop_all();
    results.push(check(
        "no_next_when_nothing_runs",
        driver.next_thread().is_none(),
        "stop_all leaves no runnable thread".into(),
    ));

    results
}

// ── 4. Tick loop ────────────────────────────────────────────────────────

fn validate_tick_loop(_verbose: bool) -> Vec<TestResult> {
    println!("--- Tick Loop ---");
    let mut results = Vec::new();

    let registry = Arc::new(ThreadRegistry::seeded(44));
    registry.create(named("short", ThreadPriority::Medium, 2_000));
    let driver = headless_driver(registry.clone(), 44);

    driver.tick();
    let mid = registry.list()[0].clone();
    driver.tick();
    let done = registry.list()[0].clone();

    results.push(check(
        "completes_on_burst",
        mid.state == ThreadState::Running
            && done.state == ThreadState::Completed
            && done.cpu_usage == 0.0
            && done.execution_ms == 2_000,
        format!(
            "after tick 1: {} ({} ms); after tick 2: {} ({} ms)",
            mid.state, mid.execution_ms, done.state, done.execution_ms
        ),
    ));

    driver.tick();
    results.push(check(
        "completed_is_inert_to_ticks",
        registry.list()[0].execution_ms == 2_000,
        "extra tick left the completed thread untouched".into(),
    ));

    results.push(check(
        "loop_flag_cleared",
        !driver.is_running(),
        "driver reports not running outside the loop".into(),
    ));

    results
}

// ── 5. Bulk operations ──────────────────────────────────────────────────

fn validate_bulk_ops(_verbose: bool) -> Vec<TestResult> {
    println!("--- Bulk Operations ---");
    let mut results = Vec::new();

    let registry = demo_registry(55);
    registry.set_state(4, ThreadState::Completed);

    registry.pause_all();
    let after_pause: Vec<ThreadState> = registry.list().iter().map(|t| t.state).collect();
    registry.pause_all();
    let after_second: Vec<ThreadState> = registry.list().iter().map(|t| t.state).collect();
    results.push(check(
        "pause_all_idempotent",
        after_pause == after_second,
        "two pause_all calls converge to the same state set".into(),
    ));

    registry.resume_all();
    let stats = registry.stats();
    results.push(check(
        "resume_all_skips_completed",
        stats.running == 3 && stats.completed == 1,
        format!("{} running, {} completed after resume_all", stats.running, stats.completed),
    ));

    registry.stop_all();
    let stats = registry.stats();
    results.push(check(
        "stop_all_preserves_completed",
        stats.stopped == 3 && stats.completed == 1,
        format!("{} stopped, {} still completed", stats.stopped, stats.completed),
    ));

    results
}

// ── 6. CSV round-trip ───────────────────────────────────────────────────

fn validate_csv_roundtrip(verbose: bool) -> Vec<TestResult> {
    println!("--- CSV Export ---");
    let mut results = Vec::new();

    let registry = demo_registry(66);
    let driver = headless_driver(registry.clone(), 66);
    driver.run_loop(6);

    let snapshot = registry.list();
    let mut out = Vec::new();
    if let Err(e) = write_csv(&snapshot, &mut out) {
        results.push(check("csv_write", false, format!("export failed: {}", e)));
        return results;
    }

    match read_csv(&out[..]) {
        Ok(records) => {
            let matches = records.len() == snapshot.len()
                && records.iter().zip(&snapshot).all(|(r, t)| {
                    r.id == t.id && r.execution_ms == t.execution_ms && r.burst_ms == t.burst_ms
                });
            results.push(check(
                "csv_roundtrip",
                matches,
                format!("{} rows round-tripped", records.len()),
            ));
        }
        Err(e) => {
            results.push(check("csv_roundtrip", false, format!("re-parse failed: {}", e)));
        }
    }

    if verbose {
        print!("{}", String::from_utf8_lossy(&out));
    }
    results
}

// ── 7. Demo scenario ────────────────────────────────────────────────────

fn run_demo_scenario(verbose: bool, results: &mut Vec<TestResult>) -> SystemStats {
    println!("--- Demo Scenario (5 ticks) ---");

    let registry = demo_registry(77);
    let driver = headless_driver(registry.clone(), 77);

    println!("  algorithm: {}", driver.policy().name());
    println!("  {}", driver.policy().description());
    println!("  quantum: {} ms", driver.quantum().as_millis());
    if let Some(next) = driver.next_thread() {
        println!("  next thread: {} ({})", next.name, next.priority);
    }

    for step in 1..=5 {
        driver.tick();
        if verbose {
            println!("\n  step {}:", step);
            print_thread_table(&registry.list());
        }
    }

    let stats = registry.stats();
    results.push(check(
        "demo_all_advancing",
        registry.list().iter().all(|t| t.execution_ms == 5_000),
        format!(
            "5 ticks advanced every thread to 5000 ms ({} running)",
            stats.running
        ),
    ));

    if !verbose {
        print_thread_table(&registry.list());
    }
    println!(
        "\n  totals: {} threads, {} running, {} completed, {:.1}% CPU, {:.0} MB",
        stats.total, stats.running, stats.completed, stats.total_cpu, stats.total_memory_mb
    );

    stats
}

/// Plain-text thread table, one row per registry entry.
fn print_thread_table(threads: &[SimThread]) {
    println!(
        "  {:<4} {:<16} {:<10} {:<9} {:>7} {:>9} {:>10} {:>10} {:>8}",
        "ID", "Name", "State", "Priority", "CPU %", "Mem (MB)", "Exec (ms)", "Burst (ms)", "Prog %"
    );
    for t in threads {
        println!(
            "  {:<4} {:<16} {:<10} {:<9} {:>7.1} {:>9.1} {:>10} {:>10} {:>8.1}",
            t.id,
            t.name,
            t.state.to_string(),
            t.priority.to_string(),
            t.cpu_usage,
            t.memory_mb,
            t.execution_ms,
            t.burst_ms,
            t.progress_percent()
        );
    }
}
