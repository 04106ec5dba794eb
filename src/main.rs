//! Simulated fuzzing loop that reports its progress to a statsd collector.
//!
//! ```sh
//! AFL_STATSD_PORT=9125 AFL_STATSD_TAGS_FLAVOR=dogstatsd RUST_LOG=debug cargo run
//! ```
//!
//! `FUZZ_STATSD_INTERVAL_MS` sets the status refresh interval (default 1000) and
//! `FUZZ_STATSD_REPORTS` the number of reports before exiting (default 60).

use crossbeam::channel::tick;
use fuzz_statsd::{MetricsSnapshot, StatsdOptions, StatsdReporter};
use std::time::{Duration, Instant};
use tracing::{error, info, Level};
use tracing_subscriber::prelude::*;

const BANNER: &str = "fuzz-statsd-demo";

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let interval = Duration::from_millis(env_or("FUZZ_STATSD_INTERVAL_MS", 1000));
    let reports: u32 = env_or("FUZZ_STATSD_REPORTS", 60);

    let options = StatsdOptions::from_env();
    info!(
        host = options.host.as_deref().unwrap_or(fuzz_statsd::DEFAULT_HOST),
        port = options.port.unwrap_or(fuzz_statsd::DEFAULT_PORT),
        tags = %options.tags_flavor,
        "reporting every {}ms",
        interval.as_millis()
    );

    let mut reporter = StatsdReporter::new(&options, BANNER, env!("CARGO_PKG_VERSION"));
    let mut snapshot = MetricsSnapshot::new(Instant::now());
    let status_tick = tick(interval);

    for report in 0..reports {
        if status_tick.recv().is_err() {
            break;
        }
        simulate_progress(&mut snapshot, report);

        if let Err(err) = reporter.send_metrics(&snapshot) {
            if err.is_fatal() {
                error!("Stopping: {err}");
                std::process::exit(1);
            }
        }
    }

    info!(
        execs = snapshot.execs_done,
        paths = snapshot.paths_total,
        "done"
    );
}

fn simulate_progress(snapshot: &mut MetricsSnapshot, report: u32) {
    snapshot.execs_done += 1_000 + u64::from(report % 7) * 150;
    snapshot.cur_path = report % snapshot.paths_total.max(1);

    if report % 5 == 0 {
        snapshot.queue_cycle += 1;
        snapshot.cycles_wo_finds += 1;
    }
    if report % 3 == 0 {
        snapshot.paths_total += 1;
        snapshot.paths_found += 1;
        snapshot.pending_total += 1;
        snapshot.edges_found += 17;
        snapshot.cycles_wo_finds = 0;
        snapshot.max_depth = snapshot.max_depth.max(1 + report / 10);
    }
    if report % 4 == 0 {
        snapshot.paths_favored += 1;
        snapshot.pending_favs += 1;
    }
    if report % 11 == 0 {
        snapshot.total_crashes += 1;
        snapshot.unique_crashes += u64::from(report % 22 == 0);
    }
    if report % 13 == 0 {
        snapshot.unique_hangs += 1;
        snapshot.havoc_expansion = snapshot.havoc_expansion.saturating_add(1).min(5);
    }
    snapshot.slowest_exec_ms = snapshot.slowest_exec_ms.max(report % 40);
    snapshot.var_byte_count = snapshot.edges_found / 50;
}
