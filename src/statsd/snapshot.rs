use std::time::Instant;

use super::writer::{MetricValue, PacketWriter};
use super::{MetricType, TagSet};

/// Progress counters of a fuzzing run, sampled at send time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsSnapshot {
    /// When the run started; the execution rate is measured from here.
    pub start_time: Instant,
    /// Queue cycle counter. The first cycle is cycle 1, `0` means not started.
    pub queue_cycle: u64,
    pub cycles_wo_finds: u64,
    pub execs_done: u64,
    pub paths_total: u32,
    pub paths_favored: u32,
    pub paths_found: u32,
    pub paths_imported: u32,
    pub max_depth: u32,
    pub cur_path: u32,
    pub pending_favs: u32,
    pub pending_total: u32,
    pub variable_paths: u32,
    pub unique_crashes: u64,
    pub unique_hangs: u64,
    pub total_crashes: u64,
    pub slowest_exec_ms: u32,
    /// Coverage map entries that have been hit at least once.
    pub edges_found: u32,
    pub var_byte_count: u32,
    pub havoc_expansion: u32,
}

impl MetricsSnapshot {
    /// A snapshot with every counter at zero.
    #[must_use]
    pub const fn new(start_time: Instant) -> Self {
        Self {
            start_time,
            queue_cycle: 0,
            cycles_wo_finds: 0,
            execs_done: 0,
            paths_total: 0,
            paths_favored: 0,
            paths_found: 0,
            paths_imported: 0,
            max_depth: 0,
            cur_path: 0,
            pending_favs: 0,
            pending_total: 0,
            variable_paths: 0,
            unique_crashes: 0,
            unique_hangs: 0,
            total_crashes: 0,
            slowest_exec_ms: 0,
            edges_found: 0,
            var_byte_count: 0,
            havoc_expansion: 0,
        }
    }

    /// Completed cycles: one less than the cycle counter, never below zero.
    #[must_use]
    pub const fn cycle_done(&self) -> u64 {
        self.queue_cycle.saturating_sub(1)
    }

    /// Executions per second between `start_time` and `now`, at millisecond resolution.
    ///
    /// Returns `0.0` when less than a millisecond has elapsed.
    #[must_use]
    pub fn execs_per_sec(&self, now: Instant) -> f64 {
        let elapsed_ms = now.saturating_duration_since(self.start_time).as_millis();
        if elapsed_ms == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        {
            self.execs_done as f64 / (elapsed_ms as f64 / 1000.0)
        }
    }
}

type MetricFn = fn(&MetricsSnapshot, Instant) -> MetricValue;

/// Reported metrics, in wire order.
pub const METRICS: [(&str, MetricFn); 20] = [
    ("cycle_done", |s, _| s.cycle_done().into()),
    ("cycles_wo_finds", |s, _| s.cycles_wo_finds.into()),
    ("execs_done", |s, _| s.execs_done.into()),
    ("execs_per_sec", |s, now| MetricValue::Rate(s.execs_per_sec(now))),
    ("paths_total", |s, _| s.paths_total.into()),
    ("paths_favored", |s, _| s.paths_favored.into()),
    ("paths_found", |s, _| s.paths_found.into()),
    ("paths_imported", |s, _| s.paths_imported.into()),
    ("max_depth", |s, _| s.max_depth.into()),
    ("cur_path", |s, _| s.cur_path.into()),
    ("pending_favs", |s, _| s.pending_favs.into()),
    ("pending_total", |s, _| s.pending_total.into()),
    ("variable_paths", |s, _| s.variable_paths.into()),
    ("unique_crashes", |s, _| s.unique_crashes.into()),
    ("unique_hangs", |s, _| s.unique_hangs.into()),
    ("total_crashes", |s, _| s.total_crashes.into()),
    ("slowest_exec_ms", |s, _| s.slowest_exec_ms.into()),
    ("edges_found", |s, _| s.edges_found.into()),
    ("var_byte_count", |s, _| s.var_byte_count.into()),
    ("havoc_expansion", |s, _| s.havoc_expansion.into()),
];

/// Renders one gauge line per metric into `writer`.
///
/// Formatting never fails: once the buffer is full the remaining output is dropped.
pub fn format_metrics(
    writer: &mut PacketWriter<'_>,
    snapshot: &MetricsSnapshot,
    now: Instant,
    stats_prefix: &str,
    tags: &TagSet,
) {
    for (name, value) in &METRICS {
        writer.write_metric(
            stats_prefix,
            name,
            value(snapshot, now),
            MetricType::Gauge,
            tags.suffix(),
        );
    }
}
