//! # fuzz-statsd
//!
//! A best-effort statsd reporter for fuzzing engines.
//!
//! Every call to [`StatsdReporter::send_metrics`] renders a fixed set of progress counters as
//! gauge lines and sends them to the collector in a single UDP datagram. Nothing is
//! acknowledged or retried: a failed cycle is logged, the socket is discarded, and the next
//! call starts over with a fresh socket.
//!
//! ## Features
//!
//! - **Lazy socket**: created and resolved on first use, recreated after a failed send
//! - **Bounded packets**: output is cut at [`MAX_PACKET_SIZE`] instead of overflowing
//! - **Tag dialects**: plain statsd or `DogStatsD` `|#banner:...,afl_version:...` suffixes
//! - **Fail fast**: an unresolvable collector is reported as a fatal [`StatsdError`]
//!
//! ## Quick Start
//!
//! ```no_run
//! use fuzz_statsd::{MetricsSnapshot, StatsdOptions, StatsdReporter};
//! use std::time::Instant;
//!
//! // AFL_STATSD_HOST, AFL_STATSD_PORT and AFL_STATSD_TAGS_FLAVOR override the defaults
//! let options = StatsdOptions::from_env();
//! let mut reporter = StatsdReporter::new(&options, "my-target", "4.00c");
//!
//! let start = Instant::now();
//! let snapshot = MetricsSnapshot {
//!     queue_cycle: 5,
//!     execs_done: 100_000,
//!     paths_total: 42,
//!     ..MetricsSnapshot::new(start)
//! };
//!
//! match reporter.send_metrics(&snapshot) {
//!     Ok(_) => {}
//!     Err(err) if err.is_fatal() => panic!("statsd misconfigured: {err}"),
//!     Err(_) => {} // skipped cycle, already logged
//! }
//! ```

// #![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![warn(clippy::missing_errors_doc)]
#![warn(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

// https://github.com/statsd/statsd/blob/master/docs/metric_types.md
mod config;
mod error;
mod statsd;

pub use config::{
    parse_port, StatsdOptions, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_STATS_PREFIX, ENV_HOST,
    ENV_PORT, ENV_TAGS_FLAVOR, MAX_PACKET_SIZE,
};
pub use error::StatsdError;
pub use statsd::endpoint::Endpoint;
pub use statsd::reporter::{SharedStatsdReporter, StatsdReporter};
pub use statsd::snapshot::{format_metrics, MetricsSnapshot, METRICS};
pub use statsd::socket::{SocketFactory, SocketManager, UdpSocketFactory, UdpSocketWriter, Writer};
pub use statsd::writer::{MetricValue, PacketWriter};
pub use statsd::{MetricType, TagSet, TagsFlavor, MAX_TAGS_LEN};

/// Result type for statsd operations.
pub type StatsdResult<T> = Result<T, StatsdError>;
