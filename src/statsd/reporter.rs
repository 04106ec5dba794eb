use std::net::SocketAddrV4;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, error, warn};

use super::endpoint::Endpoint;
use super::snapshot::{format_metrics, MetricsSnapshot};
use super::socket::{SocketFactory, SocketManager, UdpSocketFactory};
use super::writer::PacketWriter;
use super::TagSet;
use crate::config::{StatsdOptions, MAX_PACKET_SIZE};
use crate::{StatsdError, StatsdResult};

/// Sends fuzzing progress to a statsd collector, one datagram per call.
///
/// The socket is created on the first [`StatsdReporter::send_metrics`] call and recreated after
/// any failed send. Delivery is best effort: a failed cycle is logged and reported to the
/// caller, who is expected to carry on and try again on the next status refresh.
///
/// # Example
///
/// ```no_run
/// use fuzz_statsd::{MetricsSnapshot, StatsdOptions, StatsdReporter};
/// use std::time::Instant;
///
/// let options = StatsdOptions::from_env();
/// let mut reporter = StatsdReporter::new(&options, "libpng", "4.00c");
///
/// let mut snapshot = MetricsSnapshot::new(Instant::now());
/// snapshot.queue_cycle = 3;
/// snapshot.execs_done = 12_000;
///
/// if let Err(err) = reporter.send_metrics(&snapshot) {
///     if err.is_fatal() {
///         std::process::exit(1);
///     }
/// }
/// ```
pub struct StatsdReporter<F: SocketFactory = UdpSocketFactory> {
    sockets: SocketManager<F>,
    stats_prefix: String,
    max_packet_size: usize,
    tags: TagSet,
}

impl StatsdReporter<UdpSocketFactory> {
    /// Creates a reporter sending over UDP. `banner` and `version` feed the tag suffix when
    /// the options enable a tag dialect.
    #[must_use]
    pub fn new(options: &StatsdOptions, banner: &str, version: &str) -> Self {
        let tags = TagSet::for_flavor(options.tags_flavor, banner, version);
        Self::with_factory(options, tags, UdpSocketFactory::new(options.bind_addr))
    }
}

impl<F: SocketFactory> StatsdReporter<F> {
    /// Creates a reporter whose sockets come from `factory`.
    #[must_use]
    pub fn with_factory(options: &StatsdOptions, tags: TagSet, factory: F) -> Self {
        Self {
            sockets: SocketManager::new(Endpoint::from_options(options), factory),
            stats_prefix: options.stats_prefix.clone(),
            max_packet_size: options.max_packet_size.min(MAX_PACKET_SIZE),
            tags,
        }
    }

    /// Formats `snapshot` and sends it as one datagram. Returns the number of bytes sent.
    ///
    /// # Errors
    /// [`StatsdError::Resolve`] and [`StatsdError::SocketCreate`] are fatal and returned
    /// before anything is formatted. [`StatsdError::SendFailed`] only costs this cycle.
    pub fn send_metrics(&mut self, snapshot: &MetricsSnapshot) -> StatsdResult<usize> {
        self.send_metrics_at(snapshot, Instant::now())
    }

    /// Same as [`StatsdReporter::send_metrics`], measuring the execution rate up to `now`.
    ///
    /// # Errors
    /// See [`StatsdReporter::send_metrics`].
    pub fn send_metrics_at(
        &mut self,
        snapshot: &MetricsSnapshot,
        now: Instant,
    ) -> StatsdResult<usize> {
        if let Err(err) = self.sockets.acquire() {
            if err.is_fatal() {
                error!(endpoint = %self.sockets.endpoint(), "{err}");
            } else {
                warn!("Cannot create statsd socket: {err}");
            }
            return Err(err);
        }

        let mut buf = [0u8; MAX_PACKET_SIZE];
        let mut writer = PacketWriter::new(&mut buf[..self.max_packet_size]);
        format_metrics(
            &mut writer,
            snapshot,
            now,
            &self.stats_prefix,
            &self.tags,
        );
        if writer.is_truncated() {
            debug!(
                max_packet_size = self.max_packet_size,
                "statsd packet truncated"
            );
        }

        self.sockets
            .transmit(writer.as_bytes())
            .inspect_err(|err| warn!("Cannot send statsd metrics: {err}"))
    }

    /// Collector address of the live socket, if one exists.
    #[must_use]
    pub fn destination(&self) -> Option<SocketAddrV4> {
        self.sockets.destination()
    }

    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.sockets.is_live()
    }

    #[must_use]
    pub const fn tags(&self) -> &TagSet {
        &self.tags
    }
}

/// A [`StatsdReporter`] that can be shared between threads.
///
/// Calls never wait for each other: while one caller is sending, the others get
/// [`StatsdError::SocketUnavailable`] and skip their cycle.
pub struct SharedStatsdReporter<F: SocketFactory = UdpSocketFactory> {
    inner: Mutex<StatsdReporter<F>>,
}

impl<F: SocketFactory> SharedStatsdReporter<F> {
    #[must_use]
    pub fn new(reporter: StatsdReporter<F>) -> Self {
        Self {
            inner: Mutex::new(reporter),
        }
    }

    /// Sends `snapshot` unless another caller currently holds the reporter.
    ///
    /// # Errors
    /// Returns [`StatsdError::SocketUnavailable`] when the reporter is busy, otherwise the
    /// errors of [`StatsdReporter::send_metrics`].
    pub fn send_metrics(&self, snapshot: &MetricsSnapshot) -> StatsdResult<usize> {
        let Some(mut reporter) = self.inner.try_lock() else {
            warn!("Statsd reporter busy, skipping this cycle");
            return Err(StatsdError::SocketUnavailable);
        };
        reporter.send_metrics(snapshot)
    }

    /// Runs `f` with exclusive access to the reporter.
    pub fn with_reporter<R>(&self, f: impl FnOnce(&mut StatsdReporter<F>) -> R) -> R {
        f(&mut self.inner.lock())
    }

    pub fn into_inner(self) -> StatsdReporter<F> {
        self.inner.into_inner()
    }
}
