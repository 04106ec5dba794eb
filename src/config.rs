use std::net::SocketAddr;

use tracing::warn;

use crate::statsd::TagsFlavor;
use crate::StatsdResult;

/// Collector host used when no override is configured.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Collector port used when no override is configured.
pub const DEFAULT_PORT: u16 = 8125;

/// Largest datagram payload produced by a single send.
pub const MAX_PACKET_SIZE: usize = 4096;

/// Prefix of every metric name. A `.` separates it from the metric name.
pub const DEFAULT_STATS_PREFIX: &str = "fuzzing";

/// Environment variable overriding the collector host.
pub const ENV_HOST: &str = "AFL_STATSD_HOST";

/// Environment variable overriding the collector port.
pub const ENV_PORT: &str = "AFL_STATSD_PORT";

/// Environment variable selecting the tag dialect.
pub const ENV_TAGS_FLAVOR: &str = "AFL_STATSD_TAGS_FLAVOR";

#[cfg(feature = "dogstatsd-tags")]
const DEFAULT_TAGS_FLAVOR: TagsFlavor = TagsFlavor::Dogstatsd;
#[cfg(not(feature = "dogstatsd-tags"))]
const DEFAULT_TAGS_FLAVOR: TagsFlavor = TagsFlavor::None;

/// Configuration options for the statsd reporter.
///
/// `host` and `port` are overrides: `None` (or an empty host / zero port) falls back to
/// [`DEFAULT_HOST`] and [`DEFAULT_PORT`] when the endpoint is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsdOptions {
    /// Collector host override.
    pub host: Option<String>,
    /// Collector port override.
    pub port: Option<u16>,
    /// Local address the datagram socket binds to.
    pub bind_addr: SocketAddr,
    /// Prefix of every metric name, without the trailing dot.
    pub stats_prefix: String,
    /// Maximum payload of one datagram. Formatting truncates at this size.
    pub max_packet_size: usize,
    /// Whether metric lines carry the static tag suffix.
    pub tags_flavor: TagsFlavor,
}

impl Default for StatsdOptions {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 0)),
            stats_prefix: DEFAULT_STATS_PREFIX.to_string(),
            max_packet_size: MAX_PACKET_SIZE,
            tags_flavor: DEFAULT_TAGS_FLAVOR,
        }
    }
}

impl StatsdOptions {
    /// Builds options from the `AFL_STATSD_*` environment variables.
    ///
    /// Values that cannot be interpreted are logged and replaced by their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds options from an arbitrary key lookup, e.g. a map in tests.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::default();

        options.host = lookup(ENV_HOST).filter(|host| !host.trim().is_empty());

        if let Some(raw) = lookup(ENV_PORT) {
            match parse_port(&raw) {
                Ok(port) => options.port = port,
                Err(err) => warn!("{err}, using default port {DEFAULT_PORT}"),
            }
        }

        if let Some(raw) = lookup(ENV_TAGS_FLAVOR) {
            match raw.parse::<TagsFlavor>() {
                Ok(flavor) => options.tags_flavor = flavor,
                Err(err) => {
                    warn!("{err}, metrics are sent without tags");
                    options.tags_flavor = TagsFlavor::None;
                }
            }
        }

        options
    }
}

/// Parses a port override. Empty and zero values mean "no override".
///
/// # Errors
/// Returns [`crate::StatsdError::InvalidConfig`] when the value is not a valid port number.
pub fn parse_port(raw: &str) -> StatsdResult<Option<u16>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<u16>() {
        Ok(0) => Ok(None),
        Ok(port) => Ok(Some(port)),
        Err(err) => Err(format!("{ENV_PORT}={raw:?} is not a valid port: {err}").into()),
    }
}
