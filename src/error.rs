use thiserror::Error;

/// Errors that can occur while resolving the collector and transmitting metrics.
///
/// Only [`StatsdError::Resolve`] and [`StatsdError::SocketCreate`] are fatal: they describe a
/// misconfiguration that will not go away by retrying. Every other variant is a per-cycle
/// failure the caller is expected to skip over.
#[derive(Error, Debug)]
pub enum StatsdError {
    /// The collector host could not be resolved to an IPv4 address.
    #[error("Cannot resolve statsd host {host}: {source}")]
    Resolve {
        /// The host string that failed to resolve.
        host: String,
        /// The underlying resolver error.
        #[source]
        source: std::io::Error,
    },

    /// A datagram socket could not be created at all.
    #[error("Cannot create statsd socket: {0}")]
    SocketCreate(#[source] std::io::Error),

    /// No socket could be acquired for this reporting cycle.
    #[error("Statsd socket unavailable")]
    SocketUnavailable,

    /// The datagram could not be sent. The socket has been discarded.
    #[error("Statsd send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// A configuration value could not be interpreted.
    #[error("Invalid statsd configuration: {0}")]
    InvalidConfig(String),
}

impl StatsdError {
    /// Returns `true` for errors that should terminate the reporting process.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Resolve { .. } | Self::SocketCreate(_))
    }
}

impl From<String> for StatsdError {
    fn from(value: String) -> Self {
        Self::InvalidConfig(value)
    }
}

impl From<&str> for StatsdError {
    fn from(value: &str) -> Self {
        Self::InvalidConfig(value.to_string())
    }
}
