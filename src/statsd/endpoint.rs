use std::fmt;
use std::net::{SocketAddr, SocketAddrV4, ToSocketAddrs};

use crate::config::{StatsdOptions, DEFAULT_HOST, DEFAULT_PORT};
use crate::{StatsdError, StatsdResult};

/// Host and port of the statsd collector, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl Endpoint {
    /// Builds an endpoint, replacing an empty host or a zero port with the defaults.
    #[must_use]
    pub fn new(host: Option<&str>, port: Option<u16>) -> Self {
        let host = host
            .map(str::trim)
            .filter(|host| !host.is_empty())
            .unwrap_or(DEFAULT_HOST);
        let port = port.filter(|port| *port != 0).unwrap_or(DEFAULT_PORT);
        Self {
            host: host.to_string(),
            port,
        }
    }

    /// Effective endpoint for the configured overrides.
    #[must_use]
    pub fn from_options(options: &StatsdOptions) -> Self {
        Self::new(options.host.as_deref(), options.port)
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Resolves the host through the system resolver, keeping the first IPv4 address.
    ///
    /// # Errors
    /// Returns [`StatsdError::Resolve`] when the lookup fails or yields no IPv4 address.
    pub fn resolve(&self) -> StatsdResult<SocketAddrV4> {
        let addrs = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|source| self.resolve_error(source))?;

        addrs
            .into_iter()
            .find_map(|addr| match addr {
                SocketAddr::V4(v4) => Some(SocketAddrV4::new(*v4.ip(), self.port)),
                SocketAddr::V6(_) => None,
            })
            .ok_or_else(|| {
                self.resolve_error(std::io::Error::new(
                    std::io::ErrorKind::AddrNotAvailable,
                    "no IPv4 address",
                ))
            })
    }

    fn resolve_error(&self, source: std::io::Error) -> StatsdError {
        StatsdError::Resolve {
            host: self.host.clone(),
            source,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
