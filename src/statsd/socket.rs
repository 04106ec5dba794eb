use std::io;
use std::net::{SocketAddr, SocketAddrV4, UdpSocket};

use tracing::{debug, trace, warn};

use super::endpoint::Endpoint;
use crate::{StatsdError, StatsdResult};

/// A datagram transport able to send one packet and be closed explicitly.
pub trait Writer {
    /// Sends `buf` as a single datagram to `destination`.
    ///
    /// # Errors
    /// Returns the transport error unchanged.
    fn write(&self, buf: &[u8], destination: SocketAddrV4) -> io::Result<usize>;

    /// Closes the transport, reporting a failed close instead of ignoring it.
    ///
    /// # Errors
    /// Returns the error of the underlying close call.
    fn close(self) -> io::Result<()>
    where
        Self: Sized;
}

/// Creates transports and resolves the collector address for them.
pub trait SocketFactory {
    /// The transport produced by [`SocketFactory::open`].
    type Socket: Writer;

    /// Creates a new datagram socket.
    ///
    /// # Errors
    /// Returns the OS error when no socket can be created.
    fn open(&self) -> io::Result<Self::Socket>;

    /// Resolves the collector address the new socket sends to.
    ///
    /// # Errors
    /// Returns [`StatsdError::Resolve`] when the host has no IPv4 address.
    fn resolve(&self, endpoint: &Endpoint) -> StatsdResult<SocketAddrV4> {
        endpoint.resolve()
    }
}

pub struct UdpSocketWriter {
    pub sock: UdpSocket,
}

impl Writer for UdpSocketWriter {
    fn write(&self, buf: &[u8], destination: SocketAddrV4) -> io::Result<usize> {
        self.sock.send_to(buf, destination)
    }

    #[cfg(unix)]
    fn close(self) -> io::Result<()> {
        use std::os::fd::IntoRawFd;

        let fd = self.sock.into_raw_fd();
        // SAFETY: `into_raw_fd` released ownership of the descriptor, nothing else closes it
        if unsafe { libc::close(fd) } == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn close(self) -> io::Result<()> {
        drop(self.sock);
        Ok(())
    }
}

/// Opens non-blocking UDP sockets bound to `bind_addr`.
#[derive(Debug, Clone)]
pub struct UdpSocketFactory {
    bind_addr: SocketAddr,
}

impl UdpSocketFactory {
    #[must_use]
    pub const fn new(bind_addr: SocketAddr) -> Self {
        Self { bind_addr }
    }
}

impl SocketFactory for UdpSocketFactory {
    type Socket = UdpSocketWriter;

    fn open(&self) -> io::Result<UdpSocketWriter> {
        let sock = UdpSocket::bind(self.bind_addr)?;
        // a full send buffer must not stall the fuzzer
        sock.set_nonblocking(true)?;
        Ok(UdpSocketWriter { sock })
    }
}

struct LiveSocket<W> {
    writer: W,
    destination: SocketAddrV4,
}

/// Owns the single outbound socket and the address it sends to.
///
/// The socket is created lazily by [`SocketManager::acquire`] and discarded after a failed
/// send, so the following cycle starts over with a fresh socket and a fresh resolution.
pub struct SocketManager<F: SocketFactory> {
    endpoint: Endpoint,
    factory: F,
    live: Option<LiveSocket<F::Socket>>,
}

impl<F: SocketFactory> SocketManager<F> {
    #[must_use]
    pub const fn new(endpoint: Endpoint, factory: F) -> Self {
        Self {
            endpoint,
            factory,
            live: None,
        }
    }

    #[must_use]
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Address of the live socket, if any.
    #[must_use]
    pub fn destination(&self) -> Option<SocketAddrV4> {
        self.live.as_ref().map(|live| live.destination)
    }

    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.live.is_some()
    }

    /// Returns the destination of the live socket, creating the socket first if needed.
    ///
    /// # Errors
    /// Returns [`StatsdError::SocketCreate`] or [`StatsdError::Resolve`], both fatal.
    pub fn acquire(&mut self) -> StatsdResult<SocketAddrV4> {
        if let Some(live) = &self.live {
            return Ok(live.destination);
        }

        let writer = self.factory.open().map_err(StatsdError::SocketCreate)?;
        let destination = self.factory.resolve(&self.endpoint)?;
        debug!(endpoint = %self.endpoint, %destination, "statsd socket created");

        self.live = Some(LiveSocket {
            writer,
            destination,
        });
        Ok(destination)
    }

    /// Sends `buf` as one datagram over the live socket.
    ///
    /// # Errors
    /// Returns [`StatsdError::SocketUnavailable`] without a live socket, and
    /// [`StatsdError::SendFailed`] when the send errors; the socket is then discarded.
    pub fn transmit(&mut self, buf: &[u8]) -> StatsdResult<usize> {
        let Some(live) = &self.live else {
            return Err(StatsdError::SocketUnavailable);
        };

        let destination = live.destination;
        match live.writer.write(buf, destination) {
            Ok(sent) => {
                trace!(bytes = sent, %destination, "statsd packet sent");
                Ok(sent)
            }
            Err(err) => {
                self.invalidate();
                Err(StatsdError::SendFailed(err))
            }
        }
    }

    /// Closes and forgets the live socket. A failed close is only logged.
    pub fn invalidate(&mut self) {
        if let Some(live) = self.live.take() {
            if let Err(err) = live.writer.close() {
                warn!("Cannot close statsd socket: {err}");
            }
        }
    }
}
