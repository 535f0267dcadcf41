//! UDP Datagram Module
//!
//! Raw connectionless send-to/receive-from without any connection object.
//! Each datagram is delivered whole or not at all; there is no lifecycle
//! beyond owning the socket.

use std::io;
use std::net::SocketAddrV4;

use entities_transport::{BoundAddress, TransportError, TransportKind};
use log::{debug, trace};

use crate::socket::Endpoint;

/// A UDP endpoint, bound or unbound
#[derive(Debug)]
pub struct DatagramEndpoint {
    endpoint: Endpoint,
}

impl DatagramEndpoint {
    /// Create an endpoint reachable at `port`
    ///
    /// # Arguments
    ///
    /// * `port` - Port to bind (0 for an ephemeral port)
    /// * `loopback_only` - Accept datagrams from the local host only
    ///
    /// # Returns
    ///
    /// * `Ok(DatagramEndpoint)` - Bound endpoint
    /// * `Err(TransportError::BindFailure)` - Creation or bind failed
    pub fn bind(port: u16, loopback_only: bool) -> Result<Self, TransportError> {
        let bound = BoundAddress::new(port, loopback_only);
        let endpoint = Endpoint::new(TransportKind::Datagram).map_err(TransportError::BindFailure)?;
        endpoint
            .bind(bound.socket_addr())
            .map_err(TransportError::BindFailure)?;
        debug!("bound datagram endpoint to {}", bound);
        Ok(Self { endpoint })
    }

    /// Create an endpoint for a client; the OS binds it on first send
    pub fn unbound() -> Result<Self, TransportError> {
        let endpoint = Endpoint::new(TransportKind::Datagram).map_err(TransportError::SocketCreateFailure)?;
        Ok(Self { endpoint })
    }

    /// Send one datagram to `dest`, returning the number of bytes sent
    pub fn send_to(&self, data: &[u8], dest: SocketAddrV4) -> Result<usize, TransportError> {
        let n = self
            .endpoint
            .send_to(data, dest)
            .map_err(TransportError::SendFailure)?;
        trace!("sent {} byte datagram to {}", n, dest);
        Ok(n)
    }

    /// Block until one datagram arrives
    ///
    /// Returns at most `capacity` bytes of it; the rest of a longer datagram
    /// is discarded by the OS.
    pub fn recv_from(&self, capacity: usize) -> Result<(Vec<u8>, SocketAddrV4), TransportError> {
        let mut buf = vec![0u8; capacity];
        let (n, source) = self
            .endpoint
            .recv_from(&mut buf)
            .map_err(TransportError::ReceiveFailure)?;
        buf.truncate(n);
        trace!("received {} byte datagram from {}", n, source);
        Ok((buf, source))
    }

    pub fn local_addr(&self) -> io::Result<SocketAddrV4> {
        self.endpoint.local_addr()
    }

    /// Get the underlying endpoint
    pub fn inner(&self) -> &Endpoint {
        &self.endpoint
    }
}
