//! Endpoint Factory
//!
//! Construction of stream endpoints behind a trait, so the connection layer
//! can run against real sockets or against an in-memory fake. The factory
//! never keeps the endpoints it creates: ownership passes to the caller, and
//! dropping an endpoint is how it is closed.

use std::io;
use std::net::SocketAddrV4;

use entities_transport::{BoundAddress, TransportError, TransportKind};
use log::{debug, trace};

use crate::socket::Endpoint;

/// Platform maximum length of the accept queue
pub fn max_backlog() -> i32 {
    #[cfg(unix)]
    {
        libc::SOMAXCONN as i32
    }
    #[cfg(not(unix))]
    {
        0x7fff_ffff
    }
}

/// A connected stream endpoint as seen by a connection
///
/// `send` and `recv` take `&self` so one thread can receive while another
/// sends on the same endpoint.
pub trait StreamEndpoint: Send + Sync + 'static {
    /// One underlying write; returns how many bytes were taken
    fn send(&self, data: &[u8]) -> io::Result<usize>;

    /// One underlying read; `Ok(0)` is an orderly close by the peer
    fn recv(&self, buf: &mut [u8]) -> io::Result<usize>;

    fn local_addr(&self) -> io::Result<SocketAddrV4>;

    /// Shut both directions down, waking any blocked reader
    fn shutdown(&self) -> io::Result<()>;
}

/// Creates, binds, accepts and connects stream endpoints
pub trait EndpointFactory: Send + Sync {
    type Endpoint: StreamEndpoint;

    /// Allocate a stream endpoint bound to `bound`; does not listen yet
    fn create_listening_endpoint(&self, bound: &BoundAddress) -> Result<Self::Endpoint, TransportError>;

    /// Mark a bound endpoint ready to accept; `None` uses [`max_backlog`]
    fn start_listening(&self, endpoint: &Self::Endpoint, backlog: Option<i32>) -> Result<(), TransportError>;

    /// Block until a pending connection exists
    fn accept_next(&self, listening: &Self::Endpoint) -> Result<(Self::Endpoint, SocketAddrV4), TransportError>;

    /// Make a blocked or later `accept_next` on `listening` fail
    ///
    /// Callable from another thread while `accept_next` is blocked.
    fn stop_accepting(&self, listening: &Self::Endpoint) -> io::Result<()>;

    /// Allocate an unconnected stream endpoint
    fn create_client_endpoint(&self) -> Result<Self::Endpoint, TransportError>;

    /// Block until the handshake with `target` completes or fails
    fn connect(&self, endpoint: &Self::Endpoint, target: SocketAddrV4) -> Result<(), TransportError>;

    /// Release an endpoint
    ///
    /// Consumes the endpoint, so a handle can never be released twice.
    fn close(&self, endpoint: Self::Endpoint) {
        drop(endpoint);
    }
}

impl StreamEndpoint for Endpoint {
    fn send(&self, data: &[u8]) -> io::Result<usize> {
        let n = Endpoint::send(self, data)?;
        trace!("sent {} of {} bytes", n, data.len());
        Ok(n)
    }

    fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        let n = Endpoint::recv(self, buf)?;
        trace!("received {} bytes", n);
        Ok(n)
    }

    fn local_addr(&self) -> io::Result<SocketAddrV4> {
        Endpoint::local_addr(self)
    }

    fn shutdown(&self) -> io::Result<()> {
        Endpoint::shutdown(self)
    }
}

/// [`EndpointFactory`] backed by real IPv4 sockets
#[derive(Debug, Clone, Copy, Default)]
pub struct SocketFactory;

impl SocketFactory {
    pub fn new() -> Self {
        SocketFactory
    }
}

impl EndpointFactory for SocketFactory {
    type Endpoint = Endpoint;

    fn create_listening_endpoint(&self, bound: &BoundAddress) -> Result<Endpoint, TransportError> {
        // Both creation and bind failures are bind failures for a listener
        let endpoint = Endpoint::new(TransportKind::Stream).map_err(TransportError::BindFailure)?;
        endpoint
            .bind(bound.socket_addr())
            .map_err(TransportError::BindFailure)?;
        debug!("bound stream endpoint to {}", bound);
        Ok(endpoint)
    }

    fn start_listening(&self, endpoint: &Endpoint, backlog: Option<i32>) -> Result<(), TransportError> {
        let backlog = backlog.unwrap_or_else(max_backlog);
        endpoint.listen(backlog).map_err(TransportError::ListenFailure)?;
        debug!("listening with backlog {}", backlog);
        Ok(())
    }

    fn accept_next(&self, listening: &Endpoint) -> Result<(Endpoint, SocketAddrV4), TransportError> {
        let (endpoint, peer) = listening.accept().map_err(TransportError::AcceptFailure)?;
        debug!("accepted connection from {}", peer);
        Ok((endpoint, peer))
    }

    fn stop_accepting(&self, listening: &Endpoint) -> io::Result<()> {
        listening.shutdown_read()
    }

    fn create_client_endpoint(&self) -> Result<Endpoint, TransportError> {
        Endpoint::new(TransportKind::Stream).map_err(TransportError::SocketCreateFailure)
    }

    fn connect(&self, endpoint: &Endpoint, target: SocketAddrV4) -> Result<(), TransportError> {
        endpoint.connect(target).map_err(TransportError::ConnectFailure)?;
        debug!("connected to {}", target);
        Ok(())
    }
}
