//! Connection Module
//!
//! One established stream plus its resolved address. A `Connection` is
//! either open and usable or closed: closing releases the endpoint at once,
//! even while other threads still hold the `Connection`, and the endpoint is
//! released exactly once.

use std::io;
use std::net::SocketAddrV4;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use adapters_socket::{
    target_address, Endpoint, EndpointFactory, PeerResolver, SocketFactory, StreamEndpoint,
    SystemResolver,
};
use entities_transport::{PeerAddress, Received, TransportError};
use log::{debug, warn};

/// A connection over real TCP sockets
pub type TcpConnection = Connection<Endpoint>;

/// Resolve `addr`, falling back to numeric strings on failure
pub(crate) fn resolve_or_numeric<R>(resolver: &R, addr: SocketAddrV4) -> PeerAddress
where
    R: PeerResolver + ?Sized,
{
    match resolver.resolve(addr) {
        Ok(peer) => peer,
        Err(e) => {
            warn!("address resolution for {} failed, using numeric form: {}", addr, e);
            PeerAddress::numeric(addr)
        }
    }
}

/// An established stream connection
pub struct Connection<E: StreamEndpoint> {
    // Emptied by `close`; readers hold the read lock for the whole call
    endpoint: RwLock<Option<E>>,
    peer: PeerAddress,
    client: bool,
    closed: AtomicBool,
}

impl<E: StreamEndpoint> Connection<E> {
    /// Wrap an endpoint produced by `accept`
    ///
    /// Never fails: if the peer cannot be resolved the numeric address is
    /// used for the presentation strings.
    pub fn accepted<R>(endpoint: E, raw_peer: SocketAddrV4, resolver: &R) -> Self
    where
        R: PeerResolver + ?Sized,
    {
        let peer = resolve_or_numeric(resolver, raw_peer);
        debug!("connection from {}", peer);
        Self {
            endpoint: RwLock::new(Some(endpoint)),
            peer,
            client: false,
            closed: AtomicBool::new(false),
        }
    }

    /// Open a client connection to `host:port`
    ///
    /// Creates an endpoint, performs the handshake and then resolves the
    /// endpoint's own local address. Any failure is reported as
    /// `ConnectionEstablishFailure` and the endpoint is released before
    /// returning.
    pub fn connect<F, R>(factory: &F, resolver: &R, host: &str, port: u16) -> Result<Self, TransportError>
    where
        F: EndpointFactory<Endpoint = E> + ?Sized,
        R: PeerResolver + ?Sized,
    {
        let target = target_address(host, port).map_err(establish_failure)?;
        Self::connect_to(factory, resolver, target)
    }

    /// Open a client connection to an already parsed address
    pub fn connect_to<F, R>(factory: &F, resolver: &R, target: SocketAddrV4) -> Result<Self, TransportError>
    where
        F: EndpointFactory<Endpoint = E> + ?Sized,
        R: PeerResolver + ?Sized,
    {
        let endpoint = factory.create_client_endpoint().map_err(establish_failure)?;

        // On any error below `endpoint` is dropped, closing the handle
        factory.connect(&endpoint, target).map_err(establish_failure)?;
        let local = endpoint
            .local_addr()
            .map_err(|e| establish_failure(TransportError::ConnectFailure(e)))?;

        let peer = resolve_or_numeric(resolver, local);
        debug!("connected to {} from {}", target, peer);
        Ok(Self {
            endpoint: RwLock::new(Some(endpoint)),
            peer,
            client: true,
            closed: AtomicBool::new(false),
        })
    }

    /// Write all of `data`
    ///
    /// Loops over partial writes. A failure part way through is returned as
    /// `SendFailure`; the connection should then be dropped.
    pub fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        self.with_endpoint(|endpoint| {
            let mut written = 0;
            while written < data.len() {
                match endpoint.send(&data[written..]) {
                    Ok(0) => {
                        return Err(TransportError::SendFailure(io::Error::new(
                            io::ErrorKind::WriteZero,
                            "endpoint accepted no bytes",
                        )))
                    }
                    Ok(n) => written += n,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(_) if self.is_closed() => return Err(TransportError::ConnectionClosed),
                    Err(e) => return Err(TransportError::SendFailure(e)),
                }
            }
            Ok(())
        })
    }

    /// Block until data arrives, the peer closes, or an error occurs
    ///
    /// `buf` is zeroed before the read, so bytes past the returned length
    /// never hold data from an earlier call.
    pub fn receive(&self, buf: &mut [u8]) -> Result<Received, TransportError> {
        self.with_endpoint(|endpoint| {
            if buf.is_empty() {
                return Err(TransportError::ReceiveFailure(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "receive buffer has no capacity",
                )));
            }

            buf.fill(0);
            loop {
                match endpoint.recv(buf) {
                    // A local close wakes the reader with a zero-length read
                    Ok(0) if self.is_closed() => return Err(TransportError::ConnectionClosed),
                    Ok(0) => return Ok(Received::EndOfStream),
                    Ok(n) => return Ok(Received::Data(n)),
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(_) if self.is_closed() => return Err(TransportError::ConnectionClosed),
                    Err(e) => return Err(TransportError::ReceiveFailure(e)),
                }
            }
        })
    }

    /// Shut the stream down and release the endpoint
    ///
    /// Threads blocked in `send` or `receive` wake up with
    /// `ConnectionClosed`, and so does every later call. The handle is
    /// released before `close` returns, whoever else still holds this
    /// connection.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        // Wake blocked callers first so they give up the read lock
        if let Some(endpoint) = self.endpoint.read().unwrap_or_else(PoisonError::into_inner).as_ref() {
            if let Err(e) = endpoint.shutdown() {
                // The peer may already have torn the stream down
                if e.kind() != io::ErrorKind::NotConnected {
                    warn!("shutdown of connection {} failed: {}", self.peer, e);
                }
            }
        }

        let released = self
            .endpoint
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(released);
        debug!("closed connection {}", self.peer);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Resolved address of this connection
    ///
    /// For accepted connections this is the remote peer. For client
    /// connections it is this end's own local address, resolved after the
    /// handshake.
    pub fn peer(&self) -> &PeerAddress {
        &self.peer
    }

    /// Whether this connection was opened with [`connect`](Connection::connect)
    pub fn is_client(&self) -> bool {
        self.client
    }

    fn with_endpoint<T, G>(&self, op: G) -> Result<T, TransportError>
    where
        G: FnOnce(&E) -> Result<T, TransportError>,
    {
        let slot = self.endpoint.read().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            Some(endpoint) if !self.is_closed() => op(endpoint),
            _ => Err(TransportError::ConnectionClosed),
        }
    }
}

impl TcpConnection {
    /// Connect to `host:port` over TCP using the system resolver
    pub fn open(host: &str, port: u16) -> Result<Self, TransportError> {
        Self::connect(&SocketFactory::new(), &SystemResolver::new(), host, port)
    }
}

impl<E: StreamEndpoint> Drop for Connection<E> {
    fn drop(&mut self) {
        debug!("releasing connection {}", self.peer);
    }
}

impl<E: StreamEndpoint> std::fmt::Debug for Connection<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("peer", &self.peer)
            .field("client", &self.client)
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn establish_failure(err: TransportError) -> TransportError {
    TransportError::ConnectionEstablishFailure(Box::new(err))
}
