//! Listener Module
//!
//! Owns a listening endpoint and every connection it has accepted. The
//! accept loop is driven by the caller through
//! [`wait_for_connection`](Listener::wait_for_connection); another thread
//! can end a blocked wait with [`stop_accepting`](Listener::stop_accepting).
//!
//! Accepted connections are never removed: a peer that disconnects is
//! observed by whoever calls `receive`, not by the listener.

use std::io;
use std::mem::ManuallyDrop;
use std::net::SocketAddrV4;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use adapters_socket::{EndpointFactory, PeerResolver, SocketFactory, StreamEndpoint, SystemResolver};
use entities_transport::{BoundAddress, ListenerConfig, Subsystem, TransportError};
use log::{debug, info};

use crate::connection::Connection;

/// A listener over real TCP sockets
pub type TcpListener = Listener<SocketFactory, SystemResolver>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Accepts stream connections and keeps ownership of them
pub struct Listener<F: EndpointFactory, R: PeerResolver> {
    factory: F,
    resolver: R,
    bound: BoundAddress,
    // Taken exactly once, in `Drop`
    endpoint: ManuallyDrop<F::Endpoint>,
    connections: Mutex<Vec<Arc<Connection<F::Endpoint>>>>,
    // Held across `accept_next` so one accept is in flight at a time
    accepting: Mutex<()>,
}

impl<F: EndpointFactory, R: PeerResolver> Listener<F, R> {
    /// Bind and start listening on `port`
    ///
    /// # Arguments
    ///
    /// * `subsystem` - Must report online, otherwise `SubsystemNotReady`
    /// * `port` - Port to listen on (0 for an ephemeral port)
    /// * `loopback_only` - Accept connections from the local host only
    ///
    /// # Returns
    ///
    /// * `Ok(Listener)` - Listening, with the platform's maximum backlog
    /// * `Err(TransportError::ListenerCreateFailure)` - Bind or listen failed
    pub fn new(
        subsystem: &dyn Subsystem,
        factory: F,
        resolver: R,
        port: u16,
        loopback_only: bool,
    ) -> Result<Self, TransportError> {
        Self::with_config(subsystem, factory, resolver, ListenerConfig::new(port, loopback_only))
    }

    pub fn with_config(
        subsystem: &dyn Subsystem,
        factory: F,
        resolver: R,
        config: ListenerConfig,
    ) -> Result<Self, TransportError> {
        if !subsystem.is_online() {
            return Err(TransportError::SubsystemNotReady);
        }

        let bound = config.bound_address();
        let endpoint = factory
            .create_listening_endpoint(&bound)
            .map_err(|e| TransportError::ListenerCreateFailure(Box::new(e)))?;

        // A failed listen drops `endpoint` here, releasing the handle
        factory
            .start_listening(&endpoint, config.backlog)
            .map_err(|e| TransportError::ListenerCreateFailure(Box::new(e)))?;

        info!("listening on {}", bound);
        Ok(Self {
            factory,
            resolver,
            bound,
            endpoint: ManuallyDrop::new(endpoint),
            connections: Mutex::new(Vec::new()),
            accepting: Mutex::new(()),
        })
    }

    /// Block until a client connects, then return the new connection
    ///
    /// The connection is retained by the listener and also handed to the
    /// caller. A failed accept leaves the listener usable; call again.
    /// Concurrent callers are served one at a time.
    pub fn wait_for_connection(&self) -> Result<Arc<Connection<F::Endpoint>>, TransportError> {
        let _accepting = lock(&self.accepting);
        let (endpoint, raw_peer) = self.factory.accept_next(&self.endpoint)?;

        let connection = Arc::new(Connection::accepted(endpoint, raw_peer, &self.resolver));
        let mut connections = lock(&self.connections);
        connections.push(Arc::clone(&connection));
        debug!(
            "accepted connection #{} on {} from {}",
            connections.len(),
            self.bound,
            connection.peer()
        );
        Ok(connection)
    }

    /// Stop accepting connections
    ///
    /// A `wait_for_connection` blocked on another thread returns
    /// `AcceptFailure`, and so does every later call. Connections already
    /// accepted are not affected.
    pub fn stop_accepting(&self) -> io::Result<()> {
        self.factory.stop_accepting(&self.endpoint)?;
        debug!("listener on {} stopped accepting", self.bound);
        Ok(())
    }

    /// Connections accepted so far, in acceptance order
    pub fn connections(&self) -> Vec<Arc<Connection<F::Endpoint>>> {
        lock(&self.connections).clone()
    }

    pub fn connection_count(&self) -> usize {
        lock(&self.connections).len()
    }

    pub fn bound_address(&self) -> &BoundAddress {
        &self.bound
    }

    /// Actual local address; differs from the bound port when it was 0
    pub fn local_addr(&self) -> io::Result<SocketAddrV4> {
        self.endpoint.local_addr()
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }
}

impl TcpListener {
    /// Listen over TCP using the system resolver
    pub fn bind(subsystem: &dyn Subsystem, port: u16, loopback_only: bool) -> Result<Self, TransportError> {
        Self::new(subsystem, SocketFactory::new(), SystemResolver::new(), port, loopback_only)
    }
}

impl<F: EndpointFactory, R: PeerResolver> Drop for Listener<F, R> {
    fn drop(&mut self) {
        // SAFETY: `endpoint` is never used again after this point
        let endpoint = unsafe { ManuallyDrop::take(&mut self.endpoint) };
        self.factory.close(endpoint);

        let connections = std::mem::take(self.connections.get_mut().unwrap_or_else(PoisonError::into_inner));
        for connection in connections {
            connection.close();
        }
        debug!("listener on {} closed", self.bound);
    }
}
