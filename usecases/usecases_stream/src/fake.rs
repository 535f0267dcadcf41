//! In-memory endpoint factory and mocks for unit tests.
//!
//! Every [`FakeEndpoint`] bumps a shared live counter on creation and drops
//! it again in `Drop`, so tests can assert that no handle leaks.

use std::collections::VecDeque;
use std::io;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use adapters_socket::{EndpointFactory, PeerResolver, StreamEndpoint};
use entities_transport::{BoundAddress, PeerAddress, Subsystem, TransportError};
use mockall::mock;

mock! {
    pub Resolver {}
    impl PeerResolver for Resolver {
        fn resolve(&self, addr: SocketAddrV4) -> Result<PeerAddress, TransportError>;
    }
}

mock! {
    pub Gate {}
    impl Subsystem for Gate {
        fn is_online(&self) -> bool;
    }
}

pub fn online() -> MockGate {
    let mut gate = MockGate::new();
    gate.expect_is_online().return_const(true);
    gate
}

pub fn resolver_returning(host: &'static str, service: &'static str) -> MockResolver {
    let mut resolver = MockResolver::new();
    resolver
        .expect_resolve()
        .returning(move |addr| Ok(PeerAddress::new(addr, host, service)));
    resolver
}

pub fn peer(port: u16) -> SocketAddrV4 {
    SocketAddrV4::new(Ipv4Addr::new(192, 0, 2, 1), port)
}

/// One scripted outcome of a `recv` call
pub enum Inbound {
    Data(Vec<u8>),
    Fail(io::ErrorKind),
}

pub struct FakeEndpoint {
    live: Arc<AtomicUsize>,
    local: SocketAddrV4,
    inbound: Mutex<VecDeque<Inbound>>,
    sent: Arc<Mutex<Vec<u8>>>,
    max_write: usize,
    send_error: Option<io::ErrorKind>,
    shut: AtomicBool,
}

impl FakeEndpoint {
    pub fn sent(&self) -> Arc<Mutex<Vec<u8>>> {
        Arc::clone(&self.sent)
    }

    pub fn with_inbound(mut self, inbound: Vec<Inbound>) -> Self {
        self.inbound = Mutex::new(inbound.into());
        self
    }

    /// Accept at most `max_write` bytes per write call
    pub fn with_max_write(mut self, max_write: usize) -> Self {
        self.max_write = max_write;
        self
    }

    pub fn failing_sends(mut self, kind: io::ErrorKind) -> Self {
        self.send_error = Some(kind);
        self
    }
}

impl StreamEndpoint for FakeEndpoint {
    fn send(&self, data: &[u8]) -> io::Result<usize> {
        if let Some(kind) = self.send_error {
            return Err(io::Error::from(kind));
        }
        let n = data.len().min(self.max_write);
        self.sent.lock().unwrap().extend_from_slice(&data[..n]);
        Ok(n)
    }

    fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        if self.shut.load(Ordering::SeqCst) {
            return Ok(0);
        }
        match self.inbound.lock().unwrap().pop_front() {
            Some(Inbound::Data(bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                Ok(n)
            }
            Some(Inbound::Fail(kind)) => Err(io::Error::from(kind)),
            None => Ok(0),
        }
    }

    fn local_addr(&self) -> io::Result<SocketAddrV4> {
        Ok(self.local)
    }

    fn shutdown(&self) -> io::Result<()> {
        self.shut.store(true, Ordering::SeqCst);
        Ok(())
    }
}

impl Drop for FakeEndpoint {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Endpoint factory whose accept queue is filled by the test
#[derive(Default)]
pub struct FakeFactory {
    live: Arc<AtomicUsize>,
    pending: Mutex<VecDeque<(FakeEndpoint, SocketAddrV4)>>,
    fail_bind: bool,
    fail_listen: bool,
    fail_connect: bool,
}

impl FakeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_bind(mut self) -> Self {
        self.fail_bind = true;
        self
    }

    pub fn failing_listen(mut self) -> Self {
        self.fail_listen = true;
        self
    }

    pub fn failing_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    pub fn live(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.live)
    }

    pub fn live_count(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn endpoint(&self, local_port: u16) -> FakeEndpoint {
        self.live.fetch_add(1, Ordering::SeqCst);
        FakeEndpoint {
            live: Arc::clone(&self.live),
            local: SocketAddrV4::new(Ipv4Addr::LOCALHOST, local_port),
            inbound: Mutex::new(VecDeque::new()),
            sent: Arc::new(Mutex::new(Vec::new())),
            max_write: usize::MAX,
            send_error: None,
            shut: AtomicBool::new(false),
        }
    }

    /// Queue a connection for the next `accept_next`
    pub fn push_pending(&self, endpoint: FakeEndpoint, peer: SocketAddrV4) {
        self.pending.lock().unwrap().push_back((endpoint, peer));
    }
}

impl EndpointFactory for FakeFactory {
    type Endpoint = FakeEndpoint;

    fn create_listening_endpoint(&self, bound: &BoundAddress) -> Result<FakeEndpoint, TransportError> {
        if self.fail_bind {
            return Err(TransportError::BindFailure(io::Error::from(io::ErrorKind::AddrInUse)));
        }
        Ok(self.endpoint(bound.port()))
    }

    fn start_listening(&self, _endpoint: &FakeEndpoint, _backlog: Option<i32>) -> Result<(), TransportError> {
        if self.fail_listen {
            return Err(TransportError::ListenFailure(io::Error::from(io::ErrorKind::InvalidInput)));
        }
        Ok(())
    }

    fn accept_next(&self, listening: &FakeEndpoint) -> Result<(FakeEndpoint, SocketAddrV4), TransportError> {
        if listening.shut.load(Ordering::SeqCst) {
            return Err(TransportError::AcceptFailure(io::Error::from(io::ErrorKind::InvalidInput)));
        }
        self.pending
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TransportError::AcceptFailure(io::Error::from(io::ErrorKind::WouldBlock)))
    }

    fn stop_accepting(&self, listening: &FakeEndpoint) -> io::Result<()> {
        listening.shutdown()
    }

    fn create_client_endpoint(&self) -> Result<FakeEndpoint, TransportError> {
        Ok(self.endpoint(50_000))
    }

    fn connect(&self, _endpoint: &FakeEndpoint, _target: SocketAddrV4) -> Result<(), TransportError> {
        if self.fail_connect {
            return Err(TransportError::ConnectFailure(io::Error::from(io::ErrorKind::ConnectionRefused)));
        }
        Ok(())
    }
}
