//! Socket Module
//!
//! [`Endpoint`] is the owned OS socket underneath every listener, connection
//! and datagram endpoint. It always uses IPv4 and blocking mode. The handle is
//! closed exactly once, when the `Endpoint` is dropped.

use std::io::{self, Read};
use std::mem::MaybeUninit;
use std::net::{Ipv4Addr, Shutdown, SocketAddrV4};

use entities_transport::{AddressFamily, TransportError, TransportKind};
use log::debug;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};

#[cfg(unix)]
use std::os::unix::io::{AsRawFd, RawFd};

// Writes to a reset stream must surface as EPIPE, not kill the process.
#[cfg(any(
    target_os = "linux",
    target_os = "android",
    target_os = "freebsd",
    target_os = "dragonfly",
    target_os = "netbsd",
    target_os = "openbsd"
))]
const SEND_FLAGS: i32 = libc::MSG_NOSIGNAL;
// Apple targets set SO_NOSIGPIPE on the socket instead
#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "freebsd",
    target_os = "dragonfly",
    target_os = "netbsd",
    target_os = "openbsd"
)))]
const SEND_FLAGS: i32 = 0;

fn socket_type(kind: TransportKind) -> Type {
    match kind {
        TransportKind::Stream => Type::STREAM,
        TransportKind::Datagram => Type::DGRAM,
    }
}

fn socket_protocol(kind: TransportKind) -> Protocol {
    match kind {
        TransportKind::Stream => Protocol::TCP,
        TransportKind::Datagram => Protocol::UDP,
    }
}

fn ipv4_only(addr: SockAddr) -> io::Result<SocketAddrV4> {
    addr.as_socket_ipv4()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "address is not IPv4"))
}

/// Parse a dotted IPv4 host and a port into a target address
pub fn target_address(host: &str, port: u16) -> Result<SocketAddrV4, TransportError> {
    let ip: Ipv4Addr = host
        .trim()
        .parse()
        .map_err(|_| TransportError::InvalidAddress(host.to_string()))?;
    Ok(SocketAddrV4::new(ip, port))
}

/// An exclusively owned OS socket
pub struct Endpoint {
    inner: Socket,
    family: AddressFamily,
    kind: TransportKind,
}

impl Endpoint {
    /// Allocate a new, unbound socket
    ///
    /// # Arguments
    ///
    /// * `kind` - Stream (TCP) or Datagram (UDP)
    pub fn new(kind: TransportKind) -> io::Result<Self> {
        let inner = Socket::new(Domain::IPV4, socket_type(kind), Some(socket_protocol(kind)))?;

        #[cfg(any(target_os = "macos", target_os = "ios"))]
        if kind == TransportKind::Stream {
            inner.set_nosigpipe(true)?;
        }

        debug!("created {:?} endpoint", kind);
        Ok(Self {
            inner,
            family: AddressFamily::Ipv4,
            kind,
        })
    }

    pub fn bind(&self, addr: SocketAddrV4) -> io::Result<()> {
        self.inner.bind(&SockAddr::from(addr))
    }

    /// Put a bound stream endpoint into the accept-queue state
    pub fn listen(&self, backlog: i32) -> io::Result<()> {
        if self.kind != TransportKind::Stream {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "listen requires a stream endpoint",
            ));
        }
        self.inner.listen(backlog)
    }

    /// Block until a pending connection exists, then return it with the
    /// peer's raw address
    pub fn accept(&self) -> io::Result<(Endpoint, SocketAddrV4)> {
        if self.kind != TransportKind::Stream {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "accept requires a stream endpoint",
            ));
        }

        let (socket, addr) = self.inner.accept()?;
        let peer = ipv4_only(addr)?;

        let accepted = Endpoint {
            inner: socket,
            family: self.family,
            kind: self.kind,
        };
        Ok((accepted, peer))
    }

    /// Blocks until the handshake completes (stream) or sets the default
    /// destination (datagram)
    pub fn connect(&self, addr: SocketAddrV4) -> io::Result<()> {
        self.inner.connect(&SockAddr::from(addr))
    }

    pub fn local_addr(&self) -> io::Result<SocketAddrV4> {
        ipv4_only(self.inner.local_addr()?)
    }

    pub fn peer_addr(&self) -> io::Result<SocketAddrV4> {
        ipv4_only(self.inner.peer_addr()?)
    }

    /// Shut down both directions of a connected stream
    ///
    /// A thread blocked in [`recv`](Endpoint::recv) on this endpoint wakes up
    /// with end-of-stream. The handle itself stays allocated until drop.
    pub fn shutdown(&self) -> io::Result<()> {
        self.inner.shutdown(Shutdown::Both)
    }

    /// Shut down the receive side only
    ///
    /// On a listening endpoint this wakes a thread blocked in
    /// [`accept`](Endpoint::accept) with an error.
    pub fn shutdown_read(&self) -> io::Result<()> {
        self.inner.shutdown(Shutdown::Read)
    }

    /// One underlying write; may write fewer bytes than given
    pub fn send(&self, data: &[u8]) -> io::Result<usize> {
        self.inner.send_with_flags(data, SEND_FLAGS)
    }

    /// One underlying read; `Ok(0)` means the peer closed the stream
    pub fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        (&self.inner).read(buf)
    }

    pub fn send_to(&self, data: &[u8], addr: SocketAddrV4) -> io::Result<usize> {
        self.inner.send_to(data, &SockAddr::from(addr))
    }

    pub fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddrV4)> {
        // Convert &mut [u8] to &mut [MaybeUninit<u8>]
        let uninit_buf: &mut [MaybeUninit<u8>] = unsafe {
            std::slice::from_raw_parts_mut(buf.as_mut_ptr() as *mut MaybeUninit<u8>, buf.len())
        };

        // Safety: recv_from only writes initialized bytes into the buffer
        let (n, addr) = self.inner.recv_from(uninit_buf)?;
        Ok((n, ipv4_only(addr)?))
    }

    pub fn family(&self) -> AddressFamily {
        self.family
    }

    pub fn kind(&self) -> TransportKind {
        self.kind
    }

    #[cfg(unix)]
    pub fn as_raw_fd(&self) -> RawFd {
        self.inner.as_raw_fd()
    }

    /// Get the underlying socket2 socket
    pub fn inner(&self) -> &Socket {
        &self.inner
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("kind", &self.kind)
            .field("local", &self.local_addr().ok())
            .finish()
    }
}

impl Drop for Endpoint {
    fn drop(&mut self) {
        match self.local_addr() {
            Ok(addr) => debug!("closing {:?} endpoint {}", self.kind, addr),
            Err(_) => debug!("closing {:?} endpoint", self.kind),
        }
    }
}
