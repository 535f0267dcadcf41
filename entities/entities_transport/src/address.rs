//! Address Module
//!
//! Describes where endpoints are bound and who they are connected to.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddrV4};

/// Address family
///
/// Every endpoint in this design is IPv4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    /// IPv4
    Ipv4,
}

/// Transport kind of an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// Connection-oriented byte stream (TCP)
    Stream,
    /// Connectionless datagrams (UDP)
    Datagram,
}

/// Which local interfaces a bound endpoint accepts traffic on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostPattern {
    /// Every interface (`INADDR_ANY`)
    AnyInterface,
    /// Loopback only (`INADDR_LOOPBACK`)
    LoopbackOnly,
}

impl HostPattern {
    /// Pick the pattern for a `loopback_only` flag
    pub fn from_loopback_only(loopback_only: bool) -> Self {
        if loopback_only {
            HostPattern::LoopbackOnly
        } else {
            HostPattern::AnyInterface
        }
    }

    /// The IPv4 address this pattern binds to
    pub fn ip(self) -> Ipv4Addr {
        match self {
            HostPattern::AnyInterface => Ipv4Addr::UNSPECIFIED,
            HostPattern::LoopbackOnly => Ipv4Addr::LOCALHOST,
        }
    }
}

/// Where a listening or datagram endpoint is reachable
///
/// Immutable after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundAddress {
    family: AddressFamily,
    port: u16,
    host: HostPattern,
}

impl BoundAddress {
    /// Create a bound address for `port`
    ///
    /// Port 0 asks the operating system for an ephemeral port.
    pub fn new(port: u16, loopback_only: bool) -> Self {
        Self {
            family: AddressFamily::Ipv4,
            port,
            host: HostPattern::from_loopback_only(loopback_only),
        }
    }

    pub fn family(&self) -> AddressFamily {
        self.family
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn host(&self) -> HostPattern {
        self.host
    }

    pub fn is_loopback_only(&self) -> bool {
        self.host == HostPattern::LoopbackOnly
    }

    /// The socket address to hand to `bind(2)`
    pub fn socket_addr(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.host.ip(), self.port)
    }
}

impl fmt::Display for BoundAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.socket_addr())
    }
}

/// The resolved peer of a connection
///
/// Holds the raw address plus the presentation strings produced by reverse
/// lookup. When lookup fails the strings carry the numeric IP and port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerAddress {
    addr: SocketAddrV4,
    host: String,
    service: String,
}

impl PeerAddress {
    pub fn new(addr: SocketAddrV4, host: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            addr,
            host: host.into(),
            service: service.into(),
        }
    }

    /// Presentation strings built from the numbers alone
    pub fn numeric(addr: SocketAddrV4) -> Self {
        Self::new(addr, addr.ip().to_string(), addr.port().to_string())
    }

    pub fn addr(&self) -> SocketAddrV4 {
        self.addr
    }

    pub fn ip(&self) -> Ipv4Addr {
        *self.addr.ip()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Reverse-resolved host name (or numeric IP)
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Service name (or numeric port)
    pub fn service(&self) -> &str {
        &self.service
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", self.host, self.service)
    }
}
