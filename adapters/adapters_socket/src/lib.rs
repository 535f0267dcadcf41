//! Adapters Layer: Socket Endpoints
//!
//! Turns the transport data model into real operating-system sockets using
//! the `socket2` crate. Everything here is blocking: a call returns when the
//! kernel has finished the operation or reported an error.
//!
//! ## Overview
//!
//! The `adapters_socket` crate provides:
//! - **Endpoints**: [`Endpoint`] owns exactly one OS socket and closes it on drop
//! - **Endpoint factory**: [`EndpointFactory`] and its socket-backed
//!   implementation [`SocketFactory`] (bind, listen, accept, connect)
//! - **Peer resolution**: [`PeerResolver`] and the `getnameinfo`-backed
//!   [`SystemResolver`]
//! - **Subsystem gate**: [`NetworkSubsystem`] start/stop flag
//! - **Datagrams**: [`DatagramEndpoint`] for connectionless send-to/receive-from
//!
//! ## See Also
//!
//! - [`entities_transport`](../entities_transport/index.html): addresses and errors

pub mod factory;
pub mod resolver;
pub mod socket;
pub mod subsystem;
pub mod udp;

pub use factory::{max_backlog, EndpointFactory, SocketFactory, StreamEndpoint};
pub use resolver::{PeerResolver, SystemResolver};
pub use socket::{target_address, Endpoint};
pub use subsystem::NetworkSubsystem;
pub use udp::DatagramEndpoint;
