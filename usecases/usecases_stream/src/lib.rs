//! Use Cases Layer: Stream Connections
//!
//! Lifecycle management for connection-oriented transport.
//!
//! ## Overview
//!
//! - [`Listener`] owns a listening endpoint and every [`Connection`] it has
//!   accepted, in acceptance order. Dropping the listener closes the
//!   listening endpoint and then releases every retained connection.
//! - [`Connection`] owns one connected stream endpoint and its resolved
//!   address, and exposes blocking `send`/`receive`.
//!
//! Both are generic over [`EndpointFactory`](adapters_socket::EndpointFactory)
//! and [`PeerResolver`](adapters_socket::PeerResolver); [`TcpListener`] and
//! [`TcpConnection`] are the real-socket instantiations.
//!
//! ## Threading
//!
//! Nothing here spawns threads. A `Listener` can be shared: callers of
//! `wait_for_connection` are served one at a time, and `stop_accepting`
//! from another thread ends a blocked wait. Connections are handed out as
//! `Arc`s: one thread may `receive` while another `send`s on the same
//! connection, but concurrent senders must serialize themselves. `close`
//! releases the endpoint immediately, whoever still holds the `Arc`.

pub mod connection;
pub mod listener;

#[cfg(test)]
mod fake;

pub use connection::{Connection, TcpConnection};
pub use listener::{Listener, TcpListener};
