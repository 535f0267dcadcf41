//! Entities Layer: Transport Data Model
//!
//! Plain data shared by every layer of the transport workspace. Nothing in
//! this crate touches the operating system; the adapters layer turns these
//! descriptions into real endpoints and the use-case layer builds the
//! connection lifecycle on top of them.
//!
//! ## Overview
//!
//! - **Addresses**: [`BoundAddress`] describes where an endpoint listens,
//!   [`PeerAddress`] describes who is on the other end of a connection
//! - **Errors**: [`TransportError`] is the single failure taxonomy
//! - **Receive results**: [`Received`] separates data from end-of-stream
//! - **Readiness**: [`Subsystem`] reports whether the networking stack is up
//! - **Configuration**: [`ListenerConfig`] for port, binding and backlog

pub mod address;
pub mod config;
pub mod error;
pub mod received;
pub mod subsystem;

pub use address::{AddressFamily, BoundAddress, HostPattern, PeerAddress, TransportKind};
pub use config::ListenerConfig;
pub use error::TransportError;
pub use received::Received;
pub use subsystem::Subsystem;
