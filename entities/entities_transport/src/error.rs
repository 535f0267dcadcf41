//! Error Module
//!
//! The failure taxonomy for every transport operation. Each variant that
//! comes from the operating system carries the original `io::Error`, so the
//! platform error code is never lost.

use std::io;
use thiserror::Error;

/// Transport error types
#[derive(Debug, Error)]
pub enum TransportError {
    /// The networking subsystem has not been started
    #[error("transport subsystem is not online")]
    SubsystemNotReady,
    /// Socket creation or bind failed for a listening/bound endpoint
    #[error("failed to bind endpoint: {0}")]
    BindFailure(#[source] io::Error),
    /// `listen(2)` failed on a bound endpoint
    #[error("failed to start listening: {0}")]
    ListenFailure(#[source] io::Error),
    /// `accept(2)` failed
    #[error("failed to accept connection: {0}")]
    AcceptFailure(#[source] io::Error),
    /// Allocating an unbound socket failed
    #[error("failed to create socket: {0}")]
    SocketCreateFailure(#[source] io::Error),
    /// The connect handshake failed
    #[error("failed to connect: {0}")]
    ConnectFailure(#[source] io::Error),
    /// A client-side connection could not be established
    #[error("failed to establish connection: {0}")]
    ConnectionEstablishFailure(#[source] Box<TransportError>),
    /// A listener could not be created
    #[error("failed to create listener: {0}")]
    ListenerCreateFailure(#[source] Box<TransportError>),
    #[error("send failed: {0}")]
    SendFailure(#[source] io::Error),
    #[error("receive failed: {0}")]
    ReceiveFailure(#[source] io::Error),
    /// Reverse lookup of a peer address failed
    #[error("address resolution failed ({code}): {message}")]
    ResolutionFailure { code: i32, message: String },
    /// A textual address could not be parsed
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    /// The connection was closed locally
    #[error("connection is closed")]
    ConnectionClosed,
}

impl TransportError {
    /// Innermost error, looking through the wrapper variants
    pub fn root(&self) -> &TransportError {
        match self {
            TransportError::ConnectionEstablishFailure(inner)
            | TransportError::ListenerCreateFailure(inner) => inner.root(),
            other => other,
        }
    }

    /// The underlying platform error code, if the failure came from the OS
    pub fn os_code(&self) -> Option<i32> {
        match self.root() {
            TransportError::BindFailure(e)
            | TransportError::ListenFailure(e)
            | TransportError::AcceptFailure(e)
            | TransportError::SocketCreateFailure(e)
            | TransportError::ConnectFailure(e)
            | TransportError::SendFailure(e)
            | TransportError::ReceiveFailure(e) => e.raw_os_error(),
            TransportError::ResolutionFailure { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// The `io::ErrorKind` of the underlying OS failure
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self.root() {
            TransportError::BindFailure(e)
            | TransportError::ListenFailure(e)
            | TransportError::AcceptFailure(e)
            | TransportError::SocketCreateFailure(e)
            | TransportError::ConnectFailure(e)
            | TransportError::SendFailure(e)
            | TransportError::ReceiveFailure(e) => Some(e.kind()),
            _ => None,
        }
    }

    /// True when the peer reset the connection
    pub fn is_connection_reset(&self) -> bool {
        matches!(
            self.io_kind(),
            Some(io::ErrorKind::ConnectionReset) | Some(io::ErrorKind::BrokenPipe)
        )
    }
}
