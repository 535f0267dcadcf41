//! Network Subsystem Gate
//!
//! A process-wide start/stop flag around the networking stack. Both calls
//! are idempotent. Components never read the flag directly; they are handed
//! a [`NetworkSubsystem`] through the [`Subsystem`] trait.

use std::sync::atomic::{AtomicBool, Ordering};

use entities_transport::{Subsystem, TransportError};
use log::debug;

/// Global subsystem state
static ONLINE: AtomicBool = AtomicBool::new(false);

/// Handle to the process-wide networking subsystem
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkSubsystem;

impl NetworkSubsystem {
    /// Bring the subsystem online
    ///
    /// Calling this again while online is a no-op. Must happen before any
    /// listener is constructed.
    pub fn start() -> Result<Self, TransportError> {
        if !ONLINE.swap(true, Ordering::AcqRel) {
            debug!("transport subsystem online");
        }
        Ok(NetworkSubsystem)
    }

    /// Take the subsystem offline
    ///
    /// Callers close their endpoints first. Calling this while offline is a
    /// no-op.
    pub fn stop() {
        if ONLINE.swap(false, Ordering::AcqRel) {
            debug!("transport subsystem offline");
        }
    }

    /// Whether [`start`](NetworkSubsystem::start) has run without a later stop
    pub fn is_started() -> bool {
        ONLINE.load(Ordering::Acquire)
    }
}

impl Subsystem for NetworkSubsystem {
    fn is_online(&self) -> bool {
        Self::is_started()
    }
}
