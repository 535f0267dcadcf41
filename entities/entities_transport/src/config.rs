//! Listener Configuration
//!
//! Environment variables:
//! - `TRANSPORT_PORT`: port to listen on (default: 54000)
//! - `TRANSPORT_LOOPBACK_ONLY`: `1`/`true` binds to loopback only (default: false)
//! - `TRANSPORT_BACKLOG`: accept queue length (default: platform maximum)

use std::env;

use crate::address::BoundAddress;

pub const DEFAULT_PORT: u16 = 54000;

/// Settings for a stream listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerConfig {
    pub port: u16,
    pub loopback_only: bool,
    /// `None` uses the platform's maximum queue length
    pub backlog: Option<i32>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            loopback_only: false,
            backlog: None,
        }
    }
}

impl ListenerConfig {
    pub fn new(port: u16, loopback_only: bool) -> Self {
        Self {
            port,
            loopback_only,
            backlog: None,
        }
    }

    /// Read settings from the environment, keeping defaults for anything
    /// absent or unparsable
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = lookup("TRANSPORT_PORT")
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.port);

        let loopback_only = lookup("TRANSPORT_LOOPBACK_ONLY")
            .and_then(|s| parse_flag(&s))
            .unwrap_or(defaults.loopback_only);

        let backlog = lookup("TRANSPORT_BACKLOG")
            .and_then(|s| s.trim().parse().ok())
            .filter(|b: &i32| *b > 0)
            .or(defaults.backlog);

        Self {
            port,
            loopback_only,
            backlog,
        }
    }

    pub fn bound_address(&self) -> BoundAddress {
        BoundAddress::new(self.port, self.loopback_only)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
