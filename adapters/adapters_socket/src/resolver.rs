//! Peer Resolver
//!
//! Reverse lookup of a peer's raw address into presentation strings.
//! Callers treat a failure here as cosmetic: the connection stays usable and
//! the numeric address is shown instead.

use std::net::SocketAddrV4;

use entities_transport::{PeerAddress, TransportError};

/// Converts a raw peer address into a host/service pair
pub trait PeerResolver: Send + Sync {
    fn resolve(&self, addr: SocketAddrV4) -> Result<PeerAddress, TransportError>;
}

/// [`PeerResolver`] backed by the system's `getnameinfo(3)`
///
/// Without a name for the host or service, `getnameinfo` itself falls back to
/// the numeric form, so the strings are never empty on success.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl SystemResolver {
    pub fn new() -> Self {
        SystemResolver
    }
}

impl PeerResolver for SystemResolver {
    fn resolve(&self, addr: SocketAddrV4) -> Result<PeerAddress, TransportError> {
        let (host, service) = name_info(addr)?;
        Ok(PeerAddress::new(addr, host, service))
    }
}

#[cfg(unix)]
fn name_info(addr: SocketAddrV4) -> Result<(String, String), TransportError> {
    use std::ffi::CStr;

    use socket2::SockAddr;

    const NI_MAXHOST: usize = 1025;
    const NI_MAXSERV: usize = 32;

    let raw = SockAddr::from(addr);
    let mut host = [0 as libc::c_char; NI_MAXHOST];
    let mut service = [0 as libc::c_char; NI_MAXSERV];

    let rc = unsafe {
        libc::getnameinfo(
            raw.as_ptr().cast(),
            raw.len(),
            host.as_mut_ptr(),
            NI_MAXHOST as libc::socklen_t,
            service.as_mut_ptr(),
            NI_MAXSERV as libc::socklen_t,
            0,
        )
    };

    if rc != 0 {
        let message = if rc == libc::EAI_SYSTEM {
            std::io::Error::last_os_error().to_string()
        } else {
            // Safety: gai_strerror returns a static NUL-terminated string
            unsafe { CStr::from_ptr(libc::gai_strerror(rc)) }
                .to_string_lossy()
                .into_owned()
        };
        return Err(TransportError::ResolutionFailure { code: rc, message });
    }

    // Safety: on success both buffers hold NUL-terminated strings
    let host = unsafe { CStr::from_ptr(host.as_ptr()) }.to_string_lossy().into_owned();
    let service = unsafe { CStr::from_ptr(service.as_ptr()) }.to_string_lossy().into_owned();
    Ok((host, service))
}

#[cfg(not(unix))]
fn name_info(_addr: SocketAddrV4) -> Result<(String, String), TransportError> {
    Err(TransportError::ResolutionFailure {
        code: -1,
        message: "reverse lookup is not supported on this platform".to_string(),
    })
}
