//! Subsystem Readiness
//!
//! Components that need the networking stack receive a `&dyn Subsystem`
//! instead of reading a global, so tests can hand in a fake.

/// Reports whether the process-wide transport subsystem is online
pub trait Subsystem: Send + Sync {
    fn is_online(&self) -> bool;
}

impl<S: Subsystem + ?Sized> Subsystem for &S {
    fn is_online(&self) -> bool {
        (**self).is_online()
    }
}
