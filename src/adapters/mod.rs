//! Adapters binding the port traits to the platform.
//!
//! `time` builds everywhere (host tests use the `std::time::Instant` path);
//! the peripheral adapters only build on target.

pub mod time;

#[cfg(target_os = "espidf")]
pub mod hardware;
#[cfg(target_os = "espidf")]
pub mod serial;
