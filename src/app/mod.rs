//! Application layer: hardware-agnostic port traits.
//!
//! The runner and consumer loop are written against these traits only;
//! concrete ESP-IDF adapters live in [`crate::adapters`] and
//! [`crate::drivers`], and the integration tests substitute mocks.

pub mod ports;
