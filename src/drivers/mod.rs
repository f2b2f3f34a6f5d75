//! Peripheral drivers.
//!
//! The I2C converter drivers are generic over [`embedded_hal::i2c::I2c`] so
//! they test on the host against a scripted bus; the timer driver wraps
//! ESP-IDF's esp_timer API and only builds on target.

pub mod ads1115;
pub mod gain;
pub mod max5217;

#[cfg(target_os = "espidf")]
pub mod hw_timer;
