//! Potentiostat control core.
//!
//! Firmware for a water-quality potentiostat shield: runs cyclic/linear
//! sweep and differential-pulse voltammetry over a MAX5217 DAC and ADS1115
//! ADC, commanded over serial.
//!
//! Hexagonal layout: the command grammar, validator, waveform engine,
//! sampling scheduler, and experiment runner are pure and host-testable;
//! hardware sits behind the port traits in [`app::ports`] and only the
//! `adapters`/`drivers` outer ring (gated on `target_os = "espidf"`)
//! touches ESP-IDF.
//!
//! ```text
//!  serial ──▶ command ──▶ experiment::validate ──▶ CompiledProgram
//!                                                       │
//!  output tick ──▶ runner ──▶ waveform ──▶ DAC          │
//!  sample tick ──▶ runner ──▶ ADC ──▶ telemetry ◀───────┘
//! ```

pub mod adapters;
pub mod app;
pub mod command;
pub mod config;
pub mod drivers;
pub mod error;
pub mod experiment;
pub mod runner;
pub mod sampling;
pub mod telemetry;
pub mod ticks;
pub mod waveform;

pub use error::{Error, Result};
