//! Telemetry: structured logging setup.
//!
//! The library itself only emits `tracing` events and `metrics` counters;
//! binaries decide where they go by calling [`init_logging`] once at startup.
//!
//! # Example
//!
//! ```rust,no_run
//! use cutline_core::telemetry::{init_logging, LoggingConfig};
//!
//! init_logging(&LoggingConfig::default()).expect("Failed to initialize logging");
//! ```

pub mod logging;

pub use logging::{init_logging, LogFormat, LoggingConfig};
