//! Shared infrastructure for the Lotus Directory Engine binaries.

pub mod logging;

pub use logging::{init_logging, LogFormat};
