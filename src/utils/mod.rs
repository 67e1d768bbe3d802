//! Utility functions
//!
//! Provides logging setup shared by both binaries.

pub mod logging;

pub use logging::{LogConfig, setup_logging};
