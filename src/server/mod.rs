//! Server core functionality
//!
//! Binds the listening socket and hands each accepted connection to its own
//! session task.

pub mod core;

pub use core::Server;
