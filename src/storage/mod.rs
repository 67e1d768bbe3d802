//! File system storage
//!
//! Path handling shared by the server and the client.

pub mod validation;

pub use validation::{resolve_filename, wire_name};
