//! Wire protocol
//!
//! Defines the command set and the fixed-size header codec.

pub mod commands;
pub mod header;

pub use commands::Command;
pub use header::{HEADER_SIZE, Header, MAX_FILENAME, read_header, write_header};
