//! Client side of the protocol
//!
//! Initiates UPLOAD, LIST, DOWNLOAD and EXIT over one connection.

pub mod operations;
pub mod results;

pub use operations::Client;
pub use results::DownloadOutcome;
