//! Client result types
//!
//! Defines result structures returned by client operations.

/// Result of a download request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The file arrived; number of bytes written
    Received(u64),
    /// The server answered with a zero size
    NotFound,
}
