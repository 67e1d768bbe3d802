//! Error types
//!
//! Defines domain-specific error types for each layer of the transfer protocol.

use std::fmt;
use std::io;

/// Header codec errors
#[derive(Debug, PartialEq, Eq)]
pub enum ProtocolError {
    /// Fewer bytes than a full header were available.
    MalformedHeader { received: usize },
    UnknownCommand(u32),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::MalformedHeader { received } => write!(
                f,
                "Malformed header: got {} of {} bytes",
                received,
                crate::protocol::HEADER_SIZE
            ),
            ProtocolError::UnknownCommand(value) => write!(f, "Unknown command: {}", value),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Transfer engine errors
#[derive(Debug)]
pub enum TransferError {
    FileNotFound(String),
    PermissionDenied(String),
    InvalidFilename(String),
    FileTooLarge(u64),
    /// The peer went away (or the local file ran short) before the declared size was reached.
    TransferIncomplete { received: u64, expected: u64 },
    /// Local file I/O failure.
    Io(io::Error),
    /// Write failure on the connection itself.
    Connection(io::Error),
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferError::FileNotFound(p) => write!(f, "File not found: {}", p),
            TransferError::PermissionDenied(p) => write!(f, "Permission denied: {}", p),
            TransferError::InvalidFilename(p) => write!(f, "Invalid filename: {:?}", p),
            TransferError::FileTooLarge(size) => {
                write!(f, "File too large: {} bytes (max {})", size, u32::MAX)
            }
            TransferError::TransferIncomplete { received, expected } => write!(
                f,
                "Transfer incomplete: {} of {} bytes",
                received, expected
            ),
            TransferError::Io(e) => write!(f, "IO error: {}", e),
            TransferError::Connection(e) => write!(f, "Connection lost: {}", e),
        }
    }
}

impl std::error::Error for TransferError {}

impl From<io::Error> for TransferError {
    fn from(error: io::Error) -> Self {
        TransferError::Io(error)
    }
}

impl TransferError {
    /// Maps an error from opening or stat-ing `path` onto the matching variant.
    pub fn from_open(path: &str, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => TransferError::FileNotFound(path.to_string()),
            io::ErrorKind::PermissionDenied => TransferError::PermissionDenied(path.to_string()),
            _ => TransferError::Io(error),
        }
    }
}

/// General error that encompasses every failure the server and client can hit
#[derive(Debug)]
pub enum ServerError {
    /// Socket bind/connect failure for the given address.
    Connection(String, io::Error),
    Accept(io::Error),
    Config(config::ConfigError),
    Protocol(ProtocolError),
    Transfer(TransferError),
    Io(io::Error),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Connection(addr, e) => write!(f, "Connection error on {}: {}", addr, e),
            ServerError::Accept(e) => write!(f, "Accept error: {}", e),
            ServerError::Config(e) => write!(f, "Configuration error: {}", e),
            ServerError::Protocol(e) => write!(f, "Protocol error: {}", e),
            ServerError::Transfer(e) => write!(f, "Transfer error: {}", e),
            ServerError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerError::Connection(_, e) | ServerError::Accept(e) | ServerError::Io(e) => Some(e),
            ServerError::Config(e) => Some(e),
            ServerError::Protocol(e) => Some(e),
            ServerError::Transfer(e) => Some(e),
        }
    }
}

impl From<ProtocolError> for ServerError {
    fn from(error: ProtocolError) -> Self {
        ServerError::Protocol(error)
    }
}

impl From<TransferError> for ServerError {
    fn from(error: TransferError) -> Self {
        ServerError::Transfer(error)
    }
}

impl From<config::ConfigError> for ServerError {
    fn from(error: config::ConfigError) -> Self {
        ServerError::Config(error)
    }
}

impl From<io::Error> for ServerError {
    fn from(error: io::Error) -> Self {
        ServerError::Io(error)
    }
}
