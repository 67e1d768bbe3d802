//! Error handlers
//!
//! Decides how loudly an error is reported and whether it ends the current session.

use crate::error::types::{ProtocolError, ServerError, TransferError};
use log::{error, warn};

/// Log an error at a level matching its severity
pub fn handle_error(err: &ServerError) {
    match err {
        ServerError::Protocol(ProtocolError::UnknownCommand(_))
        | ServerError::Transfer(TransferError::FileNotFound(_))
        | ServerError::Transfer(TransferError::InvalidFilename(_)) => warn!("{}", err),
        _ => error!("{}", err),
    }
}

/// Whether the error leaves the connection unusable.
///
/// Local file failures only abort the current command; anything that broke the
/// socket itself ends the session.
pub fn is_fatal(err: &ServerError) -> bool {
    match err {
        ServerError::Connection(..) | ServerError::Config(_) | ServerError::Io(_) => true,
        ServerError::Accept(_) | ServerError::Protocol(_) => false,
        ServerError::Transfer(e) => matches!(
            e,
            TransferError::TransferIncomplete { .. } | TransferError::Connection(_)
        ),
    }
}
