//! Session states
//!
//! A session waits for a header, dispatches it, and goes back to waiting
//! until EXIT, a disconnect, or an error that broke the connection.

use std::fmt;

use crate::error::ServerError;
use crate::error::handlers::is_fatal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingCommand,
    Dispatching,
    Closed,
}

impl SessionState {
    /// Where a session goes once a command has finished with `outcome`.
    pub fn after(outcome: &Result<(), ServerError>) -> Self {
        match outcome {
            Err(e) if is_fatal(e) => SessionState::Closed,
            _ => SessionState::AwaitingCommand,
        }
    }

    pub fn is_closed(self) -> bool {
        self == SessionState::Closed
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::AwaitingCommand => write!(f, "AWAITING_COMMAND"),
            SessionState::Dispatching => write!(f, "DISPATCHING"),
            SessionState::Closed => write!(f, "CLOSED"),
        }
    }
}
