//! Session state machine
//!
//! Per-connection command loop on the server side.

pub mod handler;
pub mod state;

pub use handler::Session;
pub use state::SessionState;
