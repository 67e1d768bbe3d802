//! TCP file transfer
//!
//! A fixed 268-byte header followed by a raw payload, over one persistent
//! connection per client. Four commands: UPLOAD, LIST, DOWNLOAD, EXIT.

pub mod client;
pub mod config;
pub mod error;
pub mod listing;
pub mod protocol;
pub mod server;
pub mod session;
pub mod storage;
pub mod transfer;
pub mod utils;

pub use client::Client;
pub use config::ServerConfig;
pub use server::Server;
