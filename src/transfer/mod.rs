//! Transfer engine
//!
//! Chunked send and receive of file payloads whose length a header has
//! already declared.

pub mod file_ops;
pub mod results;

pub use file_ops::{DEFAULT_BUFFER_SIZE, discard_payload, receive_file, send_file};
pub use results::Progress;
