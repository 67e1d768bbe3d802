//! Directory listing responder
//!
//! Streams a textual directory listing terminated by `END_OF_LIST\n`.

pub mod operations;
pub mod source;

pub use operations::{END_MARKER, END_OF_LIST, read_listing, send_listing};
pub use source::ListingSource;
