//! Module `commands`
//!
//! Defines the four protocol commands and their numeric wire values.

use std::fmt;

/// A command carried in the `command` field of a header.
///
/// Values outside 1..=4 survive decoding as `Unknown` so the session
/// can report them instead of the codec rejecting the whole header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Upload,
    List,
    Download,
    Exit,
    Unknown(u32),
}

pub const CMD_UPLOAD: u32 = 1;
pub const CMD_LIST: u32 = 2;
pub const CMD_DOWNLOAD: u32 = 3;
pub const CMD_EXIT: u32 = 4;

impl Command {
    pub fn as_u32(self) -> u32 {
        match self {
            Command::Upload => CMD_UPLOAD,
            Command::List => CMD_LIST,
            Command::Download => CMD_DOWNLOAD,
            Command::Exit => CMD_EXIT,
            Command::Unknown(value) => value,
        }
    }
}

impl From<u32> for Command {
    fn from(value: u32) -> Self {
        match value {
            CMD_UPLOAD => Command::Upload,
            CMD_LIST => Command::List,
            CMD_DOWNLOAD => Command::Download,
            CMD_EXIT => Command::Exit,
            other => Command::Unknown(other),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Upload => write!(f, "UPLOAD"),
            Command::List => write!(f, "LIST"),
            Command::Download => write!(f, "DOWNLOAD"),
            Command::Exit => write!(f, "EXIT"),
            Command::Unknown(value) => write!(f, "UNKNOWN({})", value),
        }
    }
}
