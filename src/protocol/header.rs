//! Module `header`
//!
//! The fixed-size command header that precedes every command and every
//! sized payload on the wire.
//!
//! Layout (all integers big-endian):
//!
//! | offset | size | field          |
//! |--------|------|----------------|
//! | 0      | 4    | `command`      |
//! | 4      | 4    | `file_size`    |
//! | 8      | 4    | `filename_len` |
//! | 12     | 256  | `filename`, NUL-terminated |

use log::debug;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{ProtocolError, ServerError, TransferError};
use crate::protocol::Command;

pub const MAX_FILENAME: usize = 256;
pub const HEADER_SIZE: usize = 12 + MAX_FILENAME;

/// One decoded header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub command: Command,
    pub file_size: u32,
    pub filename: String,
    /// Set when the filename field was not valid UTF-8 and `filename` is a lossy copy.
    lossy: bool,
}

impl Header {
    /// Creates a header, truncating `filename` so it fits the fixed field with its NUL.
    pub fn new(command: Command, file_size: u32, filename: &str) -> Self {
        Self {
            command,
            file_size,
            filename: truncate_filename(filename).to_string(),
            lossy: false,
        }
    }

    /// A header with no file attached (LIST, EXIT, or a DOWNLOAD request before the name is set).
    pub fn command_only(command: Command) -> Self {
        Self::new(command, 0, "")
    }

    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        let name = truncate_filename(&self.filename).as_bytes();

        buf[0..4].copy_from_slice(&self.command.as_u32().to_be_bytes());
        buf[4..8].copy_from_slice(&self.file_size.to_be_bytes());
        buf[8..12].copy_from_slice(&(name.len() as u32).to_be_bytes());
        buf[12..12 + name.len()].copy_from_slice(name);
        buf
    }

    /// Decodes the first `HEADER_SIZE` bytes of `buf`.
    ///
    /// The filename is read up to its first NUL; `filename_len` is not trusted.
    pub fn decode(buf: &[u8]) -> Result<Self, ProtocolError> {
        if buf.len() < HEADER_SIZE {
            return Err(ProtocolError::MalformedHeader {
                received: buf.len(),
            });
        }

        let command = Command::from(read_u32(&buf[0..4]));
        let file_size = read_u32(&buf[4..8]);
        let declared_len = read_u32(&buf[8..12]);

        let field = &buf[12..HEADER_SIZE];
        let end = field.iter().position(|&b| b == 0).unwrap_or(MAX_FILENAME);
        let (filename, lossy) = match std::str::from_utf8(&field[..end]) {
            Ok(name) => (name.to_string(), false),
            Err(_) => (String::from_utf8_lossy(&field[..end]).into_owned(), true),
        };

        if declared_len as usize != end {
            debug!(
                "filename_len {} disagrees with filename field ({} bytes); ignoring it",
                declared_len, end
            );
        }

        Ok(Self {
            command,
            file_size,
            filename,
            lossy,
        })
    }

    /// The filename, or `InvalidFilename` if it did not arrive as UTF-8.
    ///
    /// A lossy name would store or serve a different file than the peer asked for.
    pub fn name(&self) -> Result<&str, TransferError> {
        if self.lossy {
            return Err(TransferError::InvalidFilename(self.filename.clone()));
        }
        Ok(&self.filename)
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Longest prefix of `name` that fits in the field with a trailing NUL,
/// cut on a character boundary.
fn truncate_filename(name: &str) -> &str {
    let name = name.split('\0').next().unwrap_or("");
    if name.len() < MAX_FILENAME {
        return name;
    }
    let mut end = MAX_FILENAME - 1;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

/// Reads one header from the connection.
///
/// Returns `Ok(None)` when the peer closed the connection before sending
/// anything, and `MalformedHeader` when it closed part way through one.
pub async fn read_header<R>(conn: &mut R) -> Result<Option<Header>, ServerError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; HEADER_SIZE];
    let mut filled = 0;

    while filled < HEADER_SIZE {
        let n = conn.read(&mut buf[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(ProtocolError::MalformedHeader { received: filled }.into());
        }
        filled += n;
    }

    Ok(Some(Header::decode(&buf)?))
}

/// Writes one header as a single unit.
pub async fn write_header<W>(conn: &mut W, header: &Header) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    conn.write_all(&header.encode()).await?;
    conn.flush().await
}
