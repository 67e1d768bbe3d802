//! Module `file_ops`
//!
//! Moves file bytes over a connection once a header has declared their length.
//! Payloads are pushed in chunks of at most `buffer_size` bytes with no
//! per-chunk acknowledgment, and are never held in memory whole.

use log::{debug, error, info, warn};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::TransferError;
use crate::protocol::{Command, Header, write_header};
use crate::storage::wire_name;
use crate::transfer::Progress;

pub const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Size of the next read: never past the end of the payload.
fn next_chunk(buffer_len: usize, remaining: u64) -> usize {
    usize::try_from(remaining).map_or(buffer_len, |r| r.min(buffer_len))
}

/// Sends the file at `path`: a header stamped with `command`, then its bytes.
///
/// The file is opened and measured before anything is written, so a missing
/// or unreadable file leaves the connection untouched. Returns the number of
/// payload bytes sent.
pub async fn send_file<W>(
    conn: &mut W,
    path: &Path,
    command: Command,
    buffer_size: usize,
) -> Result<u64, TransferError>
where
    W: AsyncWrite + Unpin,
{
    let display = path.display().to_string();

    let mut file = File::open(path)
        .await
        .map_err(|e| TransferError::from_open(&display, e))?;
    let metadata = file.metadata().await?;
    if !metadata.is_file() {
        return Err(TransferError::FileNotFound(display));
    }
    let size = metadata.len();
    let file_size = u32::try_from(size).map_err(|_| TransferError::FileTooLarge(size))?;

    let header = Header::new(command, file_size, &wire_name(path));
    write_header(conn, &header)
        .await
        .map_err(TransferError::Connection)?;

    info!("Sending file: {} ({} bytes)", display, file_size);

    let expected = u64::from(file_size);
    let mut buffer = vec![0u8; buffer_size.max(1)];
    let mut total_bytes_sent = 0u64;

    while total_bytes_sent < expected {
        let want = next_chunk(buffer.len(), expected - total_bytes_sent);
        // Past the header a local read failure can only end the stream short.
        let n = match file.read(&mut buffer[..want]).await {
            Ok(n) => n,
            Err(e) => {
                error!("Read error on {}: {}", display, e);
                0
            }
        };
        if n == 0 {
            break;
        }
        conn.write_all(&buffer[..n])
            .await
            .map_err(TransferError::Connection)?;
        total_bytes_sent += n as u64;
    }

    conn.flush().await.map_err(TransferError::Connection)?;

    if total_bytes_sent < expected {
        warn!(
            "{} ended early while sending: {} of {} bytes",
            display, total_bytes_sent, expected
        );
        return Err(TransferError::TransferIncomplete {
            received: total_bytes_sent,
            expected,
        });
    }

    info!(
        "File sent successfully: {} ({} bytes)",
        display, total_bytes_sent
    );
    Ok(total_bytes_sent)
}

/// Receives exactly `expected_size` bytes into `path`, truncating it first.
///
/// An `expected_size` of 0 means the peer reported the file missing; nothing
/// is written. If the connection ends early the bytes received so far stay
/// on disk and `TransferIncomplete` is returned. `on_progress` is called after
/// every chunk.
pub async fn receive_file<R, F>(
    conn: &mut R,
    path: &Path,
    expected_size: u32,
    buffer_size: usize,
    mut on_progress: F,
) -> Result<u64, TransferError>
where
    R: AsyncRead + Unpin,
    F: FnMut(Progress),
{
    let display = path.display().to_string();
    if expected_size == 0 {
        return Err(TransferError::FileNotFound(display));
    }
    let expected = u64::from(expected_size);

    let mut file = match File::create(path).await {
        Ok(file) => file,
        Err(e) => {
            error!("Failed to create file {}: {}", display, e);
            discard_payload(conn, expected, buffer_size).await?;
            return Err(TransferError::from_open(&display, e));
        }
    };

    debug!("Receiving file: {} ({} bytes)", display, expected);

    let mut buffer = vec![0u8; buffer_size.max(1)];
    let mut total_received = 0u64;

    while total_received < expected {
        let want = next_chunk(buffer.len(), expected - total_received);
        let n = match conn.read(&mut buffer[..want]).await {
            Ok(n) => n,
            Err(e) => {
                warn!("Receive error on {}: {}", display, e);
                0
            }
        };

        if n == 0 {
            file.flush().await?;
            warn!(
                "Connection ended after {} of {} bytes; keeping partial {}",
                total_received, expected, display
            );
            return Err(TransferError::TransferIncomplete {
                received: total_received,
                expected,
            });
        }

        if let Err(e) = file.write_all(&buffer[..n]).await {
            error!("Failed to write to {}: {}", display, e);
            total_received += n as u64;
            discard_payload(conn, expected - total_received, buffer_size).await?;
            return Err(TransferError::Io(e));
        }

        total_received += n as u64;
        on_progress(Progress {
            received: total_received,
            expected,
        });
    }

    file.flush().await?;
    Ok(total_received)
}

/// Reads and drops `len` payload bytes so the next header stays aligned.
pub async fn discard_payload<R>(conn: &mut R, len: u64, buffer_size: usize) -> Result<(), TransferError>
where
    R: AsyncRead + Unpin,
{
    let mut buffer = vec![0u8; buffer_size.max(1)];
    let mut remaining = len;

    while remaining > 0 {
        let want = next_chunk(buffer.len(), remaining);
        let n = conn.read(&mut buffer[..want]).await.unwrap_or(0);
        if n == 0 {
            return Err(TransferError::TransferIncomplete {
                received: len - remaining,
                expected: len,
            });
        }
        remaining -= n as u64;
    }

    if len > 0 {
        debug!("Discarded {} payload bytes", len);
    }
    Ok(())
}
