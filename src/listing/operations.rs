//! Listing operations
//!
//! Server side streams a listing followed by the end marker; client side
//! accumulates until it sees the marker.

use log::{error, info};
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::TransferError;
use crate::listing::ListingSource;

pub const END_MARKER: &[u8] = b"END_OF_LIST";
pub const END_OF_LIST: &[u8] = b"END_OF_LIST\n";

/// Streams the listing of `dir`, then `END_OF_LIST\n`.
///
/// The marker is written even when enumeration fails, so the reader is never
/// left waiting; only a broken connection is returned as an error.
pub async fn send_listing<W>(
    conn: &mut W,
    source: &ListingSource,
    dir: &Path,
) -> Result<(), TransferError>
where
    W: AsyncWrite + Unpin,
{
    match source.stream_to(conn, dir).await {
        Ok(count) => info!("Sent listing of {} ({} entries)", dir.display(), count),
        Err(e @ TransferError::Connection(_)) => return Err(e),
        Err(e) => error!("Failed to list {}: {}", dir.display(), e),
    }

    conn.write_all(END_OF_LIST)
        .await
        .map_err(TransferError::Connection)?;
    conn.flush().await.map_err(TransferError::Connection)
}

fn find_marker(haystack: &[u8], from: usize) -> Option<usize> {
    haystack[from..]
        .windows(END_MARKER.len())
        .position(|w| w == END_MARKER)
        .map(|pos| from + pos)
}

/// Reads a listing up to the end marker and returns the text before it.
///
/// Chunk boundaries are not line-aligned, so the marker is searched for in
/// everything accumulated so far. Bytes after the marker are dropped; the
/// marker's trailing newline is consumed so the next header starts clean.
pub async fn read_listing<R>(conn: &mut R, buffer_size: usize) -> Result<String, TransferError>
where
    R: AsyncRead + Unpin,
{
    let mut accumulated: Vec<u8> = Vec::new();
    let mut buffer = vec![0u8; buffer_size.max(1)];

    loop {
        let n = conn
            .read(&mut buffer)
            .await
            .map_err(TransferError::Connection)?;
        if n == 0 {
            return Err(TransferError::Connection(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed before end of listing",
            )));
        }

        // A marker may straddle the previous chunk.
        let search_from = accumulated.len().saturating_sub(END_MARKER.len() - 1);
        accumulated.extend_from_slice(&buffer[..n]);

        if let Some(pos) = find_marker(&accumulated, search_from) {
            if accumulated.len() == pos + END_MARKER.len() {
                let mut newline = [0u8; 1];
                conn.read_exact(&mut newline)
                    .await
                    .map_err(TransferError::Connection)?;
            }
            accumulated.truncate(pos);
            return Ok(String::from_utf8_lossy(&accumulated).into_owned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_listing_ends_with_single_marker() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"abc").unwrap();

        let (mut tx, mut rx) = tokio::io::duplex(64 * 1024);
        send_listing(&mut tx, &ListingSource::ReadDir, dir.path())
            .await
            .unwrap();
        drop(tx);

        let mut raw = Vec::new();
        rx.read_to_end(&mut raw).await.unwrap();
        let text = String::from_utf8(raw).unwrap();
        assert!(text.ends_with("END_OF_LIST\n"));
        assert_eq!(text.matches("END_OF_LIST").count(), 1);
        assert!(text.contains("a.txt"));
    }

    #[tokio::test]
    async fn test_failed_enumeration_still_sends_marker() {
        let dir = TempDir::new().unwrap();
        let (mut tx, mut rx) = tokio::io::duplex(1024);
        send_listing(&mut tx, &ListingSource::ReadDir, &dir.path().join("gone"))
            .await
            .unwrap();
        drop(tx);

        let mut raw = Vec::new();
        rx.read_to_end(&mut raw).await.unwrap();
        assert_eq!(raw, END_OF_LIST);
    }

    #[tokio::test]
    async fn test_reader_stops_at_marker_and_drops_trailing_bytes() {
        let (mut tx, mut rx) = tokio::io::duplex(1024);
        tx.write_all(b"file1\nfile2\nEND_OF_LIST\ngarbage")
            .await
            .unwrap();

        let listing = read_listing(&mut rx, 1024).await.unwrap();
        assert_eq!(listing, "file1\nfile2\n");
    }

    #[tokio::test]
    async fn test_reader_finds_marker_split_across_reads() {
        let (mut tx, mut rx) = tokio::io::duplex(1024);
        tx.write_all(b"alpha\nbeta\nEND_OF_LIST\n").await.unwrap();

        // 4-byte reads split the marker over several chunks
        let listing = read_listing(&mut rx, 4).await.unwrap();
        assert_eq!(listing, "alpha\nbeta\n");

        drop(tx);
        let mut rest = Vec::new();
        rx.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty(), "newline after marker should be consumed");
    }

    #[tokio::test]
    async fn test_marker_named_file_keeps_stream_framed() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("END_OF_LIST"), b"x").unwrap();
        for i in 0..300 {
            std::fs::write(dir.path().join(format!("filler_{i:03}.txt")), b"f").unwrap();
        }

        let (mut tx, mut rx) = tokio::io::duplex(1024);
        let root = dir.path().to_path_buf();
        let sender = tokio::spawn(async move {
            send_listing(&mut tx, &ListingSource::ReadDir, &root)
                .await
                .unwrap();
        });

        let listing = read_listing(&mut rx, 256).await.unwrap();
        sender.await.unwrap();
        assert_eq!(listing.lines().count(), 300);
        assert!(listing.contains("filler_299.txt"));

        // Reader stopped at the real marker: nothing of the listing is left behind
        let mut rest = Vec::new();
        rx.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    }

    #[tokio::test]
    async fn test_reader_eof_before_marker() {
        let (mut tx, mut rx) = tokio::io::duplex(1024);
        tx.write_all(b"partial listing").await.unwrap();
        drop(tx);

        let err = read_listing(&mut rx, 1024).await.unwrap_err();
        assert!(matches!(err, TransferError::Connection(_)));
    }
}
