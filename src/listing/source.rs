//! Listing sources
//!
//! Where directory listings come from: the native directory reader, or an
//! external command such as `ls -la` run inside the directory.

use log::{debug, warn};
use std::path::Path;
use std::process::Stdio;
use std::time::UNIX_EPOCH;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::Command;

use crate::error::TransferError;
use crate::listing::END_MARKER;

/// A line carrying the end marker would end the reader's listing early.
fn carries_marker(text: &str) -> bool {
    text.as_bytes()
        .windows(END_MARKER.len())
        .any(|w| w == END_MARKER)
}

/// How a directory is enumerated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ListingSource {
    /// `read_dir`, one line per entry: size, modification time, name (`/` suffix for directories).
    #[default]
    ReadDir,
    /// A shell command whose stdout is forwarded line by line.
    Command(String),
}

impl ListingSource {
    pub fn from_command(command: Option<&str>) -> Self {
        match command.map(str::trim) {
            Some(cmd) if !cmd.is_empty() => ListingSource::Command(cmd.to_string()),
            _ => ListingSource::ReadDir,
        }
    }

    /// Writes the listing of `dir` to `conn` one chunk at a time as entries are produced.
    ///
    /// Returns the number of chunks written. Write failures come back as
    /// `TransferError::Connection`; failures to enumerate as `Io`.
    pub async fn stream_to<W>(&self, conn: &mut W, dir: &Path) -> Result<usize, TransferError>
    where
        W: AsyncWrite + Unpin,
    {
        match self {
            ListingSource::ReadDir => stream_read_dir(conn, dir).await,
            ListingSource::Command(cmd) => stream_command(conn, cmd, dir).await,
        }
    }
}

async fn stream_read_dir<W>(conn: &mut W, dir: &Path) -> Result<usize, TransferError>
where
    W: AsyncWrite + Unpin,
{
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut count = 0;

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if carries_marker(&name) {
            warn!("Leaving {:?} out of the listing of {}", name, dir.display());
            continue;
        }

        let line = match entry.metadata().await {
            Ok(metadata) => {
                let size = if metadata.is_dir() { 0 } else { metadata.len() };
                let timestamp = metadata
                    .modified()
                    .ok()
                    .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
                    .map(|dur| dur.as_secs())
                    .unwrap_or(0);
                let name_with_type = if metadata.is_dir() {
                    format!("{}/", name)
                } else {
                    name
                };
                format!("{:>12} {:>12} {}\n", size, timestamp, name_with_type)
            }
            Err(_) => format!("{:>12} {:>12} {}\n", 0, 0, name),
        };

        conn.write_all(line.as_bytes())
            .await
            .map_err(TransferError::Connection)?;
        count += 1;
    }

    Ok(count)
}

async fn stream_command<W>(conn: &mut W, cmd: &str, dir: &Path) -> Result<usize, TransferError>
where
    W: AsyncWrite + Unpin,
{
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(cmd)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| std::io::Error::other("listing command has no stdout"))?;
    let mut lines = BufReader::new(stdout).lines();
    let mut count = 0;

    while let Some(line) = lines.next_line().await? {
        if carries_marker(&line) {
            warn!("Dropping listing command output line {:?}", line);
            continue;
        }
        conn.write_all(format!("{}\n", line).as_bytes())
            .await
            .map_err(TransferError::Connection)?;
        count += 1;
    }

    let status = child.wait().await?;
    if !status.success() {
        warn!("Listing command {:?} exited with {}", cmd, status);
    } else {
        debug!("Listing command {:?} produced {} lines", cmd, count);
    }

    Ok(count)
}
