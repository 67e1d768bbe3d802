//! Server side of a session.
//!
//! Reads one header at a time and runs the matching operation to completion
//! before reading the next. The connection is owned by the session and shut
//! down once, when the loop ends.

use log::{debug, info};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::config::ServerConfig;
use crate::error::handlers::handle_error;
use crate::error::{ProtocolError, ServerError, TransferError};
use crate::listing::{ListingSource, send_listing};
use crate::protocol::{Command, Header, read_header, write_header};
use crate::session::SessionState;
use crate::storage::resolve_filename;
use crate::transfer::{discard_payload, receive_file, send_file};

/// One client connection on the server.
pub struct Session<S> {
    conn: S,
    peer: String,
    config: Arc<ServerConfig>,
    listing: ListingSource,
    state: SessionState,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(conn: S, peer: impl Into<String>, config: Arc<ServerConfig>) -> Self {
        let listing = config.listing_source();
        Self {
            conn,
            peer: peer.into(),
            config,
            listing,
            state: SessionState::AwaitingCommand,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            debug!("Session {}: {} -> {}", self.peer, self.state, next);
        }
        self.state = next;
    }

    /// Runs the session until EXIT, disconnect, or a broken connection.
    pub async fn run(mut self) {
        while !self.state.is_closed() {
            match read_header(&mut self.conn).await {
                Ok(Some(header)) => {
                    debug!(
                        "Received from {}: {} size={} name={:?}",
                        self.peer, header.command, header.file_size, header.filename
                    );
                    self.transition(SessionState::Dispatching);
                    let next = self.dispatch(&header).await;
                    self.transition(next);
                }
                Ok(None) => {
                    info!("Client {} disconnected", self.peer);
                    self.transition(SessionState::Closed);
                }
                Err(e) => {
                    handle_error(&e);
                    let next = SessionState::after(&Err(e));
                    self.transition(next);
                }
            }
        }

        if let Err(e) = self.conn.shutdown().await {
            debug!("Shutdown of {} failed: {}", self.peer, e);
        }
        info!("Session with {} closed", self.peer);
    }

    async fn dispatch(&mut self, header: &Header) -> SessionState {
        let outcome = match header.command {
            Command::Upload => self.handle_upload(header).await,
            Command::List => self.handle_list().await,
            Command::Download => self.handle_download(header).await,
            Command::Exit => {
                info!("Client {} requested exit", self.peer);
                return SessionState::Closed;
            }
            Command::Unknown(value) => Err(ProtocolError::UnknownCommand(value).into()),
        };

        if let Err(e) = &outcome {
            handle_error(e);
        }
        SessionState::after(&outcome)
    }

    async fn handle_upload(&mut self, header: &Header) -> Result<(), ServerError> {
        let buffer_size = self.config.buffer_size;
        let expected = u64::from(header.file_size);

        let path = match header
            .name()
            .and_then(|name| resolve_filename(&self.config.server_root_path(), name)) {
            Ok(path) => path,
            Err(e) => {
                discard_payload(&mut self.conn, expected, buffer_size).await?;
                return Err(e.into());
            }
        };

        info!(
            "Receiving file: {} ({} bytes) from {}",
            path.display(),
            expected,
            self.peer
        );

        if expected == 0 {
            tokio::fs::write(&path, b"")
                .await
                .map_err(|e| TransferError::from_open(&path.display().to_string(), e))?;
            info!("File received successfully: {} (0 bytes)", path.display());
            return Ok(());
        }

        let received = receive_file(&mut self.conn, &path, header.file_size, buffer_size, |p| {
            debug!("Receiving {}: {:.2}%", header.filename, p.percent())
        })
        .await?;

        info!(
            "File received successfully: {} ({} bytes)",
            path.display(),
            received
        );
        Ok(())
    }

    async fn handle_list(&mut self) -> Result<(), ServerError> {
        info!("Sending file list to {}", self.peer);
        let root = self.config.server_root_path();
        send_listing(&mut self.conn, &self.listing, &root).await?;
        Ok(())
    }

    async fn handle_download(&mut self, header: &Header) -> Result<(), ServerError> {
        info!("Sending file: {} to {}", header.filename, self.peer);

        let sent = match header
            .name()
            .and_then(|name| resolve_filename(&self.config.server_root_path(), name)) {
            Ok(path) => {
                send_file(
                    &mut self.conn,
                    &path,
                    Command::Download,
                    self.config.buffer_size,
                )
                .await
            }
            Err(e) => Err(e),
        };

        match sent {
            Ok(_) => Ok(()),
            Err(e @ (TransferError::Connection(_) | TransferError::TransferIncomplete { .. })) => {
                Err(e.into())
            }
            Err(e) => {
                // Nothing was written yet; a zero size tells the client there is no file.
                let reply = Header::new(Command::Download, 0, &header.filename);
                write_header(&mut self.conn, &reply).await?;
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::read_listing;
    use crate::protocol::HEADER_SIZE;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, DuplexStream};

    fn config_for(dir: &TempDir) -> Arc<ServerConfig> {
        Arc::new(ServerConfig {
            server_root: dir.path().to_string_lossy().into_owned(),
            ..ServerConfig::default()
        })
    }

    fn spawn_session(dir: &TempDir) -> (DuplexStream, tokio::task::JoinHandle<()>) {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let session = Session::new(server, "test-peer", config_for(dir));
        assert_eq!(session.state(), SessionState::AwaitingCommand);
        (client, tokio::spawn(session.run()))
    }

    #[tokio::test]
    async fn test_upload_then_download() {
        let dir = TempDir::new().unwrap();
        let (mut client, task) = spawn_session(&dir);

        let data: Vec<u8> = (0..3000u32).map(|i| (i % 200) as u8).collect();
        write_header(&mut client, &Header::new(Command::Upload, 3000, "up.bin"))
            .await
            .unwrap();
        client.write_all(&data).await.unwrap();

        write_header(&mut client, &Header::new(Command::Download, 0, "up.bin"))
            .await
            .unwrap();
        let reply = read_header(&mut client).await.unwrap().unwrap();
        assert_eq!(reply.command, Command::Download);
        assert_eq!(reply.file_size, 3000);

        let mut payload = vec![0u8; 3000];
        client.read_exact(&mut payload).await.unwrap();
        assert_eq!(payload, data);
        assert_eq!(std::fs::read(dir.path().join("up.bin")).unwrap(), data);

        write_header(&mut client, &Header::command_only(Command::Exit))
            .await
            .unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_download_missing_replies_zero() {
        let dir = TempDir::new().unwrap();
        let (mut client, task) = spawn_session(&dir);

        write_header(&mut client, &Header::new(Command::Download, 0, "ghost.txt"))
            .await
            .unwrap();
        let reply = read_header(&mut client).await.unwrap().unwrap();
        assert_eq!(reply.file_size, 0);

        write_header(&mut client, &Header::command_only(Command::Exit))
            .await
            .unwrap();
        task.await.unwrap();

        // Nothing but the reply header was sent
        let mut rest = Vec::new();
        client.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_command_keeps_session_alive() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("listed.txt"), b"x").unwrap();
        let (mut client, task) = spawn_session(&dir);

        let mut bogus = Header::command_only(Command::Exit).encode();
        bogus[0..4].copy_from_slice(&77u32.to_be_bytes());
        client.write_all(&bogus).await.unwrap();

        write_header(&mut client, &Header::command_only(Command::List))
            .await
            .unwrap();
        let listing = read_listing(&mut client, 1024).await.unwrap();
        assert!(listing.contains("listed.txt"));

        drop(client);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_upload_name_is_drained() {
        let dir = TempDir::new().unwrap();
        let (mut client, task) = spawn_session(&dir);

        write_header(&mut client, &Header::new(Command::Upload, 5, ".."))
            .await
            .unwrap();
        client.write_all(b"hello").await.unwrap();

        // Session is still framed: a download of a missing file answers normally
        write_header(&mut client, &Header::new(Command::Download, 0, "none"))
            .await
            .unwrap();
        let reply = read_header(&mut client).await.unwrap().unwrap();
        assert_eq!(reply.file_size, 0);

        drop(client);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_non_utf8_names_are_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a\u{fffd}"), b"other").unwrap();
        let (mut client, task) = spawn_session(&dir);

        let mut upload = Header::new(Command::Upload, 5, "ab").encode();
        upload[13] = 0xff;
        client.write_all(&upload).await.unwrap();
        client.write_all(b"hello").await.unwrap();

        // Payload was drained; the lossy twin is not served either
        let mut download = Header::new(Command::Download, 0, "ab").encode();
        download[13] = 0xff;
        client.write_all(&download).await.unwrap();
        let reply = read_header(&mut client).await.unwrap().unwrap();
        assert_eq!(reply.file_size, 0);

        write_header(&mut client, &Header::command_only(Command::Exit))
            .await
            .unwrap();
        task.await.unwrap();

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
        assert_eq!(
            std::fs::read(dir.path().join("a\u{fffd}")).unwrap(),
            b"other"
        );
    }

    #[tokio::test]
    async fn test_empty_upload_creates_empty_file() {
        let dir = TempDir::new().unwrap();
        let (mut client, task) = spawn_session(&dir);

        write_header(&mut client, &Header::new(Command::Upload, 0, "empty.txt"))
            .await
            .unwrap();
        write_header(&mut client, &Header::command_only(Command::Exit))
            .await
            .unwrap();
        task.await.unwrap();

        let path = dir.path().join("empty.txt");
        assert!(path.exists());
        assert_eq!(std::fs::metadata(path).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_exit_closes_connection() {
        let dir = TempDir::new().unwrap();
        let (mut client, task) = spawn_session(&dir);

        write_header(&mut client, &Header::command_only(Command::Exit))
            .await
            .unwrap();
        task.await.unwrap();

        let mut buf = [0u8; HEADER_SIZE];
        assert_eq!(client.read(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_partial_header_then_disconnect() {
        let dir = TempDir::new().unwrap();
        let (mut client, task) = spawn_session(&dir);

        client.write_all(&[0u8; 10]).await.unwrap();
        drop(client);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_upload_cut_short_keeps_partial_file() {
        let dir = TempDir::new().unwrap();
        let (mut client, task) = spawn_session(&dir);

        write_header(&mut client, &Header::new(Command::Upload, 1000, "cut.bin"))
            .await
            .unwrap();
        client.write_all(&[7u8; 400]).await.unwrap();
        drop(client);
        task.await.unwrap();

        assert_eq!(
            std::fs::read(dir.path().join("cut.bin")).unwrap(),
            vec![7u8; 400]
        );
    }
}
