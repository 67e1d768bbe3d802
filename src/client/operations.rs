//! Client operations
//!
//! The initiating side of each command. Every method sends a header first and
//! then plays the opposite role to the server's handler for that command.

use log::{debug, info};
use std::io;
use std::path::Path;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::client::results::DownloadOutcome;
use crate::error::ServerError;
use crate::listing::read_listing;
use crate::protocol::{Command, Header, read_header, write_header};
use crate::transfer::{DEFAULT_BUFFER_SIZE, Progress, receive_file, send_file};

/// A connection to a transfer server with one command in flight at a time.
pub struct Client<S = TcpStream> {
    conn: S,
    buffer_size: usize,
}

impl Client<TcpStream> {
    pub async fn connect(addr: &str) -> Result<Self, ServerError> {
        let conn = TcpStream::connect(addr)
            .await
            .map_err(|e| ServerError::Connection(addr.to_string(), e))?;
        info!("Connected to server {}", addr);
        Ok(Self::new(conn, DEFAULT_BUFFER_SIZE))
    }
}

impl<S> Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(conn: S, buffer_size: usize) -> Self {
        Self { conn, buffer_size }
    }

    /// Sends a local file; the server stores it under the file's base name.
    ///
    /// A missing local file fails before anything is sent.
    pub async fn upload(&mut self, path: &Path) -> Result<u64, ServerError> {
        let sent = send_file(&mut self.conn, path, Command::Upload, self.buffer_size).await?;
        Ok(sent)
    }

    /// Fetches the server's directory listing.
    pub async fn list(&mut self) -> Result<String, ServerError> {
        write_header(&mut self.conn, &Header::command_only(Command::List)).await?;
        let listing = read_listing(&mut self.conn, self.buffer_size).await?;
        Ok(listing)
    }

    /// Requests `name` and writes it to `dest`.
    ///
    /// A zero-size reply means the server has no such file; `dest` is left alone.
    pub async fn download<F>(
        &mut self,
        name: &str,
        dest: &Path,
        on_progress: F,
    ) -> Result<DownloadOutcome, ServerError>
    where
        F: FnMut(Progress),
    {
        write_header(&mut self.conn, &Header::new(Command::Download, 0, name)).await?;

        let reply = read_header(&mut self.conn).await?.ok_or_else(|| {
            ServerError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "server closed the connection",
            ))
        })?;
        debug!(
            "Download reply: {} size={} name={:?}",
            reply.command, reply.file_size, reply.filename
        );

        if reply.file_size == 0 {
            return Ok(DownloadOutcome::NotFound);
        }

        let received =
            receive_file(&mut self.conn, dest, reply.file_size, self.buffer_size, on_progress)
                .await?;
        Ok(DownloadOutcome::Received(received))
    }

    /// Tells the server the session is over and closes the connection.
    pub async fn exit(mut self) -> Result<(), ServerError> {
        write_header(&mut self.conn, &Header::command_only(Command::Exit)).await?;
        self.conn.shutdown().await?;
        info!("Disconnected");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransferError;
    use crate::listing::END_OF_LIST;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_upload_missing_file_sends_nothing() {
        let dir = TempDir::new().unwrap();
        let (conn, mut server) = tokio::io::duplex(1024);
        let mut client = Client::new(conn, 1024);

        let err = client.upload(&dir.path().join("absent")).await.unwrap_err();
        assert!(matches!(
            err,
            ServerError::Transfer(TransferError::FileNotFound(_))
        ));

        drop(client);
        let mut rest = Vec::new();
        server.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    }

    #[tokio::test]
    async fn test_list_sends_header_and_reads_until_marker() {
        let (conn, mut server) = tokio::io::duplex(4096);
        let mut client = Client::new(conn, 1024);

        let responder = tokio::spawn(async move {
            let header = read_header(&mut server).await.unwrap().unwrap();
            assert_eq!(header.command, Command::List);
            server.write_all(b"a\nb\n").await.unwrap();
            server.write_all(END_OF_LIST).await.unwrap();
            server
        });

        assert_eq!(client.list().await.unwrap(), "a\nb\n");
        responder.await.unwrap();
    }

    #[tokio::test]
    async fn test_download_not_found_leaves_dest_alone() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("wanted.txt");
        let (conn, mut server) = tokio::io::duplex(4096);
        let mut client = Client::new(conn, 1024);

        let responder = tokio::spawn(async move {
            let header = read_header(&mut server).await.unwrap().unwrap();
            assert_eq!(header.command, Command::Download);
            assert_eq!(header.filename, "wanted.txt");
            write_header(&mut server, &Header::new(Command::Download, 0, "wanted.txt"))
                .await
                .unwrap();
            server
        });

        let outcome = client.download("wanted.txt", &dest, |_| {}).await.unwrap();
        assert_eq!(outcome, DownloadOutcome::NotFound);
        assert!(!dest.exists());
        responder.await.unwrap();
    }

    #[tokio::test]
    async fn test_exit_sends_exit_header() {
        let (conn, mut server) = tokio::io::duplex(4096);
        let client = Client::new(conn, 1024);
        client.exit().await.unwrap();

        let header = read_header(&mut server).await.unwrap().unwrap();
        assert_eq!(header.command, Command::Exit);
        assert!(read_header(&mut server).await.unwrap().is_none());
    }
}
