use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::error::handlers::handle_error;
use crate::session::Session;

pub struct Server {
    listener: TcpListener,
    config: Arc<ServerConfig>,
}

impl Server {
    /// Binds the listening socket. Failure here is fatal for the process.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let addr = config.listen_addr();

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::Connection(addr.clone(), e))?;

        info!("Server bound to {}", addr);
        info!(
            "Server root directory: {}",
            config.server_root_path().display()
        );

        Ok(Self {
            listener,
            config: Arc::new(config),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections until the process is killed.
    ///
    /// Every connection runs in its own task; an accept failure is logged and
    /// the loop carries on.
    pub async fn run(self) {
        match self.listener.local_addr() {
            Ok(addr) => info!("Server listening on {}", addr),
            Err(e) => error!("Listening socket has no local address: {}", e),
        }

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    info!("New connection from {}", addr);
                    let config = Arc::clone(&self.config);

                    // Spawn a task for each client so accept loop doesn't block
                    tokio::spawn(async move {
                        Session::new(stream, addr.to_string(), config).run().await;
                    });
                }
                Err(e) => handle_error(&ServerError::Accept(e)),
            }
        }
    }
}
