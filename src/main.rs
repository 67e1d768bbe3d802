//! Transfer server - Entry Point
//!
//! Listens on the configured port and serves every client in its own task
//! until the process is killed.

use log::{error, info};
use std::process::ExitCode;

use tcp_file_transfer::utils::setup_logging;
use tcp_file_transfer::{Server, ServerConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = setup_logging(&config.log_config()) {
        eprintln!("Failed to initialise logging: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Launching transfer server...");

    let server = match Server::bind(config).await {
        Ok(server) => server,
        Err(e) => {
            error!("Server startup failed: {}", e);
            return ExitCode::FAILURE;
        }
    };
    server.run().await;

    ExitCode::SUCCESS
}
