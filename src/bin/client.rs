//! Transfer client - Entry Point
//!
//! Connects to one server and runs an interactive menu until the user exits.

use clap::Parser;
use log::LevelFilter;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use tcp_file_transfer::client::{Client, DownloadOutcome};
use tcp_file_transfer::config::DEFAULT_PORT;
use tcp_file_transfer::error::handlers::is_fatal;
use tcp_file_transfer::error::{ServerError, TransferError};
use tcp_file_transfer::storage::resolve_filename;
use tcp_file_transfer::utils::{LogConfig, setup_logging};

/// Interactive client for the TCP file transfer server
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Server address (IP or hostname)
    server: String,

    /// Server port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Minimum level for diagnostic messages on stderr
    #[arg(long, default_value = "warn")]
    log_level: LevelFilter,
}

type Input = Lines<BufReader<Stdin>>;

fn show_menu() {
    println!("\n=== TCP File Transfer Client ===");
    println!("1. Send file to server");
    println!("2. List files on server");
    println!("3. Download file from server");
    println!("4. Exit");
}

async fn prompt(input: &mut Input, text: &str) -> Option<String> {
    print!("{}", text);
    let _ = std::io::stdout().flush();
    match input.next_line().await {
        Ok(Some(line)) => Some(line.trim().to_string()),
        _ => None,
    }
}

fn report(err: &ServerError) {
    match err {
        ServerError::Transfer(TransferError::FileNotFound(path)) => {
            println!("File not found: {}", path)
        }
        other => println!("Error: {}", other),
    }
}

async fn send(client: &mut Client, input: &mut Input) -> Result<(), ServerError> {
    let Some(name) = prompt(input, "Enter filename to send: ").await else {
        return Ok(());
    };
    println!("Sending file: {}", name);
    let sent = client.upload(Path::new(&name)).await?;
    println!("File sent successfully ({} bytes)", sent);
    Ok(())
}

async fn list(client: &mut Client) -> Result<(), ServerError> {
    let listing = client.list().await?;
    println!("\n=== Server Files ===");
    print!("{}", listing);
    println!("===================");
    Ok(())
}

async fn download(client: &mut Client, input: &mut Input) -> Result<(), ServerError> {
    let Some(name) = prompt(input, "Enter filename to download: ").await else {
        return Ok(());
    };
    let dest = resolve_filename(Path::new("."), &name)?;

    let outcome = client
        .download(&name, &dest, |p| {
            print!("\rProgress: {:.2}%", p.percent());
            let _ = std::io::stdout().flush();
        })
        .await?;

    match outcome {
        DownloadOutcome::Received(bytes) => {
            println!("\nFile received successfully: {} ({} bytes)", dest.display(), bytes)
        }
        DownloadOutcome::NotFound => println!("File not found on server"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_config = LogConfig {
        level: cli.log_level,
        ..LogConfig::default()
    };
    if let Err(e) = setup_logging(&log_config) {
        eprintln!("Failed to initialise logging: {}", e);
    }

    let addr = format!("{}:{}", cli.server, cli.port);
    let mut client = match Client::connect(&addr).await {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    println!("Connected to server {}", addr);

    let mut input: Input = BufReader::new(tokio::io::stdin()).lines();

    loop {
        show_menu();
        let Some(choice) = prompt(&mut input, "Enter choice: ").await else {
            // stdin closed: leave the way option 4 would
            break;
        };

        let result = match choice.parse::<u32>() {
            Ok(1) => send(&mut client, &mut input).await,
            Ok(2) => list(&mut client).await,
            Ok(3) => download(&mut client, &mut input).await,
            Ok(4) => break,
            _ => {
                println!("Invalid choice");
                continue;
            }
        };

        if let Err(e) = result {
            report(&e);
            if is_fatal(&e) {
                eprintln!("Connection to server lost");
                return ExitCode::FAILURE;
            }
        }
    }

    println!("Exiting...");
    match client.exit().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
