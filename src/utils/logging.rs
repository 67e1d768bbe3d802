//! Logging utilities
//!
//! Provides logging setup and configuration.

use env_logger::{Builder, Target, WriteStyle};
use log::LevelFilter;
use std::fs::{File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::path::PathBuf;

use crate::error::ServerError;

/// What the log sink does with records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Minimum level; `RUST_LOG` still overrides it
    pub level: LevelFilter,
    pub color: bool,
    /// Mirror every line to this file as well as stderr
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            color: true,
            file: None,
        }
    }
}

/// Writes every line to stderr and to a line-buffered file.
struct Mirror {
    file: LineWriter<File>,
}

impl Write for Mirror {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

/// Escape codes would end up in the mirrored file, so a file turns colour off.
fn write_style(config: &LogConfig) -> WriteStyle {
    if config.color && config.file.is_none() {
        WriteStyle::Always
    } else {
        WriteStyle::Never
    }
}

fn builder(config: &LogConfig) -> io::Result<Builder> {
    let mut builder = Builder::new();
    builder
        .filter_level(config.level)
        .parse_default_env()
        .write_style(write_style(config))
        .format(|buf, record| {
            let style = buf.default_level_style(record.level());
            writeln!(
                buf,
                "{} {style}{:<5}{style:#} {}:{} {}",
                buf.timestamp(),
                record.level(),
                record.module_path().unwrap_or("?"),
                record.line().unwrap_or(0),
                record.args()
            )
        });

    if let Some(path) = &config.file {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder.target(Target::Pipe(Box::new(Mirror {
            file: LineWriter::new(file),
        })));
    }

    Ok(builder)
}

/// Setup logging for the process
pub fn setup_logging(config: &LogConfig) -> Result<(), ServerError> {
    builder(config)?
        .try_init()
        .map_err(|e| ServerError::Io(io::Error::other(e)))
}
