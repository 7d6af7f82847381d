//! # dflog
//!
//! Print the messages of a dataflash log in time order.

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::DateTime;
use clap::Parser;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;

use dflog::config::{Config, LoggingConfig};
use dflog::{DfReader, LogFormat, Message};

/// File name used when diagnostics go to a directory
const LOG_FILE_NAME: &str = "dflog.log";

#[derive(Parser)]
#[command(name = "dflog")]
#[command(about = "Decode ArduPilot dataflash logs")]
#[command(version)]
struct Cli {
    /// Log file (.bin or .log)
    log: PathBuf,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Physical format of the log
    #[arg(short, long, value_enum)]
    format: Option<LogFormat>,

    /// Only print these message types (comma separated)
    #[arg(short, long, value_delimiter = ',')]
    types: Vec<String>,

    /// Print JSON lines
    #[arg(long)]
    json: bool,
}

/// Set up tracing to stderr, or to a file when a directory is configured
///
/// The returned guard must be kept alive to flush file output.
fn init_logging(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    if logging.directory.is_empty() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
        return None;
    }

    let appender = tracing_appender::rolling::never(&logging.directory, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Some(guard)
}

/// Human readable UTC time of a message
fn format_time(msg: &Message) -> String {
    msg.timestamp()
        .and_then(|t| DateTime::from_timestamp(t.floor() as i64, (t.fract() * 1e9) as u32))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(format) = cli.format {
        config.reader.format = format;
    }
    if !cli.types.is_empty() {
        config.output.types = cli.types.clone();
    }
    config.output.json |= cli.json;
    config.validate()?;

    let _guard = init_logging(&config.logging);
    info!("dflog v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut reader = DfReader::open(&cli.log, config.reader.format, config.reader.probe_bytes)
        .with_context(|| format!("opening {}", cli.log.display()))?;

    let types: Vec<&str> = config.output.types.iter().map(String::as_str).collect();
    let filter = if types.is_empty() { None } else { Some(types.as_slice()) };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut count: usize = 0;

    while let Some(msg) = reader.recv_match(filter, None, false)? {
        if config.output.json {
            serde_json::to_writer(&mut out, &msg)?;
            writeln!(out)?;
        } else {
            writeln!(out, "{}: {}", format_time(&msg), msg)?;
        }

        count += 1;
        if config.output.max_messages != 0 && count >= config.output.max_messages {
            debug!("Reached max_messages ({})", count);
            break;
        }
    }
    out.flush()?;

    info!("Printed {} messages, flight mode {}", count, reader.flightmode());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_flag() {
        let cli = Cli::try_parse_from(["dflog", "--format", "text", "flight.log"]).unwrap();
        assert_eq!(cli.format, Some(LogFormat::Text));

        let cli = Cli::try_parse_from(["dflog", "-f", "binary", "flight.bin"]).unwrap();
        assert_eq!(cli.format, Some(LogFormat::Binary));

        let cli = Cli::try_parse_from(["dflog", "flight.bin"]).unwrap();
        assert_eq!(cli.format, None);

        assert!(Cli::try_parse_from(["dflog", "--format", "csv", "flight.bin"]).is_err());
    }

    #[test]
    fn test_format_time() {
        let mut msg = Message::synthetic("ATT");
        assert_eq!(format_time(&msg), "-");

        msg.set_timestamp(1_700_000_000.25);
        assert_eq!(format_time(&msg), "2023-11-14 22:13:20.250");
    }
}
