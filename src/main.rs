//! scancache debug CLI.
//!
//! Small operator tool for poking at persisted recognition artifacts:
//! decode an envelope file to JSON, or derive the cache key for a
//! namespace/id pair.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scancache::{decode, MessageId};

/// scancache - inspect cached recognition artifacts.
#[derive(Parser, Debug)]
#[command(name = "scancache")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose (debug) logging.
    #[arg(short, long, env = "SCANCACHE_VERBOSE")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a serialized detection envelope and print it as JSON.
    Dump {
        /// Path to a file containing envelope bytes.
        path: PathBuf,

        /// Pretty-print the JSON output.
        #[arg(long)]
        pretty: bool,
    },

    /// Derive and print the 8-byte cache key for a message identifier.
    Key {
        /// Message namespace.
        namespace: i32,

        /// Message id within the namespace.
        id: i32,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Dump { path, pretty } => run_dump(&path, pretty),
        Command::Key { namespace, id } => run_key(namespace, id),
    }
}

fn run_dump(path: &std::path::Path, pretty: bool) -> ExitCode {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Failed to read {}: {}", path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let detections = match decode(&bytes) {
        Ok(detections) => detections,
        Err(e) => {
            error!("Failed to decode envelope: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let json = if pretty {
        serde_json::to_string_pretty(&detections)
    } else {
        serde_json::to_string(&detections)
    };

    match json {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to serialize detections: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_key(namespace: i32, id: i32) -> ExitCode {
    let key = MessageId::new(namespace, id).cache_key();
    println!("{}", hex::encode(key));
    ExitCode::SUCCESS
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
