// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `rfc2136ctl` - read and update zone records from the command line.
//!
//! Records are exchanged as JSON arrays of
//! `{"name", "type", "ttl", "value", "priority"?, "weight"?, "target"?}`.
//! Connection settings come from flags or `RFC2136_*` environment variables.

use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rfc2136_provider::constants::{
    DEFAULT_TIMEOUT_SECS, DEFAULT_TSIG_ALGORITHM, ENV_KEY, ENV_KEY_ALG, ENV_KEY_NAME, ENV_SERVER,
    ENV_TIMEOUT,
};
use rfc2136_provider::provider::Provider;
use rfc2136_provider::record::Record;
use tracing::{debug, error, info};

#[derive(Debug, Parser)]
#[command(name = "rfc2136ctl", version, about = "Manage DNS zone records over AXFR and RFC 2136")]
struct Cli {
    /// Name server address (host or host:port)
    #[arg(long, env = ENV_SERVER)]
    server: String,

    /// TSIG key name; leave empty for unsigned requests
    #[arg(long, env = ENV_KEY_NAME, default_value = "")]
    key_name: String,

    /// TSIG algorithm
    #[arg(long, env = ENV_KEY_ALG, default_value = DEFAULT_TSIG_ALGORITHM)]
    key_alg: String,

    /// TSIG secret (base64 or hex)
    #[arg(long, env = ENV_KEY, default_value = "", hide_env_values = true)]
    key: String,

    /// Timeout in seconds for connecting and for each request, a whole zone transfer included
    #[arg(long, env = ENV_TIMEOUT, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print every record in a zone as JSON
    Get {
        zone: String,
    },
    /// Replace the record sets named in the input with exactly its records
    Set {
        zone: String,
        /// JSON file with records; stdin when omitted
        #[arg(long, short)]
        file: Option<PathBuf>,
    },
    /// Add records to a zone
    Append {
        zone: String,
        #[arg(long, short)]
        file: Option<PathBuf>,
    },
    /// Remove records, record sets or names from a zone
    Delete {
        zone: String,
        #[arg(long, short)]
        file: Option<PathBuf>,
    },
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    // logs go to stderr so stdout stays valid JSON
    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_file(true)
                .with_line_number(true)
                .with_target(false)
                .compact()
                .init();
        }
    }
}

fn read_records(file: Option<&PathBuf>) -> Result<Vec<Record>> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read records from {}", path.display()))?,
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read records from stdin")?;
            raw
        }
    };
    serde_json::from_str(&raw).context("Records must be a JSON array of record objects")
}

fn print_records(records: &[Record]) -> Result<()> {
    let out = serde_json::to_string_pretty(records).context("Failed to encode records")?;
    println!("{out}");
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let provider = Provider::new(cli.server)
        .with_key(cli.key_name, cli.key_alg, cli.key)
        .with_timeout(Duration::from_secs(cli.timeout));
    debug!("Using name server {}", provider.server);

    let applied = match cli.command {
        Command::Get { zone } => provider
            .get_records(&zone)
            .await
            .with_context(|| format!("Failed to read zone {zone}"))?,
        Command::Set { zone, file } => {
            let records = read_records(file.as_ref())?;
            provider
                .set_records(&zone, &records)
                .await
                .with_context(|| format!("Failed to set records in zone {zone}"))?
        }
        Command::Append { zone, file } => {
            let records = read_records(file.as_ref())?;
            provider
                .append_records(&zone, &records)
                .await
                .with_context(|| format!("Failed to append records to zone {zone}"))?
        }
        Command::Delete { zone, file } => {
            let records = read_records(file.as_ref())?;
            provider
                .delete_records(&zone, &records)
                .await
                .with_context(|| format!("Failed to delete records from zone {zone}"))?
        }
    };

    info!("{} record(s) processed", applied.len());
    print_records(&applied)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("rfc2136ctl")
        .enable_all()
        .build()?;

    let result = runtime.block_on(run(cli));
    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}
