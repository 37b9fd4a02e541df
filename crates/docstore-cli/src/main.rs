//! docstore command-line interface
//!
//! Runs one docstore operation per invocation and prints the result as JSON.
//!
//! # Usage
//!
//! ```bash
//! # Connection settings come from flags, DOCSTORE_* variables or a file
//! export DOCSTORE_HOST=localhost DOCSTORE_USER=root DOCSTORE_PASSWORD=secret
//! export DOCSTORE_DATABASE=shop
//!
//! docstore create-table users id doc
//! docstore put users id u1 doc '{"email": "a@b.c", "age": 30}'
//! docstore create-index users doc email --unique
//! docstore find users doc '{"email": "a@b.c"}'
//! docstore indexes shop.users
//!
//! # Tokenize a query string without connecting
//! docstore tokenize "a   b"
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use docstore_common::ConnectionConfig;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::Command;

/// docstore command-line interface
#[derive(Parser, Debug)]
#[command(
    name = "docstore",
    version,
    about = "JSON documents on a MySQL-compatible engine",
    long_about = "Stores JSON documents by primary key, indexes JSON fields through\n\
                  generated columns, and queries documents by field values."
)]
struct Args {
    /// Server hostname
    #[arg(short = 'H', long, global = true, env = "DOCSTORE_HOST")]
    host: Option<String>,

    /// Server port
    #[arg(short = 'p', long, global = true, env = "DOCSTORE_PORT")]
    port: Option<u16>,

    /// Default database
    #[arg(short = 'd', long, global = true, env = "DOCSTORE_DATABASE")]
    database: Option<String>,

    /// Username
    #[arg(short = 'U', long, global = true, env = "DOCSTORE_USER")]
    user: Option<String>,

    /// Password (prefer the DOCSTORE_PASSWORD env var)
    #[arg(
        short = 'W',
        long,
        global = true,
        env = "DOCSTORE_PASSWORD",
        hide_env_values = true
    )]
    password: Option<String>,

    /// Configuration file (TOML); flags and env vars take precedence
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the resolved configuration (without password) and exit
    #[arg(long)]
    print_config: bool,

    /// Enable verbose output
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose);

    let config = load_config(&args)?;

    if args.print_config {
        let text = toml::to_string_pretty(&config).context("failed to render configuration")?;
        print!("{text}");
        return Ok(());
    }

    let Some(command) = args.command else {
        anyhow::bail!("no command given; run with --help for the list of commands");
    };

    debug!("Running {:?}", command);
    let output = commands::run(command, &config).await?;
    if let Some(value) = output {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("docstore_cli=debug,docstore_client=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docstore_cli=warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Flags (and their env fallbacks) win over the config file.
fn load_config(args: &Args) -> Result<ConnectionConfig> {
    let from_args = ConnectionConfig {
        host: args.host.clone(),
        port: args.port,
        database: args.database.clone(),
        user: args.user.clone(),
        password: args.password.clone(),
    };

    match &args.config {
        Some(path) => {
            let file = ConnectionConfig::from_file(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            Ok(from_args.or(file))
        }
        None => Ok(from_args),
    }
}
