//! flowmark-ctl: command-line interface for embedding payloads into flow
//! tables and extracting them again.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use flowmark_core::FlowmarkConfig;

mod cmd;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(author, version, about = "Hide files in the identifier field of captured flows, and recover them.")]
struct Cli {
    /// Config file (default: $FLOWMARK_CONFIG or ~/.config/flowmark/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Embed payload files into <num_flows> distinct flows of a table
    Embed {
        /// Number of flows to embed into (one payload file per flow)
        num_flows: usize,
        /// Input flow table (CSV)
        input: PathBuf,
        /// Payload files
        #[arg(required = true)]
        payloads: Vec<PathBuf>,
        /// Fixed RNG seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,
        /// Skip reading each payload back after embedding
        #[arg(long)]
        no_validate: bool,
        /// Reassignment attempts allowed when no flow fits
        #[arg(long)]
        max_retries: Option<u32>,
        /// Output table path (default: i<N>_<input> next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Extract the payloads listed in a manifest
    Extract {
        /// Embedded flow table (CSV)
        table: PathBuf,
        /// Manifest written by `embed`
        manifest: PathBuf,
        /// Directory for recovered files
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// List flows and their capacity
    Flows {
        /// Flow table (CSV)
        table: PathBuf,
        /// Only show flows able to carry at least this many bytes
        #[arg(long, default_value_t = 0)]
        min_bytes: usize,
    },
    /// Write a default config file, unless one already exists
    InitConfig,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Embed {
            num_flows,
            input,
            payloads,
            seed,
            no_validate,
            max_retries,
            output,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(seed) = seed {
                config.embed.seed = Some(seed);
            }
            if no_validate {
                config.embed.validate = false;
            }
            if let Some(n) = max_retries {
                config.embed.max_retries = n;
            }
            cmd::embed::cmd_embed(&config, num_flows, &input, &payloads, output.as_deref())
        }
        Command::Extract {
            table,
            manifest,
            out_dir,
        } => {
            load_config(cli.config.as_deref())?;
            cmd::extract::cmd_extract(&table, &manifest, &out_dir)
        }
        Command::Flows { table, min_bytes } => {
            load_config(cli.config.as_deref())?;
            cmd::flows::cmd_flows(&table, min_bytes)
        }
        Command::InitConfig => {
            let path = cli.config.unwrap_or_else(FlowmarkConfig::file_path);
            let existed = path.exists();
            let path = FlowmarkConfig::write_default_if_missing(&path)
                .context("failed to write default config")?;
            if existed {
                println!("  Config already present: {}", path.display());
            } else {
                println!("  Wrote default config: {}", path.display());
            }
            Ok(())
        }
    }
}

/// Load the config named by `--config`, or the default location.
fn load_config(path: Option<&Path>) -> Result<FlowmarkConfig> {
    match path {
        Some(path) => FlowmarkConfig::load_from(path),
        None => FlowmarkConfig::load(),
    }
    .context("failed to load config")
}
