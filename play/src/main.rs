//! `play`: run lattice pipelines from TOML files.
//!
//! `play run` prints the final value as JSON and exits with a code derived from
//! its variant (see [`play::exit_codes`]). `play check` only validates.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use play::completer::{CommandCompleter, Completer, Unconfigured};
use play::config::load_config;
use play::exit_codes;
use play::pipeline::Pipeline;
use tracing::debug;

#[derive(Parser)]
#[command(
    name = "play",
    version,
    about = "Run four-state lattice pipelines described in TOML"
)]
struct Cli {
    /// Driver configuration; a missing file means defaults.
    #[arg(long, global = true, default_value = "play.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a pipeline and print the final value.
    Run {
        /// Pipeline file.
        pipeline: PathBuf,
    },
    /// Parse and validate a pipeline without running it.
    Check {
        /// Pipeline file.
        pipeline: PathBuf,
    },
}

fn main() {
    flow::logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run { pipeline } => cmd_run(&cli.config, &pipeline),
        Command::Check { pipeline } => cmd_check(&pipeline),
    }
}

fn cmd_run(config_path: &Path, pipeline_path: &Path) -> Result<i32> {
    let config = load_config(config_path)?;
    let pipeline = Pipeline::load(pipeline_path)?;

    let command_completer = CommandCompleter::from_config(&config.completer);
    let completer: &dyn Completer = match &command_completer {
        Some(completer) => completer,
        None => {
            debug!("no completer command configured");
            &Unconfigured
        }
    };

    let result = pipeline.run(completer);
    let payload = serde_json::to_string_pretty(&result).context("serialize result")?;
    println!("{payload}");
    Ok(exit_codes::for_variant(result.variant()))
}

fn cmd_check(pipeline_path: &Path) -> Result<i32> {
    let pipeline = Pipeline::load(pipeline_path)?;
    println!("ok: {} stage(s)", pipeline.stages.len());
    Ok(exit_codes::OK)
}
