//! brainctl CLI - turn a ChatGPT conversation export into dated plain-text parts
//!
//! Reads `conversations.json` (or the export `.zip`), pulls every user and
//! assistant message out of each conversation's node mapping, sorts them by
//! date and writes them into `{base}_Part{N}{ext}` files that each stay under
//! a byte budget.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use brainctl_core::{run, BrainConfig, Outcome, RunOptions};
use clap::{ArgAction, Parser};
use tracing::debug;

mod tracing_setup;
mod ui;

#[derive(Parser, Debug)]
#[command(
    name = "brainctl",
    author,
    version,
    about = "Flatten a ChatGPT conversation export into size-bounded, date-sorted text files",
    long_about = "Load a conversations.json export (or the .zip it ships in), extract every user \
                  and assistant message with a DATE/TOPIC/ROLE header, sort by date and write \
                  numbered part files that each stay under a byte budget."
)]
struct Cli {
    /// Path to a TOML config file (default: ~/.brainctl/config.toml when present)
    #[arg(long, value_name = "PATH", env = "BRAINCTL_CONFIG")]
    config: Option<PathBuf>,

    /// Conversations export (JSON array or .zip archive)
    #[arg(long = "in", value_name = "PATH")]
    input: Option<PathBuf>,

    /// Directory the part files are written to
    #[arg(long = "out", value_name = "DIR")]
    output: Option<PathBuf>,

    /// File name prefix for part files
    #[arg(long = "base-name", value_name = "NAME")]
    base_name: Option<String>,

    /// File extension for part files, including the dot
    #[arg(long = "ext", value_name = "EXT")]
    extension: Option<String>,

    /// Part size limit in MiB
    #[arg(long = "max-mb", value_name = "N")]
    max_mb: Option<u64>,

    /// Part size limit in bytes (wins over --max-mb)
    #[arg(long = "max-bytes", value_name = "N")]
    max_bytes: Option<u64>,

    /// Timezone for date labels (e.g., Europe/Lisbon); local time when unset
    #[arg(long = "tz", value_name = "TZ")]
    timezone: Option<String>,

    /// Only keep messages from conversations created in this year
    #[arg(long, value_name = "YYYY")]
    year: Option<i32>,

    /// Skip messages without an author role instead of failing
    #[arg(long, action = ArgAction::SetTrue)]
    lenient: bool,

    /// Report the part files that would be written without writing them
    #[arg(long = "dry-run", action = ArgAction::SetTrue)]
    dry_run: bool,

    /// Print the resolved configuration as TOML and exit
    #[arg(long = "show-config", action = ArgAction::SetTrue)]
    show_config: bool,

    /// Disable the progress bar
    #[arg(long = "no-progress", action = ArgAction::SetTrue)]
    no_progress: bool,

    /// Suppress progress output (for scripts and piping)
    #[arg(long, short = 'q')]
    quiet: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

impl Cli {
    fn apply_overrides(&self, config: &mut BrainConfig) {
        if let Some(input) = &self.input {
            config.input = input.clone();
        }
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
        if let Some(base_name) = &self.base_name {
            config.base_name = base_name.clone();
        }
        if let Some(extension) = &self.extension {
            config.extension = extension.clone();
        }
        if let Some(max_mb) = self.max_mb {
            config.max_file_size_mb = max_mb;
            config.max_bytes = None;
        }
        if let Some(max_bytes) = self.max_bytes {
            config.max_bytes = Some(max_bytes);
        }
        if let Some(tz) = &self.timezone {
            config.timezone = Some(tz.clone());
        }
        if let Some(year) = self.year {
            config.year = Some(year);
        }
        if self.lenient {
            config.strict = false;
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = tracing_setup::init(&tracing_setup::TracingConfig { debug: cli.debug }) {
        eprintln!("Warning: logging disabled: {err:#}");
    }
    ui::init_quiet_mode(cli.quiet);

    match execute(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> Result<ExitCode> {
    let mut config =
        BrainConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    cli.apply_overrides(&mut config);
    debug!(?config, "resolved configuration");

    if cli.show_config {
        let rendered =
            toml::to_string_pretty(&config).context("failed to serialize config to TOML")?;
        println!("{}", rendered);
        return Ok(ExitCode::SUCCESS);
    }

    debug!(
        "exporting {:?} -> {:?} (limit: {} bytes)",
        config.input,
        config.output_dir,
        config.max_bytes()
    );

    let opts = RunOptions {
        dry_run: cli.dry_run,
        progress: ui::extraction_bar(cli.no_progress),
    };

    match run(&config, &opts).context("failed to export conversations")? {
        Outcome::MissingInput { path } => {
            println!(
                "Error: {} not found. Please ensure the file is in the same directory.",
                path.display()
            );
        }
        Outcome::Completed { summary, .. } => {
            for part in &summary.parts {
                debug!(
                    part = part.part,
                    bytes = part.bytes,
                    records = part.records,
                    "part {}",
                    part.path.display()
                );
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
