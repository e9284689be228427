//! vcdx CLI: reads a VCD file into per-signal change logs and optionally
//! writes a pass-through copy next to it.
//!
//! `vcdx trace.vcd` only reads; `vcdx trace.vcd --dump` also writes
//! `trace.vcd.out`, and `--verify` checks that copy against the input.

#![warn(missing_docs)]

mod report;
mod transcode;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;
use vcdx_config::{load_config, load_config_file, VcdxConfig};

/// vcdx: a streaming VCD transcoder.
#[derive(Parser, Debug)]
#[command(name = "vcdx", version, about = "VCD transcoder")]
pub struct Cli {
    /// Input VCD file.
    pub input: String,

    /// Write the transcoded copy to `<INPUT><suffix>`.
    #[arg(long)]
    pub dump: bool,

    /// Re-read the written copy and compare it with the input (implies --dump).
    #[arg(long)]
    pub verify: bool,

    /// Abort on unrecognized tokens, shape conflicts and width mismatches.
    #[arg(long)]
    pub strict: bool,

    /// Run summary format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Suppress all output except errors.
    #[arg(short, long)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to a custom `vcdx.toml` configuration file.
    #[arg(long)]
    pub config: Option<String>,
}

/// Run summary output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse_from(normalize_args(std::env::args()));

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config.clone(),
    };

    let config = match resolve_config(Path::new(&cli.input), &global) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };
    init_logging(log_level(&config, &global));

    match transcode::run(&cli, &config, &global) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Rewrites legacy spellings of the dump flag (`-dump`, `---dump`) to `--dump`.
///
/// Only option-like arguments are touched, so an input named `my-dump.vcd`
/// stays positional.
pub fn normalize_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    args.into_iter()
        .enumerate()
        .map(|(i, arg)| {
            if i > 0 && arg.starts_with('-') && arg.contains("-dump") {
                "--dump".to_string()
            } else {
                arg
            }
        })
        .collect()
}

/// Loads `--config` if given, else `vcdx.toml` beside the input, else defaults.
fn resolve_config(
    input: &Path,
    global: &GlobalArgs,
) -> Result<VcdxConfig, Box<dyn std::error::Error>> {
    if let Some(path) = &global.config {
        return Ok(load_config_file(Path::new(path))?);
    }
    let dir = match input.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok(load_config(&dir)?)
}

/// Filter directive for the subscriber: the flags win over the config file.
fn log_level<'a>(config: &'a VcdxConfig, global: &GlobalArgs) -> &'a str {
    if global.verbose {
        "debug"
    } else if global.quiet {
        "error"
    } else {
        &config.log.level
    }
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over `level`.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
