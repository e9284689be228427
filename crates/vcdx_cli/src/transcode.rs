//! The transcoding run behind `vcdx <INPUT>`.
//!
//! Opens the input, optionally opens `<INPUT><suffix>` for the dump, runs the
//! pull loop, reports timing and counters, and verifies the dump on request.

use std::ffi::OsString;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::warn;
use vcdx_config::VcdxConfig;
use vcdx_transcode::{open_vcd, transcode, verify_roundtrip, TranscodeOptions};

use crate::report::{render_json, render_text, RunSummary};
use crate::{Cli, GlobalArgs, ReportFormat};

/// Runs one transcode of `args.input`.
///
/// Returns exit code 0 on success and 1 if `--verify` found a mismatch.
pub fn run(
    args: &Cli,
    config: &VcdxConfig,
    global: &GlobalArgs,
) -> Result<i32, Box<dyn std::error::Error>> {
    let input = Path::new(&args.input);
    let options = options_from(config, args.strict);
    let dump = args.dump || args.verify;

    if !global.quiet {
        eprintln!("   Reading {}", input.display());
    }

    let start = Instant::now();
    let mut source = open_vcd(input)?;
    let output_path = output_path(input, &config.output.suffix);
    let sink = if dump { open_sink(&output_path) } else { None };
    let (outcome, sink) = transcode(&mut source, sink, options)?;
    let elapsed = start.elapsed();
    let written = sink.is_some();
    drop(sink);

    if written && !global.quiet {
        eprintln!("   Wrote {}", output_path.display());
    }

    let mut code = 0;
    let verified = if args.verify && written {
        let roundtrip = verify_roundtrip(outcome.report.digest, &output_path)?;
        if !roundtrip.matches() {
            eprintln!(
                "error: {} does not match the input (expected {}, found {})",
                output_path.display(),
                roundtrip.expected,
                roundtrip.actual
            );
            code = 1;
        }
        Some(roundtrip.matches())
    } else {
        if args.verify {
            warn!("nothing to verify: no output was written");
        }
        None
    };

    let summary = RunSummary {
        input: input.display().to_string(),
        output: written.then(|| output_path.display().to_string()),
        elapsed_secs: elapsed.as_secs_f64(),
        verified,
        report: &outcome.report,
        signals: outcome.store.summaries(),
    };
    match args.format {
        ReportFormat::Text => {
            if !global.quiet {
                print!("{}", render_text(&summary, global.verbose));
            }
        }
        ReportFormat::Json => println!("{}", render_json(&summary)),
    }

    Ok(code)
}

/// Run options selected by the config. `--strict` on the command line only
/// ever turns strictness on.
fn options_from(config: &VcdxConfig, strict_flag: bool) -> TranscodeOptions {
    let mut options = TranscodeOptions::from(config);
    options.strict |= strict_flag;
    options
}

/// `<input><suffix>`, appended to the full file name.
fn output_path(input: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(input.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Opens the dump sink; a failure degrades the run to read-only.
fn open_sink(path: &Path) -> Option<BufWriter<File>> {
    match File::create(path) {
        Ok(file) => Some(BufWriter::new(file)),
        Err(e) => {
            eprintln!(
                "warning: cannot open {}: {e}; continuing without dump",
                path.display()
            );
            None
        }
    }
}
