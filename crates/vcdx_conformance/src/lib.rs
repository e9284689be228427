//! Conformance test helpers for vcdx.
//!
//! Provides fixture VCD documents and a pipeline function that runs text
//! through the reader, classifier, store and re-encoder, returning the
//! outcome together with the dump for assertion in integration tests.

#![warn(missing_docs)]

use std::io::Cursor;

use vcdx_common::Logic;
use vcdx_config::VcdxConfig;
use vcdx_transcode::{
    transcode, SignalLog, TranscodeError, TranscodeOptions, TranscodeOutcome, VcdReader,
};

/// The minimal clocked design: one wire `clk` with symbol `#` under `top`.
pub const CLK_VCD: &str = "\
$date
 today
$end
$version
 sim
$end
$timescale
 1ns
 $end
$scope module top $end
$var wire 1 # clk $end
$upscope $end
$enddefinitions $end

#1
0#
#2
1#
";

/// A simulator-style dump: nested scopes, an aliased clock, a ranged vector,
/// a real variable, a `$dumpvars` block and a header comment.
pub const COUNTER_VCD: &str = "\
$date
   Mon Jan  1 00:00:00 2024
$end
$version
   Icarus Verilog
$end
$timescale
   1ps
$end
$comment generated for conformance $end
$scope module tb $end
$var wire 1 ! clk $end
$var wire 1 \" rst $end
$scope module dut $end
$var wire 1 ! clk $end
$var reg 4 # count [3:0] $end
$var real 64 $ temp $end
$upscope $end
$upscope $end
$enddefinitions $end
#0
$dumpvars
0!
1\"
b0000 #
r0.0 $
$end
#5
1!
#10
0!
0\"
b0001 #
r1.25 $
#15
1!
#20
0!
b0010 #
";

/// Result of running a document through the full transcode pipeline.
pub struct PipelineResult {
    /// Tree, store and report of the run.
    pub outcome: TranscodeOutcome,
    /// Everything the re-encoder wrote.
    pub dump: String,
}

impl PipelineResult {
    /// The part of the dump after `$enddefinitions $end` and its blank line.
    pub fn data_section(&self) -> &str {
        self.dump
            .split_once("$enddefinitions $end\n\n")
            .map(|(_, data)| data)
            .unwrap_or("")
    }

    /// `(time, value)` pairs of a scalar log, empty if the symbol is not scalar.
    pub fn scalar_history(&self, symbol: &str) -> Vec<(u64, Logic)> {
        match self.outcome.store.log_for(symbol) {
            Some(SignalLog::Scalar(log)) => log.iter().map(|r| (r.time, r.value)).collect(),
            _ => Vec::new(),
        }
    }

    /// `(time, bits)` pairs of a vector log, bits rendered as `01xz` text.
    pub fn vector_history(&self, symbol: &str) -> Vec<(u64, String)> {
        match self.outcome.store.log_for(symbol) {
            Some(SignalLog::Vector(log)) => log
                .iter()
                .map(|r| (r.time, r.value.iter().map(|b| b.to_char()).collect()))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Runs `text` through reader, store and re-encoder with default options.
pub fn full_pipeline(text: &str) -> Result<PipelineResult, TranscodeError> {
    full_pipeline_with_options(text, TranscodeOptions::default())
}

/// Runs `text` through reader, store and re-encoder with explicit options.
pub fn full_pipeline_with_options(
    text: &str,
    options: TranscodeOptions,
) -> Result<PipelineResult, TranscodeError> {
    let mut source = VcdReader::new(Cursor::new(text));
    let (outcome, sink) = transcode(&mut source, Some(Vec::new()), options)?;
    let dump = String::from_utf8_lossy(&sink.unwrap_or_default()).into_owned();
    Ok(PipelineResult { outcome, dump })
}

/// Parses a `vcdx.toml` document, panicking on invalid input.
pub fn make_config(toml_str: &str) -> VcdxConfig {
    vcdx_config::load_config_from_str(toml_str).unwrap()
}
