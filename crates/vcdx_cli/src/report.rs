//! Run summaries for the terminal and for JSON consumers.

use std::fmt::Write;

use serde::Serialize;
use vcdx_transcode::{SignalSummary, TranscodeReport};

/// Everything reported about one run.
#[derive(Serialize)]
pub struct RunSummary<'a> {
    /// Input path as given.
    pub input: String,
    /// Dump path, if one was written.
    pub output: Option<String>,
    /// Wall time of header and data processing.
    pub elapsed_secs: f64,
    /// Verification outcome, if `--verify` ran.
    pub verified: Option<bool>,
    /// Counters from the transcoder.
    pub report: &'a TranscodeReport,
    /// Per-signal log summaries.
    pub signals: Vec<SignalSummary>,
}

impl RunSummary<'_> {
    /// `ReadAndOutTime` when a dump was written, `ReadTime` otherwise.
    pub fn timing_label(&self) -> &'static str {
        if self.output.is_some() {
            "ReadAndOutTime"
        } else {
            "ReadTime"
        }
    }
}

/// Renders the human-readable summary. `detailed` adds one line per signal.
pub fn render_text(summary: &RunSummary<'_>, detailed: bool) -> String {
    let r = summary.report;
    let mut out = String::new();
    let _ = writeln!(out, "{}: {:.6}s", summary.timing_label(), summary.elapsed_secs);
    let _ = writeln!(
        out,
        "   Signals {} declared, {} scalar, {} vector",
        r.declared_signals, r.scalar_signals, r.vector_signals
    );
    let _ = writeln!(
        out,
        "   Changes {} in {} batches",
        r.changes, r.batches
    );
    if let (Some(first), Some(last)) = (r.first_time, r.last_time) {
        let _ = writeln!(out, "      Time #{first}..#{last}");
    }
    let dropped = r.unrecognized + r.conflicts;
    if dropped > 0 {
        let _ = writeln!(
            out,
            "   Dropped {dropped} ({} unrecognized, {} shape conflicts)",
            r.unrecognized, r.conflicts
        );
    }
    if r.width_mismatches > 0 {
        let _ = writeln!(out, "  Mismatch {} vector widths", r.width_mismatches);
    }
    if r.omitted_vars > 0 {
        let _ = writeln!(out, "   Omitted {} declarations of unknown type", r.omitted_vars);
    }
    if let Some(verified) = summary.verified {
        let _ = writeln!(out, "  Verified {}", if verified { "ok" } else { "MISMATCH" });
    }
    let _ = writeln!(out, "    Digest {}", r.digest);
    if detailed {
        for s in &summary.signals {
            let _ = writeln!(
                out,
                "    {:<8} {:<6} slot {:<4} {} changes",
                s.symbol, s.shape, s.slot, s.changes
            );
        }
    }
    out
}

/// Renders the summary as pretty-printed JSON.
pub fn render_json(summary: &RunSummary<'_>) -> String {
    serde_json::to_string_pretty(summary).unwrap_or_else(|_| "{}".to_string())
}
