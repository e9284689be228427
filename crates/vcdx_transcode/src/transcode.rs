//! The transcoding run: pulls batches from a [`WaveformSource`], classifies
//! every token into the [`ChangeLogStore`] and optionally echoes each batch to
//! a [`VcdWriter`].
//!
//! Policy for tokens that cannot be stored:
//! - unrecognized shape: dropped and counted (strict mode: error);
//! - shape conflict with an earlier sighting: dropped, counted, warned
//!   (strict mode: error);
//! - vector width differing from the declaration (only with
//!   `validate_width`): stored, counted, warned (strict mode: error).
//!
//! Dropped tokens are still echoed; the dump is always a faithful copy of the
//! source's data section.

use std::io::Write;

use serde::Serialize;
use tracing::{debug, trace, warn};
use vcdx_common::ContentHash;
use vcdx_config::{VcdxConfig, VectorSymbolMode};

use crate::classify::{classify, Change, SymbolPolicy};
use crate::digest::StreamDigest;
use crate::error::TranscodeError;
use crate::scope::ScopeTree;
use crate::source::WaveformSource;
use crate::store::ChangeLogStore;
use crate::writer::{HeaderInfo, VcdWriter};

/// Knobs for a transcoding run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TranscodeOptions {
    /// Vector symbol extraction.
    pub policy: SymbolPolicy,
    /// Turn drops and mismatches into errors.
    pub strict: bool,
    /// Compare vector bit counts with declared widths.
    pub validate_width: bool,
    /// Write `$upscope $end` closers in the dump header.
    pub emit_upscope: bool,
}

impl From<&VcdxConfig> for TranscodeOptions {
    /// Maps the `[classify]` and `[output]` sections onto run options.
    fn from(config: &VcdxConfig) -> Self {
        let policy = match config.classify.vector_symbol {
            VectorSymbolMode::Trailing => SymbolPolicy::Trailing,
            VectorSymbolMode::Fixed(n) => SymbolPolicy::Fixed(n),
        };
        Self {
            policy,
            strict: config.classify.strict,
            validate_width: config.classify.validate_width,
            emit_upscope: config.output.emit_upscope,
        }
    }
}

/// Counters describing a finished run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TranscodeReport {
    /// Timestamp batches processed.
    pub batches: u64,
    /// Raw change tokens seen.
    pub tokens: u64,
    /// Changes stored in the logs.
    pub changes: usize,
    /// Distinct scalar signals.
    pub scalar_signals: usize,
    /// Distinct vector signals.
    pub vector_signals: usize,
    /// Tokens of neither shape.
    pub unrecognized: u64,
    /// Tokens refused for a shape conflict.
    pub conflicts: u64,
    /// Vector changes whose width differs from the declaration.
    pub width_mismatches: u64,
    /// Stored changes whose symbol has no declaration.
    pub undeclared: u64,
    /// Variables declared in the header.
    pub declared_signals: usize,
    /// Declarations sharing a symbol with an earlier one.
    pub aliased_symbols: usize,
    /// Declarations left out of the dump header for an unknown type.
    pub omitted_vars: usize,
    /// Timestamp of the first batch.
    pub first_time: Option<u64>,
    /// Timestamp of the last batch.
    pub last_time: Option<u64>,
    /// XXH3-128 of the data section as read.
    pub digest: ContentHash,
}

/// Classifies batches into a change-log store.
pub struct Transcoder {
    options: TranscodeOptions,
    tree: ScopeTree,
    store: ChangeLogStore,
    digest: StreamDigest,
    unrecognized: u64,
    conflicts: u64,
    width_mismatches: u64,
    undeclared: u64,
    first_time: Option<u64>,
    last_time: Option<u64>,
}

impl Transcoder {
    /// Creates a transcoder resolving symbols against `tree`.
    pub fn new(tree: ScopeTree, options: TranscodeOptions) -> Self {
        Self {
            options,
            tree,
            store: ChangeLogStore::new(),
            digest: StreamDigest::new(),
            unrecognized: 0,
            conflicts: 0,
            width_mismatches: 0,
            undeclared: 0,
            first_time: None,
            last_time: None,
        }
    }

    /// Classifies every token of one batch.
    ///
    /// There is no rollback: on error, tokens before the failing one stay
    /// recorded.
    pub fn process_batch(&mut self, time: u64, tokens: &[String]) -> Result<(), TranscodeError> {
        self.digest.update_batch(time, tokens);
        self.first_time.get_or_insert(time);
        self.last_time = Some(time);
        for token in tokens {
            self.process_token(time, token)?;
        }
        Ok(())
    }

    fn process_token(&mut self, time: u64, token: &str) -> Result<(), TranscodeError> {
        let Some(change) = classify(token, self.options.policy) else {
            if self.options.strict {
                return Err(TranscodeError::Unrecognized {
                    time,
                    token: token.to_string(),
                });
            }
            trace!(time, token, "dropping unrecognized change token");
            self.unrecognized += 1;
            return Ok(());
        };

        let declared = self.tree.lookup(change.symbol());
        let mut width_mismatch = None;
        if let (Some(info), Change::Vector { symbol, bits }) = (declared, &change) {
            if self.options.validate_width && bits.len() != info.width as usize {
                if self.options.strict {
                    return Err(TranscodeError::WidthMismatch {
                        symbol: symbol.to_string(),
                        time,
                        declared: info.width,
                        actual: bits.len(),
                    });
                }
                width_mismatch = Some((info.width, bits.len()));
            }
        }
        let is_declared = declared.is_some();
        let symbol = change.symbol();

        match self.store.record(time, change) {
            Ok(_) => {
                if let Some((declared, actual)) = width_mismatch {
                    warn!(time, symbol, declared, actual, "vector width mismatch");
                    self.width_mismatches += 1;
                }
                if !is_declared {
                    debug!(time, symbol, "change for undeclared symbol");
                    self.undeclared += 1;
                }
                Ok(())
            }
            Err(err @ TranscodeError::ShapeConflict { .. }) => {
                if self.options.strict {
                    return Err(err);
                }
                warn!(time, token, "{err}");
                self.conflicts += 1;
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// The store filled so far.
    pub fn store(&self) -> &ChangeLogStore {
        &self.store
    }

    /// The declaration tree symbols are resolved against.
    pub fn tree(&self) -> &ScopeTree {
        &self.tree
    }

    /// Ends the run and returns its parts.
    pub fn finish(self) -> TranscodeOutcome {
        let report = TranscodeReport {
            batches: self.digest.batches(),
            tokens: self.digest.tokens(),
            changes: self.store.total_changes(),
            scalar_signals: self.store.scalar_count(),
            vector_signals: self.store.vector_count(),
            unrecognized: self.unrecognized,
            conflicts: self.conflicts,
            width_mismatches: self.width_mismatches,
            undeclared: self.undeclared,
            declared_signals: self.tree.signal_count(),
            aliased_symbols: self.tree.aliased_symbols(),
            omitted_vars: 0,
            first_time: self.first_time,
            last_time: self.last_time,
            digest: self.digest.finish(),
        };
        TranscodeOutcome {
            tree: self.tree,
            store: self.store,
            report,
        }
    }
}

/// Everything a run produces besides the dump itself.
pub struct TranscodeOutcome {
    /// Declaration hierarchy from the header.
    pub tree: ScopeTree,
    /// Per-signal change logs.
    pub store: ChangeLogStore,
    /// Run counters and data digest.
    pub report: TranscodeReport,
}

/// Runs the full pull loop over `source`, echoing to `sink` if given.
///
/// The sink receives the header once, one block per batch, and is flushed
/// exactly once at the end; it is returned so callers can inspect in-memory
/// buffers.
pub fn transcode<S, W>(
    source: &mut S,
    sink: Option<W>,
    options: TranscodeOptions,
) -> Result<(TranscodeOutcome, Option<W>), TranscodeError>
where
    S: WaveformSource,
    W: Write,
{
    source.read_header()?;
    let header = HeaderInfo {
        date: source.date().to_string(),
        version: source.version().to_string(),
        timescale: source.timescale().to_string(),
    };
    let tree = source.take_scope_tree();

    let mut writer = match sink {
        Some(w) => {
            let mut writer = VcdWriter::new(w).with_upscope(options.emit_upscope);
            writer.write_header(&header, &tree)?;
            Some(writer)
        }
        None => None,
    };

    let mut transcoder = Transcoder::new(tree, options);
    source.begin_read_time_data()?;
    while !source.is_data_finished() {
        source.read_next_point_data()?;
        let time = source.vc_time();
        let values = source.vc_values();
        transcoder.process_batch(time, values)?;
        if let Some(writer) = writer.as_mut() {
            writer.emit_batch(time, values)?;
        }
    }

    let mut outcome = transcoder.finish();
    let sink = match writer {
        Some(writer) => {
            outcome.report.omitted_vars = writer.omitted_vars();
            Some(writer.finish()?)
        }
        None => None,
    };
    debug!(
        batches = outcome.report.batches,
        changes = outcome.report.changes,
        "transcode finished"
    );
    Ok((outcome, sink))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Shape;
    use crate::source::VcdReader;
    use crate::store::{ChangeRecord, SignalLog};
    use std::io::Cursor;
    use vcdx_common::Logic::*;

    const CLK_VCD: &str = "\
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
$var reg 3 !A cnt $end
$upscope $end
$enddefinitions $end

#1
0#
b101 !A
#2
1#
";

    fn run(
        text: &str,
        options: TranscodeOptions,
    ) -> Result<(TranscodeOutcome, Option<Vec<u8>>), TranscodeError> {
        let mut source = VcdReader::new(Cursor::new(text));
        transcode(&mut source, Some(Vec::new()), options)
    }

    fn tokens(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn end_to_end_scalar_log() {
        let (outcome, _) = run(CLK_VCD, TranscodeOptions::default()).unwrap();
        match outcome.store.log_for("#").unwrap() {
            SignalLog::Scalar(log) => assert_eq!(
                log,
                [
                    ChangeRecord { time: 1, value: Zero },
                    ChangeRecord { time: 2, value: One },
                ]
            ),
            SignalLog::Vector(_) => panic!("clk should be scalar"),
        }
        assert_eq!(outcome.store.shape_of("!A"), Some(Shape::Vector));
        assert_eq!(outcome.report.batches, 2);
        assert_eq!(outcome.report.tokens, 3);
        assert_eq!(outcome.report.first_time, Some(1));
        assert_eq!(outcome.report.last_time, Some(2));
        assert_eq!(outcome.report.declared_signals, 2);
    }

    #[test]
    fn dump_echoes_data_section() {
        let (_, sink) = run(CLK_VCD, TranscodeOptions::default()).unwrap();
        let out = String::from_utf8(sink.unwrap()).unwrap();
        let data = out.split("$enddefinitions $end\n\n").nth(1).unwrap();
        assert_eq!(data, "#1\n0#\nb101 !A\n#2\n1#\n");
        assert!(out.starts_with(
            "$date\n today\n$end\n$version\n sim\n$end\n$timescale\n 1ns\n $end\n"
        ));
        assert!(out.contains(
            "$scope module top $end\n$var wire 1 # clk $end\n$var reg 3 !A cnt $end\n"
        ));
    }

    #[test]
    fn read_only_run_has_no_sink() {
        let mut source = VcdReader::new(Cursor::new(CLK_VCD));
        let (outcome, sink) =
            transcode::<_, Vec<u8>>(&mut source, None, TranscodeOptions::default()).unwrap();
        assert!(sink.is_none());
        assert_eq!(outcome.report.changes, 3);
    }

    #[test]
    fn unrecognized_tokens_are_dropped() {
        let mut t = Transcoder::new(ScopeTree::default(), TranscodeOptions::default());
        t.process_batch(0, &tokens(&["1!", "r1.5 %", "q"])).unwrap();
        let outcome = t.finish();
        assert_eq!(outcome.report.unrecognized, 2);
        assert_eq!(outcome.report.changes, 1);
        assert_eq!(outcome.report.tokens, 3);
    }

    #[test]
    fn strict_mode_rejects_unrecognized() {
        let options = TranscodeOptions {
            strict: true,
            ..Default::default()
        };
        let mut t = Transcoder::new(ScopeTree::default(), options);
        let err = t.process_batch(4, &tokens(&["1!", "r1.5 %"])).unwrap_err();
        assert!(matches!(err, TranscodeError::Unrecognized { time: 4, .. }));
        // no rollback of the earlier token
        assert_eq!(t.store().total_changes(), 1);
    }

    #[test]
    fn shape_conflict_dropped_when_lenient() {
        let mut t = Transcoder::new(ScopeTree::default(), TranscodeOptions::default());
        t.process_batch(0, &tokens(&["1!"])).unwrap();
        t.process_batch(1, &tokens(&["b10 !", "0!"])).unwrap();
        assert_eq!(t.store().shape_of("!"), Some(Shape::Scalar));
        assert_eq!(t.store().vector_count(), 0);
        let outcome = t.finish();
        assert_eq!(outcome.report.conflicts, 1);
        assert_eq!(outcome.store.log_for("!").unwrap().len(), 2);
    }

    #[test]
    fn backwards_time_is_logged_in_source_order() {
        let text = "$enddefinitions $end\n#5\n1!\n#3\n0!\n";
        let (outcome, sink) = run(text, TranscodeOptions::default()).unwrap();
        match outcome.store.log_for("!").unwrap() {
            SignalLog::Scalar(log) => assert_eq!(
                log,
                [
                    ChangeRecord { time: 5, value: One },
                    ChangeRecord { time: 3, value: Zero },
                ]
            ),
            SignalLog::Vector(_) => panic!("expected scalar log"),
        }
        assert_eq!(outcome.report.first_time, Some(5));
        assert_eq!(outcome.report.last_time, Some(3));
        let out = String::from_utf8(sink.unwrap()).unwrap();
        assert!(out.ends_with("#5\n1!\n#3\n0!\n"));
    }

    #[test]
    fn refused_tokens_are_not_counted_as_undeclared() {
        let mut t = Transcoder::new(ScopeTree::default(), TranscodeOptions::default());
        t.process_batch(0, &tokens(&["1?", "b10 ?"])).unwrap();
        let report = t.finish().report;
        assert_eq!(report.changes, 1);
        assert_eq!(report.conflicts, 1);
        assert_eq!(report.undeclared, 1);
    }

    #[test]
    fn options_from_config_sections() {
        let config = vcdx_config::load_config_from_str(
            "[classify]\nvector_symbol = \"fixed2\"\nstrict = true\n\
             [output]\nemit_upscope = true\n",
        )
        .unwrap();
        let options = TranscodeOptions::from(&config);
        assert_eq!(options.policy, SymbolPolicy::Fixed(2));
        assert!(options.strict);
        assert!(!options.validate_width);
        assert!(options.emit_upscope);
        assert_eq!(
            TranscodeOptions::from(&VcdxConfig::default()),
            TranscodeOptions::default()
        );
    }

    #[test]
    fn refused_tokens_are_not_counted_as_width_mismatches() {
        let options = TranscodeOptions {
            validate_width: true,
            ..Default::default()
        };
        let text = CLK_VCD.replace("b101 !A", "1!A\nb1 !A");
        let (outcome, _) = run(&text, options).unwrap();
        assert_eq!(outcome.report.conflicts, 1);
        assert_eq!(outcome.report.width_mismatches, 0);
    }

    #[test]
    fn shape_conflict_is_error_when_strict() {
        let options = TranscodeOptions {
            strict: true,
            ..Default::default()
        };
        let mut t = Transcoder::new(ScopeTree::default(), options);
        t.process_batch(0, &tokens(&["b10 !"])).unwrap();
        let err = t.process_batch(1, &tokens(&["1!"])).unwrap_err();
        assert!(matches!(
            err,
            TranscodeError::ShapeConflict {
                existing: Shape::Vector,
                attempted: Shape::Scalar,
                ..
            }
        ));
    }

    #[test]
    fn width_validation() {
        let options = TranscodeOptions {
            validate_width: true,
            ..Default::default()
        };
        let (outcome, _) = run(
            &CLK_VCD.replace("b101 !A", "b1 !A"),
            options,
        )
        .unwrap();
        assert_eq!(outcome.report.width_mismatches, 1);
        // still stored, with the token's own bit count
        match outcome.store.log_for("!A").unwrap() {
            SignalLog::Vector(log) => assert_eq!(log[0].value, vec![One]),
            SignalLog::Scalar(_) => panic!("expected vector"),
        }

        let strict = TranscodeOptions {
            validate_width: true,
            strict: true,
            ..Default::default()
        };
        let err = run(&CLK_VCD.replace("b101 !A", "b1 !A"), strict).err().unwrap();
        assert!(matches!(
            err,
            TranscodeError::WidthMismatch {
                declared: 3,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn width_not_checked_by_default() {
        let text = CLK_VCD.replace("b101 !A", "b1 !A");
        let (outcome, _) = run(&text, TranscodeOptions::default()).unwrap();
        assert_eq!(outcome.report.width_mismatches, 0);
    }

    #[test]
    fn undeclared_symbols_are_counted_and_stored() {
        let text = CLK_VCD.replace("1#\n", "1#\n1?\n");
        let (outcome, _) = run(&text, TranscodeOptions::default()).unwrap();
        assert_eq!(outcome.report.undeclared, 1);
        assert!(outcome.store.log_for("?").is_some());
    }

    #[test]
    fn fixed_policy_reproduces_two_char_symbols() {
        let options = TranscodeOptions {
            policy: SymbolPolicy::Fixed(2),
            ..Default::default()
        };
        let mut t = Transcoder::new(ScopeTree::default(), options);
        t.process_batch(0, &tokens(&["b1 abc"])).unwrap();
        assert!(t.store().log_for("ab").is_some());
        assert!(t.store().log_for("abc").is_none());
    }

    #[test]
    fn report_digest_matches_stream_digest() {
        let (outcome, _) = run(CLK_VCD, TranscodeOptions::default()).unwrap();
        assert_eq!(
            outcome.report.digest,
            ContentHash::from_bytes(b"#1\n0#\nb101 !A\n#2\n1#\n")
        );
    }

    #[test]
    fn report_serializes() {
        let (outcome, _) = run(CLK_VCD, TranscodeOptions::default()).unwrap();
        let json = serde_json::to_value(&outcome.report).unwrap();
        assert_eq!(json["batches"], 2);
        assert_eq!(json["scalar_signals"], 1);
        assert_eq!(json["vector_signals"], 1);
    }

    #[test]
    fn header_errors_propagate() {
        let err = run("$scope module top $end\n$var wire 1 ! a $end\n", TranscodeOptions::default())
            .err()
            .unwrap();
        assert!(matches!(err, TranscodeError::Format(_)));
    }
}
