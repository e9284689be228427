//! VCD re-encoding: header block from a [`ScopeTree`], data section as a
//! verbatim echo of the source's change tokens.

use std::io::Write;

use tracing::warn;

use crate::error::TranscodeError;
use crate::scope::{Scope, ScopeTree};
use crate::var_type::keyword_for;

/// Header metadata written before the scope definitions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderInfo {
    /// `$date` text.
    pub date: String,
    /// `$version` text.
    pub version: String,
    /// `$timescale` text.
    pub timescale: String,
}

/// Writes a VCD document incrementally: one header, then batches.
pub struct VcdWriter<W: Write> {
    writer: W,
    emit_upscope: bool,
    header_written: bool,
    batches: u64,
    omitted_vars: usize,
}

impl<W: Write> VcdWriter<W> {
    /// Creates a writer that omits `$upscope` closers.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            emit_upscope: false,
            header_written: false,
            batches: 0,
            omitted_vars: 0,
        }
    }

    /// Writes `$upscope $end` after every scope block when enabled.
    pub fn with_upscope(mut self, emit_upscope: bool) -> Self {
        self.emit_upscope = emit_upscope;
        self
    }

    /// Writes date, version, timescale, every scope in pre-order and the
    /// single `$enddefinitions $end` marker.
    pub fn write_header(
        &mut self,
        info: &HeaderInfo,
        tree: &ScopeTree,
    ) -> Result<(), TranscodeError> {
        if self.header_written {
            return Err(TranscodeError::Protocol("header already written".to_string()));
        }
        write!(self.writer, "$date\n {}\n$end\n", info.date)?;
        write!(self.writer, "$version\n {}\n$end\n", info.version)?;
        write!(self.writer, "$timescale\n {}\n $end\n", info.timescale)?;
        for root in tree.roots() {
            self.write_scope(root)?;
        }
        write!(self.writer, "$enddefinitions $end\n\n")?;
        self.header_written = true;
        Ok(())
    }

    fn write_scope(&mut self, scope: &Scope) -> Result<(), TranscodeError> {
        writeln!(self.writer, "$scope {} {} $end", scope.kind(), scope.name())?;
        for (name, decl) in scope.vars() {
            let keyword = keyword_for(decl.type_code);
            if keyword.is_empty() {
                warn!(
                    scope = scope.name(),
                    var = name,
                    symbol = %decl.symbol,
                    "omitting variable of unknown type"
                );
                self.omitted_vars += 1;
                continue;
            }
            writeln!(
                self.writer,
                "$var {keyword} {} {} {name} $end",
                decl.width, decl.symbol
            )?;
        }
        for child in scope.children() {
            self.write_scope(child)?;
        }
        if self.emit_upscope {
            writeln!(self.writer, "$upscope $end")?;
        }
        Ok(())
    }

    /// Writes `#<time>` followed by each change line verbatim.
    pub fn emit_batch(&mut self, time: u64, changes: &[String]) -> Result<(), TranscodeError> {
        writeln!(self.writer, "#{time}")?;
        for change in changes {
            writeln!(self.writer, "{change}")?;
        }
        self.batches += 1;
        Ok(())
    }

    /// Number of batches emitted.
    pub fn batches_written(&self) -> u64 {
        self.batches
    }

    /// Number of declarations left out of the header for an unknown type.
    pub fn omitted_vars(&self) -> usize {
        self.omitted_vars
    }

    /// Flushes and returns the underlying writer.
    pub fn finish(mut self) -> Result<W, TranscodeError> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}
