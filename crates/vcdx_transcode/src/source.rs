//! Waveform sources: the pull interface the transcoder consumes and a
//! streaming VCD text reader implementing it.
//!
//! The protocol is strictly ordered: [`WaveformSource::read_header`] once,
//! then [`WaveformSource::begin_read_time_data`], then alternate
//! [`WaveformSource::is_data_finished`] / [`WaveformSource::read_next_point_data`]
//! and read the current batch through [`WaveformSource::vc_time`] and
//! [`WaveformSource::vc_values`].

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::mem;
use std::path::Path;

use tracing::{debug, trace, warn};

use crate::error::TranscodeError;
use crate::scope::{Scope, ScopeTree, VarDecl};
use crate::var_type::{VarType, UNKNOWN_TYPE_CODE};

/// A producer of VCD header metadata and timestamped change batches.
pub trait WaveformSource {
    /// Reads date, version, timescale and the scope/variable declarations.
    fn read_header(&mut self) -> Result<(), TranscodeError>;

    /// The `$date` text.
    fn date(&self) -> &str;

    /// The `$version` text.
    fn version(&self) -> &str;

    /// The `$timescale` text.
    fn timescale(&self) -> &str;

    /// The declaration hierarchy read from the header.
    fn scope_tree(&self) -> &ScopeTree;

    /// Moves the declaration hierarchy out of the source.
    fn take_scope_tree(&mut self) -> ScopeTree;

    /// Top-level scopes in declaration order.
    fn top_scopes(&self) -> &[Scope] {
        self.scope_tree().roots()
    }

    /// Prepares the value-change stream. Must follow `read_header`.
    fn begin_read_time_data(&mut self) -> Result<(), TranscodeError>;

    /// Returns `true` once every batch has been read.
    fn is_data_finished(&self) -> bool;

    /// Advances to the next timestamp batch.
    fn read_next_point_data(&mut self) -> Result<(), TranscodeError>;

    /// Timestamp of the current batch.
    fn vc_time(&self) -> u64;

    /// Raw change tokens of the current batch, in source order.
    fn vc_values(&self) -> &[String];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ReaderState {
    Created,
    HeaderRead,
    Streaming,
}

/// Streaming reader for VCD text.
///
/// Data-section lines are split into change tokens: a word starting with
/// `b`, `B`, `r` or `R` is joined with the following word by a single space
/// (`b101 !A`), any other word is a token on its own.
pub struct VcdReader<R: BufRead> {
    reader: R,
    line_buf: Vec<u8>,
    line_num: usize,
    words: VecDeque<String>,
    state: ReaderState,
    date: String,
    version: String,
    timescale: String,
    tree: ScopeTree,
    // Changes that appeared before the first timestamp.
    stray: Vec<String>,
    // Timestamp line already consumed for the next batch.
    lookahead: Option<u64>,
    in_comment: bool,
    cur_time: u64,
    cur_values: Vec<String>,
}

impl<R: BufRead> VcdReader<R> {
    /// Wraps a buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_buf: Vec::new(),
            line_num: 0,
            words: VecDeque::new(),
            state: ReaderState::Created,
            date: String::new(),
            version: String::new(),
            timescale: String::new(),
            tree: ScopeTree::default(),
            stray: Vec::new(),
            lookahead: None,
            in_comment: false,
            cur_time: 0,
            cur_values: Vec::new(),
        }
    }

    /// The 1-based number of the last line read.
    pub fn line_number(&self) -> usize {
        self.line_num
    }

    /// Returns the next whitespace-separated word, reading lines as needed.
    ///
    /// Bytes that are not valid UTF-8 are replaced with U+FFFD, so stray
    /// Latin-1 text in comments or header strings does not abort the run.
    fn next_word(&mut self) -> Result<Option<String>, TranscodeError> {
        while self.words.is_empty() {
            self.line_buf.clear();
            if self.reader.read_until(b'\n', &mut self.line_buf)? == 0 {
                return Ok(None);
            }
            self.line_num += 1;
            let line = String::from_utf8_lossy(&self.line_buf);
            self.words.extend(line.split_whitespace().map(str::to_string));
        }
        Ok(self.words.pop_front())
    }

    fn parse_error(&self, message: impl Into<String>) -> TranscodeError {
        TranscodeError::Parse {
            line: self.line_num,
            message: message.into(),
        }
    }

    /// Applies one complete header directive. Returns `true` at
    /// `$enddefinitions`.
    fn apply_directive(
        &mut self,
        keyword: &str,
        body: &[String],
        line: usize,
        stack: &mut Vec<Scope>,
        roots: &mut Vec<Scope>,
    ) -> Result<bool, TranscodeError> {
        match keyword {
            "date" => self.date = body.join(" "),
            "version" => self.version = body.join(" "),
            "timescale" => self.timescale = body.join(" "),
            "scope" => {
                if body.len() < 2 {
                    return Err(TranscodeError::Parse {
                        line,
                        message: format!("invalid $scope: {}", body.join(" ")),
                    });
                }
                stack.push(Scope::new(body[0].as_str(), body[1].as_str()));
            }
            "upscope" => {
                let done = stack.pop().ok_or(TranscodeError::Parse {
                    line,
                    message: "$upscope without matching $scope".to_string(),
                })?;
                match stack.last_mut() {
                    Some(parent) => parent.add_child(done),
                    None => roots.push(done),
                }
            }
            "var" => {
                if body.len() < 4 {
                    return Err(TranscodeError::Parse {
                        line,
                        message: format!("invalid $var: {}", body.join(" ")),
                    });
                }
                let width: u32 = body[1].parse().map_err(|_| TranscodeError::Parse {
                    line,
                    message: format!("invalid width in $var: {}", body[1]),
                })?;
                let type_code = match VarType::from_keyword(&body[0]) {
                    Some(ty) => ty.code(),
                    None => {
                        warn!(line, keyword = %body[0], "unknown $var type");
                        UNKNOWN_TYPE_CODE
                    }
                };
                // A trailing bit range (`data [7:0]`) stays part of the name.
                let name = body[3..].join(" ");
                let scope = stack.last_mut().ok_or(TranscodeError::Parse {
                    line,
                    message: format!("$var {name} outside of any $scope"),
                })?;
                let decl = VarDecl::new(body[2].as_str(), type_code, width);
                if let Some(old) = scope.add_var(name.as_str(), decl) {
                    debug!(line, %name, old_symbol = %old.symbol, "variable redeclared in scope");
                }
            }
            "enddefinitions" => {
                if !stack.is_empty() {
                    debug!(open = stack.len(), "closing scopes left open at $enddefinitions");
                }
                while let Some(done) = stack.pop() {
                    match stack.last_mut() {
                        Some(parent) => parent.add_child(done),
                        None => roots.push(done),
                    }
                }
                return Ok(true);
            }
            "comment" => {}
            other => debug!(line, keyword = other, "ignoring header directive"),
        }
        Ok(false)
    }

    /// Reads change tokens into `out` until the next timestamp or EOF.
    fn read_batch(&mut self, out: &mut Vec<String>) -> Result<Option<u64>, TranscodeError> {
        while let Some(word) = self.next_word()? {
            if self.in_comment {
                if word == "$end" {
                    self.in_comment = false;
                }
                continue;
            }
            if let Some(ts) = word.strip_prefix('#') {
                let time = ts
                    .parse::<u64>()
                    .map_err(|_| self.parse_error(format!("invalid timestamp: {word}")))?;
                return Ok(Some(time));
            }
            if word.starts_with('$') {
                if word == "$comment" {
                    self.in_comment = true;
                } else {
                    trace!(line = self.line_num, directive = %word, "skipping data directive");
                }
                continue;
            }
            let token = if word.starts_with(['b', 'B', 'r', 'R']) {
                match self.next_word()? {
                    Some(symbol) => format!("{word} {symbol}"),
                    None => word,
                }
            } else {
                word
            };
            out.push(token);
        }
        Ok(None)
    }
}

impl VcdReader<BufReader<File>> {
    /// Opens a VCD file from a filesystem path.
    pub fn open(path: &Path) -> Result<Self, TranscodeError> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

/// Opens a VCD file as a [`WaveformSource`].
pub fn open_vcd(path: &Path) -> Result<VcdReader<BufReader<File>>, TranscodeError> {
    VcdReader::open(path)
}

impl<R: BufRead> WaveformSource for VcdReader<R> {
    fn read_header(&mut self) -> Result<(), TranscodeError> {
        if self.state != ReaderState::Created {
            return Err(TranscodeError::Protocol("header already read".to_string()));
        }

        let mut stack: Vec<Scope> = Vec::new();
        let mut roots: Vec<Scope> = Vec::new();
        let mut saw_enddefinitions = false;

        while let Some(word) = self.next_word()? {
            let Some(keyword) = word.strip_prefix('$') else {
                return Err(self.parse_error(format!("expected header directive, found '{word}'")));
            };
            let keyword = keyword.to_lowercase();
            if keyword == "end" {
                return Err(self.parse_error("$end without directive"));
            }
            let start_line = self.line_num;
            let mut body = Vec::new();
            loop {
                match self.next_word()? {
                    Some(w) if w == "$end" => break,
                    Some(w) => body.push(w),
                    None => {
                        return Err(TranscodeError::Format(format!(
                            "unterminated ${keyword} starting at line {start_line}"
                        )));
                    }
                }
            }
            if self.apply_directive(&keyword, &body, start_line, &mut stack, &mut roots)? {
                saw_enddefinitions = true;
                break;
            }
        }

        if !saw_enddefinitions && (!stack.is_empty() || !roots.is_empty()) {
            return Err(TranscodeError::Format(
                "missing $enddefinitions".to_string(),
            ));
        }

        self.tree = ScopeTree::build(roots);
        self.state = ReaderState::HeaderRead;
        debug!(
            scopes = self.tree.roots().len(),
            signals = self.tree.signal_count(),
            "header read"
        );
        Ok(())
    }

    fn date(&self) -> &str {
        &self.date
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn timescale(&self) -> &str {
        &self.timescale
    }

    fn scope_tree(&self) -> &ScopeTree {
        &self.tree
    }

    fn take_scope_tree(&mut self) -> ScopeTree {
        mem::take(&mut self.tree)
    }

    fn begin_read_time_data(&mut self) -> Result<(), TranscodeError> {
        if self.state != ReaderState::HeaderRead {
            return Err(TranscodeError::Protocol(
                "begin_read_time_data requires a freshly read header".to_string(),
            ));
        }
        let mut stray = Vec::new();
        self.lookahead = self.read_batch(&mut stray)?;
        if !stray.is_empty() {
            debug!(count = stray.len(), "changes before first timestamp assigned to time 0");
        }
        self.stray = stray;
        self.state = ReaderState::Streaming;
        Ok(())
    }

    fn is_data_finished(&self) -> bool {
        self.state != ReaderState::Streaming || (self.stray.is_empty() && self.lookahead.is_none())
    }

    fn read_next_point_data(&mut self) -> Result<(), TranscodeError> {
        if self.state != ReaderState::Streaming {
            return Err(TranscodeError::Protocol(
                "read_next_point_data before begin_read_time_data".to_string(),
            ));
        }
        if !self.stray.is_empty() {
            self.cur_time = 0;
            self.cur_values = mem::take(&mut self.stray);
            return Ok(());
        }
        let Some(time) = self.lookahead.take() else {
            return Err(TranscodeError::Protocol("no more value-change data".to_string()));
        };
        let mut values = mem::take(&mut self.cur_values);
        values.clear();
        self.lookahead = self.read_batch(&mut values)?;
        if let Some(next) = self.lookahead {
            if next < time {
                warn!(line = self.line_num, from = time, to = next, "timestamp goes backwards");
            }
        }
        self.cur_time = time;
        self.cur_values = values;
        Ok(())
    }

    fn vc_time(&self) -> u64 {
        self.cur_time
    }

    fn vc_values(&self) -> &[String] {
        &self.cur_values
    }
}
