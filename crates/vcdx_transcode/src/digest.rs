//! Content digests over the data section of a VCD stream.
//!
//! A digest covers exactly the bytes [`VcdWriter::emit_batch`](crate::VcdWriter::emit_batch)
//! would write: `#<time>\n` per batch followed by `<token>\n` per change.
//! Equal digests for an input and its dump mean the echo was faithful.

use std::path::Path;

use serde::Serialize;
use vcdx_common::{ContentHash, ContentHasher};

use crate::error::TranscodeError;
use crate::source::{open_vcd, WaveformSource};

/// Incremental digest of a sequence of batches.
#[derive(Default)]
pub struct StreamDigest {
    hasher: ContentHasher,
    batches: u64,
    tokens: u64,
}

impl StreamDigest {
    /// Creates an empty digest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one batch.
    pub fn update_batch(&mut self, time: u64, tokens: &[String]) {
        self.hasher.update(format!("#{time}\n").as_bytes());
        for token in tokens {
            self.hasher.update(token.as_bytes());
            self.hasher.update(b"\n");
        }
        self.batches += 1;
        self.tokens += tokens.len() as u64;
    }

    /// Number of batches fed.
    pub fn batches(&self) -> u64 {
        self.batches
    }

    /// Number of tokens fed.
    pub fn tokens(&self) -> u64 {
        self.tokens
    }

    /// The hash of everything fed so far.
    pub fn finish(&self) -> ContentHash {
        self.hasher.finish()
    }
}

/// Reads a whole source and digests its data section.
pub fn digest_source<S: WaveformSource>(source: &mut S) -> Result<StreamDigest, TranscodeError> {
    source.read_header()?;
    source.begin_read_time_data()?;
    let mut digest = StreamDigest::new();
    while !source.is_data_finished() {
        source.read_next_point_data()?;
        digest.update_batch(source.vc_time(), source.vc_values());
    }
    Ok(digest)
}

/// Opens a VCD file and digests its data section.
pub fn digest_file(path: &Path) -> Result<StreamDigest, TranscodeError> {
    let mut reader = open_vcd(path)?;
    digest_source(&mut reader)
}

/// Outcome of comparing an input digest with the digest of its dump.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RoundTrip {
    /// Digest of the source data section.
    pub expected: ContentHash,
    /// Digest of the re-read dump.
    pub actual: ContentHash,
    /// Number of batches found in the dump.
    pub batches: u64,
}

impl RoundTrip {
    /// Returns `true` if the dump echoed the source faithfully.
    pub fn matches(&self) -> bool {
        self.expected == self.actual
    }
}

/// Re-reads a dump written by the transcoder and compares its data-section
/// digest with `expected`.
pub fn verify_roundtrip(expected: ContentHash, output: &Path) -> Result<RoundTrip, TranscodeError> {
    let digest = digest_file(output)?;
    Ok(RoundTrip {
        expected,
        actual: digest.finish(),
        batches: digest.batches(),
    })
}
