//! Streaming VCD transcoding for vcdx.
//!
//! A [`WaveformSource`] produces header metadata and timestamped batches of
//! raw change tokens. The [`transcode`] driver classifies each token as a
//! scalar or vector change, appends it to the per-signal logs of a
//! [`ChangeLogStore`], and can echo every batch unchanged through a
//! [`VcdWriter`]. A [`StreamDigest`] over the data section lets a dump be
//! checked against its source with [`verify_roundtrip`].

#![warn(missing_docs)]

pub mod classify;
pub mod digest;
pub mod error;
pub mod registry;
pub mod scope;
pub mod source;
pub mod store;
pub mod transcode;
pub mod var_type;
pub mod writer;

pub use classify::{classify, Change, Shape, SymbolPolicy};
pub use digest::{digest_file, digest_source, verify_roundtrip, RoundTrip, StreamDigest};
pub use error::TranscodeError;
pub use registry::{SignalRegistry, SlotRef};
pub use scope::{Scope, ScopeTree, SymbolInfo, VarDecl};
pub use source::{open_vcd, VcdReader, WaveformSource};
pub use store::{
    ChangeLogStore, ChangeRecord, ScalarChange, SignalLog, SignalSummary, VectorChange,
};
pub use transcode::{transcode, TranscodeOptions, TranscodeOutcome, TranscodeReport, Transcoder};
pub use var_type::{keyword_for, VarType, UNKNOWN_TYPE_CODE};
pub use writer::{HeaderInfo, VcdWriter};
