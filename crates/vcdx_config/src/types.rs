//! Configuration types deserialized from `vcdx.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;

/// The top-level configuration parsed from `vcdx.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VcdxConfig {
    /// Dump output settings.
    #[serde(default)]
    pub output: OutputConfig,
    /// Value-change classification settings.
    #[serde(default)]
    pub classify: ClassifyConfig,
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// Settings for the re-emitted VCD document.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Suffix appended to the input path to form the output path.
    #[serde(default = "default_suffix")]
    pub suffix: String,
    /// Write `$upscope $end` after each scope block.
    #[serde(default)]
    pub emit_upscope: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            suffix: default_suffix(),
            emit_upscope: false,
        }
    }
}

fn default_suffix() -> String {
    ".out".to_string()
}

/// Settings for the value-change classifier.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifyConfig {
    /// Abort on unrecognized tokens and shape conflicts instead of dropping them.
    #[serde(default)]
    pub strict: bool,
    /// How the symbol of a vector change is extracted.
    #[serde(default)]
    pub vector_symbol: VectorSymbolMode,
    /// Warn when a vector token's bit count differs from the declared width.
    #[serde(default)]
    pub validate_width: bool,
}

/// Vector symbol extraction mode.
///
/// Written in TOML as `"trailing"` or `"fixed<N>"` (for example `"fixed2"`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VectorSymbolMode {
    /// Everything after the last whitespace character.
    #[default]
    Trailing,
    /// At most this many characters after the last whitespace character.
    Fixed(usize),
}

impl<'de> Deserialize<'de> for VectorSymbolMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ModeVisitor;

        impl<'de> Visitor<'de> for ModeVisitor {
            type Value = VectorSymbolMode;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("\"trailing\" or \"fixed<N>\" with N >= 1")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                let v = v.trim().to_ascii_lowercase();
                if v == "trailing" {
                    return Ok(VectorSymbolMode::Trailing);
                }
                match v.strip_prefix("fixed").map(str::parse::<usize>) {
                    Some(Ok(n)) if n > 0 => Ok(VectorSymbolMode::Fixed(n)),
                    _ => Err(E::invalid_value(de::Unexpected::Str(&v), &self)),
                }
            }
        }

        deserializer.deserialize_str(ModeVisitor)
    }
}

/// Logging settings.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Default `tracing` filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}
