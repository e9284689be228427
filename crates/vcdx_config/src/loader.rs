//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::VcdxConfig;
use std::path::Path;

/// File name looked up next to the input waveform.
pub const CONFIG_FILE_NAME: &str = "vcdx.toml";

/// Loads `<dir>/vcdx.toml`, or returns the default configuration if the
/// file does not exist.
pub fn load_config(dir: &Path) -> Result<VcdxConfig, ConfigError> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if !config_path.is_file() {
        return Ok(VcdxConfig::default());
    }
    load_config_file(&config_path)
}

/// Loads and validates a configuration from an explicit file path.
pub fn load_config_file(path: &Path) -> Result<VcdxConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `vcdx.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<VcdxConfig, ConfigError> {
    let config: VcdxConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that configured values are usable.
fn validate_config(config: &VcdxConfig) -> Result<(), ConfigError> {
    if config.output.suffix.is_empty() {
        return Err(ConfigError::ValidationError(
            "output.suffix must not be empty".to_string(),
        ));
    }
    if config.log.level.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "log.level must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VectorSymbolMode;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn parse_empty_config() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.output.suffix, ".out");
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[output]
suffix = ".roundtrip.vcd"
emit_upscope = true

[classify]
strict = true
vector_symbol = "fixed2"
validate_width = true

[log]
level = "debug"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.output.suffix, ".roundtrip.vcd");
        assert!(config.output.emit_upscope);
        assert!(config.classify.strict);
        assert!(config.classify.validate_width);
        assert_eq!(config.classify.vector_symbol, VectorSymbolMode::Fixed(2));
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn empty_suffix_errors() {
        let err = load_config_from_str("[output]\nsuffix = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn empty_log_level_errors() {
        let err = load_config_from_str("[log]\nlevel = \" \"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn unknown_field_errors() {
        let err = load_config_from_str("[output]\nsufix = \".x\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_config_from_str("this is not valid toml {{{}}}").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.output.suffix, ".out");
    }

    #[test]
    fn reads_file_from_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[classify]\nstrict = true\n",
        )
        .unwrap();
        let config = load_config(dir.path()).unwrap();
        assert!(config.classify.strict);
    }

    #[test]
    fn io_error_from_nonexistent_file() {
        let err = load_config_file(Path::new("/nonexistent/dir/vcdx.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
