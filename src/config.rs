use crate::cast::CastPolicy;
use crate::data_type::ByteOrder;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Settings for the conversion tool, read from a JSON file such as
///
/// ```json
/// { "policy": { "overflow": "wrap", "nan": "zero" }, "default_byte_order": "big_endian" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterConfig {
    pub policy: CastPolicy,
    /// Replaces the byte order of type strings written with `=`
    pub default_byte_order: Option<ByteOrder>,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> ConfigError {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> ConfigError {
        ConfigError::Parse(err)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::result::Result<(), std::fmt::Error> {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to read configuration: {}", e),
            ConfigError::Parse(e) => write!(f, "Invalid configuration: {}", e),
        }
    }
}

pub fn read_str(text: &str) -> Result<ConverterConfig, ConfigError> {
    Ok(serde_json::from_str(text)?)
}

pub fn read_file<P: AsRef<Path>>(path: P) -> Result<ConverterConfig, ConfigError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
use test_log::test;

#[test]
fn test_read_config() {
    use crate::cast::{NanPolicy, OverflowPolicy};
    let conf = read_str(
        r#"{"policy": {"overflow": "wrap", "nan": "minimum"},
            "default_byte_order": "big_endian"}"#,
    )
    .unwrap();
    assert_eq!(conf.policy.overflow, OverflowPolicy::Wrap);
    assert_eq!(conf.policy.nan, NanPolicy::Minimum);
    assert_eq!(conf.default_byte_order, Some(ByteOrder::BigEndian));

    assert_eq!(read_str("{}").unwrap(), ConverterConfig::default());
    assert!(matches!(
        read_str(r#"{"byte_order": "big_endian"}"#),
        Err(ConfigError::Parse(_))
    ));
    assert!(matches!(
        read_str(r#"{"polcy": {}}"#),
        Err(ConfigError::Parse(_))
    ));
    assert!(matches!(
        read_str(r#"{"policy": {"overflow": "clip"}}"#),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_read_missing_file() {
    assert!(matches!(
        read_file("/nonexistent/numconv.json"),
        Err(ConfigError::Io(_))
    ));
}
