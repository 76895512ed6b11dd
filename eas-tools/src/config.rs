//! Codec settings taken from the environment.

use std::env;

use anyhow::{Context, Result};
use eas_codec::CodecConfig;

pub const STRICT_VAR: &str = "EAS_CODEC_STRICT";
pub const MAX_PAYLOAD_LEN_VAR: &str = "EAS_CODEC_MAX_PAYLOAD_LEN";

/// Load decoding settings from environment variables.
///
/// Unset variables keep the library defaults.
pub fn from_env() -> Result<CodecConfig> {
    from_lookup(|key| env::var(key).ok())
}

fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<CodecConfig> {
    let mut config = CodecConfig::default();

    if let Some(value) = lookup(STRICT_VAR) {
        config.strict_decoding = parse_flag(&value)
            .with_context(|| format!("{STRICT_VAR} must be true or false, got {value:?}"))?;
    }

    if let Some(value) = lookup(MAX_PAYLOAD_LEN_VAR) {
        let len = value
            .trim()
            .parse()
            .with_context(|| format!("{MAX_PAYLOAD_LEN_VAR} must be a byte count, got {value:?}"))?;
        config.max_payload_len = Some(len);
    }

    Ok(config)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<CodecConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_empty_environment() {
        assert_eq!(load(&[]).unwrap(), CodecConfig::default());
    }

    #[test]
    fn test_reads_both_settings() {
        let config = load(&[(STRICT_VAR, "true"), (MAX_PAYLOAD_LEN_VAR, "4096")]).unwrap();
        assert!(config.strict_decoding);
        assert_eq!(config.max_payload_len, Some(4096));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(load(&[(STRICT_VAR, "maybe")]).is_err());
        assert!(load(&[(MAX_PAYLOAD_LEN_VAR, "lots")]).is_err());
    }
}
