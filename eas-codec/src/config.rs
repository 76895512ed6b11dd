//! Codec configuration.

use serde::{Deserialize, Serialize};

/// Decoding policy shared by every operation of a [`Codec`](crate::Codec).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Reject payloads that decode but are not the canonical encoding of the
    /// decoded values (trailing bytes, dirty padding, relocated tails).
    pub strict_decoding: bool,
    /// Largest payload accepted for decoding, in bytes.
    pub max_payload_len: Option<usize>,
}

impl CodecConfig {
    pub fn strict() -> Self {
        Self {
            strict_decoding: true,
            ..Self::default()
        }
    }

    pub fn with_max_payload_len(mut self, len: usize) -> Self {
        self.max_payload_len = Some(len);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_lenient() {
        let config = CodecConfig::default();
        assert!(!config.strict_decoding);
        assert_eq!(config.max_payload_len, None);
    }

    #[test]
    fn test_partial_json() {
        let config: CodecConfig = serde_json::from_str(r#"{"max_payload_len": 4096}"#).unwrap();
        assert_eq!(config, CodecConfig::default().with_max_payload_len(4096));

        let config: CodecConfig = serde_json::from_str(r#"{"strict_decoding": true}"#).unwrap();
        assert_eq!(config, CodecConfig::strict());
    }
}
