//! 32-byte content identifiers for schemas and attestations.

use std::fmt;
use std::str::FromStr;

use ethers_core::types::H256;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::descriptor::TypeDescriptor;
use crate::error::Result;
use crate::resolve::{fixed_bytes, AbiType, Decode, Encode};
use crate::value::Value;

/// Identifier of a registered schema or a stored attestation.
///
/// Encodes as `bytes32`; its text form is `0x`-prefixed lowercase hex.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uid(pub [u8; 32]);

impl Uid {
    pub const ZERO: Uid = Uid([0u8; 32]);

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parse hex of any length, the way numeric keys are usually written.
    ///
    /// Short input is left-padded with zeros and long input keeps its
    /// rightmost 32 bytes. An odd digit count gets a leading zero.
    pub fn from_hex_padded(text: &str) -> std::result::Result<Self, hex::FromHexError> {
        let digits = text.strip_prefix("0x").unwrap_or(text);
        let decoded = if digits.len() % 2 == 1 {
            hex::decode(format!("0{digits}"))?
        } else {
            hex::decode(digits)?
        };

        let mut bytes = [0u8; 32];
        let tail = &decoded[decoded.len().saturating_sub(32)..];
        bytes[32 - tail.len()..].copy_from_slice(tail);
        Ok(Self(bytes))
    }

    /// Copy a list of identifiers into plain 32-byte arrays.
    pub fn to_bytes_vec(uids: &[Uid]) -> Vec<[u8; 32]> {
        uids.iter().map(|uid| uid.0).collect()
    }
}

impl From<[u8; 32]> for Uid {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<Uid> for [u8; 32] {
    fn from(uid: Uid) -> Self {
        uid.0
    }
}

impl From<H256> for Uid {
    fn from(hash: H256) -> Self {
        Self(hash.0)
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uid({self})")
    }
}

/// Parses exactly 64 hex digits, with or without `0x`. Use
/// [`Uid::from_hex_padded`] for shorter keys.
impl FromStr for Uid {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(digits, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl Serialize for Uid {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Uid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

impl AbiType for Uid {
    fn abi_type() -> TypeDescriptor {
        TypeDescriptor::FixedBytes(32)
    }
}

impl Encode for Uid {
    fn encode_value(&self) -> Result<Value> {
        Ok(Value::FixedBytes(self.0.to_vec()))
    }
}

impl Decode for Uid {
    fn decode_value(value: Value) -> Result<Self> {
        fixed_bytes::<32>(value).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0xb4d0ab81afc3474119212c28a8303ae693510a13d4024dae15eae99a59e2aa7c";

    #[test]
    fn test_hex_roundtrip() {
        let uid: Uid = KEY.parse().unwrap();
        assert_eq!(uid.0[0], 0xb4);
        assert_eq!(uid.to_string(), KEY);

        let bare: Uid = KEY.trim_start_matches("0x").parse().unwrap();
        assert_eq!(bare, uid);
    }

    #[test]
    fn test_rejects_wrong_length() {
        assert!("0xabcd".parse::<Uid>().is_err());
        assert!("0xzz".parse::<Uid>().is_err());
    }

    #[test]
    fn test_padded_hex() {
        let uid = Uid::from_hex_padded("0x1").unwrap();
        assert_eq!(uid.0[31], 1);
        assert!(uid.0[..31].iter().all(|b| *b == 0));

        assert_eq!(Uid::from_hex_padded("abcd").unwrap().0[30..], [0xab, 0xcd]);
        assert_eq!(Uid::from_hex_padded(KEY).unwrap(), KEY.parse::<Uid>().unwrap());
        assert!(Uid::from_hex_padded("").unwrap().is_zero());

        let long = format!("0xff{}", KEY.trim_start_matches("0x"));
        assert_eq!(Uid::from_hex_padded(&long).unwrap(), KEY.parse::<Uid>().unwrap());

        assert!(Uid::from_hex_padded("0xzz").is_err());
    }

    #[test]
    fn test_zero() {
        assert!(Uid::default().is_zero());
        assert!(!Uid([1; 32]).is_zero());
    }

    #[test]
    fn test_to_bytes_vec() {
        let uids = [Uid([1; 32]), Uid([2; 32])];
        assert_eq!(Uid::to_bytes_vec(&uids), vec![[1u8; 32], [2u8; 32]]);
        assert!(Uid::to_bytes_vec(&[]).is_empty());
    }

    #[test]
    fn test_serde_as_hex() {
        let uid: Uid = KEY.parse().unwrap();
        let json = serde_json::to_string(&uid).unwrap();
        assert_eq!(json, format!("\"{KEY}\""));
        let back: Uid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, uid);
    }

    #[test]
    fn test_resolves_to_bytes32() {
        assert_eq!(Uid::abi_type(), TypeDescriptor::FixedBytes(32));
        let uid = Uid([6; 32]);
        assert_eq!(Uid::decode_value(uid.encode_value().unwrap()).unwrap(), uid);
    }
}
