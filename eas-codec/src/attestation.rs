//! Registry records as returned by the attestation contracts.

use ethers_core::types::{Address, Bytes};
use serde::{Deserialize, Serialize};

use crate::encoding::{Codec, SchemaItem};
use crate::error::Result;
use crate::resolve::Destination;
use crate::schema::schema_uid;
use crate::uid::Uid;

/// A registered schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRecord {
    pub uid: Uid,
    pub resolver: Address,
    pub revocable: bool,
    pub schema: String,
}

impl SchemaRecord {
    /// Build a record whose UID is derived from its other fields.
    pub fn new(schema: impl Into<String>, resolver: Address, revocable: bool) -> Self {
        let schema = schema.into();
        Self {
            uid: schema_uid(&schema, resolver, revocable),
            resolver,
            revocable,
            schema,
        }
    }

    /// Whether `uid` is the identifier the registry derives for this record.
    pub fn is_consistent(&self) -> bool {
        self.uid == schema_uid(&self.schema, self.resolver, self.revocable)
    }
}

/// A stored attestation. Times are unix seconds; zero means unset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attestation {
    pub uid: Uid,
    pub schema: Uid,
    pub time: u64,
    pub expiration_time: u64,
    pub revocation_time: u64,
    pub ref_uid: Uid,
    pub recipient: Address,
    pub attester: Address,
    pub revocable: bool,
    pub data: Bytes,
}

impl Attestation {
    pub fn is_revoked(&self) -> bool {
        self.revocation_time != 0
    }

    pub fn is_expired(&self, now: u64) -> bool {
        self.expiration_time != 0 && self.expiration_time <= now
    }

    /// Decode the payload against the schema it was made under.
    pub fn fields(&self, schema: &str) -> Result<Vec<SchemaItem>> {
        self.fields_with(&Codec::default(), schema)
    }

    pub fn fields_with(&self, codec: &Codec, schema: &str) -> Result<Vec<SchemaItem>> {
        codec.decode_fields(&self.data, schema)
    }

    /// Decode the payload into caller-owned destinations.
    pub fn scan_values(&self, destinations: &mut [&mut dyn Destination]) -> Result<()> {
        self.scan_values_with(&Codec::default(), destinations)
    }

    pub fn scan_values_with(
        &self,
        codec: &Codec,
        destinations: &mut [&mut dyn Destination],
    ) -> Result<()> {
        codec.unpack(&self.data, destinations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::pack;
    use crate::value::Value;

    fn attestation(data: Vec<u8>) -> Attestation {
        Attestation {
            uid: Uid([1; 32]),
            schema: Uid([2; 32]),
            time: 1_700_000_000,
            recipient: Address::repeat_byte(0xaa),
            attester: Address::repeat_byte(0xbb),
            revocable: true,
            data: data.into(),
            ..Attestation::default()
        }
    }

    #[test]
    fn test_schema_record_uid() {
        let record = SchemaRecord::new("bool like", Address::zero(), true);
        assert!(record.is_consistent());
        assert_eq!(record.uid, schema_uid("bool like", Address::zero(), true));

        let tampered = SchemaRecord {
            revocable: false,
            ..record
        };
        assert!(!tampered.is_consistent());
    }

    #[test]
    fn test_lifecycle_flags() {
        let mut att = attestation(Vec::new());
        assert!(!att.is_revoked());
        assert!(!att.is_expired(u64::MAX));

        att.expiration_time = 100;
        assert!(!att.is_expired(99));
        assert!(att.is_expired(100));

        att.revocation_time = 5;
        assert!(att.is_revoked());
    }

    #[test]
    fn test_fields_and_scan() {
        let data = pack(&[&"hi", &7u32]).unwrap();
        let att = attestation(data);

        let fields = att.fields("string greeting, uint32 count").unwrap();
        assert_eq!(fields[0].name, "greeting");
        assert_eq!(fields[0].value, Value::String("hi".into()));
        assert_eq!(fields[1].ty.to_string(), "uint32");

        let mut greeting = String::new();
        let mut count = 0u32;
        att.scan_values(&mut [&mut greeting, &mut count]).unwrap();
        assert_eq!(greeting, "hi");
        assert_eq!(count, 7);
    }

    #[test]
    fn test_json_field_names() {
        let json = serde_json::to_value(attestation(vec![0xde, 0xad])).unwrap();
        assert_eq!(json["refUid"], Uid::ZERO.to_string());
        assert_eq!(json["data"], "0xdead");
        assert_eq!(json["expirationTime"], 0);
    }
}
