//! Packing values into attestation payloads and unpacking them again.
//!
//! A payload is the standard ABI encoding of the argument list as one tuple,
//! which is what the attestation contracts store and emit.

use ethers_core::abi::{self, Token};
use serde::Serialize;
use tracing::{debug, trace};

use crate::config::CodecConfig;
use crate::declaration::parse_schema;
use crate::descriptor::TypeDescriptor;
use crate::error::{CodecError, Result};
use crate::resolve::{Argument, Decode, Destination};
use crate::value::Value;

/// One decoded top-level field of a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaItem {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    pub value: Value,
}

impl SchemaItem {
    pub fn new(name: impl Into<String>, ty: TypeDescriptor, value: Value) -> Self {
        Self {
            name: name.into(),
            ty,
            value,
        }
    }
}

/// Payload encoder and decoder.
///
/// Holds no state beyond its [`CodecConfig`]; a single instance can be shared
/// freely across threads.
#[derive(Clone, Debug, Default)]
pub struct Codec {
    config: CodecConfig,
}

impl Codec {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Encode an argument list into a payload.
    pub fn pack(&self, values: &[&dyn Argument]) -> Result<Vec<u8>> {
        let tokens = values
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let ty = value.resolve();
                value
                    .to_value()
                    .and_then(|value| value.check(&ty).map(|()| value.into_token()))
                    .map_err(|err| err.at_argument(i))
            })
            .collect::<Result<Vec<Token>>>()?;

        let data = abi::encode(&tokens);
        debug!(arguments = values.len(), bytes = data.len(), "packed payload");
        Ok(data)
    }

    /// Encode previously decoded schema fields.
    pub fn encode_fields(&self, items: &[SchemaItem]) -> Result<Vec<u8>> {
        let mut tokens = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            item.value.check(&item.ty).map_err(|err| err.at_argument(i))?;
            tokens.push(item.value.clone().into_token());
        }
        let data = abi::encode(&tokens);
        debug!(fields = items.len(), bytes = data.len(), "encoded schema fields");
        Ok(data)
    }

    /// Decode a payload into one value per descriptor.
    pub fn decode_values(&self, data: &[u8], types: &[TypeDescriptor]) -> Result<Vec<Value>> {
        if let Some(limit) = self.config.max_payload_len {
            if data.len() > limit {
                return Err(CodecError::Decode(format!(
                    "payload of {} bytes exceeds the {limit} byte limit",
                    data.len()
                )));
            }
        }

        // Empty tuples occupy no payload bytes, so an array of them would be
        // sized by its length word alone.
        if let Some(ty) = types.iter().find(|ty| ty.has_empty_tuple()) {
            return Err(CodecError::Decode(format!("cannot decode {ty}: tuple has no fields")));
        }

        let params: Vec<_> = types.iter().map(TypeDescriptor::param_type).collect();
        let tokens =
            abi::decode(&params, data).map_err(|err| CodecError::Decode(err.to_string()))?;
        trace!(bytes = data.len(), values = tokens.len(), "decoded payload");

        if self.config.strict_decoding && abi::encode(&tokens) != data {
            return Err(CodecError::Decode(
                "payload is not canonically encoded".to_string(),
            ));
        }

        tokens
            .into_iter()
            .zip(types)
            .map(|(token, ty)| Value::from_token(token, ty))
            .collect()
    }

    /// Decode a payload into caller-owned destinations.
    ///
    /// Nothing is written unless every destination accepts its value.
    pub fn unpack(&self, data: &[u8], destinations: &mut [&mut dyn Destination]) -> Result<()> {
        let types: Vec<TypeDescriptor> = destinations.iter().map(|dest| dest.resolve()).collect();
        let values = self.decode_values(data, &types)?;
        inject(values, destinations)
    }

    /// Decode a payload against a schema declaration.
    pub fn decode_fields(&self, data: &[u8], schema: &str) -> Result<Vec<SchemaItem>> {
        let declarations = parse_schema(schema)?;
        let types: Vec<TypeDescriptor> = declarations.iter().map(|decl| decl.ty.clone()).collect();
        let values = self.decode_values(data, &types)?;
        debug!(%schema, fields = values.len(), "decoded schema fields");

        Ok(declarations
            .into_iter()
            .zip(values)
            .map(|(decl, value)| SchemaItem::new(decl.name, decl.ty, value))
            .collect())
    }

    /// Decode a payload holding a single value of type `T`.
    pub fn decode_value<T: Decode>(&self, data: &[u8]) -> Result<T> {
        let mut values = self.decode_values(data, &[T::abi_type()])?;
        let value = values
            .pop()
            .ok_or_else(|| CodecError::Decode("payload holds no value".to_string()))?;
        T::decode_value(value).map_err(|err| err.at_argument(0))
    }
}

/// Write decoded values into destinations, one value per destination.
///
/// Every value is converted before any destination is written, so a failure
/// leaves all destinations untouched.
pub fn inject(values: Vec<Value>, destinations: &mut [&mut dyn Destination]) -> Result<()> {
    if values.len() != destinations.len() {
        return Err(CodecError::ArityMismatch {
            expected: destinations.len(),
            decoded: values.len(),
        });
    }

    let staged = destinations
        .iter()
        .zip(values)
        .enumerate()
        .map(|(i, (dest, value))| dest.stage(value).map_err(|err| err.at_argument(i)))
        .collect::<Result<Vec<_>>>()?;

    for (i, (dest, staged)) in destinations.iter_mut().zip(staged).enumerate() {
        dest.commit(staged).map_err(|err| err.at_argument(i))?;
    }
    trace!(destinations = destinations.len(), "injected values");
    Ok(())
}

pub fn pack(values: &[&dyn Argument]) -> Result<Vec<u8>> {
    Codec::default().pack(values)
}

pub fn unpack(data: &[u8], destinations: &mut [&mut dyn Destination]) -> Result<()> {
    Codec::default().unpack(data, destinations)
}

pub fn encode_fields(items: &[SchemaItem]) -> Result<Vec<u8>> {
    Codec::default().encode_fields(items)
}

pub fn decode_fields(data: &[u8], schema: &str) -> Result<Vec<SchemaItem>> {
    Codec::default().decode_fields(data, schema)
}

pub fn decode_value<T: Decode>(data: &[u8]) -> Result<T> {
    Codec::default().decode_value(data)
}
