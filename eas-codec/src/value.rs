//! Generic decoded-value tree.
//!
//! [`Value`] sits between host values and the ABI encoder's tokens. Unlike a
//! bare token, a tuple value keeps its field names, so records can be filled by
//! name rather than by position.

use ethers_core::abi::Token;
use ethers_core::types::{Address, U256};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::descriptor::TypeDescriptor;
use crate::error::{CodecError, Result};
use crate::resolve::Decode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Address(Address),
    Bool(bool),
    String(String),
    FixedBytes(Vec<u8>),
    Bytes(Vec<u8>),
    /// Any unsigned integer, narrowed on injection
    Uint(U256),
    Tuple(Vec<NamedValue>),
    FixedArray(Vec<Value>),
    Array(Vec<Value>),
}

/// A tuple field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedValue {
    pub name: String,
    pub value: Value,
}

impl NamedValue {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl Value {
    /// Short description of the value's shape, for error messages.
    pub fn kind(&self) -> String {
        match self {
            Self::Address(_) => "address".into(),
            Self::Bool(_) => "bool".into(),
            Self::String(_) => "string".into(),
            Self::FixedBytes(bytes) => format!("bytes{}", bytes.len()),
            Self::Bytes(_) => "bytes".into(),
            Self::Uint(_) => "uint".into(),
            Self::Tuple(fields) => format!("tuple of {} fields", fields.len()),
            Self::FixedArray(items) => format!("fixed array of {} elements", items.len()),
            Self::Array(_) => "dynamic array".into(),
        }
    }

    /// Open a tuple value for by-name field extraction.
    pub fn into_fields(self) -> Result<TupleFields> {
        match self {
            Self::Tuple(fields) => Ok(TupleFields { fields }),
            other => Err(CodecError::mismatch("tuple", &other)),
        }
    }

    pub(crate) fn into_token(self) -> Token {
        match self {
            Self::Address(address) => Token::Address(address),
            Self::Bool(b) => Token::Bool(b),
            Self::String(s) => Token::String(s),
            Self::FixedBytes(bytes) => Token::FixedBytes(bytes),
            Self::Bytes(bytes) => Token::Bytes(bytes),
            Self::Uint(u) => Token::Uint(u),
            Self::Tuple(fields) => {
                Token::Tuple(fields.into_iter().map(|field| field.value.into_token()).collect())
            }
            Self::FixedArray(items) => {
                Token::FixedArray(items.into_iter().map(Value::into_token).collect())
            }
            Self::Array(items) => Token::Array(items.into_iter().map(Value::into_token).collect()),
        }
    }

    /// Rebuild a value from a decoded token, naming tuple fields after `ty`.
    pub(crate) fn from_token(token: Token, ty: &TypeDescriptor) -> Result<Self> {
        match (token, ty) {
            (Token::Address(address), TypeDescriptor::Address) => Ok(Self::Address(address)),
            (Token::Bool(b), TypeDescriptor::Bool) => Ok(Self::Bool(b)),
            (Token::String(s), TypeDescriptor::String) => Ok(Self::String(s)),
            (Token::FixedBytes(bytes), TypeDescriptor::FixedBytes(len)) if bytes.len() == *len => {
                Ok(Self::FixedBytes(bytes))
            }
            (Token::Bytes(bytes), TypeDescriptor::Bytes) => Ok(Self::Bytes(bytes)),
            (Token::Uint(u), TypeDescriptor::Uint(_) | TypeDescriptor::Uint256) => Ok(Self::Uint(u)),
            (Token::Tuple(tokens), TypeDescriptor::Tuple(fields)) if tokens.len() == fields.len() => {
                tokens
                    .into_iter()
                    .zip(fields)
                    .map(|(token, field)| {
                        Self::from_token(token, &field.ty)
                            .map(|value| NamedValue::new(field.name.clone(), value))
                    })
                    .collect::<Result<Vec<_>>>()
                    .map(Self::Tuple)
            }
            (Token::FixedArray(tokens), TypeDescriptor::FixedArray(len, element))
                if tokens.len() == *len =>
            {
                tokens
                    .into_iter()
                    .map(|token| Self::from_token(token, element))
                    .collect::<Result<Vec<_>>>()
                    .map(Self::FixedArray)
            }
            (Token::Array(tokens), TypeDescriptor::Array(element)) => tokens
                .into_iter()
                .map(|token| Self::from_token(token, element))
                .collect::<Result<Vec<_>>>()
                .map(Self::Array),
            (token, ty) => Err(CodecError::Decode(format!(
                "decoded token {token} does not match type {ty}"
            ))),
        }
    }

    /// Verify the value can be encoded as `ty`.
    pub(crate) fn check(&self, ty: &TypeDescriptor) -> Result<()> {
        match (self, ty) {
            (Self::Address(_), TypeDescriptor::Address)
            | (Self::Bool(_), TypeDescriptor::Bool)
            | (Self::String(_), TypeDescriptor::String)
            | (Self::Bytes(_), TypeDescriptor::Bytes)
            | (Self::Uint(_), TypeDescriptor::Uint256) => Ok(()),
            (Self::Uint(u), TypeDescriptor::Uint(width)) => {
                if u.bits() <= width.bits() {
                    Ok(())
                } else {
                    Err(CodecError::encode(format!("{u} overflows {ty}")))
                }
            }
            (Self::FixedBytes(bytes), TypeDescriptor::FixedBytes(len)) => {
                if bytes.len() == *len {
                    Ok(())
                } else {
                    Err(CodecError::encode(format!(
                        "expected {len} bytes, found {}",
                        bytes.len()
                    )))
                }
            }
            (Self::Tuple(values), TypeDescriptor::Tuple(fields)) => {
                if values.len() != fields.len() {
                    return Err(CodecError::encode(format!(
                        "expected {} tuple fields, found {}",
                        fields.len(),
                        values.len()
                    )));
                }
                for (value, field) in values.iter().zip(fields) {
                    value
                        .value
                        .check(&field.ty)
                        .map_err(|err| err.at_field(&field.name))?;
                }
                Ok(())
            }
            (Self::FixedArray(items), TypeDescriptor::FixedArray(len, element)) => {
                if items.len() != *len {
                    return Err(CodecError::encode(format!(
                        "expected {len} elements, found {}",
                        items.len()
                    )));
                }
                check_elements(items, element)
            }
            (Self::Array(items), TypeDescriptor::Array(element)) => check_elements(items, element),
            (value, ty) => Err(CodecError::encode(format!(
                "expected {ty}, found {}",
                value.kind()
            ))),
        }
    }
}

fn check_elements(items: &[Value], element: &TypeDescriptor) -> Result<()> {
    for (i, item) in items.iter().enumerate() {
        item.check(element).map_err(|err| err.at_index(i))?;
    }
    Ok(())
}

/// Fields of a decoded tuple, taken out by name.
///
/// Generated record decoders call [`TupleFields::take`] once per field, so the
/// destination's field order does not have to match the decoded order.
#[derive(Debug)]
pub struct TupleFields {
    fields: Vec<NamedValue>,
}

impl TupleFields {
    /// Remove the first field called `name` and decode it as `T`.
    pub fn take<T: Decode>(&mut self, name: &str) -> Result<T> {
        let position = self
            .fields
            .iter()
            .position(|field| field.name == name)
            .ok_or_else(|| {
                CodecError::injection("field missing from decoded tuple").at_field(name)
            })?;
        let field = self.fields.remove(position);
        T::decode_value(field.value).map_err(|err| err.at_field(name))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn hex_prefixed(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// JSON-friendly form: byte strings and addresses as `0x` hex, integers as
/// decimal strings, tuples as objects keyed by field name.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Address(address) => serializer.serialize_str(&hex_prefixed(address.as_bytes())),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::String(s) => serializer.serialize_str(s),
            Self::FixedBytes(bytes) | Self::Bytes(bytes) => {
                serializer.serialize_str(&hex_prefixed(bytes))
            }
            Self::Uint(u) => serializer.collect_str(u),
            Self::Tuple(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for field in fields {
                    map.serialize_entry(&field.name, &field.value)?;
                }
                map.end()
            }
            Self::FixedArray(items) | Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}
