//! Language-neutral description of a value's ABI shape.
//!
//! A [`TypeDescriptor`] is produced fresh for every call, either from a host
//! type through [`AbiType`](crate::AbiType) or from a textual declaration
//! through [`FromStr`]. Its [`Display`](fmt::Display) form is the canonical type
//! text used inside schema strings.

use std::fmt;
use std::str::FromStr;

use ethers_core::abi::ParamType;
use serde::{Serialize, Serializer};

use crate::declaration;
use crate::error::CodecError;

/// Bit width of a narrow unsigned integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UintWidth {
    U8,
    U16,
    U32,
    U64,
}

impl UintWidth {
    pub const fn bits(self) -> usize {
        match self {
            Self::U8 => 8,
            Self::U16 => 16,
            Self::U32 => 32,
            Self::U64 => 64,
        }
    }

    pub fn from_bits(bits: usize) -> Option<Self> {
        match bits {
            8 => Some(Self::U8),
            16 => Some(Self::U16),
            32 => Some(Self::U32),
            64 => Some(Self::U64),
            _ => None,
        }
    }
}

/// Shape of an attestation value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    /// 20-byte account address
    Address,
    Bool,
    String,
    /// `bytesN`, 1 ≤ N ≤ 32
    FixedBytes(usize),
    /// Dynamic `bytes`
    Bytes,
    Uint(UintWidth),
    Uint256,
    /// Ordered, named fields
    Tuple(Vec<NamedType>),
    /// `T[N]`
    FixedArray(usize, Box<TypeDescriptor>),
    /// `T[]`
    Array(Box<TypeDescriptor>),
}

impl TypeDescriptor {
    /// Parameter type understood by the ABI encoder.
    pub fn param_type(&self) -> ParamType {
        match self {
            Self::Address => ParamType::Address,
            Self::Bool => ParamType::Bool,
            Self::String => ParamType::String,
            Self::FixedBytes(len) => ParamType::FixedBytes(*len),
            Self::Bytes => ParamType::Bytes,
            Self::Uint(width) => ParamType::Uint(width.bits()),
            Self::Uint256 => ParamType::Uint(256),
            Self::Tuple(fields) => {
                ParamType::Tuple(fields.iter().map(|field| field.ty.param_type()).collect())
            }
            Self::FixedArray(len, element) => {
                ParamType::FixedArray(Box::new(element.param_type()), *len)
            }
            Self::Array(element) => ParamType::Array(Box::new(element.param_type())),
        }
    }

    /// Whether the value lives in the tail region of an encoding.
    pub fn is_dynamic(&self) -> bool {
        match self {
            Self::String | Self::Bytes | Self::Array(_) => true,
            Self::Tuple(fields) => fields.iter().any(|field| field.ty.is_dynamic()),
            Self::FixedArray(_, element) => element.is_dynamic(),
            _ => false,
        }
    }

    /// Whether any tuple in the shape has no fields.
    pub fn has_empty_tuple(&self) -> bool {
        match self {
            Self::Tuple(fields) => {
                fields.is_empty() || fields.iter().any(|field| field.ty.has_empty_tuple())
            }
            Self::FixedArray(_, element) | Self::Array(element) => element.has_empty_tuple(),
            _ => false,
        }
    }

    pub fn tuple_fields(&self) -> Option<&[NamedType]> {
        match self {
            Self::Tuple(fields) => Some(fields),
            _ => None,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address => f.write_str("address"),
            Self::Bool => f.write_str("bool"),
            Self::String => f.write_str("string"),
            Self::FixedBytes(len) => write!(f, "bytes{len}"),
            Self::Bytes => f.write_str("bytes"),
            Self::Uint(width) => write!(f, "uint{}", width.bits()),
            Self::Uint256 => f.write_str("uint256"),
            Self::Tuple(fields) => {
                f.write_str("(")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{field}")?;
                }
                f.write_str(")")
            }
            // Each dimension goes to the right of the element's own suffixes.
            Self::FixedArray(len, element) => write!(f, "{element}[{len}]"),
            Self::Array(element) => write!(f, "{element}[]"),
        }
    }
}

impl FromStr for TypeDescriptor {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        declaration::parse_type(s)
    }
}

impl Serialize for TypeDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A type with the name it carries in a tuple or schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedType {
    pub name: String,
    pub ty: TypeDescriptor,
}

impl NamedType {
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    /// Top-level arguments carry no name.
    pub fn unnamed(ty: TypeDescriptor) -> Self {
        Self::new(String::new(), ty)
    }
}

impl fmt::Display for NamedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.ty)
        } else {
            write!(f, "{} {}", self.ty, self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> TypeDescriptor {
        TypeDescriptor::Tuple(vec![
            NamedType::new("Key", TypeDescriptor::FixedBytes(32)),
            NamedType::new("val", TypeDescriptor::Bytes),
            NamedType::new("abn", TypeDescriptor::Uint256),
        ])
    }

    #[test]
    fn test_scalar_rendering() {
        assert_eq!(TypeDescriptor::Address.to_string(), "address");
        assert_eq!(TypeDescriptor::FixedBytes(32).to_string(), "bytes32");
        assert_eq!(TypeDescriptor::Uint(UintWidth::U16).to_string(), "uint16");
        assert_eq!(TypeDescriptor::Uint256.to_string(), "uint256");
    }

    #[test]
    fn test_nested_array_suffix_order() {
        let ty = TypeDescriptor::FixedArray(
            3,
            Box::new(TypeDescriptor::Array(Box::new(TypeDescriptor::FixedArray(
                2,
                Box::new(TypeDescriptor::String),
            )))),
        );
        assert_eq!(ty.to_string(), "string[2][][3]");
    }

    #[test]
    fn test_tuple_rendering() {
        let ty = TypeDescriptor::Array(Box::new(record()));
        assert_eq!(ty.to_string(), "(bytes32 Key, bytes val, uint256 abn)[]");
    }

    #[test]
    fn test_param_type_mapping() {
        let ty = TypeDescriptor::FixedArray(2, Box::new(record()));
        assert_eq!(
            ty.param_type(),
            ParamType::FixedArray(
                Box::new(ParamType::Tuple(vec![
                    ParamType::FixedBytes(32),
                    ParamType::Bytes,
                    ParamType::Uint(256),
                ])),
                2
            )
        );
        assert_eq!(TypeDescriptor::Uint(UintWidth::U8).param_type(), ParamType::Uint(8));
    }

    #[test]
    fn test_dynamic_classification() {
        assert!(!TypeDescriptor::FixedBytes(32).is_dynamic());
        assert!(TypeDescriptor::Bytes.is_dynamic());
        assert!(record().is_dynamic());
        assert!(!TypeDescriptor::FixedArray(4, Box::new(TypeDescriptor::Address)).is_dynamic());
        assert!(TypeDescriptor::FixedArray(4, Box::new(TypeDescriptor::String)).is_dynamic());
    }

    #[test]
    fn test_empty_tuple_detection() {
        assert!(!record().has_empty_tuple());
        assert!(TypeDescriptor::Tuple(Vec::new()).has_empty_tuple());
        let nested = TypeDescriptor::Array(Box::new(TypeDescriptor::Tuple(vec![NamedType::new(
            "inner",
            TypeDescriptor::FixedArray(2, Box::new(TypeDescriptor::Tuple(Vec::new()))),
        )])));
        assert!(nested.has_empty_tuple());
    }

    #[test]
    fn test_uint_width_bits() {
        for width in [UintWidth::U8, UintWidth::U16, UintWidth::U32, UintWidth::U64] {
            assert_eq!(UintWidth::from_bits(width.bits()), Some(width));
        }
        assert_eq!(UintWidth::from_bits(128), None);
    }
}
