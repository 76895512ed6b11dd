//! # Attestation payload codec
//!
//! Converts between typed Rust values and the ABI-encoded payloads stored by
//! an Ethereum Attestation Service deployment, and renders the schema string
//! a value list is registered under.
//!
//! ## Overview
//!
//! - **Resolution**: every supported host shape maps to a [`TypeDescriptor`]
//!   through [`AbiType`]. Records opt in with `#[derive(Abi)]`.
//! - **Schemas**: descriptors render as canonical schema strings
//!   ([`format_schema`], [`schema_of`]) and parse back ([`parse_schema`]).
//! - **Payloads**: [`pack`] encodes an argument list as one ABI tuple;
//!   [`unpack`] and [`decode_fields`] reverse it, by destination type or by
//!   schema text.
//!
//! ## Example
//!
//! ```
//! use eas_codec::{pack, schema_of, unpack, Abi};
//!
//! #[derive(Abi, Debug, Default, PartialEq)]
//! struct Like {
//!     #[abi = "liked"]
//!     liked: bool,
//!     note: String,
//! }
//!
//! let like = Like { liked: true, note: "gm".into() };
//! assert_eq!(schema_of(&[&like]), "bool liked, string note");
//!
//! let data = pack(&[&like])?;
//! let mut decoded = Like::default();
//! unpack(&data, &mut [&mut decoded])?;
//! assert_eq!(decoded, like);
//! # Ok::<(), eas_codec::CodecError>(())
//! ```

// Lets `#[derive(Abi)]` expand to `::eas_codec::...` paths inside this crate.
extern crate self as eas_codec;

mod attestation;
mod config;
mod declaration;
mod descriptor;
mod encoding;
mod error;
mod field;
mod resolve;
mod schema;
mod uid;
mod value;

pub use attestation::{Attestation, SchemaRecord};
pub use config::CodecConfig;
pub use declaration::parse_schema;
pub use descriptor::{NamedType, TypeDescriptor, UintWidth};
pub use encoding::{
    decode_fields, decode_value, encode_fields, inject, pack, unpack, Codec, SchemaItem,
};
pub use error::{CodecError, FieldPath, PathSegment, Result};
pub use field::field_name;
pub use resolve::{resolve, AbiType, Argument, Decode, Destination, Encode, Staged};
pub use schema::{format_schema, schema_for, schema_of, schema_uid};
pub use uid::Uid;
pub use value::{NamedValue, TupleFields, Value};

pub use eas_codec_derive::Abi;
pub use ethers_core::types::{Address, Bytes, H256, U256};
pub use num_bigint::BigUint;
