//! Host value shapes and the ABI types they resolve to.
//!
//! Resolution is a closed set of trait impls rather than runtime
//! introspection: a shape without an [`AbiType`] impl (floats, signed
//! integers, maps, closures) is rejected when the caller's code is compiled.
//!
//! | host shape                              | resolves to        |
//! |-----------------------------------------|--------------------|
//! | `Address`                               | `address`          |
//! | `String`, `str`                         | `string`           |
//! | `bool`                                  | `bool`             |
//! | `[u8; 32]`, [`Uid`](crate::Uid), `H256` | `bytes32`          |
//! | `Vec<u8>`, `[u8]`, `Bytes`              | `bytes`            |
//! | `u8`, `u16`, `u32`, `u64`               | `uint8` … `uint64` |
//! | `U256`, `BigUint`                       | `uint256`          |
//! | `&T`, `Box<T>`, `Arc<T>`, `Option<T>`   | type of `T`        |
//! | `#[derive(Abi)]` struct                 | tuple              |
//! | `[T; N]`                                | `T[N]`             |
//! | `Vec<T>`, `[T]`                         | `T[]`              |

use std::any::Any;
use std::sync::Arc;

use ethers_core::types::{Address, Bytes, H256, U256};
use num_bigint::BigUint;

use crate::descriptor::{TypeDescriptor, UintWidth};
use crate::error::{CodecError, Result};
use crate::value::Value;

/// Static ABI shape of a host type.
pub trait AbiType {
    fn abi_type() -> TypeDescriptor;

    /// Shape of a sequence of `Self`: `Some(n)` for `[Self; n]`, `None` for
    /// a dynamic sequence. Byte elements override this.
    #[doc(hidden)]
    fn sequence_type(len: Option<usize>) -> TypeDescriptor
    where
        Self: Sized,
    {
        sequence_of(Self::abi_type(), len)
    }
}

/// Conversion of a host value into the generic value tree.
pub trait Encode: AbiType {
    fn encode_value(&self) -> Result<Value>;

    #[doc(hidden)]
    fn encode_sequence(items: &[Self], len: Option<usize>) -> Result<Value>
    where
        Self: Sized,
    {
        encode_elements(items, len)
    }
}

/// Re-hydration of a host value from the generic value tree.
pub trait Decode: AbiType + Sized {
    fn decode_value(value: Value) -> Result<Self>;

    #[doc(hidden)]
    fn decode_sequence(value: Value, len: Option<usize>) -> Result<Vec<Self>> {
        decode_elements(value, len)
    }
}

fn sequence_of(element: TypeDescriptor, len: Option<usize>) -> TypeDescriptor {
    match len {
        Some(n) => TypeDescriptor::FixedArray(n, Box::new(element)),
        None => TypeDescriptor::Array(Box::new(element)),
    }
}

fn encode_elements<T: Encode>(items: &[T], len: Option<usize>) -> Result<Value> {
    let values = items
        .iter()
        .enumerate()
        .map(|(i, item)| item.encode_value().map_err(|err| err.at_index(i)))
        .collect::<Result<Vec<_>>>()?;
    Ok(match len {
        Some(_) => Value::FixedArray(values),
        None => Value::Array(values),
    })
}

fn decode_elements<T: Decode>(value: Value, len: Option<usize>) -> Result<Vec<T>> {
    let items = match (value, len) {
        (Value::FixedArray(items), Some(n)) if items.len() == n => items,
        (Value::FixedArray(items), Some(n)) => {
            return Err(CodecError::injection(format!(
                "expected {n} elements, found {}",
                items.len()
            )))
        }
        (Value::Array(items), None) => items,
        (other, Some(n)) => return Err(CodecError::mismatch(format_args!("fixed array of {n}"), &other)),
        (other, None) => return Err(CodecError::mismatch("dynamic array", &other)),
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| T::decode_value(item).map_err(|err| err.at_index(i)))
        .collect()
}

/// Copy a fixed-size byte string out of a decoded value.
pub(crate) fn fixed_bytes<const N: usize>(value: Value) -> Result<[u8; N]> {
    match value {
        Value::FixedBytes(bytes) => <[u8; N]>::try_from(bytes.as_slice())
            .map_err(|_| CodecError::injection(format!("expected {N} bytes, found {}", bytes.len()))),
        other => Err(CodecError::mismatch(format_args!("bytes{N}"), &other)),
    }
}

fn narrow_uint(value: Value, width: UintWidth) -> Result<u64> {
    match value {
        Value::Uint(u) if u.bits() <= width.bits() => Ok(u.low_u64()),
        Value::Uint(u) => Err(CodecError::injection(format!(
            "{u} overflows uint{}",
            width.bits()
        ))),
        other => Err(CodecError::mismatch(format_args!("uint{}", width.bits()), &other)),
    }
}

// ─── scalars ────────────────────────────────────────────────────────────────

impl AbiType for Address {
    fn abi_type() -> TypeDescriptor {
        TypeDescriptor::Address
    }
}

impl Encode for Address {
    fn encode_value(&self) -> Result<Value> {
        Ok(Value::Address(*self))
    }
}

impl Decode for Address {
    fn decode_value(value: Value) -> Result<Self> {
        match value {
            Value::Address(address) => Ok(address),
            other => Err(CodecError::mismatch("address", &other)),
        }
    }
}

impl AbiType for bool {
    fn abi_type() -> TypeDescriptor {
        TypeDescriptor::Bool
    }
}

impl Encode for bool {
    fn encode_value(&self) -> Result<Value> {
        Ok(Value::Bool(*self))
    }
}

impl Decode for bool {
    fn decode_value(value: Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(CodecError::mismatch("bool", &other)),
        }
    }
}

impl AbiType for str {
    fn abi_type() -> TypeDescriptor {
        TypeDescriptor::String
    }
}

impl Encode for str {
    fn encode_value(&self) -> Result<Value> {
        Ok(Value::String(self.to_string()))
    }
}

impl AbiType for String {
    fn abi_type() -> TypeDescriptor {
        TypeDescriptor::String
    }
}

impl Encode for String {
    fn encode_value(&self) -> Result<Value> {
        Ok(Value::String(self.clone()))
    }
}

impl Decode for String {
    fn decode_value(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(CodecError::mismatch("string", &other)),
        }
    }
}

impl AbiType for H256 {
    fn abi_type() -> TypeDescriptor {
        TypeDescriptor::FixedBytes(32)
    }
}

impl Encode for H256 {
    fn encode_value(&self) -> Result<Value> {
        Ok(Value::FixedBytes(self.as_bytes().to_vec()))
    }
}

impl Decode for H256 {
    fn decode_value(value: Value) -> Result<Self> {
        fixed_bytes::<32>(value).map(H256)
    }
}

impl AbiType for Bytes {
    fn abi_type() -> TypeDescriptor {
        TypeDescriptor::Bytes
    }
}

impl Encode for Bytes {
    fn encode_value(&self) -> Result<Value> {
        Ok(Value::Bytes(self.to_vec()))
    }
}

impl Decode for Bytes {
    fn decode_value(value: Value) -> Result<Self> {
        match value {
            Value::Bytes(bytes) => Ok(Bytes::from(bytes)),
            other => Err(CodecError::mismatch("bytes", &other)),
        }
    }
}

// ─── unsigned integers ──────────────────────────────────────────────────────

// `u8` doubles as the byte element: `[u8; 32]` is `bytes32` and `Vec<u8>` is
// `bytes`, every other byte sequence stays a `uint8` array.
impl AbiType for u8 {
    fn abi_type() -> TypeDescriptor {
        TypeDescriptor::Uint(UintWidth::U8)
    }

    fn sequence_type(len: Option<usize>) -> TypeDescriptor {
        match len {
            None => TypeDescriptor::Bytes,
            Some(32) => TypeDescriptor::FixedBytes(32),
            Some(n) => sequence_of(Self::abi_type(), Some(n)),
        }
    }
}

impl Encode for u8 {
    fn encode_value(&self) -> Result<Value> {
        Ok(Value::Uint(U256::from(*self)))
    }

    fn encode_sequence(items: &[Self], len: Option<usize>) -> Result<Value> {
        match len {
            None => Ok(Value::Bytes(items.to_vec())),
            Some(32) => Ok(Value::FixedBytes(items.to_vec())),
            Some(_) => encode_elements(items, len),
        }
    }
}

impl Decode for u8 {
    fn decode_value(value: Value) -> Result<Self> {
        narrow_uint(value, UintWidth::U8).map(|n| n as u8)
    }

    fn decode_sequence(value: Value, len: Option<usize>) -> Result<Vec<Self>> {
        match (len, value) {
            (None, Value::Bytes(bytes)) => Ok(bytes),
            (None, other) => Err(CodecError::mismatch("bytes", &other)),
            (Some(32), value) => fixed_bytes::<32>(value).map(|bytes| bytes.to_vec()),
            (Some(_), value) => decode_elements(value, len),
        }
    }
}

macro_rules! impl_uint {
    ($($ty:ty => $width:ident),* $(,)?) => {
        $(
            impl AbiType for $ty {
                fn abi_type() -> TypeDescriptor {
                    TypeDescriptor::Uint(UintWidth::$width)
                }
            }

            impl Encode for $ty {
                fn encode_value(&self) -> Result<Value> {
                    Ok(Value::Uint(U256::from(*self)))
                }
            }

            impl Decode for $ty {
                fn decode_value(value: Value) -> Result<Self> {
                    narrow_uint(value, UintWidth::$width).map(|n| n as $ty)
                }
            }
        )*
    };
}

impl_uint!(u16 => U16, u32 => U32, u64 => U64);

impl AbiType for U256 {
    fn abi_type() -> TypeDescriptor {
        TypeDescriptor::Uint256
    }
}

impl Encode for U256 {
    fn encode_value(&self) -> Result<Value> {
        Ok(Value::Uint(*self))
    }
}

impl Decode for U256 {
    fn decode_value(value: Value) -> Result<Self> {
        match value {
            Value::Uint(u) => Ok(u),
            other => Err(CodecError::mismatch("uint256", &other)),
        }
    }
}

impl AbiType for BigUint {
    fn abi_type() -> TypeDescriptor {
        TypeDescriptor::Uint256
    }
}

impl Encode for BigUint {
    fn encode_value(&self) -> Result<Value> {
        if self.bits() > 256 {
            return Err(CodecError::encode(format!(
                "{} bits do not fit uint256",
                self.bits()
            )));
        }
        Ok(Value::Uint(U256::from_big_endian(&self.to_bytes_be())))
    }
}

impl Decode for BigUint {
    fn decode_value(value: Value) -> Result<Self> {
        let u = U256::decode_value(value)?;
        let mut buf = [0u8; 32];
        u.to_big_endian(&mut buf);
        Ok(BigUint::from_bytes_be(&buf))
    }
}

// ─── transparent wrappers ───────────────────────────────────────────────────

impl<T: AbiType + ?Sized> AbiType for &T {
    fn abi_type() -> TypeDescriptor {
        T::abi_type()
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode_value(&self) -> Result<Value> {
        (**self).encode_value()
    }
}

impl<T: AbiType + ?Sized> AbiType for Box<T> {
    fn abi_type() -> TypeDescriptor {
        T::abi_type()
    }
}

impl<T: Encode + ?Sized> Encode for Box<T> {
    fn encode_value(&self) -> Result<Value> {
        (**self).encode_value()
    }
}

impl<T: Decode> Decode for Box<T> {
    fn decode_value(value: Value) -> Result<Self> {
        T::decode_value(value).map(Box::new)
    }
}

impl<T: AbiType + ?Sized> AbiType for Arc<T> {
    fn abi_type() -> TypeDescriptor {
        T::abi_type()
    }
}

impl<T: Encode + ?Sized> Encode for Arc<T> {
    fn encode_value(&self) -> Result<Value> {
        (**self).encode_value()
    }
}

impl<T: Decode> Decode for Arc<T> {
    fn decode_value(value: Value) -> Result<Self> {
        T::decode_value(value).map(Arc::new)
    }
}

impl<T: AbiType> AbiType for Option<T> {
    fn abi_type() -> TypeDescriptor {
        T::abi_type()
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode_value(&self) -> Result<Value> {
        match self {
            Some(value) => value.encode_value(),
            None => Err(CodecError::encode("value is absent")),
        }
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode_value(value: Value) -> Result<Self> {
        T::decode_value(value).map(Some)
    }
}

// ─── sequences ──────────────────────────────────────────────────────────────

impl<T: AbiType, const N: usize> AbiType for [T; N] {
    fn abi_type() -> TypeDescriptor {
        T::sequence_type(Some(N))
    }
}

impl<T: Encode, const N: usize> Encode for [T; N] {
    fn encode_value(&self) -> Result<Value> {
        T::encode_sequence(self, Some(N))
    }
}

impl<T: Decode, const N: usize> Decode for [T; N] {
    fn decode_value(value: Value) -> Result<Self> {
        let items = T::decode_sequence(value, Some(N))?;
        <[T; N]>::try_from(items).map_err(|items: Vec<T>| {
            CodecError::injection(format!("expected {N} elements, found {}", items.len()))
        })
    }
}

impl<T: AbiType> AbiType for [T] {
    fn abi_type() -> TypeDescriptor {
        T::sequence_type(None)
    }
}

impl<T: Encode> Encode for [T] {
    fn encode_value(&self) -> Result<Value> {
        T::encode_sequence(self, None)
    }
}

impl<T: AbiType> AbiType for Vec<T> {
    fn abi_type() -> TypeDescriptor {
        T::sequence_type(None)
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode_value(&self) -> Result<Value> {
        T::encode_sequence(self, None)
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode_value(value: Value) -> Result<Self> {
        T::decode_sequence(value, None)
    }
}

// ─── heterogeneous argument lists ───────────────────────────────────────────

/// A value that takes part in a packed argument list.
///
/// Implemented for every [`Encode`] type, so `&[&dyn Argument]` can mix
/// shapes the way a schema does.
pub trait Argument {
    fn resolve(&self) -> TypeDescriptor;
    fn to_value(&self) -> Result<Value>;
}

impl<T: Encode> Argument for T {
    fn resolve(&self) -> TypeDescriptor {
        T::abi_type()
    }

    fn to_value(&self) -> Result<Value> {
        self.encode_value()
    }
}

/// A decoded value waiting to be written into its destination.
pub struct Staged(Box<dyn Any>);

/// A caller-owned slot decoded values are written into.
///
/// Writing happens in two steps so a multi-destination unpack can stage every
/// value before it touches any destination.
pub trait Destination {
    fn resolve(&self) -> TypeDescriptor;
    fn stage(&self, value: Value) -> Result<Staged>;
    fn commit(&mut self, staged: Staged) -> Result<()>;
}

impl<T: Decode + 'static> Destination for T {
    fn resolve(&self) -> TypeDescriptor {
        T::abi_type()
    }

    fn stage(&self, value: Value) -> Result<Staged> {
        Ok(Staged(Box::new(T::decode_value(value)?)))
    }

    fn commit(&mut self, staged: Staged) -> Result<()> {
        let value = staged.0.downcast::<T>().map_err(|_| {
            CodecError::injection("staged value was produced for a different destination type")
        })?;
        *self = *value;
        Ok(())
    }
}

/// Type descriptor of a single value.
pub fn resolve(value: &dyn Argument) -> TypeDescriptor {
    value.resolve()
}
