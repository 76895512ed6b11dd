//! Schema strings and schema identifiers.

use ethers_core::types::Address;
use sha3::{Digest, Keccak256};
use tracing::trace;

use crate::descriptor::NamedType;
use crate::resolve::{AbiType, Argument};
use crate::uid::Uid;

/// Render top-level declarations as a schema string.
///
/// A lone tuple is written as its bare field list, so a single record
/// formats as `address F1, string F2` rather than `(address F1, string F2)`.
pub fn format_schema(declarations: &[NamedType]) -> String {
    let rendered = declarations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    if declarations.len() == 1 && is_enclosed(&rendered) {
        rendered[1..rendered.len() - 1].to_string()
    } else {
        rendered
    }
}

/// Schema string of an argument list, as [`pack`](crate::pack) would encode it.
pub fn schema_of(values: &[&dyn Argument]) -> String {
    let declarations: Vec<NamedType> = values
        .iter()
        .map(|value| NamedType::unnamed(value.resolve()))
        .collect();
    let schema = format_schema(&declarations);
    trace!(arguments = values.len(), %schema, "formatted schema");
    schema
}

/// Schema string of a single value of type `T`.
pub fn schema_for<T: AbiType + ?Sized>() -> String {
    format_schema(&[NamedType::unnamed(T::abi_type())])
}

/// Registry identifier of a schema:
/// `keccak256(schema ‖ resolver ‖ revocable)`, tightly packed.
pub fn schema_uid(schema: &str, resolver: Address, revocable: bool) -> Uid {
    let mut hasher = Keccak256::new();
    hasher.update(schema.as_bytes());
    hasher.update(resolver.as_bytes());
    hasher.update([u8::from(revocable)]);
    Uid(hasher.finalize().into())
}

/// Whether the opening parenthesis at the start closes at the very end.
fn is_enclosed(text: &str) -> bool {
    if !(text.starts_with('(') && text.ends_with(')')) {
        return false;
    }
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i == text.len() - 1;
                }
            }
            _ => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::parse_schema;
    use crate::descriptor::TypeDescriptor;

    fn pair() -> TypeDescriptor {
        TypeDescriptor::Tuple(vec![
            NamedType::new("F1", TypeDescriptor::Address),
            NamedType::new("F2", TypeDescriptor::String),
        ])
    }

    #[test]
    fn test_single_scalar() {
        assert_eq!(schema_of(&[&"Hello!"]), "string");
        assert_eq!(schema_for::<[String; 2]>(), "string[2]");
    }

    #[test]
    fn test_lone_tuple_is_unwrapped() {
        assert_eq!(format_schema(&[NamedType::unnamed(pair())]), "address F1, string F2");
    }

    #[test]
    fn test_tuple_array_keeps_parens() {
        let ty = TypeDescriptor::Array(Box::new(pair()));
        assert_eq!(format_schema(&[NamedType::unnamed(ty)]), "(address F1, string F2)[]");
    }

    #[test]
    fn test_adjacent_tuples_keep_parens() {
        let ty = TypeDescriptor::Tuple(vec![
            NamedType::unnamed(pair()),
            NamedType::unnamed(pair()),
        ]);
        assert_eq!(
            format_schema(&[NamedType::unnamed(ty)]),
            "(address F1, string F2), (address F1, string F2)"
        );
        assert!(!is_enclosed("(a)(b)"));
        assert!(is_enclosed("((a)(b))"));
    }

    #[test]
    fn test_multiple_arguments() {
        let schema = schema_of(&[&"x", &7u64, &vec![true]]);
        assert_eq!(schema, "string, uint64, bool[]");
    }

    #[test]
    fn test_canonical_roundtrip() {
        for schema in [
            "string msg, (bytes32 Key, bytes val, uint256 abn)[] Records",
            "address F1, string F2",
            "(address F1, string F2)[]",
            "uint8 a, uint16[4][] b, bool c",
            "string[2][][3]",
        ] {
            let parsed = parse_schema(schema).unwrap();
            assert_eq!(format_schema(&parsed), schema);
        }
    }

    #[test]
    fn test_schema_uid_packing() {
        let resolver = Address::repeat_byte(0x11);
        let mut packed = b"bool like".to_vec();
        packed.extend_from_slice(resolver.as_bytes());
        packed.push(1);
        let expected: [u8; 32] = Keccak256::digest(&packed).into();

        assert_eq!(schema_uid("bool like", resolver, true), Uid(expected));
        assert_ne!(
            schema_uid("bool like", resolver, true),
            schema_uid("bool like", resolver, false)
        );
    }
}
