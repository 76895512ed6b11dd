//! Schema declaration grammar.
//!
//! ```text
//! schema      := declaration ("," declaration)*
//! declaration := type-text [name]
//!              | "(" schema ")" suffix* [name]
//! type-text   := elementary suffix*
//! suffix      := "[" digits "]" | "[]"
//! ```
//!
//! Inside a declaration the last whitespace-separated token is the name and
//! the preceding tokens, joined by single spaces, are the type text. A
//! declaration made of a single token is an unnamed type, which is how
//! top-level arguments render (`string`).

use crate::descriptor::{NamedType, TypeDescriptor, UintWidth};
use crate::error::{CodecError, Result};

/// Parse a schema string into its top-level declarations.
pub fn parse_schema(schema: &str) -> Result<Vec<NamedType>> {
    parse_list(schema)
}

/// Resolve a type text such as `string[2][]` or `(address F1, string F2)[]`.
pub(crate) fn parse_type(text: &str) -> Result<TypeDescriptor> {
    let text = text.trim();
    if text.starts_with('(') {
        let close = matching_paren(text)?;
        let fields = parse_tuple(&text[1..close])?;
        return apply_suffix(TypeDescriptor::Tuple(fields), &text[close + 1..]);
    }

    let (base, suffix) = match text.find('[') {
        Some(i) => text.split_at(i),
        None => (text, ""),
    };
    apply_suffix(parse_elementary(base)?, suffix)
}

fn parse_list(text: &str) -> Result<Vec<NamedType>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    split_top_level(text)?
        .into_iter()
        .map(parse_declaration)
        .collect()
}

/// Field list between a tuple's parentheses. A tuple with no fields encodes
/// to zero bytes, so an array of them would decode from a bare length word.
fn parse_tuple(text: &str) -> Result<Vec<NamedType>> {
    let fields = parse_list(text)?;
    if fields.is_empty() {
        return Err(CodecError::malformed("tuple has no fields"));
    }
    Ok(fields)
}

fn parse_declaration(declaration: &str) -> Result<NamedType> {
    let declaration = declaration.trim();
    if declaration.is_empty() {
        return Err(CodecError::malformed("empty declaration"));
    }

    if declaration.starts_with('(') {
        let close = matching_paren(declaration)?;
        let fields = parse_tuple(&declaration[1..close])?;
        let rest: Vec<&str> = declaration[close + 1..].split_whitespace().collect();
        let (suffix, name) = match rest.as_slice() {
            [] => (String::new(), ""),
            [only] if only.starts_with('[') => (only.to_string(), ""),
            [only] => (String::new(), *only),
            [suffix @ .., name] => (suffix.join(" "), *name),
        };
        let ty = apply_suffix(TypeDescriptor::Tuple(fields), &suffix)?;
        return Ok(NamedType::new(name, ty));
    }

    let tokens: Vec<&str> = declaration.split_whitespace().collect();
    match tokens.as_slice() {
        [ty] => Ok(NamedType::unnamed(parse_type(ty)?)),
        [ty @ .., name] => Ok(NamedType::new(*name, parse_type(&ty.join(" "))?)),
        [] => Err(CodecError::malformed("empty declaration")),
    }
}

fn parse_elementary(base: &str) -> Result<TypeDescriptor> {
    let ty = match base {
        "address" => TypeDescriptor::Address,
        "bool" => TypeDescriptor::Bool,
        "string" => TypeDescriptor::String,
        "bytes" => TypeDescriptor::Bytes,
        "uint" | "uint256" => TypeDescriptor::Uint256,
        "" => return Err(CodecError::malformed("missing type")),
        _ => {
            if let Some(width) = base
                .strip_prefix("uint")
                .and_then(|bits| bits.parse().ok())
                .and_then(UintWidth::from_bits)
            {
                TypeDescriptor::Uint(width)
            } else if let Some(len) = base
                .strip_prefix("bytes")
                .and_then(|len| len.parse::<usize>().ok())
                .filter(|len| (1..=32).contains(len))
            {
                TypeDescriptor::FixedBytes(len)
            } else {
                return Err(CodecError::UnsupportedType(base.to_string()));
            }
        }
    };
    Ok(ty)
}

/// Wrap `ty` in one array layer per `[..]` token, innermost first.
fn apply_suffix(mut ty: TypeDescriptor, suffix: &str) -> Result<TypeDescriptor> {
    let mut rest = suffix;
    while !rest.is_empty() {
        let inner = rest
            .strip_prefix('[')
            .ok_or_else(|| CodecError::malformed(format!("unexpected `{rest}` after type")))?;
        let close = inner
            .find(']')
            .ok_or_else(|| CodecError::malformed(format!("unterminated array suffix `{rest}`")))?;
        let dimension = &inner[..close];
        ty = if dimension.is_empty() {
            TypeDescriptor::Array(Box::new(ty))
        } else {
            let len = dimension
                .parse::<usize>()
                .ok()
                .filter(|len| *len > 0)
                .ok_or_else(|| {
                    CodecError::malformed(format!("invalid array length `{dimension}`"))
                })?;
            TypeDescriptor::FixedArray(len, Box::new(ty))
        };
        rest = &inner[close + 1..];
    }
    Ok(ty)
}

/// Byte index of the parenthesis closing the one `text` starts with.
fn matching_paren(text: &str) -> Result<usize> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => {}
        }
    }
    Err(CodecError::malformed(format!("unbalanced parentheses in `{text}`")))
}

/// Split on commas that are not nested inside parentheses or brackets.
fn split_top_level(text: &str) -> Result<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => {
                depth -= 1;
                if depth < 0 {
                    return Err(CodecError::malformed(format!(
                        "unexpected `{c}` at byte {i}"
                    )));
                }
            }
            ',' if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(CodecError::malformed(format!("unbalanced brackets in `{text}`")));
    }
    parts.push(&text[start..]);
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elementary_types() {
        assert_eq!(parse_type("address").unwrap(), TypeDescriptor::Address);
        assert_eq!(parse_type("bytes").unwrap(), TypeDescriptor::Bytes);
        assert_eq!(parse_type("bytes32").unwrap(), TypeDescriptor::FixedBytes(32));
        assert_eq!(parse_type("bytes4").unwrap(), TypeDescriptor::FixedBytes(4));
        assert_eq!(parse_type("uint").unwrap(), TypeDescriptor::Uint256);
        assert_eq!(parse_type("uint64").unwrap(), TypeDescriptor::Uint(UintWidth::U64));
    }

    #[test]
    fn test_unsupported_types() {
        for text in ["int256", "uint128", "bytes33", "function", "fixed128x18", "address payable"] {
            match parse_type(text) {
                Err(CodecError::UnsupportedType(shape)) => assert_eq!(shape, text),
                other => panic!("{text}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_array_suffixes() {
        let ty = parse_type("string[2][][3]").unwrap();
        assert_eq!(
            ty,
            TypeDescriptor::FixedArray(
                3,
                Box::new(TypeDescriptor::Array(Box::new(TypeDescriptor::FixedArray(
                    2,
                    Box::new(TypeDescriptor::String)
                ))))
            )
        );
        assert!(matches!(parse_type("string[0]"), Err(CodecError::MalformedSchema(_))));
        assert!(matches!(parse_type("string[x]"), Err(CodecError::MalformedSchema(_))));
        assert!(matches!(parse_type("string[2"), Err(CodecError::MalformedSchema(_))));
    }

    #[test]
    fn test_tuple_type_text() {
        let ty = parse_type("(address F1, string F2)[]").unwrap();
        assert_eq!(ty.to_string(), "(address F1, string F2)[]");
    }

    #[test]
    fn test_schema_declarations() {
        let fields =
            parse_schema("string msg, (bytes32 Key, bytes val, uint256 abn)[] Records").unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0], NamedType::new("msg", TypeDescriptor::String));
        assert_eq!(fields[1].name, "Records");
        assert_eq!(fields[1].ty.to_string(), "(bytes32 Key, bytes val, uint256 abn)[]");
    }

    #[test]
    fn test_unnamed_declarations() {
        let fields = parse_schema("string, uint8[2], (bool b)").unwrap();
        assert!(fields.iter().all(|field| field.name.is_empty()));
        assert_eq!(fields[1].ty.to_string(), "uint8[2]");
        assert_eq!(fields[2].ty.to_string(), "(bool b)");

        let fields = parse_schema("(address F1, string F2)[]").unwrap();
        assert_eq!(fields.len(), 1);
        assert!(fields[0].name.is_empty());
    }

    #[test]
    fn test_whitespace_is_normalised() {
        let fields = parse_schema("  uint64   time ,bool\trevoked ").unwrap();
        assert_eq!(fields[0], NamedType::new("time", TypeDescriptor::Uint(UintWidth::U64)));
        assert_eq!(fields[1], NamedType::new("revoked", TypeDescriptor::Bool));
    }

    #[test]
    fn test_malformed_schemas() {
        for schema in ["string a,", "(bool b", "bool b)", "string a,, bool b", "(bool b) [1] [2] x"] {
            assert!(
                matches!(parse_schema(schema), Err(CodecError::MalformedSchema(_))),
                "{schema}"
            );
        }
        assert!(parse_schema("").unwrap().is_empty());
    }

    #[test]
    fn test_empty_tuples_rejected() {
        for schema in ["()[] x", "()", "( ) x", "(bool a, ()[2] b) c", "uint8 n, ()[]"] {
            assert!(
                matches!(parse_schema(schema), Err(CodecError::MalformedSchema(_))),
                "{schema}"
            );
        }
        assert!(matches!(parse_type("()[]"), Err(CodecError::MalformedSchema(_))));
    }
}
