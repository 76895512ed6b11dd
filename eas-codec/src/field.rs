//! Externally visible names of record fields.

/// Name a record field carries inside tuples and schema strings.
///
/// `annotation` is the raw `#[abi = "..."]` text of the field, if any. Its
/// first comma-delimited segment wins when non-empty; otherwise the field's
/// identifier is used, without a raw-identifier prefix.
pub fn field_name(annotation: Option<&str>, ident: &str) -> String {
    let annotated = annotation
        .and_then(|text| text.split(',').next())
        .filter(|segment| !segment.is_empty());

    match annotated {
        Some(name) => name.to_string(),
        None => ident.strip_prefix("r#").unwrap_or(ident).to_string(),
    }
}
