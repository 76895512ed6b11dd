//! Error types for the attestation codec.

use std::fmt;

use thiserror::Error;

/// Result type alias for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;

/// One step into a nested value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Position in the top-level argument list
    Argument(usize),
    /// Named tuple field
    Field(String),
    /// Element of a fixed or dynamic array
    Index(usize),
}

/// Location of the offending value inside an argument list, outermost first.
///
/// Renders as `arg0.Records[1].val`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn prepend(&mut self, segment: PathSegment) {
        self.0.insert(0, segment);
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("value");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Argument(n) => write!(f, "arg{n}")?,
                PathSegment::Field(name) if i == 0 => f.write_str(name)?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(n) => write!(f, "[{n}]")?,
            }
        }
        Ok(())
    }
}

/// Errors raised while resolving, encoding or decoding attestation values.
///
/// None of these are transient: the same input always fails the same way.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A type declaration names a shape outside the supported ABI subset.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// A schema declaration does not follow the schema grammar.
    #[error("malformed schema: {0}")]
    MalformedSchema(String),

    /// A value could not be converted for the ABI encoder.
    #[error("encoding error at {path}: {reason}")]
    Encode { path: FieldPath, reason: String },

    /// The ABI decoder rejected the payload.
    #[error("decoding error: {0}")]
    Decode(String),

    /// Decoded value count differs from the destination count.
    #[error("arity mismatch: {decoded} decoded values for {expected} destinations")]
    ArityMismatch { expected: usize, decoded: usize },

    /// A decoded value does not fit its destination.
    #[error("injection error at {path}: {reason}")]
    Injection { path: FieldPath, reason: String },
}

impl CodecError {
    pub(crate) fn encode(reason: impl Into<String>) -> Self {
        Self::Encode {
            path: FieldPath::new(),
            reason: reason.into(),
        }
    }

    pub(crate) fn injection(reason: impl Into<String>) -> Self {
        Self::Injection {
            path: FieldPath::new(),
            reason: reason.into(),
        }
    }

    /// Injection error for a decoded value of the wrong kind.
    pub(crate) fn mismatch(expected: impl fmt::Display, found: &crate::Value) -> Self {
        Self::injection(format!("expected {expected}, found {}", found.kind()))
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedSchema(reason.into())
    }

    /// Prefix the error path with a tuple field name.
    pub fn at_field(self, name: &str) -> Self {
        self.within(PathSegment::Field(name.to_string()))
    }

    /// Prefix the error path with an array index.
    pub fn at_index(self, index: usize) -> Self {
        self.within(PathSegment::Index(index))
    }

    /// Prefix the error path with a top-level argument position.
    pub fn at_argument(self, index: usize) -> Self {
        self.within(PathSegment::Argument(index))
    }

    /// Path of the offending value, for errors that carry one.
    pub fn path(&self) -> Option<&FieldPath> {
        match self {
            Self::Encode { path, .. } | Self::Injection { path, .. } => Some(path),
            _ => None,
        }
    }

    fn within(mut self, segment: PathSegment) -> Self {
        if let Self::Encode { path, .. } | Self::Injection { path, .. } = &mut self {
            path.prepend(segment);
        }
        self
    }
}
