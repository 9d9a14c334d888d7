use alloc::string::String;

use thiserror::Error;

use crate::plain::PlainError;

/// An error returned by a field accessor.
///
/// These are programming errors on the caller's side (wrong owner type,
/// wrong slot, out of range index) or a plain value that failed to decode.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FieldError {
    /// The field was accessed in a shape it does not have, such as an
    /// element of a non-array field.
    #[error("field `{field}` holds {actual}, but was accessed as {requested}")]
    KindMismatch {
        field: &'static str,
        actual: &'static str,
        requested: &'static str,
    },
    /// The object passed to the accessor is not of the declaring type.
    #[error("field `{field}` belongs to `{expected}`, but the owner is a `{found}`")]
    OwnerMismatch {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    /// The value passed to a setter is not of the field's value type.
    #[error("field `{field}` holds `{expected}` values, cannot store a `{found}`")]
    ValueMismatch {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    /// An element index past the end of an array field.
    #[error("index {index} is out of bounds for field `{field}` of length {len}")]
    IndexOutOfBounds {
        field: &'static str,
        index: usize,
        len: usize,
    },
    /// A plain value could not be read back from its bytes.
    #[error("field `{field}`: {source}")]
    Plain {
        field: &'static str,
        source: PlainError,
    },
}

/// An error returned by schema lookups.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SchemaError {
    /// No field with the given name is declared on the type itself.
    #[error("`{type_name}` declares no field named `{field}`")]
    UnknownField {
        type_name: &'static str,
        field: String,
    },
}
