use thiserror::Error;
use vc_rtti::TypeUid;
use vc_rtti::plain::PlainError;
use vc_rtti::schema::{FieldError, FieldKind};

// -----------------------------------------------------------------------------
// EncodeError

/// An error that aborts an encode.
///
/// Output written to the sink before the error must be discarded.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum EncodeError {
    /// The flush callback returned no buffer, or an empty one.
    #[error("output buffer exhausted")]
    OutputExhausted,
    /// More objects than a 30-bit persistent id can number.
    #[error("too many objects in one stream")]
    TooManyObjects,
    /// An object's type is not in the registry.
    #[error("type `{type_name}` ({uid}) is not registered")]
    UnregisteredType { type_name: &'static str, uid: TypeUid },
    /// The root key is not in the graph.
    #[error("the object to encode is not in the graph")]
    MissingObject,
    /// A plain value wrote a different number of bytes than its schema declares.
    #[error("field {field} declares {expected} bytes, but wrote {found}")]
    SizeMismatch { field: u16, expected: u32, found: u32 },
    /// A length does not fit the 32-bit prefix.
    #[error("field {field} is too long to encode")]
    LengthOverflow { field: u16 },
    /// A tree could not be written, see [`TreeError`].
    #[error(transparent)]
    Tree(#[from] TreeError),
    /// The encoded stream could not be read back into a tree.
    #[error("encoded stream could not be read back: {0}")]
    Reparse(#[source] DecodeError),
    /// A field accessor failed.
    #[error(transparent)]
    Field(#[from] FieldError),
}

// -----------------------------------------------------------------------------
// TreeError

/// A [`SerializedGraph`](crate::intermediate::SerializedGraph) that has no binary form.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TreeError {
    /// An array lacks some of the elements below its length.
    #[error("array field {field} of length {len} is missing element {index}")]
    IncompleteArray { field: u16, len: u32, index: u32 },
    /// An entry's value does not fit its schema, such as an object under a plain field.
    #[error("field {field} of kind {kind} holds a value of the wrong shape")]
    ShapeMismatch { field: u16, kind: FieldKind },
    /// A static plain value of the wrong size.
    #[error("field {field} declares {expected} bytes, but holds {found}")]
    SizeMismatch { field: u16, expected: u32, found: u32 },
    /// A length does not fit the 32-bit prefix.
    #[error("field {field} is too long to encode")]
    LengthOverflow { field: u16 },
    /// The graph has no object under its root id.
    #[error("root object {root} is missing")]
    MissingRoot { root: u32 },
    /// An object id of `0` or beyond [`MAX_OBJECT_ID`](crate::binary::MAX_OBJECT_ID).
    #[error("object id {id} is out of range")]
    InvalidObjectId { id: u32 },
    /// An object without segments.
    #[error("object {id} has no segments")]
    EmptyObject { id: u32 },
}

// -----------------------------------------------------------------------------
// DecodeError

/// An error that aborts a decode.
///
/// Objects created by the failed call are removed from the graph again.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum DecodeError {
    /// The stream ended inside a record or payload.
    #[error("input truncated at byte {offset}")]
    TruncatedInput { offset: usize },
    /// A record contradicts the format or the live schema.
    #[error("corrupt metadata at byte {offset}: {reason}")]
    CorruptMetadata { offset: usize, reason: &'static str },
    /// A known field was stored with a different kind or array shape.
    #[error("field `{field}` is stored as {found}, but declared as {expected}")]
    FieldKindMismatch {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    /// A plain value rejected its bytes.
    #[error("invalid value for field `{field}`: {source}")]
    InvalidValue {
        field: &'static str,
        source: PlainError,
    },
    /// The object to decode into is not of the stream's root type.
    #[error("cannot decode a `{found}` stream into a `{expected}`")]
    RootTypeMismatch { expected: TypeUid, found: TypeUid },
    /// The object to decode into is not in the graph.
    #[error("the object to decode into is not in the graph")]
    MissingObject,
    /// A tree could not be turned into a stream.
    #[error(transparent)]
    Tree(#[from] TreeError),
    /// A field accessor failed.
    #[error(transparent)]
    Field(FieldError),
}

impl From<FieldError> for DecodeError {
    fn from(error: FieldError) -> Self {
        match error {
            FieldError::Plain { field, source } => DecodeError::InvalidValue { field, source },
            error => DecodeError::Field(error),
        }
    }
}

// -----------------------------------------------------------------------------
// DecodeWarning

/// A recoverable condition met while decoding.
///
/// Warnings are logged as they happen and collected in
/// [`Decoded::warnings`](crate::binary::Decoded::warnings).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeWarning {
    /// An object of an unregistered type was skipped; references to it are null.
    #[error("object {id} has unknown type {type_uid}, skipped")]
    UnknownType { id: u32, type_uid: TypeUid },
    /// A field the live schema no longer declares was skipped.
    #[error("`{type_name}` has no field {field}, skipped")]
    UnknownField { type_name: &'static str, field: u16 },
    /// A non-weak reference closed a cycle; the target was not fully decoded when assigned.
    #[error(
        "circular reference to object {id} through non-weak field `{field}`, \
         the target is assigned before it is fully decoded"
    )]
    CircularReference { id: u32, field: &'static str },
    /// A reference to an id the stream does not contain; the field is null.
    #[error("object {id} is referenced but not contained in the stream")]
    MissingObject { id: u32 },
    /// A base segment of a type that is not the next base of the live type, skipped.
    #[error("`{type_name}` has no base type {found} at this level, segment skipped")]
    BaseTypeMismatch {
        type_name: &'static str,
        found: TypeUid,
    },
    /// An embedded value of another type than the field holds, skipped.
    #[error("field `{field}` holds {expected} values, but the stream has a {found}, skipped")]
    EmbeddedTypeMismatch {
        field: &'static str,
        expected: TypeUid,
        found: TypeUid,
    },
}

// -----------------------------------------------------------------------------
// CloneError

/// An error returned by [`Cloner::clone_object`](crate::clone::Cloner::clone_object).
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum CloneError {
    #[error("failed to encode the source: {0}")]
    Encode(#[from] EncodeError),
    #[error("failed to decode the copy: {0}")]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Field(#[from] FieldError),
    /// The object to clone is not in the graph.
    #[error("the object to clone is not in the graph")]
    MissingObject,
}
