use thiserror::Error;

use crate::TypeUid;

/// An error returned by [`TypeRegistry::try_register`](crate::registry::TypeRegistry::try_register).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RegistryError {
    /// Two different types claim the same persistent id.
    #[error("type id {uid} is claimed by both `{existing}` and `{new}`")]
    DuplicateTypeUid {
        uid: TypeUid,
        existing: &'static str,
        new: &'static str,
    },
    /// A type declares two fields with the same id.
    #[error("`{type_name}` declares field id {id} more than once")]
    DuplicateFieldId { type_name: &'static str, id: u16 },
    /// A type declares two fields with the same name.
    #[error("`{type_name}` declares field `{name}` more than once")]
    DuplicateFieldName {
        type_name: &'static str,
        name: &'static str,
    },
    /// A type reaches itself through its base chain.
    #[error("`{type_name}` is its own base type")]
    InheritanceCycle { type_name: &'static str },
    /// A type declares more than one base type.
    #[error("`{type_name}` declares more than one base type")]
    MultipleBases { type_name: &'static str },
}
