use core::fmt;

use bitflags::bitflags;
use serde_core::{Serialize, Serializer};

// -----------------------------------------------------------------------------
// FieldKind

/// How a field's value is stored and persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// A value copied by its raw bytes, see [`PlainType`](crate::plain::PlainType).
    Plain,
    /// A reflectable value owned by the field and persisted inline.
    Reflectable,
    /// A shared reference to an object of an [`ObjectGraph`](crate::object::ObjectGraph).
    ReflectablePointer,
    /// An opaque byte blob.
    DataBlock,
}

impl FieldKind {
    /// Returns a short lowercase name, used in messages and exports.
    pub const fn as_str(self) -> &'static str {
        match self {
            FieldKind::Plain => "plain",
            FieldKind::Reflectable => "reflectable",
            FieldKind::ReflectablePointer => "pointer",
            FieldKind::DataBlock => "data block",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FieldKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// -----------------------------------------------------------------------------
// FieldSchema

/// The persisted shape of a field.
///
/// This is exactly what a serialized stream records about a field, which
/// lets a reader compare stored data against the live schema and skip
/// fields it does not know.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldSchema {
    /// The field id, unique within the declaring type.
    pub id: u16,
    /// The field kind.
    pub kind: FieldKind,
    /// Whether the field holds a sequence of values.
    pub is_array: bool,
    /// The static size of a plain value, `0` otherwise.
    pub size: u8,
    /// Whether plain values carry a length prefix.
    pub dynamic: bool,
}

impl FieldSchema {
    /// Returns `true` if `other` can be read by a field of this shape.
    ///
    /// Static sizes must match exactly; a change between static and dynamic
    /// sizes is never compatible.
    #[inline]
    pub fn matches(&self, other: &FieldSchema) -> bool {
        self.kind == other.kind
            && self.is_array == other.is_array
            && self.dynamic == other.dynamic
            && self.size == other.size
    }
}

// -----------------------------------------------------------------------------
// FieldFlags

bitflags! {
    /// Optional behaviors of a field.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct FieldFlags: u8 {
        /// A reference that may close a cycle.
        ///
        /// A decoder does not populate the target on demand when it meets
        /// such a reference, and does not warn if the target is still being
        /// populated.
        const WEAK_REF = 1 << 0;
    }
}

// -----------------------------------------------------------------------------
// Slot

/// Selects the value of a field accessor call.
///
/// Non-array fields only accept [`Slot::Single`], array fields only accept
/// [`Slot::Element`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    /// The value of a non-array field.
    Single,
    /// One element of an array field.
    Element(usize),
}

impl Slot {
    /// Describes the slot in error messages.
    pub(crate) fn describe(self) -> &'static str {
        match self {
            Slot::Single => "a single value",
            Slot::Element(_) => "an array element",
        }
    }
}
