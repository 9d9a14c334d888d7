use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::object::ObjectKey;
use crate::reflection::{ReflectType, Reflectable, TypeUid};
use crate::schema::{FieldError, Slot};

// -----------------------------------------------------------------------------
// Accessor traits

/// Type-erased access to a plain field.
///
/// Values cross the erased boundary as bytes, in the encoding of the
/// field's [`PlainType`](crate::plain::PlainType).
pub trait PlainAccess: Send + Sync {
    /// The number of bytes [`write`](Self::write) produces for the value.
    fn encoded_len(&self, owner: &dyn Reflectable, slot: Slot) -> Result<u32, FieldError>;

    /// Appends the encoding of the value to `out`.
    fn write(&self, owner: &dyn Reflectable, slot: Slot, out: &mut Vec<u8>)
    -> Result<(), FieldError>;

    /// Decodes `bytes` and stores the value.
    fn read(&self, owner: &mut dyn Reflectable, slot: Slot, bytes: &[u8]) -> Result<(), FieldError>;

    /// The length of an array field.
    fn len(&self, owner: &dyn Reflectable) -> Result<usize, FieldError>;

    /// Resizes an array field, keeping existing elements.
    fn resize(&self, owner: &mut dyn Reflectable, len: usize) -> Result<(), FieldError>;
}

/// Type-erased access to an embedded reflectable field.
pub trait ReflectableAccess: Send + Sync {
    /// The type id of the field's values.
    fn value_uid(&self) -> TypeUid;

    /// Creates a default value of the field's value type.
    fn new_value(&self) -> Box<dyn Reflectable>;

    /// Borrows the value.
    fn get<'a>(&self, owner: &'a dyn Reflectable, slot: Slot)
    -> Result<&'a dyn Reflectable, FieldError>;

    /// Borrows the value mutably.
    fn get_mut<'a>(
        &self,
        owner: &'a mut dyn Reflectable,
        slot: Slot,
    ) -> Result<&'a mut dyn Reflectable, FieldError>;

    /// Replaces the value.
    fn set(
        &self,
        owner: &mut dyn Reflectable,
        slot: Slot,
        value: Box<dyn Reflectable>,
    ) -> Result<(), FieldError>;

    /// The length of an array field.
    fn len(&self, owner: &dyn Reflectable) -> Result<usize, FieldError>;

    /// Resizes an array field, keeping existing elements.
    fn resize(&self, owner: &mut dyn Reflectable, len: usize) -> Result<(), FieldError>;
}

/// Type-erased access to a reference field.
pub trait PointerAccess: Send + Sync {
    /// Reads the referenced key.
    fn get(&self, owner: &dyn Reflectable, slot: Slot) -> Result<Option<ObjectKey>, FieldError>;

    /// Stores the referenced key.
    fn set(
        &self,
        owner: &mut dyn Reflectable,
        slot: Slot,
        key: Option<ObjectKey>,
    ) -> Result<(), FieldError>;

    /// The length of an array field.
    fn len(&self, owner: &dyn Reflectable) -> Result<usize, FieldError>;

    /// Resizes an array field, keeping existing elements.
    fn resize(&self, owner: &mut dyn Reflectable, len: usize) -> Result<(), FieldError>;
}

/// Type-erased access to a data block field.
pub trait DataBlockAccess: Send + Sync {
    /// Borrows the block.
    fn get<'a>(&self, owner: &'a dyn Reflectable) -> Result<&'a [u8], FieldError>;

    /// Replaces the block.
    fn set(&self, owner: &mut dyn Reflectable, data: Vec<u8>) -> Result<(), FieldError>;
}

// -----------------------------------------------------------------------------
// FieldAccess

/// The accessor of a field, one variant per [`FieldKind`](crate::schema::FieldKind).
pub enum FieldAccess {
    Plain(Box<dyn PlainAccess>),
    Reflectable(Box<dyn ReflectableAccess>),
    Pointer(Box<dyn PointerAccess>),
    DataBlock(Box<dyn DataBlockAccess>),
}

// -----------------------------------------------------------------------------
// Helpers

pub(crate) const SINGLE_VALUE: &str = "a single value";
pub(crate) const ARRAY: &str = "an array";

#[inline]
pub(crate) fn owner_ref<'a, T: ReflectType>(
    field: &'static str,
    owner: &'a dyn Reflectable,
) -> Result<&'a T, FieldError> {
    owner
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| FieldError::OwnerMismatch {
            field,
            expected: T::TYPE_NAME,
            found: owner.type_name(),
        })
}

#[inline]
pub(crate) fn owner_mut<'a, T: ReflectType>(
    field: &'static str,
    owner: &'a mut dyn Reflectable,
) -> Result<&'a mut T, FieldError> {
    let found = owner.type_name();
    owner
        .as_any_mut()
        .downcast_mut::<T>()
        .ok_or(FieldError::OwnerMismatch {
            field,
            expected: T::TYPE_NAME,
            found,
        })
}

/// Fails unless the slot addresses a non-array value.
#[inline]
pub(crate) fn expect_single(field: &'static str, slot: Slot) -> Result<(), FieldError> {
    match slot {
        Slot::Single => Ok(()),
        Slot::Element(_) => Err(FieldError::KindMismatch {
            field,
            actual: SINGLE_VALUE,
            requested: slot.describe(),
        }),
    }
}

/// Returns the element index, failing for [`Slot::Single`].
#[inline]
pub(crate) fn expect_element(field: &'static str, slot: Slot) -> Result<usize, FieldError> {
    match slot {
        Slot::Element(index) => Ok(index),
        Slot::Single => Err(FieldError::KindMismatch {
            field,
            actual: ARRAY,
            requested: slot.describe(),
        }),
    }
}

/// The error for `len`/`resize` on a non-array field.
#[inline]
pub(crate) fn not_an_array(field: &'static str) -> FieldError {
    FieldError::KindMismatch {
        field,
        actual: SINGLE_VALUE,
        requested: ARRAY,
    }
}

#[inline]
pub(crate) fn out_of_bounds(field: &'static str, index: usize, len: usize) -> FieldError {
    FieldError::IndexOutOfBounds { field, index, len }
}
