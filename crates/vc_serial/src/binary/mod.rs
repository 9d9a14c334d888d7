//! The binary stream format and its codec.
//!
//! An object is written as one segment per level of its base chain, most
//! derived first. Each segment is an [`ObjectMeta`] record followed by the
//! fields declared at that level, each a [`FieldMeta`] record and its
//! payload. Embedded values are written inline the same way, with object id
//! `0`, and closed by a terminator record.
//!
//! - [`BinaryEncoder`]: object graph to bytes, through any [`ByteSink`].
//! - [`BinaryDecoder`]: bytes to object graph.
//! - [`BufferWriter`]: a sink over caller-owned buffers.

use vc_rtti::Reflectable;
use vc_rtti::schema::{FieldError, Slot, TypeDescriptor};

// -----------------------------------------------------------------------------
// Modules

mod decoder;
mod encoder;
mod meta;
mod reader;
mod sink;
mod skip;

// -----------------------------------------------------------------------------
// Exports

pub use decoder::{BinaryDecoder, Decoded};
pub use encoder::{BinaryEncoder, EncodeFlags};
pub use meta::{FIELD_META_LEN, FieldMeta, FieldMetaError, MAX_OBJECT_ID, OBJECT_META_LEN};
pub use meta::{ObjectMeta, is_object_meta};
pub use sink::{BufferWriter, ByteSink, DEFAULT_CAPACITY};

pub(crate) use reader::{ByteReader, Record};
pub(crate) use skip::{check_nesting, min_element_len};

// -----------------------------------------------------------------------------
// Base chain projection

/// Projects `object` onto level `depth` of its base chain.
pub(crate) fn level_ref<'o>(
    chain: &[&TypeDescriptor],
    object: &'o dyn Reflectable,
    depth: usize,
) -> Result<&'o dyn Reflectable, FieldError> {
    let mut level = object;
    for descriptor in &chain[..depth] {
        if let Some(base) = descriptor.project_base(level)? {
            level = base;
        }
    }
    Ok(level)
}

/// Mutable version of [`level_ref`].
pub(crate) fn level_mut<'o>(
    chain: &[&TypeDescriptor],
    object: &'o mut dyn Reflectable,
    depth: usize,
) -> Result<&'o mut dyn Reflectable, FieldError> {
    let mut level = object;
    for descriptor in &chain[..depth] {
        let Some(base) = descriptor.base() else {
            break;
        };
        level = base.project_mut(level)?;
    }
    Ok(level)
}

// -----------------------------------------------------------------------------
// Slots

/// The slots of one field: `Single`, or every element of an array.
pub(crate) struct Slots {
    next: usize,
    len: usize,
    array: bool,
}

impl Slots {
    #[inline]
    pub fn single() -> Self {
        Self {
            next: 0,
            len: 1,
            array: false,
        }
    }

    #[inline]
    pub fn elements(len: usize) -> Self {
        Self {
            next: 0,
            len,
            array: true,
        }
    }
}

impl Iterator for Slots {
    type Item = Slot;

    fn next(&mut self) -> Option<Slot> {
        if self.next >= self.len {
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some(if self.array {
            Slot::Element(index)
        } else {
            Slot::Single
        })
    }
}
