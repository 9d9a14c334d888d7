//! Skipping payloads by their field records alone.
//!
//! A stream is self-describing enough to step over any field or object
//! without the registry. The decoder uses this for unknown types, unknown
//! fields and mismatched segments.

use vc_rtti::schema::{FieldKind, FieldSchema};

use crate::binary::meta::{FIELD_META_LEN, OBJECT_META_LEN};
use crate::binary::reader::{ByteReader, Record};
use crate::error::DecodeError;

/// The deepest embedded value a stream may hold.
pub(crate) const MAX_NESTING: usize = 128;

/// Fails once embedded values nest deeper than [`MAX_NESTING`].
#[inline]
pub(crate) fn check_nesting(nesting: usize, offset: usize) -> Result<(), DecodeError> {
    if nesting > MAX_NESTING {
        return Err(DecodeError::CorruptMetadata {
            offset,
            reason: "embedded values nest too deeply",
        });
    }
    Ok(())
}

/// The smallest number of bytes one element of a field can take.
pub(crate) fn min_element_len(schema: &FieldSchema) -> usize {
    match schema.kind {
        FieldKind::Plain if schema.dynamic => 4,
        FieldKind::Plain => schema.size as usize,
        FieldKind::ReflectablePointer | FieldKind::DataBlock => 4,
        FieldKind::Reflectable => OBJECT_META_LEN + FIELD_META_LEN,
    }
}

/// Skips the payload following a field record.
///
/// `nesting` is the depth of the value holding the field, `0` for a
/// top-level object.
pub(crate) fn skip_payload(
    reader: &mut ByteReader<'_>,
    schema: &FieldSchema,
    nesting: usize,
) -> Result<(), DecodeError> {
    if !schema.is_array {
        return skip_element(reader, schema, nesting);
    }

    let count = reader.read_count(min_element_len(schema))?;
    match schema.kind {
        // Fixed-size elements are stepped over at once.
        FieldKind::Plain if !schema.dynamic => reader.take(count * schema.size as usize).map(drop),
        FieldKind::ReflectablePointer => reader.take(count * 4).map(drop),
        _ => (0..count).try_for_each(|_| skip_element(reader, schema, nesting)),
    }
}

fn skip_element(reader: &mut ByteReader<'_>, schema: &FieldSchema, nesting: usize) -> Result<(), DecodeError> {
    match schema.kind {
        FieldKind::Plain if schema.dynamic => reader.read_prefixed().map(drop),
        FieldKind::Plain => reader.take(schema.size as usize).map(drop),
        FieldKind::ReflectablePointer => reader.read_u32().map(drop),
        FieldKind::DataBlock => reader.read_prefixed().map(drop),
        FieldKind::Reflectable => skip_embedded(reader, nesting + 1),
    }
}

/// Skips an embedded value at depth `nesting` up to and including its
/// terminator.
///
/// The reader may stand before or after the value's first segment record.
pub(crate) fn skip_embedded(reader: &mut ByteReader<'_>, nesting: usize) -> Result<(), DecodeError> {
    check_nesting(nesting, reader.offset())?;
    loop {
        let start = reader.offset();
        match reader.read_record()? {
            Record::Object(meta) if meta.id == 0 => {}
            Record::Object(_) => {
                return Err(DecodeError::CorruptMetadata {
                    offset: start,
                    reason: "object record inside an embedded value",
                });
            }
            Record::Field(field) if field.terminator => return Ok(()),
            Record::Field(field) => skip_payload(reader, &field.schema, nesting)?,
        }
    }
}

/// Skips the rest of the top-level object `id`: its fields and base
/// segments, up to the next object or the end of input.
pub(crate) fn skip_object(reader: &mut ByteReader<'_>, id: u32) -> Result<(), DecodeError> {
    while !reader.is_empty() {
        let start = reader.offset();
        match reader.read_record()? {
            Record::Object(meta) if meta.is_base && meta.id == id => {}
            Record::Object(meta) if meta.is_base => {
                return Err(DecodeError::CorruptMetadata {
                    offset: start,
                    reason: "base segment of another object",
                });
            }
            Record::Object(_) => {
                reader.unread_object_meta();
                return Ok(());
            }
            Record::Field(field) if field.terminator => {
                return Err(DecodeError::CorruptMetadata {
                    offset: start,
                    reason: "terminator outside an embedded value",
                });
            }
            Record::Field(field) => skip_payload(reader, &field.schema, 0)?,
        }
    }
    Ok(())
}

// -----------------------------------------------------------------------------
// Tests
