//! Conversion between binary streams and trees, without a registry.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::mem;

use vc_rtti::TypeUid;
use vc_rtti::schema::{FieldKind, FieldSchema};

use crate::binary::{ByteReader, ByteSink, FieldMeta, MAX_OBJECT_ID, ObjectMeta, Record};
use crate::binary::{check_nesting, min_element_len};
use crate::error::{DecodeError, EncodeError, TreeError};
use crate::intermediate::{SerializedArray, SerializedEntry, SerializedField, SerializedGraph};
use crate::intermediate::{SerializedInstance, SerializedObject, SerializedSubObject};

// -----------------------------------------------------------------------------
// Reading

/// Parses a binary stream into a tree that borrows its byte spans.
///
/// Every object, segment and field of the stream is kept, whether or not its
/// type is registered anywhere. Empty input yields an empty graph.
///
/// # Examples
///
/// ```
/// use vc_serial::intermediate::{read_tree, write_tree};
///
/// let tree = read_tree(&[]).unwrap();
/// assert!(tree.is_empty());
///
/// let mut bytes = Vec::new();
/// write_tree(&tree, &mut bytes).unwrap();
/// assert!(bytes.is_empty());
/// ```
pub fn read_tree(bytes: &[u8]) -> Result<SerializedGraph<'_>, DecodeError> {
    let mut reader = ByteReader::new(bytes);
    let mut graph = SerializedGraph::new();
    let mut root = None;

    while !reader.is_empty() {
        let start = reader.offset();
        let meta = reader.read_object_meta()?;
        if meta.is_base || meta.id == 0 {
            return Err(DecodeError::CorruptMetadata {
                offset: start,
                reason: "expected the first segment of a top-level object",
            });
        }
        if graph.objects.contains_key(&meta.id) {
            return Err(DecodeError::CorruptMetadata {
                offset: start,
                reason: "object id appears twice",
            });
        }

        let object = read_object(&mut reader, meta.id, meta.type_uid, 0)?;
        root.get_or_insert(meta.id);
        graph.objects.insert(meta.id, object);
    }

    graph.root = root.unwrap_or(0);
    Ok(graph)
}

/// Reads the segments of the object `id`, starting after its first record.
/// Embedded values have id `0` and a `nesting` above `0`.
fn read_object<'a>(
    reader: &mut ByteReader<'a>,
    id: u32,
    type_uid: TypeUid,
    nesting: usize,
) -> Result<SerializedObject<'a>, DecodeError> {
    let embedded = nesting > 0;
    let mut object = SerializedObject::default();
    let mut current = SerializedSubObject::new(type_uid);

    loop {
        if reader.is_empty() {
            if embedded {
                return Err(reader.truncated());
            }
            break;
        }

        let start = reader.offset();
        match reader.read_record()? {
            Record::Object(meta) if meta.is_base && meta.id == id => {
                let next = SerializedSubObject::new(meta.type_uid);
                object.sub_objects.push(mem::replace(&mut current, next));
            }
            Record::Object(meta) if meta.is_base && !embedded => {
                return Err(DecodeError::CorruptMetadata {
                    offset: start,
                    reason: "base segment of another object",
                });
            }
            Record::Object(_) if embedded => {
                return Err(DecodeError::CorruptMetadata {
                    offset: start,
                    reason: "object record inside an embedded value",
                });
            }
            Record::Object(_) => {
                reader.unread_object_meta();
                break;
            }
            Record::Field(field) if field.terminator => {
                if embedded {
                    break;
                }
                return Err(DecodeError::CorruptMetadata {
                    offset: start,
                    reason: "terminator outside an embedded value",
                });
            }
            Record::Field(field) => {
                let value = read_value(reader, &field.schema, nesting)?;
                current.entries.push(SerializedEntry {
                    schema: field.schema,
                    value,
                });
            }
        }
    }

    object.sub_objects.push(current);
    Ok(object)
}

fn read_value<'a>(
    reader: &mut ByteReader<'a>,
    schema: &FieldSchema,
    nesting: usize,
) -> Result<SerializedInstance<'a>, DecodeError> {
    if !schema.is_array {
        return read_element(reader, schema, nesting);
    }

    let count = reader.read_count(min_element_len(schema))?;
    let mut array = SerializedArray::default();
    for _ in 0..count {
        let element = read_element(reader, schema, nesting)?;
        array.elements.insert(array.len, element);
        array.len += 1;
    }
    Ok(SerializedInstance::Array(array))
}

fn read_element<'a>(
    reader: &mut ByteReader<'a>,
    schema: &FieldSchema,
    nesting: usize,
) -> Result<SerializedInstance<'a>, DecodeError> {
    let bytes = match schema.kind {
        FieldKind::Plain if !schema.dynamic => reader.take(schema.size as usize)?,
        FieldKind::Plain | FieldKind::DataBlock => reader.read_prefixed()?,
        FieldKind::ReflectablePointer => return Ok(SerializedInstance::Reference(reader.read_u32()?)),
        FieldKind::Reflectable => {
            let start = reader.offset();
            check_nesting(nesting + 1, start)?;
            let meta = reader.read_object_meta()?;
            if meta.is_base || meta.id != 0 {
                return Err(DecodeError::CorruptMetadata {
                    offset: start,
                    reason: "expected the first segment of an embedded value",
                });
            }
            let object = read_object(reader, 0, meta.type_uid, nesting + 1)?;
            return Ok(SerializedInstance::Object(object));
        }
    };
    Ok(SerializedInstance::Field(SerializedField::borrowed(bytes)))
}

// -----------------------------------------------------------------------------
// Writing

/// Writes a tree as a binary stream.
///
/// The root object comes first, then the others in ascending id order.
/// Returns the number of objects written.
pub fn write_tree<S: ByteSink + ?Sized>(
    tree: &SerializedGraph<'_>,
    sink: &mut S,
) -> Result<u32, EncodeError> {
    let mut bytes = Vec::new();
    tree_bytes(tree, &mut bytes)?;
    sink.write_bytes(&bytes)?;
    Ok(tree.objects.len() as u32)
}

/// Appends the binary form of `tree` to `out`.
pub(crate) fn tree_bytes(tree: &SerializedGraph<'_>, out: &mut Vec<u8>) -> Result<(), TreeError> {
    if tree.objects.is_empty() {
        return Ok(());
    }

    let root = tree
        .objects
        .get(&tree.root)
        .ok_or(TreeError::MissingRoot { root: tree.root })?;
    write_object(out, tree.root, root)?;
    for (&id, object) in &tree.objects {
        if id != tree.root {
            write_object(out, id, object)?;
        }
    }
    Ok(())
}

fn write_object(out: &mut Vec<u8>, id: u32, object: &SerializedObject<'_>) -> Result<(), TreeError> {
    if id == 0 || id > MAX_OBJECT_ID {
        return Err(TreeError::InvalidObjectId { id });
    }
    if object.sub_objects.is_empty() {
        return Err(TreeError::EmptyObject { id });
    }
    write_segments(out, id, object)
}

fn write_segments(out: &mut Vec<u8>, id: u32, object: &SerializedObject<'_>) -> Result<(), TreeError> {
    for (depth, sub) in object.sub_objects.iter().enumerate() {
        let meta = ObjectMeta {
            id,
            type_uid: sub.type_uid,
            is_base: depth > 0,
        };
        out.extend_from_slice(&meta.encode());
        for entry in &sub.entries {
            write_entry(out, entry)?;
        }
    }
    Ok(())
}

fn write_entry(out: &mut Vec<u8>, entry: &SerializedEntry<'_>) -> Result<(), TreeError> {
    let schema = &entry.schema;
    out.extend_from_slice(&FieldMeta::encode(schema).to_le_bytes());
    if !schema.is_array {
        return write_element(out, schema, &entry.value);
    }

    let SerializedInstance::Array(array) = &entry.value else {
        return Err(shape_mismatch(schema));
    };
    out.extend_from_slice(&array.len.to_le_bytes());
    for index in 0..array.len {
        let element = array.elements.get(&index).ok_or(TreeError::IncompleteArray {
            field: schema.id,
            len: array.len,
            index,
        })?;
        write_element(out, schema, element)?;
    }
    Ok(())
}

fn write_element(
    out: &mut Vec<u8>,
    schema: &FieldSchema,
    value: &SerializedInstance<'_>,
) -> Result<(), TreeError> {
    match (schema.kind, value) {
        (FieldKind::Plain, SerializedInstance::Field(field)) if !schema.dynamic => {
            let bytes = field.bytes();
            if bytes.len() != schema.size as usize {
                return Err(TreeError::SizeMismatch {
                    field: schema.id,
                    expected: u32::from(schema.size),
                    found: u32::try_from(bytes.len()).unwrap_or(u32::MAX),
                });
            }
            out.extend_from_slice(bytes);
        }
        (FieldKind::Plain | FieldKind::DataBlock, SerializedInstance::Field(field)) => {
            let bytes = field.bytes();
            let len = u32::try_from(bytes.len())
                .map_err(|_| TreeError::LengthOverflow { field: schema.id })?;
            out.extend_from_slice(&len.to_le_bytes());
            out.extend_from_slice(bytes);
        }
        (FieldKind::ReflectablePointer, SerializedInstance::Reference(id)) => {
            out.extend_from_slice(&id.to_le_bytes());
        }
        (FieldKind::Reflectable, SerializedInstance::Object(object)) if !object.sub_objects.is_empty() => {
            write_segments(out, 0, object)?;
            out.extend_from_slice(&FieldMeta::TERMINATOR.to_le_bytes());
        }
        _ => return Err(shape_mismatch(schema)),
    }
    Ok(())
}

#[inline]
fn shape_mismatch(schema: &FieldSchema) -> TreeError {
    TreeError::ShapeMismatch {
        field: schema.id,
        kind: schema.kind,
    }
}

// -----------------------------------------------------------------------------
// Tests
