use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use vc_rtti::Reflectable;
use vc_rtti::object::{ObjectGraph, ObjectKey};
use vc_rtti::registry::TypeRegistry;
use vc_rtti::schema::{FieldAccess, FieldDescriptor, FieldError, FieldKind, FieldSchema};
use vc_rtti::schema::{ReflectableAccess, Slot, TypeDescriptor};

use crate::binary::meta::{OBJECT_META_LEN, ObjectMeta};
use crate::binary::reader::{ByteReader, Record};
use crate::binary::skip::{check_nesting, min_element_len, skip_embedded, skip_object, skip_payload};
use crate::binary::{Slots, level_mut};
use crate::error::{DecodeError, DecodeWarning};

// -----------------------------------------------------------------------------
// Decoded

/// The result of a successful decode.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Decoded {
    /// The first object of the stream, or `None` for empty input and roots of
    /// unknown type.
    pub root: Option<ObjectKey>,
    /// The objects this call inserted into the graph, in stream order.
    pub objects: Vec<ObjectKey>,
    /// The recoverable conditions met on the way.
    pub warnings: Vec<DecodeWarning>,
}

impl Decoded {
    /// Returns `true` if the stream decoded without warnings.
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

// -----------------------------------------------------------------------------
// BinaryDecoder

/// Reads a binary stream back into an object graph.
///
/// Decoding runs in two passes. The first pass walks the stream once,
/// creating an empty instance for every top-level object and remembering
/// where its fields begin. The second pass fills the root, then every other
/// object in ascending id order. A non-weak reference to an object that is
/// not filled yet fills it on the spot, so most objects are complete by the
/// time they are assigned. Past a fixed depth of such nested fills the
/// target is left to the ascending pass instead, so long reference chains
/// decode in bounded stack space.
///
/// Embedded values nesting deeper than a fixed limit are rejected as
/// [`DecodeError::CorruptMetadata`].
///
/// Unknown types, unknown fields and mismatched segments are skipped and
/// reported as [`DecodeWarning`]s. Any [`DecodeError`] removes the objects
/// created by the call again.
#[derive(Clone, Copy, Debug)]
pub struct BinaryDecoder<'r> {
    registry: &'r TypeRegistry,
}

impl<'r> BinaryDecoder<'r> {
    /// Creates a decoder for the types of `registry`.
    #[inline]
    pub const fn new(registry: &'r TypeRegistry) -> Self {
        Self { registry }
    }

    /// Decodes a stream into new objects of `graph`.
    pub fn decode(&self, graph: &mut ObjectGraph, bytes: &[u8]) -> Result<Decoded, DecodeError> {
        self.run(graph, bytes, None)
    }

    /// Decodes a stream onto the existing object `key`.
    ///
    /// The stream's first object must be of the same type as `key`; it is
    /// decoded into `key` instead of a new instance. Fields absent from the
    /// stream keep their values. Every other object of the stream is created
    /// anew.
    pub fn decode_into(
        &self,
        graph: &mut ObjectGraph,
        key: ObjectKey,
        bytes: &[u8],
    ) -> Result<Decoded, DecodeError> {
        if graph.get(key).is_none() {
            return Err(DecodeError::MissingObject);
        }
        self.run(graph, bytes, Some(key))
    }

    fn run(
        &self,
        graph: &mut ObjectGraph,
        bytes: &[u8],
        target: Option<ObjectKey>,
    ) -> Result<Decoded, DecodeError> {
        let mut state = DecodeState {
            registry: self.registry,
            graph,
            bytes,
            entries: BTreeMap::new(),
            created: Vec::new(),
            warnings: Vec::new(),
            depth: 0,
        };

        match state.decode(target) {
            Ok(root) => {
                log::debug!(
                    "decoded {} objects from {} bytes with {} warnings",
                    state.entries.len(),
                    bytes.len(),
                    state.warnings.len(),
                );
                Ok(Decoded {
                    root,
                    objects: state.created,
                    warnings: state.warnings,
                })
            }
            Err(error) => {
                log::debug!("decode failed, discarding {} objects: {error}", state.created.len());
                for key in state.created {
                    state.graph.remove(key);
                }
                Err(error)
            }
        }
    }
}

// -----------------------------------------------------------------------------
// DecodeState

/// How many objects and embedded values may be open at once before a
/// reference stops filling its target on the spot.
const MAX_FILL_DEPTH: usize = 64;

#[derive(Clone, Copy, PartialEq, Eq)]
enum FillState {
    Pending,
    InProgress,
    Filled,
}

#[derive(Clone, Copy)]
struct Entry<'r> {
    /// `None` for objects of unknown type.
    object: Option<(ObjectKey, &'r TypeDescriptor)>,
    /// Where the fields of the first segment begin.
    offset: usize,
    state: FillState,
}

/// How a segment ended.
enum SegmentEnd {
    /// A base segment of the same object follows.
    Base(ObjectMeta),
    /// The object or embedded value is complete.
    End,
}

struct DecodeState<'r, 'g, 'b> {
    registry: &'r TypeRegistry,
    graph: &'g mut ObjectGraph,
    bytes: &'b [u8],
    entries: BTreeMap<u32, Entry<'r>>,
    created: Vec<ObjectKey>,
    warnings: Vec<DecodeWarning>,
    /// Objects and embedded values currently being decoded.
    depth: usize,
}

impl<'r> DecodeState<'r, '_, '_> {
    fn decode(&mut self, target: Option<ObjectKey>) -> Result<Option<ObjectKey>, DecodeError> {
        if self.bytes.is_empty() {
            return Ok(target);
        }

        let root = self.scan(target)?;
        self.fill(root)?;
        let ids: Vec<u32> = self.entries.keys().copied().collect();
        for id in ids {
            self.fill(id)?;
        }

        Ok(self
            .entries
            .get(&root)
            .and_then(|entry| entry.object)
            .map(|(key, _)| key))
    }

    fn warn(&mut self, warning: DecodeWarning) {
        log::warn!("{warning}");
        self.warnings.push(warning);
    }

    // -------------------------------------------------------------------------
    // Pass 1

    /// Creates an instance for every top-level object and returns the root id.
    fn scan(&mut self, target: Option<ObjectKey>) -> Result<u32, DecodeError> {
        let mut reader = ByteReader::new(self.bytes);
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
            if self.entries.contains_key(&meta.id) {
                return Err(DecodeError::CorruptMetadata {
                    offset: start,
                    reason: "object id appears twice",
                });
            }

            let object = match (root, target) {
                (None, Some(key)) => self.target(key, meta)?,
                _ => self.instantiate(meta),
            };
            root.get_or_insert(meta.id);
            self.entries.insert(
                meta.id,
                Entry {
                    object,
                    offset: reader.offset(),
                    state: FillState::Pending,
                },
            );
            skip_object(&mut reader, meta.id)?;
        }

        root.ok_or_else(|| reader.truncated())
    }

    fn instantiate(&mut self, meta: ObjectMeta) -> Option<(ObjectKey, &'r TypeDescriptor)> {
        let registry = self.registry;
        let Some(descriptor) = registry.get(meta.type_uid) else {
            self.warn(DecodeWarning::UnknownType {
                id: meta.id,
                type_uid: meta.type_uid,
            });
            return None;
        };
        let key = self.graph.insert_boxed(descriptor.new_instance());
        self.created.push(key);
        Some((key, descriptor))
    }

    fn target(
        &mut self,
        key: ObjectKey,
        meta: ObjectMeta,
    ) -> Result<Option<(ObjectKey, &'r TypeDescriptor)>, DecodeError> {
        let registry = self.registry;
        let object = self.graph.get(key).ok_or(DecodeError::MissingObject)?;
        if object.type_uid() != meta.type_uid {
            return Err(DecodeError::RootTypeMismatch {
                expected: object.type_uid(),
                found: meta.type_uid,
            });
        }

        match registry.descriptor_of(object) {
            Some(descriptor) => Ok(Some((key, descriptor))),
            None => {
                self.warn(DecodeWarning::UnknownType {
                    id: meta.id,
                    type_uid: meta.type_uid,
                });
                Ok(None)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Pass 2

    fn fill(&mut self, id: u32) -> Result<(), DecodeError> {
        let Some(entry) = self.entries.get_mut(&id) else {
            return Ok(());
        };
        if entry.state != FillState::Pending {
            return Ok(());
        }
        let Some((key, descriptor)) = entry.object else {
            entry.state = FillState::Filled;
            return Ok(());
        };
        entry.state = FillState::InProgress;
        let offset = entry.offset;

        let mut object = self.graph.checkout(key).ok_or(DecodeError::MissingObject)?;
        log::trace!("decoding object {id} `{}`", descriptor.name());
        let registry = self.registry;
        let chain: Vec<&'r TypeDescriptor> = registry.chain(descriptor.uid()).collect();
        let mut reader = ByteReader::at(self.bytes, offset);
        self.depth += 1;
        let result = self.decode_segments(&mut reader, &mut *object, &chain, id, 0);
        self.depth -= 1;
        self.graph.checkin(key, object);

        if let Some(entry) = self.entries.get_mut(&id) {
            entry.state = FillState::Filled;
        }
        result
    }

    /// Decodes every segment of the object `id`, starting after its first
    /// record. Embedded values have id `0` and a `nesting` above `0`.
    fn decode_segments(
        &mut self,
        reader: &mut ByteReader<'_>,
        object: &mut dyn Reflectable,
        chain: &[&'r TypeDescriptor],
        id: u32,
        nesting: usize,
    ) -> Result<(), DecodeError> {
        let mut depth = 0;
        let mut end = self.decode_level(reader, &mut *object, chain, depth, nesting)?;

        while let SegmentEnd::Base(meta) = end {
            if meta.id != id {
                return Err(DecodeError::CorruptMetadata {
                    offset: reader.offset() - OBJECT_META_LEN,
                    reason: "base segment of another object",
                });
            }
            let found = chain
                .iter()
                .skip(depth + 1)
                .position(|descriptor| descriptor.uid() == meta.type_uid);
            end = match found {
                Some(step) => {
                    depth += 1 + step;
                    self.decode_level(reader, &mut *object, chain, depth, nesting)?
                }
                None => {
                    self.warn(DecodeWarning::BaseTypeMismatch {
                        type_name: object.type_name(),
                        found: meta.type_uid,
                    });
                    self.decode_fields(reader, None, nesting)?
                }
            };
        }
        Ok(())
    }

    fn decode_level(
        &mut self,
        reader: &mut ByteReader<'_>,
        object: &mut dyn Reflectable,
        chain: &[&'r TypeDescriptor],
        depth: usize,
        nesting: usize,
    ) -> Result<SegmentEnd, DecodeError> {
        let descriptor = chain[depth];
        let level = level_mut(chain, object, depth)?;

        descriptor.hooks().deserialize_begin(&mut *level);
        let end = self.decode_fields(reader, Some((descriptor, &mut *level)), nesting);
        descriptor.hooks().deserialize_end(level);
        end
    }

    /// Decodes the fields of one segment into `target`, or skips them if
    /// there is no target.
    fn decode_fields(
        &mut self,
        reader: &mut ByteReader<'_>,
        mut target: Option<(&'r TypeDescriptor, &mut dyn Reflectable)>,
        nesting: usize,
    ) -> Result<SegmentEnd, DecodeError> {
        let embedded = nesting > 0;
        loop {
            if reader.is_empty() {
                return if embedded {
                    Err(reader.truncated())
                } else {
                    Ok(SegmentEnd::End)
                };
            }

            let start = reader.offset();
            match reader.read_record()? {
                Record::Object(meta) if meta.is_base => return Ok(SegmentEnd::Base(meta)),
                Record::Object(_) if embedded => {
                    return Err(DecodeError::CorruptMetadata {
                        offset: start,
                        reason: "object record inside an embedded value",
                    });
                }
                Record::Object(_) => {
                    reader.unread_object_meta();
                    return Ok(SegmentEnd::End);
                }
                Record::Field(field) if field.terminator => {
                    if embedded {
                        return Ok(SegmentEnd::End);
                    }
                    return Err(DecodeError::CorruptMetadata {
                        offset: start,
                        reason: "terminator outside an embedded value",
                    });
                }
                Record::Field(field) => match target.as_mut() {
                    Some((descriptor, level)) => {
                        self.decode_field(reader, *descriptor, &mut **level, &field.schema, start, nesting)?;
                    }
                    None => skip_payload(reader, &field.schema, nesting)?,
                },
            }
        }
    }

    fn decode_field(
        &mut self,
        reader: &mut ByteReader<'_>,
        descriptor: &'r TypeDescriptor,
        level: &mut dyn Reflectable,
        stream: &FieldSchema,
        offset: usize,
        nesting: usize,
    ) -> Result<(), DecodeError> {
        let Some(field) = descriptor.field(stream.id) else {
            self.warn(DecodeWarning::UnknownField {
                type_name: descriptor.name(),
                field: stream.id,
            });
            return skip_payload(reader, stream, nesting);
        };
        check_shape(field, stream, offset)?;

        match field.access() {
            FieldAccess::Plain(access) => {
                let slots = slots(reader, field, |len| access.resize(level, len))?;
                for slot in slots {
                    let bytes = plain_bytes(reader, stream)?;
                    access.read(level, slot, bytes)?;
                }
            }
            FieldAccess::Reflectable(access) => {
                let slots = slots(reader, field, |len| access.resize(level, len))?;
                for slot in slots {
                    self.decode_embedded(reader, field, &**access, level, slot, nesting + 1)?;
                }
            }
            FieldAccess::Pointer(access) => {
                let slots = slots(reader, field, |len| access.resize(level, len))?;
                for slot in slots {
                    let id = reader.read_u32()?;
                    let key = self.resolve(field, id)?;
                    access.set(level, slot, key)?;
                }
            }
            FieldAccess::DataBlock(access) => {
                let data = reader.read_prefixed()?;
                access.set(level, data.to_vec())?;
            }
        }
        Ok(())
    }

    fn decode_embedded(
        &mut self,
        reader: &mut ByteReader<'_>,
        field: &FieldDescriptor,
        access: &dyn ReflectableAccess,
        level: &mut dyn Reflectable,
        slot: Slot,
        nesting: usize,
    ) -> Result<(), DecodeError> {
        let start = reader.offset();
        check_nesting(nesting, start)?;
        let meta = reader.read_object_meta()?;
        if meta.is_base || meta.id != 0 {
            return Err(DecodeError::CorruptMetadata {
                offset: start,
                reason: "expected the first segment of an embedded value",
            });
        }

        let expected = access.value_uid();
        if meta.type_uid != expected {
            self.warn(DecodeWarning::EmbeddedTypeMismatch {
                field: field.name(),
                expected,
                found: meta.type_uid,
            });
            return skip_embedded(reader, nesting);
        }

        let registry = self.registry;
        let chain: Vec<&'r TypeDescriptor> = registry.chain(expected).collect();
        if chain.is_empty() {
            self.warn(DecodeWarning::UnknownType {
                id: 0,
                type_uid: expected,
            });
            return skip_embedded(reader, nesting);
        }

        let value = access.get_mut(level, slot)?;
        self.depth += 1;
        let result = self.decode_segments(reader, value, &chain, 0, nesting);
        self.depth -= 1;
        result
    }

    /// Maps a persistent id to the key of its object, filling the object
    /// first unless the field is weak or too many values are already open.
    fn resolve(&mut self, field: &FieldDescriptor, id: u32) -> Result<Option<ObjectKey>, DecodeError> {
        if id == 0 {
            return Ok(None);
        }
        let Some(&Entry { object, state, .. }) = self.entries.get(&id) else {
            self.warn(DecodeWarning::MissingObject { id });
            return Ok(None);
        };
        let Some((key, _)) = object else {
            return Ok(None);
        };

        if !field.is_weak() {
            match state {
                FillState::Pending if self.depth < MAX_FILL_DEPTH => self.fill(id)?,
                FillState::Pending => log::trace!("deferring object {id}"),
                FillState::InProgress => self.warn(DecodeWarning::CircularReference {
                    id,
                    field: field.name(),
                }),
                FillState::Filled => {}
            }
        }
        Ok(Some(key))
    }
}

// -----------------------------------------------------------------------------
// Helpers

/// Reads the length of an array field and resizes it, or yields the single
/// slot of a plain field.
fn slots(
    reader: &mut ByteReader<'_>,
    field: &FieldDescriptor,
    resize: impl FnOnce(usize) -> Result<(), FieldError>,
) -> Result<Slots, DecodeError> {
    if !field.is_array() {
        return Ok(Slots::single());
    }
    let len = reader.read_count(min_element_len(field.schema()))?;
    resize(len)?;
    Ok(Slots::elements(len))
}

#[inline]
fn plain_bytes<'a>(reader: &mut ByteReader<'a>, schema: &FieldSchema) -> Result<&'a [u8], DecodeError> {
    if schema.dynamic {
        reader.read_prefixed()
    } else {
        reader.take(schema.size as usize)
    }
}

fn check_shape(field: &FieldDescriptor, stream: &FieldSchema, offset: usize) -> Result<(), DecodeError> {
    let live = field.schema();
    if live.kind != stream.kind || live.is_array != stream.is_array {
        return Err(DecodeError::FieldKindMismatch {
            field: field.name(),
            expected: shape(live),
            found: shape(stream),
        });
    }
    if live.dynamic != stream.dynamic || live.size != stream.size {
        return Err(DecodeError::CorruptMetadata {
            offset,
            reason: "field size contradicts the registered schema",
        });
    }
    Ok(())
}

fn shape(schema: &FieldSchema) -> &'static str {
    match (schema.kind, schema.is_array) {
        (FieldKind::Plain, false) => "a plain value",
        (FieldKind::Plain, true) => "a plain array",
        (FieldKind::Reflectable, false) => "an embedded value",
        (FieldKind::Reflectable, true) => "an embedded array",
        (FieldKind::ReflectablePointer, false) => "a reference",
        (FieldKind::ReflectablePointer, true) => "a reference array",
        (FieldKind::DataBlock, false) => "a data block",
        (FieldKind::DataBlock, true) => "a data block array",
    }
}

// -----------------------------------------------------------------------------
// Tests
