use alloc::collections::VecDeque;
use alloc::vec::Vec;

use bitflags::bitflags;
use vc_rtti::Reflectable;
use vc_rtti::hash::HashMap;
use vc_rtti::object::{ObjectGraph, ObjectKey};
use vc_rtti::registry::TypeRegistry;
use vc_rtti::schema::{FieldAccess, FieldDescriptor, FieldError, PlainAccess, ReflectableAccess};
use vc_rtti::schema::{Slot, TypeDescriptor};

use crate::binary::meta::{FieldMeta, MAX_OBJECT_ID, ObjectMeta};
use crate::binary::{ByteSink, Slots, level_mut};
use crate::error::EncodeError;

// -----------------------------------------------------------------------------
// EncodeFlags

bitflags! {
    /// Options of a [`BinaryEncoder`].
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct EncodeFlags: u8 {
        /// Write every reference as null and encode only the root object.
        const SHALLOW = 1 << 0;
    }
}

// -----------------------------------------------------------------------------
// BinaryEncoder

/// Writes an object and everything it references to a binary stream.
///
/// Objects receive persistent ids in the order they are first met, starting
/// at `1` for the root. Every object is written exactly once, after the root,
/// in ascending id order, so references to the same object share an id.
///
/// # Examples
///
/// ```
/// use vc_rtti::{ReflectType, TypeUid};
/// use vc_rtti::object::{ObjectGraph, ObjectKey};
/// use vc_rtti::registry::TypeRegistry;
/// use vc_rtti::schema::{FieldFlags, TypeBuilder};
/// use vc_serial::binary::{BinaryDecoder, BinaryEncoder};
///
/// #[derive(Default)]
/// struct Link {
///     value: u32,
///     next: Option<ObjectKey>,
/// }
///
/// impl ReflectType for Link {
///     const TYPE_UID: TypeUid = TypeUid::new(7);
///     const TYPE_NAME: &'static str = "Link";
///
///     fn describe(ty: &mut TypeBuilder<Self>) {
///         ty.plain(1, "value", |l| &l.value, |l| &mut l.value)
///             .pointer(2, "next", FieldFlags::empty(), |l| &l.next, |l| &mut l.next);
///     }
/// }
///
/// let mut registry = TypeRegistry::new();
/// registry.register::<Link>();
///
/// let mut graph = ObjectGraph::new();
/// let tail = graph.insert(Link { value: 2, next: None });
/// let head = graph.insert(Link { value: 1, next: Some(tail) });
///
/// let mut bytes = Vec::new();
/// let written = BinaryEncoder::new(&registry).encode(&mut graph, head, &mut bytes).unwrap();
/// assert_eq!(written, 2);
///
/// let mut copy = ObjectGraph::new();
/// let decoded = BinaryDecoder::new(&registry).decode(&mut copy, &bytes).unwrap();
/// let head = copy.get_as::<Link>(decoded.root.unwrap()).unwrap();
/// assert_eq!(head.value, 1);
/// assert_eq!(copy.get_as::<Link>(head.next.unwrap()).unwrap().value, 2);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct BinaryEncoder<'r> {
    registry: &'r TypeRegistry,
    flags: EncodeFlags,
}

impl<'r> BinaryEncoder<'r> {
    /// Creates an encoder for the types of `registry`.
    #[inline]
    pub const fn new(registry: &'r TypeRegistry) -> Self {
        Self {
            registry,
            flags: EncodeFlags::empty(),
        }
    }

    #[inline]
    pub const fn with_flags(mut self, flags: EncodeFlags) -> Self {
        self.flags = flags;
        self
    }

    #[inline]
    pub const fn flags(&self) -> EncodeFlags {
        self.flags
    }

    /// Encodes `root` and the objects it references into `sink`.
    ///
    /// The graph is borrowed mutably because serialize hooks may stage data
    /// on the objects. Returns the number of objects written.
    ///
    /// On error the output already written to `sink` is incomplete and must
    /// be discarded.
    pub fn encode<S: ByteSink + ?Sized>(
        &self,
        graph: &mut ObjectGraph,
        root: ObjectKey,
        sink: &mut S,
    ) -> Result<u32, EncodeError> {
        if graph.get(root).is_none() {
            return Err(EncodeError::MissingObject);
        }

        let mut state = EncodeState {
            registry: self.registry,
            shallow: self.flags.contains(EncodeFlags::SHALLOW),
            graph,
            ids: HashMap::default(),
            queue: VecDeque::new(),
            next_id: 1,
            scratch: Vec::new(),
        };
        state.assign(root)?;
        while let Some((id, key)) = state.queue.pop_front() {
            state.write_object(id, key, sink)?;
        }

        let written = state.next_id - 1;
        log::debug!("encoded {written} objects");
        Ok(written)
    }

    /// Encodes into a new `Vec`.
    pub fn encode_to_vec(
        &self,
        graph: &mut ObjectGraph,
        root: ObjectKey,
    ) -> Result<Vec<u8>, EncodeError> {
        let mut bytes = Vec::new();
        self.encode(graph, root, &mut bytes)?;
        Ok(bytes)
    }
}

// -----------------------------------------------------------------------------
// EncodeState

struct EncodeState<'r, 'g> {
    registry: &'r TypeRegistry,
    shallow: bool,
    graph: &'g mut ObjectGraph,
    ids: HashMap<ObjectKey, u32>,
    queue: VecDeque<(u32, ObjectKey)>,
    next_id: u32,
    scratch: Vec<u8>,
}

impl<'r> EncodeState<'r, '_> {
    fn assign(&mut self, key: ObjectKey) -> Result<u32, EncodeError> {
        if self.next_id > MAX_OBJECT_ID {
            return Err(EncodeError::TooManyObjects);
        }
        let id = self.next_id;
        self.next_id += 1;
        self.ids.insert(key, id);
        self.queue.push_back((id, key));
        Ok(id)
    }

    fn write_object<S: ByteSink + ?Sized>(
        &mut self,
        id: u32,
        key: ObjectKey,
        sink: &mut S,
    ) -> Result<(), EncodeError> {
        let mut object = self.graph.checkout(key).ok_or(EncodeError::MissingObject)?;
        log::trace!("encoding object {id} `{}`", object.type_name());
        let result = self.write_value(id, &mut *object, sink);
        self.graph.checkin(key, object);
        result
    }

    /// Writes every segment of `object`, most-derived first.
    fn write_value<S: ByteSink + ?Sized>(
        &mut self,
        id: u32,
        object: &mut dyn Reflectable,
        sink: &mut S,
    ) -> Result<(), EncodeError> {
        let registry = self.registry;
        let descriptor =
            registry
                .descriptor_of(object)
                .ok_or_else(|| EncodeError::UnregisteredType {
                    type_name: object.type_name(),
                    uid: object.type_uid(),
                })?;
        let chain: Vec<&'r TypeDescriptor> = registry.chain(descriptor.uid()).collect();

        for (depth, &descriptor) in chain.iter().enumerate() {
            let level = level_mut(&chain, &mut *object, depth)?;
            let meta = ObjectMeta {
                id,
                type_uid: descriptor.uid(),
                is_base: depth > 0,
            };

            descriptor.hooks().serialize_begin(&mut *level);
            let result = sink
                .write_bytes(&meta.encode())
                .and_then(|()| self.write_fields(descriptor, &mut *level, sink));
            descriptor.hooks().serialize_end(level);
            result?;
        }
        Ok(())
    }

    fn write_fields<S: ByteSink + ?Sized>(
        &mut self,
        descriptor: &'r TypeDescriptor,
        level: &mut dyn Reflectable,
        sink: &mut S,
    ) -> Result<(), EncodeError> {
        for field in descriptor.fields() {
            sink.write_u32(FieldMeta::encode(field.schema()))?;
            match field.access() {
                FieldAccess::Plain(access) => {
                    for slot in self.slots(field, sink, access.len(level))? {
                        self.write_plain(field, &**access, level, slot, sink)?;
                    }
                }
                FieldAccess::Reflectable(access) => {
                    for slot in self.slots(field, sink, access.len(level))? {
                        self.write_embedded(&**access, level, slot, sink)?;
                    }
                }
                FieldAccess::Pointer(access) => {
                    for slot in self.slots(field, sink, access.len(level))? {
                        let key = access.get(level, slot)?;
                        let id = self.reference(field, key)?;
                        sink.write_u32(id)?;
                    }
                }
                FieldAccess::DataBlock(access) => {
                    let data = access.get(level)?;
                    sink.write_u32(length(field, data.len())?)?;
                    sink.write_bytes(data)?;
                }
            }
        }
        Ok(())
    }

    /// Writes the element count of an array field and returns the slots to
    /// write. `len` is only consulted for arrays.
    fn slots<S: ByteSink + ?Sized>(
        &self,
        field: &FieldDescriptor,
        sink: &mut S,
        len: Result<usize, FieldError>,
    ) -> Result<Slots, EncodeError> {
        if !field.is_array() {
            return Ok(Slots::single());
        }
        let len = len?;
        sink.write_u32(length(field, len)?)?;
        Ok(Slots::elements(len))
    }

    fn write_plain<S: ByteSink + ?Sized>(
        &mut self,
        field: &FieldDescriptor,
        access: &dyn PlainAccess,
        level: &dyn Reflectable,
        slot: Slot,
        sink: &mut S,
    ) -> Result<(), EncodeError> {
        self.scratch.clear();
        access.write(level, slot, &mut self.scratch)?;
        let found = length(field, self.scratch.len())?;

        let schema = field.schema();
        let expected = if schema.dynamic {
            access.encoded_len(level, slot)?
        } else {
            schema.size as u32
        };
        if found != expected {
            return Err(EncodeError::SizeMismatch {
                field: schema.id,
                expected,
                found,
            });
        }

        if schema.dynamic {
            sink.write_u32(found)?;
        }
        sink.write_bytes(&self.scratch)
    }

    fn write_embedded<S: ByteSink + ?Sized>(
        &mut self,
        access: &dyn ReflectableAccess,
        level: &mut dyn Reflectable,
        slot: Slot,
        sink: &mut S,
    ) -> Result<(), EncodeError> {
        let value = access.get_mut(level, slot)?;
        self.write_value(0, value, sink)?;
        sink.write_u32(FieldMeta::TERMINATOR)
    }

    fn reference(
        &mut self,
        field: &FieldDescriptor,
        key: Option<ObjectKey>,
    ) -> Result<u32, EncodeError> {
        let Some(key) = key.filter(|_| !self.shallow) else {
            return Ok(0);
        };
        if let Some(&id) = self.ids.get(&key) {
            return Ok(id);
        }
        if !self.graph.contains(key) {
            log::warn!(
                "field `{}` refers to an object that is not in the graph, writing null",
                field.name()
            );
            return Ok(0);
        }
        self.assign(key)
    }
}

fn length(field: &FieldDescriptor, len: usize) -> Result<u32, EncodeError> {
    u32::try_from(len).map_err(|_| EncodeError::LengthOverflow { field: field.id() })
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;

    use vc_rtti::object::ObjectGraph;
    use vc_rtti::registry::TypeRegistry;

    use super::{BinaryEncoder, EncodeFlags};
    use crate::binary::{BufferWriter, DEFAULT_CAPACITY};
    use crate::error::EncodeError;
    use crate::fixtures::{Asset, Entity, Ghost, Holder, Liar, Light, Squeezed, Transform, Vec3};
    use crate::fixtures::{node, registry};

    #[test]
    fn plain_fields_layout() {
        let registry = registry();
        let mut graph = ObjectGraph::new();
        let root = graph.insert(Transform {
            position: Vec3::new(1.0, 2.0, 3.0),
            scale: 0.5,
        });

        let bytes = BinaryEncoder::new(&registry)
            .encode_to_vec(&mut graph, root)
            .unwrap();

        let mut expected = Vec::new();
        expected.extend_from_slice(&(1u32 << 2 | 1).to_le_bytes());
        expected.extend_from_slice(&Transform::UID.to_le_bytes());
        expected.extend_from_slice(&0x0001_0C00u32.to_le_bytes());
        for value in [1.0f32, 2.0, 3.0] {
            expected.extend_from_slice(&value.to_le_bytes());
        }
        expected.extend_from_slice(&0x0002_0400u32.to_le_bytes());
        expected.extend_from_slice(&0.5f32.to_le_bytes());
        assert_eq!(bytes, expected);
    }

    #[test]
    fn base_segments_follow_the_derived_one() {
        let registry = registry();
        let mut graph = ObjectGraph::new();
        let root = graph.insert(Light::named("lamp", 2.0));

        let bytes = BinaryEncoder::new(&registry)
            .encode_to_vec(&mut graph, root)
            .unwrap();

        // The Light segment holds one f32, then the Entity base segment
        // follows with the same id.
        assert_eq!(&bytes[..4], &5u32.to_le_bytes());
        assert_eq!(&bytes[4..8], &Light::UID.to_le_bytes());
        assert_eq!(&bytes[16..20], &(1u32 << 2 | 0b11).to_le_bytes());
        assert_eq!(&bytes[20..24], &Entity::UID.to_le_bytes());
    }

    #[test]
    fn shared_targets_are_written_once() {
        let registry = registry();
        let mut graph = ObjectGraph::new();
        let shared = graph.insert(node(3, vec![]));
        let left = graph.insert(node(2, vec![shared]));
        let root = graph.insert(node(1, vec![left, shared, left]));

        let mut bytes = Vec::new();
        let written = BinaryEncoder::new(&registry)
            .encode(&mut graph, root, &mut bytes)
            .unwrap();
        assert_eq!(written, 3);

        // Objects are written in id order: root, left, shared.
        let starts: Vec<u32> = bytes
            .chunks(4)
            .map(|word| u32::from_le_bytes([word[0], word[1], word[2], word[3]]))
            .filter(|&word| word == (1 << 2 | 1) || word == (2 << 2 | 1) || word == (3 << 2 | 1))
            .collect();
        assert_eq!(starts, [1 << 2 | 1, 2 << 2 | 1, 3 << 2 | 1]);
    }

    #[test]
    fn shallow_writes_null_references() {
        let registry = registry();
        let mut graph = ObjectGraph::new();
        let child = graph.insert(node(2, vec![]));
        let root = graph.insert(node(1, vec![child]));

        let encoder = BinaryEncoder::new(&registry).with_flags(EncodeFlags::SHALLOW);
        let mut bytes = Vec::new();
        assert_eq!(encoder.encode(&mut graph, root, &mut bytes), Ok(1));

        // children come last: count 1, then the null id.
        assert_eq!(&bytes[bytes.len() - 8..], &[1, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn dangling_references_become_null() {
        let registry = registry();
        let mut graph = ObjectGraph::new();
        let gone = graph.insert(node(2, vec![]));
        let root = graph.insert(node(1, vec![gone]));
        graph.remove(gone);

        let mut bytes = Vec::new();
        assert_eq!(
            BinaryEncoder::new(&registry).encode(&mut graph, root, &mut bytes),
            Ok(1)
        );
        assert_eq!(&bytes[bytes.len() - 4..], &[0, 0, 0, 0]);
    }

    #[test]
    fn streaming_matches_single_buffer() {
        let registry = registry();
        let mut graph = ObjectGraph::new();
        let asset = graph.insert(Asset {
            name: String::from("blob"),
            payload: (0..=255).collect(),
        });
        let light = graph.insert(Light::named("sun", 7.5));
        let root = graph.insert(Holder {
            target: Some(asset),
            others: vec![light, asset],
        });

        let encoder = BinaryEncoder::new(&registry);
        let whole = encoder.encode_to_vec(&mut graph, root).unwrap();

        let mut streamed = Vec::new();
        let mut buffer = [0u8; 8];
        let mut writer = BufferWriter::new(&mut buffer, |filled, len| {
            streamed.extend_from_slice(&filled[..len]);
            Some(filled)
        });
        encoder.encode(&mut graph, root, &mut writer).unwrap();
        assert_eq!(writer.finish(), whole.len());

        assert_eq!(streamed, whole);
        assert!(whole.len() < DEFAULT_CAPACITY);
    }

    #[test]
    fn exhausted_output_aborts() {
        let registry = registry();
        let mut graph = ObjectGraph::new();
        let root = graph.insert(Light::named("lamp", 1.0));

        let mut buffer = [0u8; 8];
        let mut flushes = 0;
        let mut writer = BufferWriter::new(&mut buffer, |filled, _| {
            flushes += 1;
            (flushes < 2).then_some(filled)
        });
        assert_eq!(
            BinaryEncoder::new(&registry).encode(&mut graph, root, &mut writer),
            Err(EncodeError::OutputExhausted)
        );
        drop(writer);

        // The object is back in the graph after the failed call.
        assert!(graph.get_as::<Light>(root).is_some());
    }

    #[test]
    fn unregistered_and_missing_objects() {
        let registry = registry();
        let mut graph = ObjectGraph::new();
        let ghost = graph.insert(Ghost::default());
        assert!(matches!(
            BinaryEncoder::new(&registry).encode_to_vec(&mut graph, ghost),
            Err(EncodeError::UnregisteredType { type_name: "Ghost", .. })
        ));
        assert!(graph.get(ghost).is_some());

        graph.remove(ghost);
        assert_eq!(
            BinaryEncoder::new(&registry).encode_to_vec(&mut graph, ghost),
            Err(EncodeError::MissingObject)
        );

        let empty = TypeRegistry::new();
        let root = graph.insert(node(1, vec![]));
        assert!(matches!(
            BinaryEncoder::new(&empty).encode_to_vec(&mut graph, root),
            Err(EncodeError::UnregisteredType { type_name: "Node", .. })
        ));
    }

    #[test]
    fn plain_codecs_must_honor_their_size() {
        let registry = registry();
        let mut graph = ObjectGraph::new();

        let root = graph.insert(Liar::default());
        assert_eq!(
            BinaryEncoder::new(&registry).encode_to_vec(&mut graph, root),
            Err(EncodeError::SizeMismatch {
                field: 1,
                expected: 6,
                found: 5,
            })
        );

        let root = graph.insert(Squeezed::default());
        assert_eq!(
            BinaryEncoder::new(&registry).encode_to_vec(&mut graph, root),
            Err(EncodeError::SizeMismatch {
                field: 1,
                expected: 4,
                found: 2,
            })
        );
    }
}
