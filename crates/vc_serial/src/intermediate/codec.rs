use alloc::vec::Vec;

use vc_rtti::object::{ObjectGraph, ObjectKey};
use vc_rtti::registry::TypeRegistry;

use crate::binary::{BinaryDecoder, BinaryEncoder, Decoded, EncodeFlags};
use crate::error::{DecodeError, EncodeError};
use crate::intermediate::SerializedGraph;
use crate::intermediate::bridge::{read_tree, tree_bytes};

// -----------------------------------------------------------------------------
// IntermediateEncoder

/// Encodes an object graph into a [`SerializedGraph`].
///
/// The object graph is encoded by a [`BinaryEncoder`] into a temporary
/// buffer, which is then parsed into the tree. Flags, errors and object ids
/// therefore match a binary encode of the same root, at the cost of one
/// extra buffer per call.
///
/// # Examples
///
/// ```
/// use vc_rtti::{ReflectType, TypeUid};
/// use vc_rtti::object::ObjectGraph;
/// use vc_rtti::registry::TypeRegistry;
/// use vc_rtti::schema::TypeBuilder;
/// use vc_serial::intermediate::{IntermediateDecoder, IntermediateEncoder, SerializedInstance};
///
/// #[derive(Default)]
/// struct Counter {
///     hits: u32,
/// }
///
/// impl ReflectType for Counter {
///     const TYPE_UID: TypeUid = TypeUid::new(42);
///     const TYPE_NAME: &'static str = "Counter";
///
///     fn describe(ty: &mut TypeBuilder<Self>) {
///         ty.plain(1, "hits", |c| &c.hits, |c| &mut c.hits);
///     }
/// }
///
/// let mut registry = TypeRegistry::new();
/// registry.register::<Counter>();
///
/// let mut graph = ObjectGraph::new();
/// let root = graph.insert(Counter { hits: 3 });
/// let mut tree = IntermediateEncoder::new(&registry).encode(&mut graph, root).unwrap();
///
/// // Edit the stored value without a live object.
/// let entry = tree.objects.get_mut(&tree.root).unwrap().sub_objects[0]
///     .entry_mut(1)
///     .unwrap();
/// if let SerializedInstance::Field(field) = &mut entry.value {
///     field.0 = 9u32.to_le_bytes().to_vec().into();
/// }
///
/// let decoded = IntermediateDecoder::new(&registry).decode(&mut graph, &tree).unwrap();
/// let copy = graph.get_as::<Counter>(decoded.root.unwrap()).unwrap();
/// assert_eq!(copy.hits, 9);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct IntermediateEncoder<'r> {
    binary: BinaryEncoder<'r>,
}

impl<'r> IntermediateEncoder<'r> {
    #[inline]
    pub const fn new(registry: &'r TypeRegistry) -> Self {
        Self {
            binary: BinaryEncoder::new(registry),
        }
    }

    #[inline]
    pub const fn with_flags(self, flags: EncodeFlags) -> Self {
        Self {
            binary: self.binary.with_flags(flags),
        }
    }

    /// Encodes `root` and every object it reaches.
    pub fn encode(
        &self,
        graph: &mut ObjectGraph,
        root: ObjectKey,
    ) -> Result<SerializedGraph<'static>, EncodeError> {
        let bytes = self.binary.encode_to_vec(graph, root)?;
        let tree = read_tree(&bytes).map_err(EncodeError::Reparse)?;
        Ok(tree.into_owned())
    }
}

// -----------------------------------------------------------------------------
// IntermediateDecoder

/// Decodes a [`SerializedGraph`] into live objects.
///
/// The tree is written into a temporary buffer that a [`BinaryDecoder`]
/// then reads, so warnings, errors and the skipping rules are those of a
/// binary decode, at the cost of one extra buffer per call. A tree without
/// a binary form fails with [`DecodeError::Tree`].
#[derive(Clone, Copy, Debug)]
pub struct IntermediateDecoder<'r> {
    binary: BinaryDecoder<'r>,
}

impl<'r> IntermediateDecoder<'r> {
    #[inline]
    pub const fn new(registry: &'r TypeRegistry) -> Self {
        Self {
            binary: BinaryDecoder::new(registry),
        }
    }

    /// Decodes `tree` into new objects of `graph`.
    pub fn decode(&self, graph: &mut ObjectGraph, tree: &SerializedGraph<'_>) -> Result<Decoded, DecodeError> {
        let mut bytes = Vec::new();
        tree_bytes(tree, &mut bytes)?;
        self.binary.decode(graph, &bytes)
    }

    /// Decodes `tree` onto the existing object `key`.
    ///
    /// See [`BinaryDecoder::decode_into`].
    pub fn decode_into(
        &self,
        graph: &mut ObjectGraph,
        key: ObjectKey,
        tree: &SerializedGraph<'_>,
    ) -> Result<Decoded, DecodeError> {
        let mut bytes = Vec::new();
        tree_bytes(tree, &mut bytes)?;
        self.binary.decode_into(graph, key, &bytes)
    }
}

// -----------------------------------------------------------------------------
// Tests
