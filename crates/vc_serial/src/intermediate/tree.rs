use alloc::borrow::Cow;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use vc_rtti::TypeUid;
use vc_rtti::schema::FieldSchema;

// -----------------------------------------------------------------------------
// SerializedGraph

/// Every object of one stream, keyed by persistent id.
///
/// References between objects are [`SerializedInstance::Reference`] ids into
/// `objects`, so shared and cyclic structure is kept without live pointers.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SerializedGraph<'a> {
    /// The id of the object the stream was encoded from.
    pub root: u32,
    pub objects: BTreeMap<u32, SerializedObject<'a>>,
}

impl<'a> SerializedGraph<'a> {
    /// Creates an empty graph.
    #[inline]
    pub const fn new() -> Self {
        Self {
            root: 0,
            objects: BTreeMap::new(),
        }
    }

    /// Returns `true` if the graph holds no objects.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// The root object, if present.
    #[inline]
    pub fn root_object(&self) -> Option<&SerializedObject<'a>> {
        self.objects.get(&self.root)
    }

    /// The most derived type of the root object.
    #[inline]
    pub fn root_type_uid(&self) -> Option<TypeUid> {
        self.root_object().and_then(SerializedObject::type_uid)
    }

    /// Copies every borrowed byte span, detaching the graph from its input.
    pub fn into_owned(self) -> SerializedGraph<'static> {
        SerializedGraph {
            root: self.root,
            objects: self
                .objects
                .into_iter()
                .map(|(id, object)| (id, object.into_owned()))
                .collect(),
        }
    }
}

// -----------------------------------------------------------------------------
// SerializedObject

/// One object or embedded value: a segment per level of its base chain, most
/// derived first.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SerializedObject<'a> {
    pub sub_objects: Vec<SerializedSubObject<'a>>,
}

impl<'a> SerializedObject<'a> {
    /// The type of the first segment.
    #[inline]
    pub fn type_uid(&self) -> Option<TypeUid> {
        self.sub_objects.first().map(|sub| sub.type_uid)
    }

    /// The segment of type `uid`.
    pub fn sub_object(&self, uid: TypeUid) -> Option<&SerializedSubObject<'a>> {
        self.sub_objects.iter().find(|sub| sub.type_uid == uid)
    }

    pub fn into_owned(self) -> SerializedObject<'static> {
        SerializedObject {
            sub_objects: self
                .sub_objects
                .into_iter()
                .map(SerializedSubObject::into_owned)
                .collect(),
        }
    }
}

/// The fields one level of a base chain wrote, in stream order.
#[derive(Debug, Clone, PartialEq)]
pub struct SerializedSubObject<'a> {
    pub type_uid: TypeUid,
    pub entries: Vec<SerializedEntry<'a>>,
}

impl<'a> SerializedSubObject<'a> {
    #[inline]
    pub const fn new(type_uid: TypeUid) -> Self {
        Self {
            type_uid,
            entries: Vec::new(),
        }
    }

    /// The entry of field `id`.
    pub fn entry(&self, id: u16) -> Option<&SerializedEntry<'a>> {
        self.entries.iter().find(|entry| entry.schema.id == id)
    }

    /// Mutable version of [`entry`](Self::entry).
    pub fn entry_mut(&mut self, id: u16) -> Option<&mut SerializedEntry<'a>> {
        self.entries.iter_mut().find(|entry| entry.schema.id == id)
    }

    pub fn into_owned(self) -> SerializedSubObject<'static> {
        SerializedSubObject {
            type_uid: self.type_uid,
            entries: self
                .entries
                .into_iter()
                .map(SerializedEntry::into_owned)
                .collect(),
        }
    }
}

// -----------------------------------------------------------------------------
// Entries

/// One field: the shape from its field record, and its payload.
#[derive(Debug, Clone, PartialEq)]
pub struct SerializedEntry<'a> {
    pub schema: FieldSchema,
    pub value: SerializedInstance<'a>,
}

impl<'a> SerializedEntry<'a> {
    /// The field id.
    #[inline]
    pub const fn id(&self) -> u16 {
        self.schema.id
    }

    pub fn into_owned(self) -> SerializedEntry<'static> {
        SerializedEntry {
            schema: self.schema,
            value: self.value.into_owned(),
        }
    }
}

/// The payload of an entry or array element.
#[derive(Debug, Clone, PartialEq)]
pub enum SerializedInstance<'a> {
    /// A plain value or data block.
    Field(SerializedField<'a>),
    Array(SerializedArray<'a>),
    /// An embedded value.
    Object(SerializedObject<'a>),
    /// A persistent object id, `0` for null.
    Reference(u32),
}

impl<'a> SerializedInstance<'a> {
    pub fn into_owned(self) -> SerializedInstance<'static> {
        match self {
            Self::Field(field) => SerializedInstance::Field(field.into_owned()),
            Self::Array(array) => SerializedInstance::Array(array.into_owned()),
            Self::Object(object) => SerializedInstance::Object(object.into_owned()),
            Self::Reference(id) => SerializedInstance::Reference(id),
        }
    }
}

/// The encoded bytes of a plain value or data block, without a length prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedField<'a>(pub Cow<'a, [u8]>);

impl<'a> SerializedField<'a> {
    #[inline]
    pub fn borrowed(bytes: &'a [u8]) -> Self {
        Self(Cow::Borrowed(bytes))
    }

    #[inline]
    pub fn owned(bytes: Vec<u8>) -> Self {
        Self(Cow::Owned(bytes))
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    #[inline]
    pub fn into_owned(self) -> SerializedField<'static> {
        SerializedField(Cow::Owned(self.0.into_owned()))
    }
}

/// The elements of an array field by index.
///
/// An array is written with `len` elements and every index below `len` must
/// be present. Elements at or beyond `len` are ignored.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SerializedArray<'a> {
    pub len: u32,
    pub elements: BTreeMap<u32, SerializedInstance<'a>>,
}

impl<'a> SerializedArray<'a> {
    pub fn into_owned(self) -> SerializedArray<'static> {
        SerializedArray {
            len: self.len,
            elements: self
                .elements
                .into_iter()
                .map(|(index, element)| (index, element.into_owned()))
                .collect(),
        }
    }
}

impl<'a> FromIterator<SerializedInstance<'a>> for SerializedArray<'a> {
    fn from_iter<I: IntoIterator<Item = SerializedInstance<'a>>>(iter: I) -> Self {
        let mut array = Self::default();
        for element in iter {
            array.elements.insert(array.len, element);
            array.len += 1;
        }
        array
    }
}

// -----------------------------------------------------------------------------
// Tests
