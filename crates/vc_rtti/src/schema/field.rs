use core::fmt;

use crate::schema::{DataBlockAccess, FieldAccess, FieldError, FieldFlags, FieldKind, FieldSchema};
use crate::schema::{PlainAccess, PointerAccess, ReflectableAccess};

// -----------------------------------------------------------------------------
// FieldDescriptor

/// A persistable field of a reflectable type.
///
/// Holds the field's name, its persisted [`FieldSchema`], its [`FieldFlags`]
/// and a type-erased accessor bound to the declaring type.
///
/// # Examples
///
/// ```
/// use vc_rtti::{ReflectType, TypeUid};
/// use vc_rtti::registry::TypeRegistry;
/// use vc_rtti::schema::{FieldKind, Slot, TypeBuilder};
///
/// #[derive(Default)]
/// struct Score {
///     points: Vec<u32>,
/// }
///
/// impl ReflectType for Score {
///     const TYPE_UID: TypeUid = TypeUid::new(5);
///     const TYPE_NAME: &'static str = "Score";
///
///     fn describe(ty: &mut TypeBuilder<Self>) {
///         ty.plain_array(1, "points", |s| &s.points, |s| &mut s.points);
///     }
/// }
///
/// let mut registry = TypeRegistry::new();
/// registry.register::<Score>();
///
/// let field = registry.get_of::<Score>().unwrap().field(1).unwrap();
/// assert_eq!(field.kind(), FieldKind::Plain);
/// assert!(field.is_array());
///
/// let score = Score { points: vec![3, 4] };
/// let plain = field.as_plain().unwrap();
/// assert_eq!(plain.len(&score).unwrap(), 2);
///
/// let mut bytes = Vec::new();
/// plain.write(&score, Slot::Element(1), &mut bytes).unwrap();
/// assert_eq!(bytes, 4u32.to_le_bytes());
///
/// // Array fields have no single value.
/// assert!(plain.write(&score, Slot::Single, &mut bytes).is_err());
/// ```
pub struct FieldDescriptor {
    name: &'static str,
    schema: FieldSchema,
    flags: FieldFlags,
    access: FieldAccess,
}

impl FieldDescriptor {
    /// Creates a descriptor. The accessor variant must agree with `schema.kind`.
    pub(crate) fn new(
        name: &'static str,
        schema: FieldSchema,
        flags: FieldFlags,
        access: FieldAccess,
    ) -> Self {
        Self {
            name,
            schema,
            flags,
            access,
        }
    }

    /// Returns the field name.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the field id.
    #[inline]
    pub const fn id(&self) -> u16 {
        self.schema.id
    }

    /// Returns the field kind.
    #[inline]
    pub const fn kind(&self) -> FieldKind {
        self.schema.kind
    }

    /// Returns `true` if the field holds a sequence of values.
    #[inline]
    pub const fn is_array(&self) -> bool {
        self.schema.is_array
    }

    /// Returns the persisted shape of the field.
    #[inline]
    pub const fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// Returns the field flags.
    #[inline]
    pub const fn flags(&self) -> FieldFlags {
        self.flags
    }

    /// Returns `true` for a reference field flagged [`FieldFlags::WEAK_REF`].
    #[inline]
    pub fn is_weak(&self) -> bool {
        self.flags.contains(FieldFlags::WEAK_REF)
    }

    /// Returns the accessor.
    #[inline]
    pub const fn access(&self) -> &FieldAccess {
        &self.access
    }

    /// Returns the plain accessor.
    pub fn as_plain(&self) -> Result<&dyn PlainAccess, FieldError> {
        match &self.access {
            FieldAccess::Plain(access) => Ok(&**access),
            _ => Err(self.wrong_kind(FieldKind::Plain)),
        }
    }

    /// Returns the embedded reflectable accessor.
    pub fn as_reflectable(&self) -> Result<&dyn ReflectableAccess, FieldError> {
        match &self.access {
            FieldAccess::Reflectable(access) => Ok(&**access),
            _ => Err(self.wrong_kind(FieldKind::Reflectable)),
        }
    }

    /// Returns the reference accessor.
    pub fn as_pointer(&self) -> Result<&dyn PointerAccess, FieldError> {
        match &self.access {
            FieldAccess::Pointer(access) => Ok(&**access),
            _ => Err(self.wrong_kind(FieldKind::ReflectablePointer)),
        }
    }

    /// Returns the data block accessor.
    pub fn as_data_block(&self) -> Result<&dyn DataBlockAccess, FieldError> {
        match &self.access {
            FieldAccess::DataBlock(access) => Ok(&**access),
            _ => Err(self.wrong_kind(FieldKind::DataBlock)),
        }
    }

    fn wrong_kind(&self, requested: FieldKind) -> FieldError {
        FieldError::KindMismatch {
            field: self.name,
            actual: self.schema.kind.as_str(),
            requested: requested.as_str(),
        }
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}
