use alloc::boxed::Box;
use alloc::string::ToString;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::fmt;
use core::marker::PhantomData;

use crate::hash::HashMap;
use crate::reflection::{ReflectType, Reflectable, TypeUid};
use crate::schema::access::{owner_mut, owner_ref};
use crate::schema::{FieldDescriptor, FieldError, SchemaError};

// -----------------------------------------------------------------------------
// BaseLink

pub(crate) trait BaseProjection: Send + Sync {
    fn project<'a>(&self, owner: &'a dyn Reflectable) -> Result<&'a dyn Reflectable, FieldError>;

    fn project_mut<'a>(
        &self,
        owner: &'a mut dyn Reflectable,
    ) -> Result<&'a mut dyn Reflectable, FieldError>;
}

pub(crate) struct BaseProjectionFn<T, B, G, M> {
    pub get: G,
    pub get_mut: M,
    pub _marker: PhantomData<fn() -> (T, B)>,
}

impl<T, B, G, M> BaseProjection for BaseProjectionFn<T, B, G, M>
where
    T: ReflectType,
    B: ReflectType,
    G: Fn(&T) -> &B + Send + Sync + 'static,
    M: Fn(&mut T) -> &mut B + Send + Sync + 'static,
{
    fn project<'a>(&self, owner: &'a dyn Reflectable) -> Result<&'a dyn Reflectable, FieldError> {
        Ok((self.get)(owner_ref::<T>(B::TYPE_NAME, owner)?))
    }

    fn project_mut<'a>(
        &self,
        owner: &'a mut dyn Reflectable,
    ) -> Result<&'a mut dyn Reflectable, FieldError> {
        Ok((self.get_mut)(owner_mut::<T>(B::TYPE_NAME, owner)?))
    }
}

/// The link from a type to its base type.
///
/// Base types are embedded by composition: a derived value owns its base
/// value, and the link knows how to reach it.
pub struct BaseLink {
    uid: TypeUid,
    name: &'static str,
    projection: Box<dyn BaseProjection>,
}

impl BaseLink {
    pub(crate) fn new(uid: TypeUid, name: &'static str, projection: Box<dyn BaseProjection>) -> Self {
        Self {
            uid,
            name,
            projection,
        }
    }

    /// Returns the base type id.
    #[inline]
    pub const fn uid(&self) -> TypeUid {
        self.uid
    }

    /// Returns the base type name.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Borrows the base part of a derived value.
    #[inline]
    pub fn project<'a>(&self, owner: &'a dyn Reflectable) -> Result<&'a dyn Reflectable, FieldError> {
        self.projection.project(owner)
    }

    /// Borrows the base part of a derived value mutably.
    #[inline]
    pub fn project_mut<'a>(
        &self,
        owner: &'a mut dyn Reflectable,
    ) -> Result<&'a mut dyn Reflectable, FieldError> {
        self.projection.project_mut(owner)
    }
}

impl fmt::Debug for BaseLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseLink")
            .field("uid", &self.uid)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// LifecycleHooks

pub(crate) type Hook = Box<dyn Fn(&mut dyn Reflectable) + Send + Sync>;

/// Callbacks run around the (de)serialization of one type level.
///
/// Hooks of a type run for the part of an object that this type declares,
/// never for its base or derived parts. Types use them to stage derived
/// data, such as flattening a map into a list before encoding and
/// rebuilding it after decoding.
#[derive(Default)]
pub struct LifecycleHooks {
    pub(crate) serialize_begin: Option<Hook>,
    pub(crate) serialize_end: Option<Hook>,
    pub(crate) deserialize_begin: Option<Hook>,
    pub(crate) deserialize_end: Option<Hook>,
}

impl LifecycleHooks {
    /// Runs the `on_serialize_begin` hook, if any.
    #[inline]
    pub fn serialize_begin(&self, object: &mut dyn Reflectable) {
        run(&self.serialize_begin, object);
    }

    /// Runs the `on_serialize_end` hook, if any.
    #[inline]
    pub fn serialize_end(&self, object: &mut dyn Reflectable) {
        run(&self.serialize_end, object);
    }

    /// Runs the `on_deserialize_begin` hook, if any.
    #[inline]
    pub fn deserialize_begin(&self, object: &mut dyn Reflectable) {
        run(&self.deserialize_begin, object);
    }

    /// Runs the `on_deserialize_end` hook, if any.
    #[inline]
    pub fn deserialize_end(&self, object: &mut dyn Reflectable) {
        run(&self.deserialize_end, object);
    }

    /// Returns `true` if no hook is set.
    pub fn is_empty(&self) -> bool {
        self.serialize_begin.is_none()
            && self.serialize_end.is_none()
            && self.deserialize_begin.is_none()
            && self.deserialize_end.is_none()
    }
}

#[inline]
fn run(hook: &Option<Hook>, object: &mut dyn Reflectable) {
    if let Some(hook) = hook {
        hook(object);
    }
}

// -----------------------------------------------------------------------------
// TypeDescriptor

/// The schema of one reflectable type.
///
/// Built once by [`TypeRegistry::register`](crate::registry::TypeRegistry::register)
/// from [`ReflectType::describe`] and immutable afterwards, apart from the
/// list of derived types that the registry fills in.
///
/// Only the fields declared by the type itself are listed; the fields of
/// its base are found by following [`base`](Self::base). A codec persists
/// each level as its own segment.
pub struct TypeDescriptor {
    uid: TypeUid,
    name: &'static str,
    type_id: TypeId,
    base: Option<BaseLink>,
    derived: Vec<TypeUid>,
    fields: Vec<FieldDescriptor>,
    field_ids: HashMap<u16, usize>,
    factory: fn() -> Box<dyn Reflectable>,
    hooks: LifecycleHooks,
}

fn new_boxed<T: ReflectType>() -> Box<dyn Reflectable> {
    Box::new(T::default())
}

impl TypeDescriptor {
    pub(crate) fn new<T: ReflectType>(
        base: Option<BaseLink>,
        fields: Vec<FieldDescriptor>,
        hooks: LifecycleHooks,
    ) -> Self {
        let field_ids = fields
            .iter()
            .enumerate()
            .map(|(index, field)| (field.id(), index))
            .collect();
        Self {
            uid: T::TYPE_UID,
            name: T::TYPE_NAME,
            type_id: TypeId::of::<T>(),
            base,
            derived: Vec::new(),
            fields,
            field_ids,
            factory: new_boxed::<T>,
            hooks,
        }
    }

    /// Returns the persistent type id.
    #[inline]
    pub const fn uid(&self) -> TypeUid {
        self.uid
    }

    /// Returns the type name.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the Rust [`TypeId`] of the described type.
    #[inline]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns `true` if this descriptor describes `T`.
    #[inline]
    pub fn type_is<T: Any>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Returns the link to the base type, `None` at the root of a chain.
    #[inline]
    pub const fn base(&self) -> Option<&BaseLink> {
        self.base.as_ref()
    }

    /// Returns the base type id, `None` at the root of a chain.
    #[inline]
    pub fn base_uid(&self) -> Option<TypeUid> {
        self.base.as_ref().map(BaseLink::uid)
    }

    /// Borrows the base part of `object`, `None` at the root of a chain.
    pub fn project_base<'a>(
        &self,
        object: &'a dyn Reflectable,
    ) -> Result<Option<&'a dyn Reflectable>, FieldError> {
        match &self.base {
            Some(base) => base.project(object).map(Some),
            None => Ok(None),
        }
    }

    /// Borrows the base part of `object` mutably, `None` at the root of a chain.
    pub fn project_base_mut<'a>(
        &self,
        object: &'a mut dyn Reflectable,
    ) -> Result<Option<&'a mut dyn Reflectable>, FieldError> {
        match &self.base {
            Some(base) => base.project_mut(object).map(Some),
            None => Ok(None),
        }
    }

    /// Returns the ids of the registered types directly derived from this one.
    #[inline]
    pub fn derived(&self) -> &[TypeUid] {
        &self.derived
    }

    pub(crate) fn add_derived(&mut self, uid: TypeUid) {
        if !self.derived.contains(&uid) {
            self.derived.push(uid);
        }
    }

    /// Returns the fields declared by this type, in declaration order.
    #[inline]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Finds a field declared by this type by id.
    #[inline]
    pub fn field(&self, id: u16) -> Option<&FieldDescriptor> {
        self.field_ids.get(&id).map(|&index| &self.fields[index])
    }

    /// Finds a field declared by this type by name.
    ///
    /// This is meant for tools and debugging; codecs always look fields up by id.
    pub fn field_named(&self, name: &str) -> Result<&FieldDescriptor, SchemaError> {
        self.fields
            .iter()
            .find(|field| field.name() == name)
            .ok_or_else(|| SchemaError::UnknownField {
                type_name: self.name,
                field: name.to_string(),
            })
    }

    /// Creates a default instance of the described type.
    #[inline]
    pub fn new_instance(&self) -> Box<dyn Reflectable> {
        (self.factory)()
    }

    /// Returns the lifecycle hooks.
    #[inline]
    pub const fn hooks(&self) -> &LifecycleHooks {
        &self.hooks
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("uid", &self.uid)
            .field("name", &self.name)
            .field("base", &self.base_uid())
            .field("derived", &self.derived)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}
