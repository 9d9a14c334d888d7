use alloc::boxed::Box;
use alloc::vec::Vec;
use core::marker::PhantomData;

use crate::hash::HashSet;
use crate::object::PointerSlot;
use crate::plain::PlainType;
use crate::reflection::{ReflectType, Reflectable};
use crate::registry::{RegistryError, TypeRegistry};
use crate::schema::accessors::{DataBlockField, PlainArrayField, PlainField, PlainProperty};
use crate::schema::accessors::{PointerArrayField, PointerField};
use crate::schema::accessors::{ReflectableArrayField, ReflectableField};
use crate::schema::descriptor::{BaseProjectionFn, Hook};
use crate::schema::{BaseLink, FieldAccess, FieldDescriptor, FieldFlags, FieldKind, FieldSchema};
use crate::schema::{LifecycleHooks, TypeDescriptor};

pub(crate) type RegisterFn = fn(&mut TypeRegistry) -> Result<(), RegistryError>;

// -----------------------------------------------------------------------------
// TypeBuilder

/// Collects the schema of `T` inside [`ReflectType::describe`].
///
/// Every field method takes the field id, the field name and a pair of
/// closures reaching the value from the owner, and returns the builder for
/// chaining. Array variants reach a `Vec` of values.
///
/// Field ids must be unique within `T` and must keep their meaning across
/// versions of the type; names are only used for lookups by tools.
///
/// # Examples
///
/// ```
/// use vc_rtti::{ReflectType, TypeUid};
/// use vc_rtti::object::ObjectKey;
/// use vc_rtti::schema::{FieldFlags, TypeBuilder};
///
/// #[derive(Default)]
/// struct Mesh {
///     name: String,
///     lods: Vec<f32>,
///     material: Option<ObjectKey>,
///     owner: Option<ObjectKey>,
///     vertices: Vec<u8>,
/// }
///
/// impl ReflectType for Mesh {
///     const TYPE_UID: TypeUid = TypeUid::new(300);
///     const TYPE_NAME: &'static str = "Mesh";
///
///     fn describe(ty: &mut TypeBuilder<Self>) {
///         ty.plain(1, "name", |m| &m.name, |m| &mut m.name)
///             .plain_array(2, "lods", |m| &m.lods, |m| &mut m.lods)
///             .pointer(3, "material", FieldFlags::empty(), |m| &m.material, |m| &mut m.material)
///             .pointer(4, "owner", FieldFlags::WEAK_REF, |m| &m.owner, |m| &mut m.owner)
///             .data_block(5, "vertices", |m| m.vertices.as_slice(), |m, data| m.vertices = data);
///     }
/// }
/// ```
pub struct TypeBuilder<T: ReflectType> {
    base: Option<BaseLink>,
    base_declarations: usize,
    fields: Vec<FieldDescriptor>,
    hooks: LifecycleHooks,
    dependencies: Vec<RegisterFn>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: ReflectType> TypeBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            base: None,
            base_declarations: 0,
            fields: Vec::new(),
            hooks: LifecycleHooks::default(),
            dependencies: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Declares the base type of `T`, reached through a projection pair.
    ///
    /// The base type is registered along with `T`. A type has at most one base.
    pub fn base<B: ReflectType>(
        &mut self,
        get: impl Fn(&T) -> &B + Send + Sync + 'static,
        get_mut: impl Fn(&mut T) -> &mut B + Send + Sync + 'static,
    ) -> &mut Self {
        let projection = BaseProjectionFn {
            get,
            get_mut,
            _marker: PhantomData,
        };
        self.base = Some(BaseLink::new(B::TYPE_UID, B::TYPE_NAME, Box::new(projection)));
        self.base_declarations += 1;
        self.dependencies.push(TypeRegistry::try_register::<B>);
        self
    }

    // -------------------------------------------------------------------------
    // Plain

    /// Declares a plain field.
    pub fn plain<V: PlainType>(
        &mut self,
        id: u16,
        name: &'static str,
        get: impl Fn(&T) -> &V + Send + Sync + 'static,
        get_mut: impl Fn(&mut T) -> &mut V + Send + Sync + 'static,
    ) -> &mut Self {
        let access = PlainField {
            name,
            get,
            get_mut,
            _marker: PhantomData,
        };
        self.push(
            name,
            plain_schema::<V>(id, false),
            FieldFlags::empty(),
            FieldAccess::Plain(Box::new(access)),
        )
    }

    /// Declares a plain field computed by a getter and applied by a setter.
    pub fn plain_with<V: PlainType>(
        &mut self,
        id: u16,
        name: &'static str,
        getter: impl Fn(&T) -> V + Send + Sync + 'static,
        setter: impl Fn(&mut T, V) + Send + Sync + 'static,
    ) -> &mut Self {
        let access = PlainProperty {
            name,
            getter,
            setter,
            _marker: PhantomData,
        };
        self.push(
            name,
            plain_schema::<V>(id, false),
            FieldFlags::empty(),
            FieldAccess::Plain(Box::new(access)),
        )
    }

    /// Declares a plain array field.
    pub fn plain_array<V: PlainType + Default>(
        &mut self,
        id: u16,
        name: &'static str,
        get: impl Fn(&T) -> &Vec<V> + Send + Sync + 'static,
        get_mut: impl Fn(&mut T) -> &mut Vec<V> + Send + Sync + 'static,
    ) -> &mut Self {
        let access = PlainArrayField {
            name,
            get,
            get_mut,
            _marker: PhantomData,
        };
        self.push(
            name,
            plain_schema::<V>(id, true),
            FieldFlags::empty(),
            FieldAccess::Plain(Box::new(access)),
        )
    }

    // -------------------------------------------------------------------------
    // Reflectable

    /// Declares an embedded reflectable field.
    ///
    /// The value is owned by `T` and persisted inline. `V` is registered along with `T`.
    pub fn reflectable<V: ReflectType>(
        &mut self,
        id: u16,
        name: &'static str,
        get: impl Fn(&T) -> &V + Send + Sync + 'static,
        get_mut: impl Fn(&mut T) -> &mut V + Send + Sync + 'static,
    ) -> &mut Self {
        let access = ReflectableField {
            name,
            get,
            get_mut,
            _marker: PhantomData,
        };
        self.dependencies.push(TypeRegistry::register_dependency::<V>);
        self.push(
            name,
            other_schema(id, FieldKind::Reflectable, false),
            FieldFlags::empty(),
            FieldAccess::Reflectable(Box::new(access)),
        )
    }

    /// Declares an embedded reflectable array field.
    pub fn reflectable_array<V: ReflectType>(
        &mut self,
        id: u16,
        name: &'static str,
        get: impl Fn(&T) -> &Vec<V> + Send + Sync + 'static,
        get_mut: impl Fn(&mut T) -> &mut Vec<V> + Send + Sync + 'static,
    ) -> &mut Self {
        let access = ReflectableArrayField {
            name,
            get,
            get_mut,
            _marker: PhantomData,
        };
        self.dependencies.push(TypeRegistry::register_dependency::<V>);
        self.push(
            name,
            other_schema(id, FieldKind::Reflectable, true),
            FieldFlags::empty(),
            FieldAccess::Reflectable(Box::new(access)),
        )
    }

    // -------------------------------------------------------------------------
    // Pointer

    /// Declares a reference field.
    pub fn pointer<P: PointerSlot>(
        &mut self,
        id: u16,
        name: &'static str,
        flags: FieldFlags,
        get: impl Fn(&T) -> &P + Send + Sync + 'static,
        get_mut: impl Fn(&mut T) -> &mut P + Send + Sync + 'static,
    ) -> &mut Self {
        let access = PointerField {
            name,
            get,
            get_mut,
            _marker: PhantomData,
        };
        self.push(
            name,
            other_schema(id, FieldKind::ReflectablePointer, false),
            flags,
            FieldAccess::Pointer(Box::new(access)),
        )
    }

    /// Declares a reference array field.
    pub fn pointer_array<P: PointerSlot>(
        &mut self,
        id: u16,
        name: &'static str,
        flags: FieldFlags,
        get: impl Fn(&T) -> &Vec<P> + Send + Sync + 'static,
        get_mut: impl Fn(&mut T) -> &mut Vec<P> + Send + Sync + 'static,
    ) -> &mut Self {
        let access = PointerArrayField {
            name,
            get,
            get_mut,
            _marker: PhantomData,
        };
        self.push(
            name,
            other_schema(id, FieldKind::ReflectablePointer, true),
            flags,
            FieldAccess::Pointer(Box::new(access)),
        )
    }

    // -------------------------------------------------------------------------
    // DataBlock

    /// Declares a data block field.
    pub fn data_block(
        &mut self,
        id: u16,
        name: &'static str,
        getter: impl Fn(&T) -> &[u8] + Send + Sync + 'static,
        setter: impl Fn(&mut T, Vec<u8>) + Send + Sync + 'static,
    ) -> &mut Self {
        let access = DataBlockField {
            name,
            getter,
            setter,
            _marker: PhantomData,
        };
        self.push(
            name,
            other_schema(id, FieldKind::DataBlock, false),
            FieldFlags::empty(),
            FieldAccess::DataBlock(Box::new(access)),
        )
    }

    // -------------------------------------------------------------------------
    // Hooks

    /// Sets the hook run before the fields of `T` are encoded.
    pub fn on_serialize_begin(&mut self, hook: impl Fn(&mut T) + Send + Sync + 'static) -> &mut Self {
        self.hooks.serialize_begin = Some(erase_hook(hook));
        self
    }

    /// Sets the hook run after the fields of `T` are encoded.
    pub fn on_serialize_end(&mut self, hook: impl Fn(&mut T) + Send + Sync + 'static) -> &mut Self {
        self.hooks.serialize_end = Some(erase_hook(hook));
        self
    }

    /// Sets the hook run before the fields of `T` are decoded.
    pub fn on_deserialize_begin(
        &mut self,
        hook: impl Fn(&mut T) + Send + Sync + 'static,
    ) -> &mut Self {
        self.hooks.deserialize_begin = Some(erase_hook(hook));
        self
    }

    /// Sets the hook run after the fields of `T` are decoded.
    pub fn on_deserialize_end(&mut self, hook: impl Fn(&mut T) + Send + Sync + 'static) -> &mut Self {
        self.hooks.deserialize_end = Some(erase_hook(hook));
        self
    }

    // -------------------------------------------------------------------------
    // Build

    fn push(
        &mut self,
        name: &'static str,
        schema: FieldSchema,
        flags: FieldFlags,
        access: FieldAccess,
    ) -> &mut Self {
        self.fields.push(FieldDescriptor::new(name, schema, flags, access));
        self
    }

    /// The registrations `T` depends on: its base and embedded value types.
    pub(crate) fn dependencies(&self) -> &[RegisterFn] {
        &self.dependencies
    }

    /// Validates the collected schema and turns it into a descriptor.
    pub(crate) fn build(self) -> Result<TypeDescriptor, RegistryError> {
        if self.base_declarations > 1 {
            return Err(RegistryError::MultipleBases {
                type_name: T::TYPE_NAME,
            });
        }

        let mut ids = HashSet::default();
        let mut names = HashSet::default();
        for field in &self.fields {
            if !ids.insert(field.id()) {
                return Err(RegistryError::DuplicateFieldId {
                    type_name: T::TYPE_NAME,
                    id: field.id(),
                });
            }
            if !names.insert(field.name()) {
                return Err(RegistryError::DuplicateFieldName {
                    type_name: T::TYPE_NAME,
                    name: field.name(),
                });
            }
        }

        Ok(TypeDescriptor::new::<T>(self.base, self.fields, self.hooks))
    }
}

fn plain_schema<V: PlainType>(id: u16, is_array: bool) -> FieldSchema {
    FieldSchema {
        id,
        kind: FieldKind::Plain,
        is_array,
        size: V::SIZE.static_size(),
        dynamic: V::SIZE.is_dynamic(),
    }
}

fn other_schema(id: u16, kind: FieldKind, is_array: bool) -> FieldSchema {
    FieldSchema {
        id,
        kind,
        is_array,
        size: 0,
        dynamic: false,
    }
}

fn erase_hook<T: ReflectType>(hook: impl Fn(&mut T) + Send + Sync + 'static) -> Hook {
    Box::new(move |object: &mut dyn Reflectable| {
        if let Some(object) = object.as_any_mut().downcast_mut::<T>() {
            hook(object);
        }
    })
}
