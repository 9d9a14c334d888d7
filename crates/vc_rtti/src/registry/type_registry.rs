use alloc::boxed::Box;
use core::any::TypeId;

use crate::hash::{HashMap, HashSet};
use crate::reflection::{ReflectType, Reflectable, TypeUid};
use crate::registry::RegistryError;
use crate::schema::{TypeBuilder, TypeDescriptor};

// -----------------------------------------------------------------------------
// TypeRegistry

/// A registry of [reflectable] types, keyed by persistent [`TypeUid`].
///
/// Registering a type runs its [`ReflectType::describe`] once and stores the
/// resulting [`TypeDescriptor`]. Base types and the value types of embedded
/// fields are registered first, so a registry never holds a descriptor
/// whose dependencies are missing.
///
/// # Example
///
/// ```
/// use vc_rtti::{ReflectType, TypeUid};
/// use vc_rtti::registry::TypeRegistry;
/// use vc_rtti::schema::TypeBuilder;
///
/// #[derive(Default)]
/// struct Shape {
///     layer: u8,
/// }
///
/// #[derive(Default)]
/// struct Circle {
///     shape: Shape,
///     radius: f32,
/// }
///
/// impl ReflectType for Shape {
///     const TYPE_UID: TypeUid = TypeUid::new(1);
///     const TYPE_NAME: &'static str = "Shape";
///
///     fn describe(ty: &mut TypeBuilder<Self>) {
///         ty.plain(1, "layer", |s| &s.layer, |s| &mut s.layer);
///     }
/// }
///
/// impl ReflectType for Circle {
///     const TYPE_UID: TypeUid = TypeUid::new(2);
///     const TYPE_NAME: &'static str = "Circle";
///
///     fn describe(ty: &mut TypeBuilder<Self>) {
///         ty.base::<Shape>(|c| &c.shape, |c| &mut c.shape)
///             .plain(1, "radius", |c| &c.radius, |c| &mut c.radius);
///     }
/// }
///
/// let mut registry = TypeRegistry::new();
/// registry.register::<Circle>();
///
/// // The base type came along.
/// assert!(registry.contains(TypeUid::new(1)));
/// assert!(registry.is_derived_from(TypeUid::new(2), TypeUid::new(1)));
///
/// let names: Vec<_> = registry.chain(TypeUid::new(2)).map(|d| d.name()).collect();
/// assert_eq!(names, ["Circle", "Shape"]);
///
/// let object = registry.new_instance(TypeUid::new(2)).unwrap();
/// assert!(object.is::<Circle>());
/// ```
///
/// [reflectable]: crate::Reflectable
#[derive(Default)]
pub struct TypeRegistry {
    types: HashMap<TypeUid, TypeDescriptor>,
    rust_ids: HashMap<TypeId, TypeUid>,
    names: HashMap<&'static str, TypeUid>,
    pending: HashSet<TypeId>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every type submitted through
    /// [`auto_register!`](crate::auto_register).
    ///
    /// On platforms without static collection the registry is empty.
    pub fn with_auto_registered() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        registry.auto_register()?;
        Ok(registry)
    }

    /// Registers `T` and its dependencies.
    ///
    /// Registering the same type again does nothing.
    ///
    /// # Panics
    ///
    /// Panics if [`try_register`](Self::try_register) fails. Registration
    /// runs at startup, where a conflicting schema is a programming error.
    #[track_caller]
    pub fn register<T: ReflectType>(&mut self) {
        if let Err(error) = self.try_register::<T>() {
            panic!("failed to register `{}`: {error}", T::TYPE_NAME);
        }
    }

    /// Registers `T` and its dependencies.
    ///
    /// Registering the same type again does nothing. On error, dependencies
    /// registered before the failure stay registered.
    pub fn try_register<T: ReflectType>(&mut self) -> Result<(), RegistryError> {
        let type_id = TypeId::of::<T>();
        if self.rust_ids.contains_key(&type_id) {
            return Ok(());
        }
        if self.pending.contains(&type_id) {
            return Err(RegistryError::InheritanceCycle {
                type_name: T::TYPE_NAME,
            });
        }
        self.check_uid::<T>()?;

        self.pending.insert(type_id);
        let result = self.register_new::<T>();
        self.pending.remove(&type_id);
        result
    }

    /// Registers the value type of an embedded field.
    ///
    /// A type may embed values of a type that is still being registered,
    /// such as a `Vec` of itself.
    pub(crate) fn register_dependency<V: ReflectType>(&mut self) -> Result<(), RegistryError> {
        if self.pending.contains(&TypeId::of::<V>()) {
            return Ok(());
        }
        self.try_register::<V>()
    }

    fn check_uid<T: ReflectType>(&self) -> Result<(), RegistryError> {
        match self.types.get(&T::TYPE_UID) {
            Some(existing) => Err(RegistryError::DuplicateTypeUid {
                uid: T::TYPE_UID,
                existing: existing.name(),
                new: T::TYPE_NAME,
            }),
            None => Ok(()),
        }
    }

    fn register_new<T: ReflectType>(&mut self) -> Result<(), RegistryError> {
        let mut builder = TypeBuilder::<T>::new();
        T::describe(&mut builder);

        for register in builder.dependencies() {
            register(self)?;
        }
        // A dependency may have claimed the id in the meantime.
        self.check_uid::<T>()?;

        let descriptor = builder.build()?;
        let uid = descriptor.uid();
        if let Some(base) = descriptor.base_uid()
            && let Some(base) = self.types.get_mut(&base)
        {
            base.add_derived(uid);
        }

        log::trace!("registered `{}` as type {uid}", T::TYPE_NAME);
        self.rust_ids.insert(TypeId::of::<T>(), uid);
        self.names.entry(T::TYPE_NAME).or_insert(uid);
        self.types.insert(uid, descriptor);
        Ok(())
    }

    /// Registers every type submitted through [`auto_register!`](crate::auto_register).
    ///
    /// Repeated calls are cheap and register nothing twice.
    ///
    /// ## Return Value
    ///
    /// Returns `Ok(true)` if static collection works on the current platform,
    /// `Ok(false)` otherwise or when the `auto_register` feature is disabled.
    ///
    /// ## Platform Support
    ///
    /// Supported platforms include Linux, macOS, Windows, iOS, Android and Web,
    /// enabled by the `inventory` crate.
    #[cfg_attr(not(feature = "auto_register"), inline(always))]
    pub fn auto_register(&mut self) -> Result<bool, RegistryError> {
        #[cfg(feature = "auto_register")]
        {
            crate::registry::auto::register_submitted(self)
        }
        #[cfg(not(feature = "auto_register"))]
        {
            Ok(false)
        }
    }

    // -------------------------------------------------------------------------
    // Queries

    /// Returns the descriptor of a type id.
    #[inline]
    pub fn get(&self, uid: TypeUid) -> Option<&TypeDescriptor> {
        self.types.get(&uid)
    }

    /// Returns the descriptor of a type name.
    ///
    /// If two types share a name, the first registered wins.
    pub fn get_named(&self, name: &str) -> Option<&TypeDescriptor> {
        self.names.get(name).and_then(|uid| self.types.get(uid))
    }

    /// Returns the descriptor of `T`, if registered.
    pub fn get_of<T: ReflectType>(&self) -> Option<&TypeDescriptor> {
        self.rust_ids
            .get(&TypeId::of::<T>())
            .and_then(|uid| self.types.get(uid))
    }

    /// Returns `true` if a type with this id is registered.
    #[inline]
    pub fn contains(&self, uid: TypeUid) -> bool {
        self.types.contains_key(&uid)
    }

    /// Returns the descriptor of a live value's most-derived type.
    pub fn descriptor_of(&self, object: &dyn Reflectable) -> Option<&TypeDescriptor> {
        self.types
            .get(&object.type_uid())
            .filter(|descriptor| descriptor.type_id() == object.as_any().type_id())
    }

    /// Creates an empty instance of the type with this id.
    pub fn new_instance(&self, uid: TypeUid) -> Option<Box<dyn Reflectable>> {
        self.types.get(&uid).map(TypeDescriptor::new_instance)
    }

    /// Iterates the base chain of a type, from the type itself to its root.
    ///
    /// The iterator is empty for an unregistered id.
    pub fn chain(&self, uid: TypeUid) -> Chain<'_> {
        Chain {
            registry: self,
            next: Some(uid),
        }
    }

    /// Returns `true` if `base` is `uid` or one of its base types.
    pub fn is_derived_from(&self, uid: TypeUid, base: TypeUid) -> bool {
        self.chain(uid).any(|descriptor| descriptor.uid() == base)
    }

    /// Iterates all registered descriptors, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.values()
    }

    /// Returns the number of registered types.
    #[inline]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no type is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl core::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.names.keys()).finish()
    }
}

// -----------------------------------------------------------------------------
// Chain

/// An iterator over the base chain of a type, see [`TypeRegistry::chain`].
#[derive(Clone)]
pub struct Chain<'a> {
    registry: &'a TypeRegistry,
    next: Option<TypeUid>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a TypeDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        let descriptor = self.registry.get(self.next?)?;
        self.next = descriptor.base_uid();
        Some(descriptor)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec::Vec;

    use crate::object::ObjectKey;
    use crate::registry::{RegistryError, TypeRegistry};
    use crate::schema::{FieldFlags, FieldKind, TypeBuilder};
    use crate::{ReflectType, Reflectable, TypeUid};

    #[derive(Default)]
    struct Entity {
        name: String,
        parent: Option<ObjectKey>,
    }

    impl ReflectType for Entity {
        const TYPE_UID: TypeUid = TypeUid::new(10);
        const TYPE_NAME: &'static str = "Entity";

        fn describe(ty: &mut TypeBuilder<Self>) {
            ty.plain(1, "name", |e| &e.name, |e| &mut e.name).pointer(
                2,
                "parent",
                FieldFlags::WEAK_REF,
                |e| &e.parent,
                |e| &mut e.parent,
            );
        }
    }

    #[derive(Default)]
    struct Pose {
        angle: f32,
    }

    impl ReflectType for Pose {
        const TYPE_UID: TypeUid = TypeUid::new(11);
        const TYPE_NAME: &'static str = "Pose";

        fn describe(ty: &mut TypeBuilder<Self>) {
            ty.plain(1, "angle", |p| &p.angle, |p| &mut p.angle);
        }
    }

    #[derive(Default)]
    struct Actor {
        entity: Entity,
        pose: Pose,
    }

    impl ReflectType for Actor {
        const TYPE_UID: TypeUid = TypeUid::new(12);
        const TYPE_NAME: &'static str = "Actor";

        fn describe(ty: &mut TypeBuilder<Self>) {
            ty.base::<Entity>(|a| &a.entity, |a| &mut a.entity)
                .reflectable(1, "pose", |a| &a.pose, |a| &mut a.pose);
        }
    }

    #[derive(Default)]
    struct Player {
        actor: Actor,
        score: u32,
    }

    impl ReflectType for Player {
        const TYPE_UID: TypeUid = TypeUid::new(13);
        const TYPE_NAME: &'static str = "Player";

        fn describe(ty: &mut TypeBuilder<Self>) {
            ty.base::<Actor>(|p| &p.actor, |p| &mut p.actor)
                .plain(1, "score", |p| &p.score, |p| &mut p.score);
        }
    }

    #[derive(Default)]
    struct Tree {
        children: Vec<Tree>,
    }

    impl ReflectType for Tree {
        const TYPE_UID: TypeUid = TypeUid::new(20);
        const TYPE_NAME: &'static str = "Tree";

        fn describe(ty: &mut TypeBuilder<Self>) {
            ty.reflectable_array(1, "children", |t| &t.children, |t| &mut t.children);
        }
    }

    #[derive(Default)]
    struct Ouroboros;

    impl ReflectType for Ouroboros {
        const TYPE_UID: TypeUid = TypeUid::new(30);
        const TYPE_NAME: &'static str = "Ouroboros";

        fn describe(ty: &mut TypeBuilder<Self>) {
            ty.base::<Ouroboros>(|o| o, |o| o);
        }
    }

    #[derive(Default)]
    struct Impostor;

    impl ReflectType for Impostor {
        const TYPE_UID: TypeUid = TypeUid::new(10);
        const TYPE_NAME: &'static str = "Impostor";

        fn describe(_: &mut TypeBuilder<Self>) {}
    }

    #[derive(Default)]
    struct Twice {
        a: u8,
        b: u8,
    }

    impl ReflectType for Twice {
        const TYPE_UID: TypeUid = TypeUid::new(40);
        const TYPE_NAME: &'static str = "Twice";

        fn describe(ty: &mut TypeBuilder<Self>) {
            ty.plain(1, "a", |t| &t.a, |t| &mut t.a)
                .plain(1, "b", |t| &t.b, |t| &mut t.b);
        }
    }

    #[derive(Default)]
    struct SameName {
        a: u8,
        b: u8,
    }

    impl ReflectType for SameName {
        const TYPE_UID: TypeUid = TypeUid::new(41);
        const TYPE_NAME: &'static str = "SameName";

        fn describe(ty: &mut TypeBuilder<Self>) {
            ty.plain(1, "a", |t| &t.a, |t| &mut t.a)
                .plain(2, "a", |t| &t.b, |t| &mut t.b);
        }
    }

    #[test]
    fn registers_dependencies_first() {
        let mut registry = TypeRegistry::new();
        registry.register::<Player>();

        assert_eq!(registry.len(), 4);
        assert!(registry.get_of::<Entity>().is_some());
        assert!(registry.get_of::<Pose>().is_some());
        assert_eq!(registry.get_named("Actor").unwrap().uid(), TypeUid::new(12));

        let entity = registry.get(TypeUid::new(10)).unwrap();
        assert_eq!(entity.derived(), [TypeUid::new(12)]);
        let actor = registry.get(TypeUid::new(12)).unwrap();
        assert_eq!(actor.derived(), [TypeUid::new(13)]);
        assert_eq!(actor.field(1).unwrap().kind(), FieldKind::Reflectable);
    }

    #[test]
    fn registration_is_idempotent() {
        let mut registry = TypeRegistry::new();
        registry.register::<Actor>();
        registry.register::<Actor>();
        registry.register::<Player>();

        assert_eq!(registry.len(), 4);
        let actor = registry.get_of::<Actor>().unwrap();
        assert_eq!(actor.derived().len(), 1);
    }

    #[test]
    fn chain_walks_to_root() {
        let mut registry = TypeRegistry::new();
        registry.register::<Player>();

        let uids: Vec<_> = registry.chain(TypeUid::new(13)).map(|d| d.uid().get()).collect();
        assert_eq!(uids, [13, 12, 10]);

        assert!(registry.is_derived_from(TypeUid::new(13), TypeUid::new(10)));
        assert!(registry.is_derived_from(TypeUid::new(13), TypeUid::new(13)));
        assert!(!registry.is_derived_from(TypeUid::new(10), TypeUid::new(13)));
        assert_eq!(registry.chain(TypeUid::new(99)).count(), 0);
    }

    #[test]
    fn projects_base_values() {
        let mut registry = TypeRegistry::new();
        registry.register::<Player>();

        let mut player = Player::default();
        player.actor.entity.name = "hero".into();

        let descriptor = registry.get_of::<Player>().unwrap();
        let actor = descriptor.project_base(&player).unwrap().unwrap();
        assert!(actor.is::<Actor>());

        let actor_descriptor = registry.descriptor_of(actor).unwrap();
        let entity = actor_descriptor.project_base_mut(&mut player.actor).unwrap().unwrap();
        entity.downcast_mut::<Entity>().unwrap().name.push('!');
        assert_eq!(player.actor.entity.name, "hero!");

        let root = registry.get_of::<Entity>().unwrap();
        assert!(root.project_base(&player.actor.entity).unwrap().is_none());
    }

    #[test]
    fn instantiates_from_uid() {
        let mut registry = TypeRegistry::new();
        registry.register::<Player>();

        let object = registry.new_instance(TypeUid::new(12)).unwrap();
        assert_eq!(object.type_name(), "Actor");
        assert!(registry.new_instance(TypeUid::new(99)).is_none());
    }

    #[test]
    fn allows_self_embedding() {
        let mut registry = TypeRegistry::new();
        registry.register::<Tree>();
        assert!(registry.contains(TypeUid::new(20)));
    }

    #[test]
    fn rejects_conflicts() {
        let mut registry = TypeRegistry::new();
        assert_eq!(
            registry.try_register::<Ouroboros>(),
            Err(RegistryError::InheritanceCycle {
                type_name: "Ouroboros"
            })
        );
        assert!(registry.is_empty());

        registry.register::<Entity>();
        assert_eq!(
            registry.try_register::<Impostor>(),
            Err(RegistryError::DuplicateTypeUid {
                uid: TypeUid::new(10),
                existing: "Entity",
                new: "Impostor",
            })
        );
        assert_eq!(
            registry.try_register::<Twice>(),
            Err(RegistryError::DuplicateFieldId {
                type_name: "Twice",
                id: 1
            })
        );
        assert_eq!(
            registry.try_register::<SameName>(),
            Err(RegistryError::DuplicateFieldName {
                type_name: "SameName",
                name: "a"
            })
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    #[should_panic(expected = "failed to register `Ouroboros`")]
    fn register_panics_on_conflict() {
        TypeRegistry::new().register::<Ouroboros>();
    }

    #[test]
    fn descriptor_of_live_value() {
        let mut registry = TypeRegistry::new();
        registry.register::<Entity>();

        let entity: &dyn Reflectable = &Entity::default();
        assert_eq!(registry.descriptor_of(entity).unwrap().name(), "Entity");
        assert!(registry.descriptor_of(&Pose::default()).is_none());
    }
}
