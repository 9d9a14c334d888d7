use alloc::boxed::Box;
use core::any::{Any, TypeId};

use crate::reflection::TypeUid;
use crate::schema::TypeBuilder;

// -----------------------------------------------------------------------------
// Reflectable

/// The object-safe capability shared by every persistable object.
///
/// A codec only ever sees `dyn Reflectable`: it asks for the [`TypeUid`],
/// looks the matching [`TypeDescriptor`] up in a registry, and goes through the
/// descriptor's field accessors for everything else.
///
/// This trait is implemented automatically for every [`ReflectType`],
/// it should not be implemented by hand.
///
/// [`TypeDescriptor`]: crate::schema::TypeDescriptor
pub trait Reflectable: Any {
    /// Returns the persistent type id of the concrete type.
    fn type_uid(&self) -> TypeUid;

    /// Returns the registered name of the concrete type.
    fn type_name(&self) -> &'static str;

    /// Casts to `&dyn Any`.
    fn as_any(&self) -> &dyn Any;

    /// Casts to `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Casts to `Box<dyn Any>`.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl dyn Reflectable {
    /// Returns `true` if the underlying value is of type `T`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use vc_rtti::{Reflectable, ReflectType, TypeUid, schema::TypeBuilder};
    /// #[derive(Default)]
    /// struct Marker;
    ///
    /// impl ReflectType for Marker {
    ///     const TYPE_UID: TypeUid = TypeUid::new(7);
    ///     const TYPE_NAME: &'static str = "Marker";
    ///     fn describe(_: &mut TypeBuilder<Self>) {}
    /// }
    ///
    /// let value: Box<dyn Reflectable> = Box::new(Marker);
    /// assert!(value.is::<Marker>());
    /// assert!(!value.is::<u32>());
    /// ```
    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.as_any().type_id() == TypeId::of::<T>()
    }

    /// Downcasts the value to type `T` by reference.
    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Downcasts the value to type `T` by mutable reference.
    #[inline]
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    /// Downcasts a boxed value to type `T`, returning the box unchanged on failure.
    pub fn downcast<T: Any>(self: Box<Self>) -> Result<Box<T>, Box<Self>> {
        if self.is::<T>() {
            // The check above guarantees the downcast succeeds.
            match self.into_any().downcast::<T>() {
                Ok(value) => Ok(value),
                Err(_) => unreachable!("type checked before downcast"),
            }
        } else {
            Err(self)
        }
    }
}

impl core::fmt::Debug for dyn Reflectable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Reflectable({} #{})", self.type_name(), self.type_uid())
    }
}

// -----------------------------------------------------------------------------
// ReflectType

/// The static side of a reflectable type.
///
/// Implementing this trait makes a type [`Reflectable`] and registrable in a
/// [`TypeRegistry`](crate::registry::TypeRegistry).
///
/// - `TYPE_UID` must be unique among the registered types and must not change
///   once data has been persisted.
/// - [`Default`] provides the empty instance a decoder populates.
/// - [`describe`](Self::describe) declares the base type, the fields and the
///   lifecycle hooks. It is called once, at registration.
///
/// # Examples
///
/// ```
/// use vc_rtti::{ReflectType, TypeUid};
/// use vc_rtti::schema::TypeBuilder;
///
/// #[derive(Default)]
/// struct Entity {
///     name: String,
/// }
///
/// #[derive(Default)]
/// struct Camera {
///     entity: Entity,
///     fov: f32,
/// }
///
/// impl ReflectType for Entity {
///     const TYPE_UID: TypeUid = TypeUid::new(1);
///     const TYPE_NAME: &'static str = "Entity";
///
///     fn describe(ty: &mut TypeBuilder<Self>) {
///         ty.plain(1, "name", |e| &e.name, |e| &mut e.name);
///     }
/// }
///
/// impl ReflectType for Camera {
///     const TYPE_UID: TypeUid = TypeUid::new(2);
///     const TYPE_NAME: &'static str = "Camera";
///
///     fn describe(ty: &mut TypeBuilder<Self>) {
///         ty.base::<Entity>(|c| &c.entity, |c| &mut c.entity)
///             .plain(1, "fov", |c| &c.fov, |c| &mut c.fov);
///     }
/// }
/// ```
pub trait ReflectType: Any + Default {
    /// The persistent type id.
    const TYPE_UID: TypeUid;

    /// The registered type name.
    const TYPE_NAME: &'static str;

    /// Declares the schema of this type.
    fn describe(ty: &mut TypeBuilder<Self>);
}

impl<T: ReflectType> Reflectable for T {
    #[inline(always)]
    fn type_uid(&self) -> TypeUid {
        T::TYPE_UID
    }

    #[inline(always)]
    fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }

    #[inline(always)]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline(always)]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    #[inline(always)]
    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

// -----------------------------------------------------------------------------
// Tests
