use crate::registry::{RegistryError, TypeRegistry};

// -----------------------------------------------------------------------------
// AutoRegistration

/// A registration submitted by [`auto_register!`](crate::auto_register).
///
/// Not meant to be built by hand.
#[cfg_attr(not(feature = "auto_register"), allow(dead_code))]
pub struct AutoRegistration {
    register: fn(&mut TypeRegistry) -> Result<(), RegistryError>,
    is_marker: bool,
}

impl AutoRegistration {
    #[doc(hidden)]
    pub const fn new(register: fn(&mut TypeRegistry) -> Result<(), RegistryError>) -> Self {
        Self {
            register,
            is_marker: false,
        }
    }

    /// The entry this crate submits itself, seen only where collection works.
    #[cfg(feature = "auto_register")]
    const fn marker() -> Self {
        Self {
            register: noop,
            is_marker: true,
        }
    }
}

#[cfg(feature = "auto_register")]
fn noop(_: &mut TypeRegistry) -> Result<(), RegistryError> {
    Ok(())
}

#[cfg(feature = "auto_register")]
inventory::collect!(AutoRegistration);

#[cfg(feature = "auto_register")]
inventory::submit! {
    AutoRegistration::marker()
}

/// Runs every submitted registration.
///
/// Returns `false` if the marker entry was not collected, meaning the
/// platform does not support static collection.
#[cfg(feature = "auto_register")]
pub(crate) fn register_submitted(registry: &mut TypeRegistry) -> Result<bool, RegistryError> {
    let mut supported = false;
    let mut count = 0usize;
    for entry in inventory::iter::<AutoRegistration> {
        if entry.is_marker {
            supported = true;
            continue;
        }
        (entry.register)(registry)?;
        count += 1;
    }
    log::debug!("auto-registered {count} types");
    Ok(supported)
}

// -----------------------------------------------------------------------------
// Macro

/// Submits types for [`TypeRegistry::auto_register`].
///
/// Expands to nothing without the `auto_register` feature.
///
/// # Examples
///
/// ```
/// use vc_rtti::{ReflectType, TypeUid};
/// use vc_rtti::registry::TypeRegistry;
/// use vc_rtti::schema::TypeBuilder;
///
/// #[derive(Default)]
/// struct Marker {
///     tag: u8,
/// }
///
/// impl ReflectType for Marker {
///     const TYPE_UID: TypeUid = TypeUid::new(77);
///     const TYPE_NAME: &'static str = "Marker";
///
///     fn describe(ty: &mut TypeBuilder<Self>) {
///         ty.plain(1, "tag", |m| &m.tag, |m| &mut m.tag);
///     }
/// }
///
/// vc_rtti::auto_register!(Marker);
///
/// fn main() {
///     let mut registry = TypeRegistry::new();
///     if registry.auto_register().unwrap() {
///         assert!(registry.contains(TypeUid::new(77)));
///     }
/// }
/// ```
#[cfg(feature = "auto_register")]
#[macro_export]
macro_rules! auto_register {
    ($($ty:ty),+ $(,)?) => {
        $(
            $crate::__macro_exports::inventory::submit! {
                $crate::registry::AutoRegistration::new(
                    $crate::registry::TypeRegistry::try_register::<$ty>
                )
            }
        )+
    };
}

/// Submits types for [`TypeRegistry::auto_register`].
///
/// Expands to nothing without the `auto_register` feature.
#[cfg(not(feature = "auto_register"))]
#[macro_export]
macro_rules! auto_register {
    ($($ty:ty),+ $(,)?) => {};
}
