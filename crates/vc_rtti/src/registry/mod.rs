//! The type registry.
//!
//! A [`TypeRegistry`] maps persistent [`TypeUid`](crate::TypeUid)s to
//! [`TypeDescriptor`](crate::schema::TypeDescriptor)s. Codecs use it to
//! instantiate objects from a stream and to walk the fields of live objects.
//!
//! The registry is built once, before any encode or decode, and is only read
//! afterwards. Build it with explicit [`TypeRegistry::register`] calls:
//!
//! ```
//! # use vc_rtti::{ReflectType, TypeUid};
//! # use vc_rtti::schema::TypeBuilder;
//! use vc_rtti::registry::TypeRegistry;
//!
//! # #[derive(Default)] struct Camera { fov: f32 }
//! # impl ReflectType for Camera {
//! #     const TYPE_UID: TypeUid = TypeUid::new(10);
//! #     const TYPE_NAME: &'static str = "Camera";
//! #     fn describe(ty: &mut TypeBuilder<Self>) {
//! #         ty.plain(1, "fov", |c| &c.fov, |c| &mut c.fov);
//! #     }
//! # }
//! fn register_all_types() -> TypeRegistry {
//!     let mut registry = TypeRegistry::new();
//!     registry.register::<Camera>();
//!     registry
//! }
//!
//! let registry = register_all_types();
//! assert!(registry.contains(TypeUid::new(10)));
//! ```
//!
//! ## auto_register
//!
//! With the `auto_register` feature, types listed in [`auto_register!`](crate::auto_register)
//! are collected at startup through the [`inventory`] crate, see
//! [`TypeRegistry::auto_register`]. Not every platform supports it; explicit
//! registration works everywhere.
//!
//! [`inventory`]: https://docs.rs/inventory

// -----------------------------------------------------------------------------
// Modules

mod auto;
mod error;
mod type_registry;

// -----------------------------------------------------------------------------
// Exports

pub use auto::AutoRegistration;
pub use error::RegistryError;
pub use type_registry::{Chain, TypeRegistry};
