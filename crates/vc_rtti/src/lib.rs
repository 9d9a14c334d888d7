//! Runtime type information for schema-driven object graph persistence.
//!
//! Types opt in by implementing [`ReflectType`]: a numeric [`TypeUid`], a name,
//! and a [`describe`](ReflectType::describe) function that declares the
//! persistable fields through a [`TypeBuilder`](schema::TypeBuilder).
//! A [`TypeRegistry`](registry::TypeRegistry) turns those declarations into
//! [`TypeDescriptor`](schema::TypeDescriptor)s that a codec can walk without
//! knowing any concrete type.
//!
//! Objects that are shared between fields live in an
//! [`ObjectGraph`](object::ObjectGraph) and are referred to by
//! [`ObjectKey`](object::ObjectKey) handles rather than addresses.
//!
//! ## Menu
//!
//! - [`reflection`]: [`Reflectable`], [`ReflectType`] and [`TypeUid`].
//! - [`schema`]: field descriptors, type descriptors and the type builder.
//! - [`registry`]: the type registry and static registration.
//! - [`plain`]: byte codecs for plain (copied-by-value) field types.
//! - [`object`]: the object arena and pointer slots.
//! - [`hash`]: fixed-seed hash containers.
//!
//! # Example
//!
//! ```
//! use vc_rtti::{ReflectType, TypeUid};
//! use vc_rtti::registry::TypeRegistry;
//! use vc_rtti::schema::TypeBuilder;
//!
//! #[derive(Default)]
//! struct Settings {
//!     volume: f32,
//!     title: String,
//! }
//!
//! impl ReflectType for Settings {
//!     const TYPE_UID: TypeUid = TypeUid::new(1000);
//!     const TYPE_NAME: &'static str = "Settings";
//!
//!     fn describe(ty: &mut TypeBuilder<Self>) {
//!         ty.plain(1, "volume", |s| &s.volume, |s| &mut s.volume)
//!             .plain(2, "title", |s| &s.title, |s| &mut s.title);
//!     }
//! }
//!
//! let mut registry = TypeRegistry::new();
//! registry.register::<Settings>();
//!
//! let descriptor = registry.get(TypeUid::new(1000)).unwrap();
//! assert_eq!(descriptor.name(), "Settings");
//! assert_eq!(descriptor.fields().len(), 2);
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// no_std support

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

pub mod hash;
pub mod object;
pub mod plain;
pub mod reflection;
pub mod registry;
pub mod schema;

// -----------------------------------------------------------------------------
// Top-Level exports

#[doc(hidden)]
pub mod __macro_exports;

pub use reflection::{ReflectType, Reflectable, TypeUid};
