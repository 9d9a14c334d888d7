//! Field and type schemas.
//!
//! ## Menu
//!
//! - [`FieldKind`], [`FieldSchema`], [`FieldFlags`]: the persisted shape of a field.
//! - [`FieldDescriptor`]: a field with its type-erased accessor ([`FieldAccess`]).
//! - [`TypeDescriptor`]: the fields, base link and hooks of one type.
//! - [`TypeBuilder`]: collects a [`TypeDescriptor`] inside
//!   [`ReflectType::describe`](crate::ReflectType::describe).

// -----------------------------------------------------------------------------
// Modules

mod access;
mod accessors;
mod builder;
mod descriptor;
mod error;
mod field;
mod kind;

// -----------------------------------------------------------------------------
// Exports

pub use access::{DataBlockAccess, FieldAccess, PlainAccess, PointerAccess, ReflectableAccess};
pub use builder::TypeBuilder;
pub use descriptor::{BaseLink, LifecycleHooks, TypeDescriptor};
pub use error::{FieldError, SchemaError};
pub use field::FieldDescriptor;
pub use kind::{FieldFlags, FieldKind, FieldSchema, Slot};

pub(crate) use builder::RegisterFn;
