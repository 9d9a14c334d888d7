//! The reflectable capability.
//!
//! - [`TypeUid`]: the persistent numeric id of a reflectable type.
//! - [`Reflectable`]: the object-safe capability every persistable object exposes.
//! - [`ReflectType`]: the static side, implemented by hand for each type.

// -----------------------------------------------------------------------------
// Modules

mod reflectable;
mod type_uid;

// -----------------------------------------------------------------------------
// Exports

pub use reflectable::{ReflectType, Reflectable};
pub use type_uid::TypeUid;
