//! Object identity.
//!
//! Objects that may be shared between fields are stored in an [`ObjectGraph`]
//! and referred to by [`ObjectKey`]s. A key is versioned, so a key that
//! outlives its object never aliases a newer one.
//!
//! - [`ObjectKey`]: a handle to an object in a graph.
//! - [`ObjectGraph`]: the arena owning `Box<dyn Reflectable>` values.
//! - [`PointerSlot`]: storage of a reference field.

// -----------------------------------------------------------------------------
// Modules

mod graph;
mod pointer;

// -----------------------------------------------------------------------------
// Exports

pub use graph::{ObjectGraph, ObjectKey};
pub use pointer::PointerSlot;
