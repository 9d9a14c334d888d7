//! Binary persistence of object graphs described by [`vc_rtti`].
//!
//! An encode walks one root object and everything it reaches through
//! reference fields, assigning each object a persistent id, and writes a
//! compact self-describing stream. A decode reverses the walk with the same
//! registry, restoring shared and cyclic references. Streams written by an
//! older or newer schema decode with unknown fields and types skipped and
//! missing fields left at their defaults.
//!
//! ## Menu
//!
//! - [`binary`]: the stream format, [`BinaryEncoder`](binary::BinaryEncoder)
//!   and [`BinaryDecoder`](binary::BinaryDecoder).
//! - [`intermediate`]: a tree mirroring the stream, for inspection, editing,
//!   diffing and export.
//! - [`clone`]: deep and shallow copies.
//! - [`error`]: errors and decode warnings.
//!
//! # Example
//!
//! ```
//! use vc_rtti::{ReflectType, TypeUid};
//! use vc_rtti::object::{ObjectGraph, ObjectKey};
//! use vc_rtti::registry::TypeRegistry;
//! use vc_rtti::schema::{FieldFlags, TypeBuilder};
//!
//! #[derive(Default)]
//! struct Folder {
//!     name: String,
//!     parent: Option<ObjectKey>,
//!     children: Vec<ObjectKey>,
//! }
//!
//! impl ReflectType for Folder {
//!     const TYPE_UID: TypeUid = TypeUid::new(300);
//!     const TYPE_NAME: &'static str = "Folder";
//!
//!     fn describe(ty: &mut TypeBuilder<Self>) {
//!         ty.plain(1, "name", |f| &f.name, |f| &mut f.name)
//!             .pointer(2, "parent", FieldFlags::WEAK_REF, |f| &f.parent, |f| &mut f.parent)
//!             .pointer_array(3, "children", FieldFlags::empty(), |f| &f.children, |f| {
//!                 &mut f.children
//!             });
//!     }
//! }
//!
//! let mut registry = TypeRegistry::new();
//! registry.register::<Folder>();
//!
//! let mut graph = ObjectGraph::new();
//! let docs = graph.insert(Folder { name: "docs".into(), ..Folder::default() });
//! let root = graph.insert(Folder { name: "/".into(), parent: None, children: vec![docs] });
//! graph.get_as_mut::<Folder>(docs).unwrap().parent = Some(root);
//!
//! let bytes = vc_serial::encode(&registry, &mut graph, root).unwrap();
//!
//! let mut loaded = ObjectGraph::new();
//! let decoded = vc_serial::decode(&registry, &mut loaded, &bytes).unwrap();
//! assert!(decoded.is_clean());
//!
//! let root = decoded.root.unwrap();
//! let docs = loaded.get_as::<Folder>(root).unwrap().children[0];
//! assert_eq!(loaded.get_as::<Folder>(docs).unwrap().parent, Some(root));
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

pub mod binary;
pub mod clone;
pub mod error;
pub mod intermediate;

#[cfg(test)]
mod fixtures;

// -----------------------------------------------------------------------------
// Top-Level exports

use alloc::vec::Vec;

use vc_rtti::object::{ObjectGraph, ObjectKey};
use vc_rtti::registry::TypeRegistry;

pub use binary::{BinaryDecoder, BinaryEncoder, Decoded, EncodeFlags};
pub use clone::{CloneMode, Cloner};
pub use error::{CloneError, DecodeError, DecodeWarning, EncodeError, TreeError};
pub use intermediate::{IntermediateDecoder, IntermediateEncoder, SerializedGraph};

/// Encodes `root` and every object it reaches into a new buffer.
///
/// See [`BinaryEncoder`] for flags and streaming output.
#[inline]
pub fn encode(registry: &TypeRegistry, graph: &mut ObjectGraph, root: ObjectKey) -> Result<Vec<u8>, EncodeError> {
    BinaryEncoder::new(registry).encode_to_vec(graph, root)
}

/// Decodes a stream into new objects of `graph`.
#[inline]
pub fn decode(registry: &TypeRegistry, graph: &mut ObjectGraph, bytes: &[u8]) -> Result<Decoded, DecodeError> {
    BinaryDecoder::new(registry).decode(graph, bytes)
}

/// Encodes `root` and every object it reaches into a tree.
#[inline]
pub fn encode_intermediate(
    registry: &TypeRegistry,
    graph: &mut ObjectGraph,
    root: ObjectKey,
) -> Result<SerializedGraph<'static>, EncodeError> {
    IntermediateEncoder::new(registry).encode(graph, root)
}

/// Decodes a tree into new objects of `graph`.
#[inline]
pub fn decode_intermediate(
    registry: &TypeRegistry,
    graph: &mut ObjectGraph,
    tree: &SerializedGraph<'_>,
) -> Result<Decoded, DecodeError> {
    IntermediateDecoder::new(registry).decode(graph, tree)
}

/// Copies the object `key` within `graph`, see [`Cloner`].
#[inline]
pub fn clone_object(
    registry: &TypeRegistry,
    graph: &mut ObjectGraph,
    key: ObjectKey,
    mode: CloneMode,
) -> Result<ObjectKey, CloneError> {
    Cloner::new(registry).clone_object(graph, key, mode)
}
