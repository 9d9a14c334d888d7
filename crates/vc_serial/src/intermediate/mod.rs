//! A registry-free tree mirroring the binary stream.
//!
//! A [`SerializedGraph`] holds what a stream holds: objects by persistent id,
//! a segment per level of each base chain, and the entries each segment
//! wrote. It can be inspected, edited, diffed and exported without
//! materializing live objects.
//!
//! ## Menu
//!
//! - [`IntermediateEncoder`] / [`IntermediateDecoder`]: objects to trees and back.
//! - [`read_tree`] / [`write_tree`]: binary streams to trees and back.
//! - [`generate_diff`] / [`apply_diff`]: partial updates between two encodes.
//!
//! The tree types implement `serde::Serialize`, so a tree can be exported
//! to JSON, RON or any other serde format.

// -----------------------------------------------------------------------------
// Modules

mod bridge;
mod codec;
mod diff;
mod ser;
mod tree;

// -----------------------------------------------------------------------------
// Exports

pub use bridge::{read_tree, write_tree};
pub use codec::{IntermediateDecoder, IntermediateEncoder};
pub use diff::{apply_diff, generate_diff};
pub use tree::{SerializedArray, SerializedEntry, SerializedField, SerializedGraph};
pub use tree::{SerializedInstance, SerializedObject, SerializedSubObject};
