//! Schema-driven persistence of object graphs.
//!
//! - [`rtti`]: reflectable types, field schemas, the type registry and the
//!   object arena.
//! - [`serial`]: the binary codec, the intermediate tree and the cloner.
//!
//! Types describe their persistable fields once and register with a
//! [`TypeRegistry`](rtti::registry::TypeRegistry); the registry is then
//! passed to every encode, decode and clone.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

pub use vc_rtti as rtti;
pub use vc_serial as serial;
