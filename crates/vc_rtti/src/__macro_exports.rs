//! Items used by the exported macros.

#[cfg(feature = "auto_register")]
pub use inventory;
