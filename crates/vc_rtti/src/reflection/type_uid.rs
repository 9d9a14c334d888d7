use core::fmt;

use serde_core::{Serialize, Serializer};

// -----------------------------------------------------------------------------
// TypeUid

/// The persistent numeric id of a reflectable type.
///
/// Unlike [`TypeId`](core::any::TypeId), a `TypeUid` is chosen by hand and is
/// written into serialized data, so it must stay the same across builds and
/// must be unique within a [`TypeRegistry`](crate::registry::TypeRegistry).
///
/// # Examples
///
/// ```
/// use vc_rtti::TypeUid;
///
/// const NODE: TypeUid = TypeUid::new(42);
/// assert_eq!(NODE.get(), 42);
/// assert_eq!(NODE.to_string(), "42");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct TypeUid(u32);

impl TypeUid {
    /// Creates a `TypeUid` from its raw value.
    #[inline(always)]
    pub const fn new(uid: u32) -> Self {
        Self(uid)
    }

    /// Returns the raw value.
    #[inline(always)]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for TypeUid {
    #[inline(always)]
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for TypeUid {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Serialize for TypeUid {
    #[inline]
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.0)
    }
}
