use slotmap::Key;

use super::ObjectKey;

// -----------------------------------------------------------------------------
// PointerSlot

/// The storage of a reference field.
///
/// Implemented for `Option<ObjectKey>`, and for `ObjectKey` itself where
/// the null key stands for "no object".
pub trait PointerSlot: Default + 'static {
    /// Returns the referenced key, if any.
    fn key(&self) -> Option<ObjectKey>;

    /// Points the slot at `key`, or clears it.
    fn set_key(&mut self, key: Option<ObjectKey>);
}

impl PointerSlot for Option<ObjectKey> {
    #[inline]
    fn key(&self) -> Option<ObjectKey> {
        *self
    }

    #[inline]
    fn set_key(&mut self, key: Option<ObjectKey>) {
        *self = key;
    }
}

impl PointerSlot for ObjectKey {
    #[inline]
    fn key(&self) -> Option<ObjectKey> {
        if self.is_null() { None } else { Some(*self) }
    }

    #[inline]
    fn set_key(&mut self, key: Option<ObjectKey>) {
        *self = key.unwrap_or_default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectGraph;
    use crate::reflection::{ReflectType, TypeUid};
    use crate::schema::TypeBuilder;

    #[derive(Default)]
    struct Unit;

    impl ReflectType for Unit {
        const TYPE_UID: TypeUid = TypeUid::new(1);
        const TYPE_NAME: &'static str = "Unit";
        fn describe(_: &mut TypeBuilder<Self>) {}
    }

    #[test]
    fn null_key_means_no_object() {
        let mut graph = ObjectGraph::new();
        let key = graph.insert(Unit);

        let mut raw = ObjectKey::default();
        assert_eq!(raw.key(), None);
        raw.set_key(Some(key));
        assert_eq!(raw.key(), Some(key));
        raw.set_key(None);
        assert!(raw.is_null());

        let mut optional: Option<ObjectKey> = None;
        optional.set_key(Some(key));
        assert_eq!(optional.key(), Some(key));
    }
}
