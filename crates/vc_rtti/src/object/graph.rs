use alloc::boxed::Box;
use core::fmt;

use slotmap::SlotMap;

use crate::reflection::Reflectable;

// -----------------------------------------------------------------------------
// ObjectKey

slotmap::new_key_type! {
    /// A handle to an object stored in an [`ObjectGraph`].
    ///
    /// The default value is the null key, which never refers to an object.
    pub struct ObjectKey;
}

// -----------------------------------------------------------------------------
// ObjectGraph

/// An arena of reflectable objects.
///
/// Reference fields hold [`ObjectKey`]s into a graph, so object identity is
/// the key, never an address. Encoding, decoding and cloning all take the
/// graph by `&mut` for the whole call.
///
/// # Checked-out objects
///
/// [`checkout`](Self::checkout) moves an object out of its slot without
/// freeing the key, so the codec can hold one object while reading or
/// populating others. While checked out the key is still
/// [`contained`](Self::contains) but [`get`](Self::get) returns `None`.
///
/// # Examples
///
/// ```
/// use vc_rtti::object::ObjectGraph;
/// # use vc_rtti::{ReflectType, TypeUid, schema::TypeBuilder};
/// # #[derive(Default)]
/// # struct Marker(u32);
/// # impl ReflectType for Marker {
/// #     const TYPE_UID: TypeUid = TypeUid::new(3);
/// #     const TYPE_NAME: &'static str = "Marker";
/// #     fn describe(_: &mut TypeBuilder<Self>) {}
/// # }
///
/// let mut graph = ObjectGraph::new();
/// let key = graph.insert(Marker(5));
///
/// assert_eq!(graph.get_as::<Marker>(key).unwrap().0, 5);
/// graph.get_as_mut::<Marker>(key).unwrap().0 += 1;
///
/// let object = graph.checkout(key).unwrap();
/// assert!(graph.contains(key) && graph.get(key).is_none());
/// graph.checkin(key, object);
/// assert_eq!(graph.get_as::<Marker>(key).unwrap().0, 6);
/// ```
#[derive(Default)]
pub struct ObjectGraph {
    slots: SlotMap<ObjectKey, Option<Box<dyn Reflectable>>>,
}

impl ObjectGraph {
    /// Creates an empty graph.
    #[inline]
    pub fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
        }
    }

    /// Inserts a value and returns its key.
    #[inline]
    pub fn insert<T: Reflectable>(&mut self, value: T) -> ObjectKey {
        self.insert_boxed(Box::new(value))
    }

    /// Inserts a boxed value and returns its key.
    #[inline]
    pub fn insert_boxed(&mut self, value: Box<dyn Reflectable>) -> ObjectKey {
        self.slots.insert(Some(value))
    }

    /// Returns `true` if the key refers to an object of this graph,
    /// including a checked-out one.
    #[inline]
    pub fn contains(&self, key: ObjectKey) -> bool {
        self.slots.contains_key(key)
    }

    /// Returns `true` if the object is currently checked out.
    #[inline]
    pub fn is_checked_out(&self, key: ObjectKey) -> bool {
        matches!(self.slots.get(key), Some(None))
    }

    /// Returns the object behind `key`.
    pub fn get(&self, key: ObjectKey) -> Option<&dyn Reflectable> {
        match self.slots.get(key) {
            Some(Some(object)) => Some(&**object),
            _ => None,
        }
    }

    /// Returns the object behind `key` mutably.
    pub fn get_mut(&mut self, key: ObjectKey) -> Option<&mut dyn Reflectable> {
        match self.slots.get_mut(key) {
            Some(Some(object)) => Some(&mut **object),
            _ => None,
        }
    }

    /// Returns the object behind `key` if it is a `T`.
    #[inline]
    pub fn get_as<T: Reflectable>(&self, key: ObjectKey) -> Option<&T> {
        self.get(key)?.as_any().downcast_ref::<T>()
    }

    /// Returns the object behind `key` mutably if it is a `T`.
    #[inline]
    pub fn get_as_mut<T: Reflectable>(&mut self, key: ObjectKey) -> Option<&mut T> {
        self.get_mut(key)?.as_any_mut().downcast_mut::<T>()
    }

    /// Removes the object and frees its key.
    ///
    /// Returns `None` if the key is stale or the object is checked out;
    /// the key is freed in both cases.
    #[inline]
    pub fn remove(&mut self, key: ObjectKey) -> Option<Box<dyn Reflectable>> {
        self.slots.remove(key).flatten()
    }

    /// Moves the object out of its slot, keeping the key reserved.
    #[inline]
    pub fn checkout(&mut self, key: ObjectKey) -> Option<Box<dyn Reflectable>> {
        self.slots.get_mut(key)?.take()
    }

    /// Puts a checked-out object back.
    ///
    /// The object is dropped if its key was removed in the meantime.
    pub fn checkin(&mut self, key: ObjectKey, object: Box<dyn Reflectable>) {
        match self.slots.get_mut(key) {
            Some(slot) => *slot = Some(object),
            None => log::warn!("object {key:?} was removed while checked out, dropping it"),
        }
    }

    /// The number of keys in use, checked-out objects included.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the graph holds no keys.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterates over every key in use.
    #[inline]
    pub fn keys(&self) -> impl Iterator<Item = ObjectKey> + '_ {
        self.slots.keys()
    }

    /// Removes every object.
    #[inline]
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

impl fmt::Debug for ObjectGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.slots.iter().map(|(key, slot)| match slot {
                Some(object) => (key, object.type_name()),
                None => (key, "<checked out>"),
            }))
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflection::{ReflectType, TypeUid};
    use crate::schema::TypeBuilder;
    use slotmap::Key;

    #[derive(Default, Debug, PartialEq)]
    struct Counter(u32);

    impl ReflectType for Counter {
        const TYPE_UID: TypeUid = TypeUid::new(2);
        const TYPE_NAME: &'static str = "Counter";
        fn describe(_: &mut TypeBuilder<Self>) {}
    }

    #[test]
    fn insert_get_remove() {
        let mut graph = ObjectGraph::new();
        let a = graph.insert(Counter(1));
        let b = graph.insert(Counter(2));
        assert_eq!(graph.len(), 2);
        assert_ne!(a, b);

        assert_eq!(graph.get_as::<Counter>(b), Some(&Counter(2)));
        assert_eq!(graph.get(a).map(|o| o.type_name()), Some("Counter"));

        let removed = graph.remove(a).unwrap();
        assert!(removed.is::<Counter>());
        assert!(!graph.contains(a));
        assert!(graph.get(a).is_none());
    }

    #[test]
    fn stale_keys_never_alias() {
        let mut graph = ObjectGraph::new();
        let old = graph.insert(Counter(1));
        graph.remove(old);
        let new = graph.insert(Counter(2));
        assert_ne!(old, new);
        assert!(graph.get(old).is_none());
        assert!(ObjectKey::default().is_null());
        assert!(!graph.contains(ObjectKey::default()));
    }

    #[test]
    fn checkout_keeps_key_reserved() {
        let mut graph = ObjectGraph::new();
        let key = graph.insert(Counter(9));

        let object = graph.checkout(key).unwrap();
        assert!(graph.contains(key));
        assert!(graph.is_checked_out(key));
        assert!(graph.get_mut(key).is_none());
        assert!(graph.checkout(key).is_none());

        graph.checkin(key, object);
        assert!(!graph.is_checked_out(key));
        assert_eq!(graph.get_as::<Counter>(key), Some(&Counter(9)));
    }

    #[test]
    fn checkin_after_remove_drops_object() {
        let mut graph = ObjectGraph::new();
        let key = graph.insert(Counter(1));
        let object = graph.checkout(key).unwrap();
        assert!(graph.remove(key).is_none());
        graph.checkin(key, object);
        assert!(graph.is_empty());
    }
}
