//! Hash containers with a fixed `foldhash` seed.
//!
//! Every map in the codec is keyed by small integers or handles, so a fast,
//! non-randomized hasher is enough and keeps iteration order reproducible
//! between runs.

use core::hash::BuildHasher;

use foldhash::fast::{FixedState, FoldHasher};

// -----------------------------------------------------------------------------
// FixedHashState

/// A fixed hash seed.
const FIXED_HASH_STATE: FixedState = FixedState::with_seed(0x9E37_79B9_7F4A_7C15);

/// A hasher whose results only depend on the input.
pub type FixedHasher = FoldHasher<'static>;

/// Fixed hash state based upon a random but fixed seed.
#[derive(Copy, Clone, Default, Debug)]
pub struct FixedHashState;

impl BuildHasher for FixedHashState {
    type Hasher = FixedHasher;

    #[inline(always)]
    fn build_hasher(&self) -> Self::Hasher {
        FIXED_HASH_STATE.build_hasher()
    }
}

// -----------------------------------------------------------------------------
// Containers

/// A [`hashbrown::HashMap`] using [`FixedHashState`].
pub type HashMap<K, V> = hashbrown::HashMap<K, V, FixedHashState>;

/// A [`hashbrown::HashSet`] using [`FixedHashState`].
pub type HashSet<T> = hashbrown::HashSet<T, FixedHashState>;

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use core::hash::{Hash, Hasher};

    #[test]
    fn fixed_state_is_stable() {
        let hash = |value: u32| {
            let mut hasher = FixedHashState.build_hasher();
            value.hash(&mut hasher);
            hasher.finish()
        };
        assert_eq!(hash(7), hash(7));
        assert_ne!(hash(7), hash(8));
    }

    #[test]
    fn containers_default_construct() {
        let mut map: HashMap<u32, &str> = HashMap::default();
        map.insert(1, "one");
        assert_eq!(map.get(&1), Some(&"one"));

        let mut set: HashSet<u32> = HashSet::default();
        assert!(set.insert(3));
        assert!(!set.insert(3));
    }
}
