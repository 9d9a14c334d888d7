//! Closure-backed implementations of the accessor traits.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::marker::PhantomData;

use crate::object::{ObjectKey, PointerSlot};
use crate::plain::PlainType;
use crate::reflection::{ReflectType, Reflectable, TypeUid};
use crate::schema::access::{expect_element, expect_single, not_an_array, out_of_bounds};
use crate::schema::access::{owner_mut, owner_ref};
use crate::schema::{DataBlockAccess, FieldError, PlainAccess, PointerAccess, ReflectableAccess};
use crate::schema::Slot;

// -----------------------------------------------------------------------------
// Plain

/// A plain field reached through a projection pair.
pub(crate) struct PlainField<T, V, G, M> {
    pub name: &'static str,
    pub get: G,
    pub get_mut: M,
    pub _marker: PhantomData<fn() -> (T, V)>,
}

impl<T, V, G, M> PlainAccess for PlainField<T, V, G, M>
where
    T: ReflectType,
    V: PlainType,
    G: Fn(&T) -> &V + Send + Sync + 'static,
    M: Fn(&mut T) -> &mut V + Send + Sync + 'static,
{
    fn encoded_len(&self, owner: &dyn Reflectable, slot: Slot) -> Result<u32, FieldError> {
        expect_single(self.name, slot)?;
        Ok((self.get)(owner_ref::<T>(self.name, owner)?).dynamic_size())
    }

    fn write(
        &self,
        owner: &dyn Reflectable,
        slot: Slot,
        out: &mut Vec<u8>,
    ) -> Result<(), FieldError> {
        expect_single(self.name, slot)?;
        (self.get)(owner_ref::<T>(self.name, owner)?).write_bytes(out);
        Ok(())
    }

    fn read(&self, owner: &mut dyn Reflectable, slot: Slot, bytes: &[u8]) -> Result<(), FieldError> {
        expect_single(self.name, slot)?;
        let value = read_plain::<V>(self.name, bytes)?;
        *(self.get_mut)(owner_mut::<T>(self.name, owner)?) = value;
        Ok(())
    }

    fn len(&self, _owner: &dyn Reflectable) -> Result<usize, FieldError> {
        Err(not_an_array(self.name))
    }

    fn resize(&self, _owner: &mut dyn Reflectable, _len: usize) -> Result<(), FieldError> {
        Err(not_an_array(self.name))
    }
}

/// A plain field reached through a getter returning a value and a setter.
pub(crate) struct PlainProperty<T, V, G, S> {
    pub name: &'static str,
    pub getter: G,
    pub setter: S,
    pub _marker: PhantomData<fn() -> (T, V)>,
}

impl<T, V, G, S> PlainAccess for PlainProperty<T, V, G, S>
where
    T: ReflectType,
    V: PlainType,
    G: Fn(&T) -> V + Send + Sync + 'static,
    S: Fn(&mut T, V) + Send + Sync + 'static,
{
    fn encoded_len(&self, owner: &dyn Reflectable, slot: Slot) -> Result<u32, FieldError> {
        expect_single(self.name, slot)?;
        Ok((self.getter)(owner_ref::<T>(self.name, owner)?).dynamic_size())
    }

    fn write(
        &self,
        owner: &dyn Reflectable,
        slot: Slot,
        out: &mut Vec<u8>,
    ) -> Result<(), FieldError> {
        expect_single(self.name, slot)?;
        (self.getter)(owner_ref::<T>(self.name, owner)?).write_bytes(out);
        Ok(())
    }

    fn read(&self, owner: &mut dyn Reflectable, slot: Slot, bytes: &[u8]) -> Result<(), FieldError> {
        expect_single(self.name, slot)?;
        let value = read_plain::<V>(self.name, bytes)?;
        (self.setter)(owner_mut::<T>(self.name, owner)?, value);
        Ok(())
    }

    fn len(&self, _owner: &dyn Reflectable) -> Result<usize, FieldError> {
        Err(not_an_array(self.name))
    }

    fn resize(&self, _owner: &mut dyn Reflectable, _len: usize) -> Result<(), FieldError> {
        Err(not_an_array(self.name))
    }
}

/// A plain array field stored as a `Vec`.
pub(crate) struct PlainArrayField<T, V, G, M> {
    pub name: &'static str,
    pub get: G,
    pub get_mut: M,
    pub _marker: PhantomData<fn() -> (T, V)>,
}

impl<T, V, G, M> PlainAccess for PlainArrayField<T, V, G, M>
where
    T: ReflectType,
    V: PlainType + Default,
    G: Fn(&T) -> &Vec<V> + Send + Sync + 'static,
    M: Fn(&mut T) -> &mut Vec<V> + Send + Sync + 'static,
{
    fn encoded_len(&self, owner: &dyn Reflectable, slot: Slot) -> Result<u32, FieldError> {
        let index = expect_element(self.name, slot)?;
        let items = (self.get)(owner_ref::<T>(self.name, owner)?);
        match items.get(index) {
            Some(item) => Ok(item.dynamic_size()),
            None => Err(out_of_bounds(self.name, index, items.len())),
        }
    }

    fn write(
        &self,
        owner: &dyn Reflectable,
        slot: Slot,
        out: &mut Vec<u8>,
    ) -> Result<(), FieldError> {
        let index = expect_element(self.name, slot)?;
        let items = (self.get)(owner_ref::<T>(self.name, owner)?);
        match items.get(index) {
            Some(item) => {
                item.write_bytes(out);
                Ok(())
            }
            None => Err(out_of_bounds(self.name, index, items.len())),
        }
    }

    fn read(&self, owner: &mut dyn Reflectable, slot: Slot, bytes: &[u8]) -> Result<(), FieldError> {
        let index = expect_element(self.name, slot)?;
        let value = read_plain::<V>(self.name, bytes)?;
        let items = (self.get_mut)(owner_mut::<T>(self.name, owner)?);
        let len = items.len();
        match items.get_mut(index) {
            Some(item) => {
                *item = value;
                Ok(())
            }
            None => Err(out_of_bounds(self.name, index, len)),
        }
    }

    fn len(&self, owner: &dyn Reflectable) -> Result<usize, FieldError> {
        Ok((self.get)(owner_ref::<T>(self.name, owner)?).len())
    }

    fn resize(&self, owner: &mut dyn Reflectable, len: usize) -> Result<(), FieldError> {
        (self.get_mut)(owner_mut::<T>(self.name, owner)?).resize_with(len, V::default);
        Ok(())
    }
}

#[inline]
fn read_plain<V: PlainType>(field: &'static str, bytes: &[u8]) -> Result<V, FieldError> {
    V::read_bytes(bytes).map_err(|source| FieldError::Plain { field, source })
}

// -----------------------------------------------------------------------------
// Reflectable

/// An embedded reflectable field reached through a projection pair.
pub(crate) struct ReflectableField<T, V, G, M> {
    pub name: &'static str,
    pub get: G,
    pub get_mut: M,
    pub _marker: PhantomData<fn() -> (T, V)>,
}

impl<T, V, G, M> ReflectableAccess for ReflectableField<T, V, G, M>
where
    T: ReflectType,
    V: ReflectType,
    G: Fn(&T) -> &V + Send + Sync + 'static,
    M: Fn(&mut T) -> &mut V + Send + Sync + 'static,
{
    #[inline]
    fn value_uid(&self) -> TypeUid {
        V::TYPE_UID
    }

    #[inline]
    fn new_value(&self) -> Box<dyn Reflectable> {
        Box::new(V::default())
    }

    fn get<'a>(
        &self,
        owner: &'a dyn Reflectable,
        slot: Slot,
    ) -> Result<&'a dyn Reflectable, FieldError> {
        expect_single(self.name, slot)?;
        Ok((self.get)(owner_ref::<T>(self.name, owner)?))
    }

    fn get_mut<'a>(
        &self,
        owner: &'a mut dyn Reflectable,
        slot: Slot,
    ) -> Result<&'a mut dyn Reflectable, FieldError> {
        expect_single(self.name, slot)?;
        Ok((self.get_mut)(owner_mut::<T>(self.name, owner)?))
    }

    fn set(
        &self,
        owner: &mut dyn Reflectable,
        slot: Slot,
        value: Box<dyn Reflectable>,
    ) -> Result<(), FieldError> {
        expect_single(self.name, slot)?;
        let value = downcast_value::<V>(self.name, value)?;
        *(self.get_mut)(owner_mut::<T>(self.name, owner)?) = value;
        Ok(())
    }

    fn len(&self, _owner: &dyn Reflectable) -> Result<usize, FieldError> {
        Err(not_an_array(self.name))
    }

    fn resize(&self, _owner: &mut dyn Reflectable, _len: usize) -> Result<(), FieldError> {
        Err(not_an_array(self.name))
    }
}

/// An embedded reflectable array field stored as a `Vec`.
pub(crate) struct ReflectableArrayField<T, V, G, M> {
    pub name: &'static str,
    pub get: G,
    pub get_mut: M,
    pub _marker: PhantomData<fn() -> (T, V)>,
}

impl<T, V, G, M> ReflectableAccess for ReflectableArrayField<T, V, G, M>
where
    T: ReflectType,
    V: ReflectType,
    G: Fn(&T) -> &Vec<V> + Send + Sync + 'static,
    M: Fn(&mut T) -> &mut Vec<V> + Send + Sync + 'static,
{
    #[inline]
    fn value_uid(&self) -> TypeUid {
        V::TYPE_UID
    }

    #[inline]
    fn new_value(&self) -> Box<dyn Reflectable> {
        Box::new(V::default())
    }

    fn get<'a>(
        &self,
        owner: &'a dyn Reflectable,
        slot: Slot,
    ) -> Result<&'a dyn Reflectable, FieldError> {
        let index = expect_element(self.name, slot)?;
        let items = (self.get)(owner_ref::<T>(self.name, owner)?);
        match items.get(index) {
            Some(item) => Ok(item),
            None => Err(out_of_bounds(self.name, index, items.len())),
        }
    }

    fn get_mut<'a>(
        &self,
        owner: &'a mut dyn Reflectable,
        slot: Slot,
    ) -> Result<&'a mut dyn Reflectable, FieldError> {
        let index = expect_element(self.name, slot)?;
        let items = (self.get_mut)(owner_mut::<T>(self.name, owner)?);
        let len = items.len();
        match items.get_mut(index) {
            Some(item) => Ok(item),
            None => Err(out_of_bounds(self.name, index, len)),
        }
    }

    fn set(
        &self,
        owner: &mut dyn Reflectable,
        slot: Slot,
        value: Box<dyn Reflectable>,
    ) -> Result<(), FieldError> {
        let index = expect_element(self.name, slot)?;
        let value = downcast_value::<V>(self.name, value)?;
        let items = (self.get_mut)(owner_mut::<T>(self.name, owner)?);
        let len = items.len();
        match items.get_mut(index) {
            Some(item) => {
                *item = value;
                Ok(())
            }
            None => Err(out_of_bounds(self.name, index, len)),
        }
    }

    fn len(&self, owner: &dyn Reflectable) -> Result<usize, FieldError> {
        Ok((self.get)(owner_ref::<T>(self.name, owner)?).len())
    }

    fn resize(&self, owner: &mut dyn Reflectable, len: usize) -> Result<(), FieldError> {
        (self.get_mut)(owner_mut::<T>(self.name, owner)?).resize_with(len, V::default);
        Ok(())
    }
}

fn downcast_value<V: ReflectType>(
    field: &'static str,
    value: Box<dyn Reflectable>,
) -> Result<V, FieldError> {
    match value.downcast::<V>() {
        Ok(value) => Ok(*value),
        Err(value) => Err(FieldError::ValueMismatch {
            field,
            expected: V::TYPE_NAME,
            found: value.type_name(),
        }),
    }
}

// -----------------------------------------------------------------------------
// Pointer

/// A reference field reached through a projection pair.
pub(crate) struct PointerField<T, P, G, M> {
    pub name: &'static str,
    pub get: G,
    pub get_mut: M,
    pub _marker: PhantomData<fn() -> (T, P)>,
}

impl<T, P, G, M> PointerAccess for PointerField<T, P, G, M>
where
    T: ReflectType,
    P: PointerSlot,
    G: Fn(&T) -> &P + Send + Sync + 'static,
    M: Fn(&mut T) -> &mut P + Send + Sync + 'static,
{
    fn get(&self, owner: &dyn Reflectable, slot: Slot) -> Result<Option<ObjectKey>, FieldError> {
        expect_single(self.name, slot)?;
        Ok((self.get)(owner_ref::<T>(self.name, owner)?).key())
    }

    fn set(
        &self,
        owner: &mut dyn Reflectable,
        slot: Slot,
        key: Option<ObjectKey>,
    ) -> Result<(), FieldError> {
        expect_single(self.name, slot)?;
        (self.get_mut)(owner_mut::<T>(self.name, owner)?).set_key(key);
        Ok(())
    }

    fn len(&self, _owner: &dyn Reflectable) -> Result<usize, FieldError> {
        Err(not_an_array(self.name))
    }

    fn resize(&self, _owner: &mut dyn Reflectable, _len: usize) -> Result<(), FieldError> {
        Err(not_an_array(self.name))
    }
}

/// A reference array field stored as a `Vec`.
pub(crate) struct PointerArrayField<T, P, G, M> {
    pub name: &'static str,
    pub get: G,
    pub get_mut: M,
    pub _marker: PhantomData<fn() -> (T, P)>,
}

impl<T, P, G, M> PointerAccess for PointerArrayField<T, P, G, M>
where
    T: ReflectType,
    P: PointerSlot,
    G: Fn(&T) -> &Vec<P> + Send + Sync + 'static,
    M: Fn(&mut T) -> &mut Vec<P> + Send + Sync + 'static,
{
    fn get(&self, owner: &dyn Reflectable, slot: Slot) -> Result<Option<ObjectKey>, FieldError> {
        let index = expect_element(self.name, slot)?;
        let items = (self.get)(owner_ref::<T>(self.name, owner)?);
        match items.get(index) {
            Some(item) => Ok(item.key()),
            None => Err(out_of_bounds(self.name, index, items.len())),
        }
    }

    fn set(
        &self,
        owner: &mut dyn Reflectable,
        slot: Slot,
        key: Option<ObjectKey>,
    ) -> Result<(), FieldError> {
        let index = expect_element(self.name, slot)?;
        let items = (self.get_mut)(owner_mut::<T>(self.name, owner)?);
        let len = items.len();
        match items.get_mut(index) {
            Some(item) => {
                item.set_key(key);
                Ok(())
            }
            None => Err(out_of_bounds(self.name, index, len)),
        }
    }

    fn len(&self, owner: &dyn Reflectable) -> Result<usize, FieldError> {
        Ok((self.get)(owner_ref::<T>(self.name, owner)?).len())
    }

    fn resize(&self, owner: &mut dyn Reflectable, len: usize) -> Result<(), FieldError> {
        (self.get_mut)(owner_mut::<T>(self.name, owner)?).resize_with(len, P::default);
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// DataBlock

/// A data block field reached through a getter and a setter.
pub(crate) struct DataBlockField<T, G, S> {
    pub name: &'static str,
    pub getter: G,
    pub setter: S,
    pub _marker: PhantomData<fn() -> T>,
}

impl<T, G, S> DataBlockAccess for DataBlockField<T, G, S>
where
    T: ReflectType,
    G: Fn(&T) -> &[u8] + Send + Sync + 'static,
    S: Fn(&mut T, Vec<u8>) + Send + Sync + 'static,
{
    fn get<'a>(&self, owner: &'a dyn Reflectable) -> Result<&'a [u8], FieldError> {
        Ok((self.getter)(owner_ref::<T>(self.name, owner)?))
    }

    fn set(&self, owner: &mut dyn Reflectable, data: Vec<u8>) -> Result<(), FieldError> {
        (self.setter)(owner_mut::<T>(self.name, owner)?, data);
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Tests
