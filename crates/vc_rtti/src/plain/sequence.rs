use alloc::vec::Vec;

use super::{PlainError, PlainSize, PlainType};
use super::{expect_consumed, read_element, read_u32, write_element};

// -----------------------------------------------------------------------------
// Vec

/// A count followed by the elements.
impl<T: PlainType> PlainType for Vec<T> {
    const SIZE: PlainSize = PlainSize::Dynamic;

    fn dynamic_size(&self) -> u32 {
        let prefix = if T::SIZE.is_dynamic() { 4 } else { 0 };
        self.iter()
            .fold(4, |total, item| total + prefix + item.dynamic_size())
    }

    fn write_bytes(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.len() as u32).to_le_bytes());
        for item in self {
            write_element(item, out);
        }
    }

    fn read_bytes(bytes: &[u8]) -> Result<Self, PlainError> {
        let mut offset = 0;
        let count = read_u32(bytes, &mut offset)? as usize;
        // Every element takes at least one byte unless it is zero-sized.
        let mut items = Vec::with_capacity(count.min(bytes.len()));
        for _ in 0..count {
            items.push(read_element::<T>(bytes, &mut offset)?);
        }
        expect_consumed(bytes, offset)?;
        Ok(items)
    }
}

// -----------------------------------------------------------------------------
// Array

/// The elements back to back, without a count.
impl<T: PlainType, const N: usize> PlainType for [T; N] {
    const SIZE: PlainSize = PlainSize::array_of(T::SIZE, N);

    fn dynamic_size(&self) -> u32 {
        let prefix = if T::SIZE.is_dynamic() { 4 } else { 0 };
        self.iter()
            .fold(0, |total, item| total + prefix + item.dynamic_size())
    }

    fn write_bytes(&self, out: &mut Vec<u8>) {
        for item in self {
            write_element(item, out);
        }
    }

    fn read_bytes(bytes: &[u8]) -> Result<Self, PlainError> {
        let mut offset = 0;
        let mut items = Vec::with_capacity(N);
        for _ in 0..N {
            items.push(read_element::<T>(bytes, &mut offset)?);
        }
        expect_consumed(bytes, offset)?;
        items.try_into().map_err(|_| PlainError::Truncated)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use alloc::vec;

    #[test]
    fn vec_of_static_elements() {
        let value: Vec<u16> = vec![1, 2, 3];
        let mut out = Vec::new();
        value.write_bytes(&mut out);
        assert_eq!(out, vec![3, 0, 0, 0, 1, 0, 2, 0, 3, 0]);
        assert_eq!(value.dynamic_size() as usize, out.len());
        assert_eq!(Vec::<u16>::read_bytes(&out), Ok(value));
    }

    #[test]
    fn vec_of_dynamic_elements() {
        let value = vec![String::from("a"), String::new(), String::from("xyz")];
        let mut out = Vec::new();
        value.write_bytes(&mut out);
        assert_eq!(value.dynamic_size() as usize, out.len());
        assert_eq!(Vec::<String>::read_bytes(&out), Ok(value));
    }

    #[test]
    fn vec_rejects_trailing_and_missing_bytes() {
        let mut out = Vec::new();
        vec![1u8, 2].write_bytes(&mut out);
        out.push(9);
        assert!(Vec::<u8>::read_bytes(&out).is_err());
        assert_eq!(Vec::<u8>::read_bytes(&out[..5]), Err(PlainError::Truncated));
    }

    #[test]
    fn arrays_are_static_when_small() {
        assert_eq!(<[f32; 3] as PlainType>::SIZE, PlainSize::Static(12));
        assert_eq!(<[u64; 40] as PlainType>::SIZE, PlainSize::Dynamic);

        let value = [1.0f32, -2.0, 0.5];
        let mut out = Vec::new();
        value.write_bytes(&mut out);
        assert_eq!(out.len(), 12);
        assert_eq!(<[f32; 3]>::read_bytes(&out), Ok(value));
    }

    #[test]
    fn array_of_text() {
        let value = [String::from("l"), String::from("r")];
        let mut out = Vec::new();
        value.write_bytes(&mut out);
        assert_eq!(value.dynamic_size() as usize, out.len());
        assert_eq!(<[String; 2]>::read_bytes(&out), Ok(value));
    }
}
