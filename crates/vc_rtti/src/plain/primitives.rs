use alloc::vec::Vec;
use core::mem::size_of;

use super::{PlainError, PlainSize, PlainType};

// -----------------------------------------------------------------------------
// Numbers

macro_rules! impl_plain_number {
    ($($ty:ty),* $(,)?) => {
        $(
            impl PlainType for $ty {
                const SIZE: PlainSize = PlainSize::Static(size_of::<$ty>() as u8);

                #[inline]
                fn write_bytes(&self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                fn read_bytes(bytes: &[u8]) -> Result<Self, PlainError> {
                    let raw = bytes.try_into().map_err(|_| PlainError::Length {
                        expected: size_of::<$ty>(),
                        found: bytes.len(),
                    })?;
                    Ok(<$ty>::from_le_bytes(raw))
                }
            }
        )*
    };
}

impl_plain_number!(u8, u16, u32, u64, u128);
impl_plain_number!(i8, i16, i32, i64, i128);
impl_plain_number!(f32, f64);

// -----------------------------------------------------------------------------
// bool & char

impl PlainType for bool {
    const SIZE: PlainSize = PlainSize::Static(1);

    #[inline]
    fn write_bytes(&self, out: &mut Vec<u8>) {
        out.push(*self as u8);
    }

    fn read_bytes(bytes: &[u8]) -> Result<Self, PlainError> {
        match bytes {
            [0] => Ok(false),
            [1] => Ok(true),
            [_] => Err(PlainError::InvalidValue("bool")),
            _ => Err(PlainError::Length {
                expected: 1,
                found: bytes.len(),
            }),
        }
    }
}

impl PlainType for char {
    const SIZE: PlainSize = PlainSize::Static(4);

    #[inline]
    fn write_bytes(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(*self as u32).to_le_bytes());
    }

    fn read_bytes(bytes: &[u8]) -> Result<Self, PlainError> {
        let raw = u32::read_bytes(bytes)?;
        char::from_u32(raw).ok_or(PlainError::InvalidValue("char"))
    }
}

// -----------------------------------------------------------------------------
// Tests
