//! Byte codecs for plain field values.
//!
//! A plain value is copied by its raw little-endian bytes. Types whose
//! encoding always has the same length declare [`PlainSize::Static`];
//! everything else declares [`PlainSize::Dynamic`] and reports its length
//! through [`PlainType::dynamic_size`].
//!
//! ## Implemented types
//!
//! - `bool` `char` `f32` `f64`
//! - `i8` `i16` `i32` `i64` `i128`
//! - `u8` `u16` `u32` `u64` `u128`
//! - `String`
//! - `Vec<T>` and `[T; N]` for any plain `T`

use alloc::vec::Vec;

use thiserror::Error;

// -----------------------------------------------------------------------------
// Modules

mod primitives;
mod sequence;
mod text;

// -----------------------------------------------------------------------------
// PlainSize

/// The encoded size of a plain type.
///
/// Static sizes are limited to one byte because the wire format stores them
/// in a single byte of field metadata.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlainSize {
    /// Every value encodes to exactly this many bytes.
    Static(u8),
    /// The length depends on the value and is written as a 4-byte prefix.
    Dynamic,
}

impl PlainSize {
    /// The size of `len` consecutive values of size `elem`.
    ///
    /// Stays static only while the total fits in one byte.
    ///
    /// # Examples
    ///
    /// ```
    /// use vc_rtti::plain::PlainSize;
    ///
    /// assert_eq!(PlainSize::array_of(PlainSize::Static(4), 3), PlainSize::Static(12));
    /// assert_eq!(PlainSize::array_of(PlainSize::Static(4), 64), PlainSize::Dynamic);
    /// assert_eq!(PlainSize::array_of(PlainSize::Dynamic, 2), PlainSize::Dynamic);
    /// ```
    pub const fn array_of(elem: PlainSize, len: usize) -> PlainSize {
        match elem {
            PlainSize::Static(size) => match (size as usize).checked_mul(len) {
                Some(total) if total <= u8::MAX as usize => PlainSize::Static(total as u8),
                _ => PlainSize::Dynamic,
            },
            PlainSize::Dynamic => PlainSize::Dynamic,
        }
    }

    /// Returns `true` for [`PlainSize::Dynamic`].
    #[inline]
    pub const fn is_dynamic(self) -> bool {
        matches!(self, PlainSize::Dynamic)
    }

    /// Returns the static size, or `0` for dynamic sizes.
    #[inline]
    pub const fn static_size(self) -> u8 {
        match self {
            PlainSize::Static(size) => size,
            PlainSize::Dynamic => 0,
        }
    }
}

// -----------------------------------------------------------------------------
// PlainError

/// An error produced while reading a plain value back from bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PlainError {
    #[error("expected {expected} bytes, found {found}")]
    Length { expected: usize, found: usize },
    #[error("unexpected end of plain value data")]
    Truncated,
    #[error("invalid utf-8 in text value")]
    Utf8,
    #[error("invalid {0} value")]
    InvalidValue(&'static str),
}

// -----------------------------------------------------------------------------
// PlainType

/// A value that is persisted by copying its bytes.
///
/// # Examples
///
/// ```
/// use vc_rtti::plain::{PlainError, PlainSize, PlainType};
///
/// #[derive(Default, Debug, PartialEq)]
/// struct Rgb(u8, u8, u8);
///
/// impl PlainType for Rgb {
///     const SIZE: PlainSize = PlainSize::Static(3);
///
///     fn write_bytes(&self, out: &mut Vec<u8>) {
///         out.extend_from_slice(&[self.0, self.1, self.2]);
///     }
///
///     fn read_bytes(bytes: &[u8]) -> Result<Self, PlainError> {
///         match bytes {
///             [r, g, b] => Ok(Rgb(*r, *g, *b)),
///             _ => Err(PlainError::Length { expected: 3, found: bytes.len() }),
///         }
///     }
/// }
///
/// let mut out = Vec::new();
/// Rgb(1, 2, 3).write_bytes(&mut out);
/// assert_eq!(Rgb::read_bytes(&out), Ok(Rgb(1, 2, 3)));
/// ```
pub trait PlainType: Sized + 'static {
    /// The encoded size of this type.
    const SIZE: PlainSize;

    /// The number of bytes [`write_bytes`](Self::write_bytes) produces for this value.
    ///
    /// The default returns the static size, and for dynamic types measures
    /// an actual encoding. Dynamic types should override it.
    fn dynamic_size(&self) -> u32 {
        match Self::SIZE {
            PlainSize::Static(size) => size as u32,
            PlainSize::Dynamic => {
                let mut buffer = Vec::new();
                self.write_bytes(&mut buffer);
                buffer.len() as u32
            }
        }
    }

    /// Appends the encoding of this value.
    fn write_bytes(&self, out: &mut Vec<u8>);

    /// Reads a value from exactly the bytes produced by [`write_bytes`](Self::write_bytes).
    fn read_bytes(bytes: &[u8]) -> Result<Self, PlainError>;
}

// -----------------------------------------------------------------------------
// Element helpers

/// Appends one element of a plain sequence.
///
/// Dynamic elements get a 4-byte length prefix so that a reader can find
/// where the next element begins.
pub fn write_element<T: PlainType>(value: &T, out: &mut Vec<u8>) {
    if T::SIZE.is_dynamic() {
        out.extend_from_slice(&value.dynamic_size().to_le_bytes());
    }
    value.write_bytes(out);
}

/// Reads one element written by [`write_element`], advancing `offset`.
pub fn read_element<T: PlainType>(bytes: &[u8], offset: &mut usize) -> Result<T, PlainError> {
    let len = match T::SIZE {
        PlainSize::Static(size) => size as usize,
        PlainSize::Dynamic => read_u32(bytes, offset)? as usize,
    };
    let end = offset.checked_add(len).ok_or(PlainError::Truncated)?;
    let slice = bytes.get(*offset..end).ok_or(PlainError::Truncated)?;
    *offset = end;
    T::read_bytes(slice)
}

/// Reads a little-endian `u32`, advancing `offset`.
pub(crate) fn read_u32(bytes: &[u8], offset: &mut usize) -> Result<u32, PlainError> {
    let end = offset.checked_add(4).ok_or(PlainError::Truncated)?;
    let slice = bytes.get(*offset..end).ok_or(PlainError::Truncated)?;
    *offset = end;
    let mut raw = [0u8; 4];
    raw.copy_from_slice(slice);
    Ok(u32::from_le_bytes(raw))
}

/// Fails unless every byte was consumed.
pub(crate) fn expect_consumed(bytes: &[u8], offset: usize) -> Result<(), PlainError> {
    if offset == bytes.len() {
        Ok(())
    } else {
        Err(PlainError::Length {
            expected: offset,
            found: bytes.len(),
        })
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
    fn element_helpers_prefix_dynamic_values() {
        let mut out = Vec::new();
        write_element(&7u16, &mut out);
        write_element(&String::from("hi"), &mut out);
        assert_eq!(out, vec![7, 0, 2, 0, 0, 0, b'h', b'i']);

        let mut offset = 0;
        assert_eq!(read_element::<u16>(&out, &mut offset), Ok(7));
        assert_eq!(read_element::<String>(&out, &mut offset).as_deref(), Ok("hi"));
        assert_eq!(offset, out.len());
        assert_eq!(read_element::<u8>(&out, &mut offset), Err(PlainError::Truncated));
    }

    #[test]
    fn static_size_helpers() {
        assert!(PlainSize::Dynamic.is_dynamic());
        assert_eq!(PlainSize::Static(9).static_size(), 9);
        assert_eq!(PlainSize::Dynamic.static_size(), 0);
        assert_eq!(PlainSize::array_of(PlainSize::Static(1), 255), PlainSize::Static(255));
        assert_eq!(PlainSize::array_of(PlainSize::Static(1), 256), PlainSize::Dynamic);
        assert_eq!(PlainSize::array_of(PlainSize::Static(200), usize::MAX), PlainSize::Dynamic);
    }

    #[test]
    fn default_dynamic_size_measures_encoding() {
        let value = vec![String::from("ab"), String::from("c")];
        // count + (prefix + 2) + (prefix + 1)
        assert_eq!(value.dynamic_size(), 4 + 6 + 5);
    }
}
