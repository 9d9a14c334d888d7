use alloc::vec::Vec;

use crate::error::EncodeError;

/// A suggested size for buffers handed to a [`BufferWriter`].
pub const DEFAULT_CAPACITY: usize = 16 * 1024;

// -----------------------------------------------------------------------------
// ByteSink

/// The output of an encoder.
pub trait ByteSink {
    /// Appends `bytes` to the output.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), EncodeError>;

    /// Appends a little-endian `u32`.
    #[inline]
    fn write_u32(&mut self, value: u32) -> Result<(), EncodeError> {
        self.write_bytes(&value.to_le_bytes())
    }
}

impl ByteSink for Vec<u8> {
    #[inline]
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

impl<S: ByteSink + ?Sized> ByteSink for &mut S {
    #[inline]
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        (**self).write_bytes(bytes)
    }
}

// -----------------------------------------------------------------------------
// BufferWriter

/// A [`ByteSink`] that fills caller-owned buffers.
///
/// Whenever the current buffer is full, the flush callback receives it
/// together with the number of bytes filled, and returns the buffer to
/// continue with: the same one after consuming its contents, or another.
/// The length of the returned buffer is the capacity the writer fills
/// next, so the callback picks the size of every buffer after the first.
/// Returning `None` or an empty buffer aborts the encode with
/// [`EncodeError::OutputExhausted`].
///
/// Records are split across buffers wherever a buffer ends, so the
/// concatenated output does not depend on the buffer sizes.
///
/// # Examples
///
/// ```
/// use vc_serial::binary::{BufferWriter, ByteSink};
///
/// let mut output = Vec::new();
/// let mut buffer = [0u8; 4];
///
/// let mut writer = BufferWriter::new(&mut buffer, |filled, len| {
///     output.extend_from_slice(&filled[..len]);
///     Some(filled)
/// });
/// writer.write_bytes(b"hello, world").unwrap();
/// assert_eq!(writer.finish(), 12);
///
/// assert_eq!(output, b"hello, world");
/// ```
pub struct BufferWriter<'b, F> {
    buffer: Option<&'b mut [u8]>,
    filled: usize,
    written: usize,
    flush: F,
}

impl<'b, F> BufferWriter<'b, F>
where
    F: FnMut(&'b mut [u8], usize) -> Option<&'b mut [u8]>,
{
    /// Creates a writer starting with `buffer`.
    pub fn new(buffer: &'b mut [u8], flush: F) -> Self {
        Self {
            buffer: Some(buffer),
            filled: 0,
            written: 0,
            flush,
        }
    }

    /// Returns the number of bytes written so far.
    #[inline]
    pub fn written(&self) -> usize {
        self.written
    }

    /// Hands the last, partially filled buffer to the callback and returns
    /// the total number of bytes written.
    ///
    /// The buffer the callback returns is dropped.
    pub fn finish(mut self) -> usize {
        if let Some(buffer) = self.buffer.take()
            && self.filled > 0
        {
            let _ = (self.flush)(buffer, self.filled);
        }
        self.written
    }

    fn flush_full(&mut self) -> Result<(), EncodeError> {
        let buffer = self.buffer.take().ok_or(EncodeError::OutputExhausted)?;
        match (self.flush)(buffer, self.filled) {
            Some(next) if !next.is_empty() => {
                self.buffer = Some(next);
                self.filled = 0;
                Ok(())
            }
            _ => {
                log::debug!("flush callback ended the output after {} bytes", self.written);
                Err(EncodeError::OutputExhausted)
            }
        }
    }
}

impl<'b, F> ByteSink for BufferWriter<'b, F>
where
    F: FnMut(&'b mut [u8], usize) -> Option<&'b mut [u8]>,
{
    fn write_bytes(&mut self, mut bytes: &[u8]) -> Result<(), EncodeError> {
        while !bytes.is_empty() {
            let Some(buffer) = self.buffer.as_deref_mut() else {
                return Err(EncodeError::OutputExhausted);
            };
            let room = buffer.len() - self.filled;
            if room == 0 {
                self.flush_full()?;
                continue;
            }

            let count = room.min(bytes.len());
            buffer[self.filled..self.filled + count].copy_from_slice(&bytes[..count]);
            self.filled += count;
            self.written += count;
            bytes = &bytes[count..];
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use super::{BufferWriter, ByteSink};
    use crate::error::EncodeError;

    #[test]
    fn splits_across_buffers() {
        let mut chunks: Vec<Vec<u8>> = Vec::new();
        let mut buffer = [0u8; 3];

        let mut writer = BufferWriter::new(&mut buffer, |filled, len| {
            chunks.push(filled[..len].to_vec());
            Some(filled)
        });
        writer.write_u32(0x0403_0201).unwrap();
        writer.write_bytes(&[5, 6]).unwrap();
        assert_eq!(writer.written(), 6);
        assert_eq!(writer.finish(), 6);

        assert_eq!(chunks, vec![vec![1, 2, 3], vec![4, 5, 6]]);
    }

    #[test]
    fn callback_can_swap_buffers() {
        let mut first = [0u8; 2];
        let mut second = [0u8; 8];
        let mut spare = Some(&mut second[..]);
        let mut flushed = Vec::new();

        let mut writer = BufferWriter::new(&mut first, |filled, len| {
            flushed.extend_from_slice(&filled[..len]);
            spare.take()
        });
        writer.write_bytes(&[1, 2, 3, 4, 5]).unwrap();
        writer.finish();

        assert_eq!(flushed, [1, 2, 3, 4, 5]);
    }

    #[test]
    fn exhausted_when_callback_gives_up() {
        let mut buffer = [0u8; 2];
        let mut writer = BufferWriter::new(&mut buffer, |_, _| None);

        assert_eq!(writer.write_bytes(&[1, 2]), Ok(()));
        assert_eq!(writer.write_bytes(&[3]), Err(EncodeError::OutputExhausted));
        assert_eq!(writer.write_bytes(&[4]), Err(EncodeError::OutputExhausted));
    }

    #[test]
    fn empty_buffer_is_exhaustion() {
        let mut buffer = [0u8; 1];
        let mut writer = BufferWriter::new(&mut buffer, |filled, _| Some(&mut filled[..0]));

        assert_eq!(writer.write_bytes(&[1, 2]), Err(EncodeError::OutputExhausted));
    }

    #[test]
    fn returned_length_sets_the_next_capacity() {
        let mut lens = Vec::new();
        let mut buffer = [0u8; 4];

        let mut writer = BufferWriter::new(&mut buffer, |filled, len| {
            lens.push(len);
            Some(&mut filled[..2])
        });
        writer.write_bytes(&[7; 9]).unwrap();
        assert_eq!(writer.finish(), 9);

        assert_eq!(lens, [4, 2, 2, 1]);
    }
}
