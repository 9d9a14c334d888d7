use crate::binary::meta::{FieldMeta, OBJECT_META_LEN, ObjectMeta, is_object_meta};
use crate::error::DecodeError;

// -----------------------------------------------------------------------------
// ByteReader

/// A bounds-checked cursor over a binary stream.
#[derive(Clone)]
pub(crate) struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

/// The next record of a stream.
pub(crate) enum Record {
    Object(ObjectMeta),
    Field(FieldMeta),
}

impl<'a> ByteReader<'a> {
    #[inline]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    #[inline]
    pub fn at(bytes: &'a [u8], offset: usize) -> Self {
        Self { bytes, offset }
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.offset >= self.bytes.len()
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.offset)
    }

    #[inline]
    pub fn truncated(&self) -> DecodeError {
        DecodeError::TruncatedInput {
            offset: self.offset,
        }
    }

    #[inline]
    pub fn corrupt(&self, reason: &'static str) -> DecodeError {
        DecodeError::CorruptMetadata {
            offset: self.offset,
            reason,
        }
    }

    /// Consumes the next `len` bytes.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| self.truncated())?;
        let bytes = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(bytes)
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn peek_u32(&self) -> Result<u32, DecodeError> {
        self.clone().read_u32()
    }

    /// Reads a `u32` length prefix and the bytes it announces.
    pub fn read_prefixed(&mut self) -> Result<&'a [u8], DecodeError> {
        let len = self.read_u32()?;
        self.take(len as usize)
    }

    /// Reads an array element count.
    ///
    /// Counts that cannot fit the rest of the input, given the smallest
    /// encoding of one element, are rejected before anything is allocated.
    pub fn read_count(&mut self, min_element_len: usize) -> Result<usize, DecodeError> {
        let start = self.offset;
        let count = self.read_u32()? as usize;
        if count.saturating_mul(min_element_len) > self.remaining() {
            return Err(DecodeError::TruncatedInput { offset: start });
        }
        Ok(count)
    }

    /// Reads the next object or field record.
    pub fn read_record(&mut self) -> Result<Record, DecodeError> {
        let word = self.peek_u32()?;
        if is_object_meta(word) {
            self.read_object_meta().map(Record::Object)
        } else {
            let start = self.offset;
            self.offset += 4;
            FieldMeta::decode(word).map(Record::Field).map_err(|error| {
                DecodeError::CorruptMetadata {
                    offset: start,
                    reason: error.reason(),
                }
            })
        }
    }

    /// Reads an object record, failing on anything else.
    pub fn read_object_meta(&mut self) -> Result<ObjectMeta, DecodeError> {
        let start = self.offset;
        let word = self.read_u32()?;
        let type_uid = self.read_u32()?;
        ObjectMeta::decode(word, type_uid).ok_or(DecodeError::CorruptMetadata {
            offset: start,
            reason: "expected an object record, found a field record",
        })
    }

    /// Steps back over an object record just read.
    #[inline]
    pub fn unread_object_meta(&mut self) {
        self.offset -= OBJECT_META_LEN;
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{ByteReader, Record};
    use crate::error::DecodeError;

    #[test]
    fn reads_words_and_spans() {
        let bytes = [1, 0, 0, 0, 2, 0, 0, 0, 9, 8, 7];
        let mut reader = ByteReader::new(&bytes);

        assert_eq!(reader.peek_u32(), Ok(1));
        assert_eq!(reader.read_u32(), Ok(1));
        assert_eq!(reader.read_prefixed(), Ok(&[9, 8][..]));
        assert_eq!(reader.offset(), 10);
        assert_eq!(reader.take(2), Err(DecodeError::TruncatedInput { offset: 10 }));
        assert_eq!(reader.take(1), Ok(&[7][..]));
        assert!(reader.is_empty());
    }

    #[test]
    fn counts_must_fit_the_input() {
        let bytes = [3, 0, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8];
        assert_eq!(ByteReader::new(&bytes).read_count(2), Ok(3));
        assert_eq!(ByteReader::new(&bytes).read_count(4), Err(DecodeError::TruncatedInput { offset: 0 }));
        assert_eq!(ByteReader::new(&bytes).read_count(0), Ok(3));
    }

    #[test]
    fn distinguishes_records() {
        // Object 1 of type 5, then field 3 holding a u8.
        let bytes = [0x05, 0, 0, 0, 5, 0, 0, 0, 0x00, 0x01, 0x03, 0x00];
        let mut reader = ByteReader::new(&bytes);

        let Ok(Record::Object(object)) = reader.read_record() else {
            panic!("expected an object record");
        };
        assert_eq!(object.id, 1);
        assert!(!object.is_base);

        let Ok(Record::Field(field)) = reader.read_record() else {
            panic!("expected a field record");
        };
        assert_eq!(field.schema.id, 3);
        assert_eq!(field.schema.size, 1);
        assert!(reader.is_empty());
    }

    #[test]
    fn rejects_conflicting_kinds() {
        let bytes = 0x0001_0018u32.to_le_bytes();
        let mut reader = ByteReader::new(&bytes);
        assert!(matches!(
            reader.read_record(),
            Err(DecodeError::CorruptMetadata { offset: 0, .. })
        ));
    }
}
