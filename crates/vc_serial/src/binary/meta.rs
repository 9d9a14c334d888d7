//! Record layouts of the binary stream.
//!
//! A stream is a sequence of records. The low bit of the first word tells
//! them apart:
//!
//! ```text
//! object meta (8 bytes)  IIII IIII IIII IIII IIII IIII IIII IIBO  + u32 type id
//! field meta  (4 bytes)  FFFF FFFF FFFF FFFF SSSS SSSS xTYP DCA0
//!
//! I - object id (30 bits)      F - field id
//! B - base class segment       S - static size of a plain value
//! O - object record            T - terminator
//!                              Y - dynamic size
//!                              P - pointer       C - reflectable
//!                              D - data block    A - array
//! ```
//!
//! All words are little-endian.

use vc_rtti::TypeUid;
use vc_rtti::schema::{FieldKind, FieldSchema};

// -----------------------------------------------------------------------------
// Constants

/// The largest persistent object id.
pub const MAX_OBJECT_ID: u32 = (1 << 30) - 1;

/// The size of an object meta record.
pub const OBJECT_META_LEN: usize = 8;

/// The size of a field meta record.
pub const FIELD_META_LEN: usize = 4;

const OBJECT_BIT: u32 = 0x01;
const BASE_BIT: u32 = 0x02;

const ARRAY_BIT: u32 = 0x02;
const DATA_BLOCK_BIT: u32 = 0x04;
const REFLECTABLE_BIT: u32 = 0x08;
const POINTER_BIT: u32 = 0x10;
const DYNAMIC_BIT: u32 = 0x20;
const TERMINATOR_BIT: u32 = 0x40;

const KIND_BITS: u32 = DATA_BLOCK_BIT | REFLECTABLE_BIT | POINTER_BIT;

/// Returns `true` if `word` starts an object meta record.
#[inline]
pub const fn is_object_meta(word: u32) -> bool {
    word & OBJECT_BIT != 0
}

// -----------------------------------------------------------------------------
// ObjectMeta

/// The header of one segment of an object.
///
/// Each level of an object's base chain gets its own segment. The first
/// segment of an object is not a base segment; the following ones are.
/// Embedded values use object id `0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObjectMeta {
    pub id: u32,
    pub type_uid: TypeUid,
    pub is_base: bool,
}

impl ObjectMeta {
    /// Encodes the record. `id` must not exceed [`MAX_OBJECT_ID`].
    #[inline]
    pub fn encode(&self) -> [u8; OBJECT_META_LEN] {
        debug_assert!(self.id <= MAX_OBJECT_ID);
        let base = if self.is_base { BASE_BIT } else { 0 };
        let word = (self.id << 2) | base | OBJECT_BIT;
        let mut out = [0; OBJECT_META_LEN];
        out[..4].copy_from_slice(&word.to_le_bytes());
        out[4..].copy_from_slice(&self.type_uid.get().to_le_bytes());
        out
    }

    /// Decodes a record from its two words. Returns `None` for a field record.
    #[inline]
    pub fn decode(word: u32, type_uid: u32) -> Option<Self> {
        if !is_object_meta(word) {
            return None;
        }
        Some(Self {
            id: (word >> 2) & MAX_OBJECT_ID,
            type_uid: TypeUid::new(type_uid),
            is_base: word & BASE_BIT != 0,
        })
    }
}

// -----------------------------------------------------------------------------
// FieldMeta

/// The header of one field, or the terminator of an embedded value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldMeta {
    pub schema: FieldSchema,
    pub terminator: bool,
}

/// Why a word is not a valid field record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldMetaError {
    ObjectRecord,
    ConflictingKinds,
}

impl FieldMetaError {
    pub const fn reason(self) -> &'static str {
        match self {
            FieldMetaError::ObjectRecord => "expected a field record, found an object record",
            FieldMetaError::ConflictingKinds => "field record sets more than one kind bit",
        }
    }
}

impl FieldMeta {
    /// The record closing an embedded value.
    pub const TERMINATOR: u32 = TERMINATOR_BIT;

    /// Encodes a field record.
    pub fn encode(schema: &FieldSchema) -> u32 {
        let kind = match schema.kind {
            FieldKind::Plain => 0,
            FieldKind::Reflectable => REFLECTABLE_BIT,
            FieldKind::ReflectablePointer => POINTER_BIT,
            FieldKind::DataBlock => DATA_BLOCK_BIT,
        };
        let size = if schema.dynamic { 0 } else { schema.size as u32 };
        let array = if schema.is_array { ARRAY_BIT } else { 0 };
        let dynamic = if schema.dynamic { DYNAMIC_BIT } else { 0 };
        ((schema.id as u32) << 16) | (size << 8) | kind | array | dynamic
    }

    /// Decodes a field record.
    pub fn decode(word: u32) -> Result<Self, FieldMetaError> {
        if is_object_meta(word) {
            return Err(FieldMetaError::ObjectRecord);
        }
        let kind = match word & KIND_BITS {
            0 => FieldKind::Plain,
            REFLECTABLE_BIT => FieldKind::Reflectable,
            POINTER_BIT => FieldKind::ReflectablePointer,
            DATA_BLOCK_BIT => FieldKind::DataBlock,
            _ => return Err(FieldMetaError::ConflictingKinds),
        };
        Ok(Self {
            schema: FieldSchema {
                id: (word >> 16) as u16,
                kind,
                is_array: word & ARRAY_BIT != 0,
                size: ((word >> 8) & 0xFF) as u8,
                dynamic: word & DYNAMIC_BIT != 0,
            },
            terminator: word & TERMINATOR_BIT != 0,
        })
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use vc_rtti::TypeUid;
    use vc_rtti::schema::{FieldKind, FieldSchema};

    use super::{FieldMeta, FieldMetaError, MAX_OBJECT_ID, ObjectMeta, is_object_meta};

    #[test]
    fn object_meta_layout() {
        let meta = ObjectMeta {
            id: 3,
            type_uid: TypeUid::new(0x0102_0304),
            is_base: true,
        };
        let bytes = meta.encode();
        assert_eq!(bytes, [0x0F, 0, 0, 0, 0x04, 0x03, 0x02, 0x01]);

        let word = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        assert!(is_object_meta(word));
        assert_eq!(ObjectMeta::decode(word, 0x0102_0304), Some(meta));
        assert_eq!(ObjectMeta::decode(0x40, 0), None);
    }

    #[test]
    fn object_meta_max_id() {
        let meta = ObjectMeta {
            id: MAX_OBJECT_ID,
            type_uid: TypeUid::new(1),
            is_base: false,
        };
        let bytes = meta.encode();
        let word = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        assert_eq!(word, 0xFFFF_FFFD);
        assert_eq!(ObjectMeta::decode(word, 1).unwrap().id, MAX_OBJECT_ID);
    }

    #[test]
    fn field_meta_layout() {
        let schema = FieldSchema {
            id: 7,
            kind: FieldKind::Plain,
            is_array: true,
            size: 12,
            dynamic: false,
        };
        let word = FieldMeta::encode(&schema);
        assert_eq!(word, 0x0007_0C02);
        assert_eq!(
            FieldMeta::decode(word),
            Ok(FieldMeta {
                schema,
                terminator: false
            })
        );

        let pointer = FieldSchema {
            id: 2,
            kind: FieldKind::ReflectablePointer,
            is_array: false,
            size: 0,
            dynamic: false,
        };
        assert_eq!(FieldMeta::encode(&pointer), 0x0002_0010);

        let text = FieldSchema {
            id: 1,
            kind: FieldKind::Plain,
            is_array: false,
            size: 0,
            dynamic: true,
        };
        assert_eq!(FieldMeta::encode(&text), 0x0001_0020);
    }

    #[test]
    fn terminator_and_invalid_records() {
        let terminator = FieldMeta::decode(FieldMeta::TERMINATOR).unwrap();
        assert!(terminator.terminator);
        assert_eq!(terminator.schema.id, 0);

        assert_eq!(FieldMeta::decode(0x01), Err(FieldMetaError::ObjectRecord));
        assert_eq!(
            FieldMeta::decode(0x0001_0018),
            Err(FieldMetaError::ConflictingKinds)
        );
    }
}
