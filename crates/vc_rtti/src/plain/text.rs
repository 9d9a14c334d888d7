use alloc::string::String;
use alloc::vec::Vec;

use super::{PlainError, PlainSize, PlainType};

impl PlainType for String {
    const SIZE: PlainSize = PlainSize::Dynamic;

    #[inline]
    fn dynamic_size(&self) -> u32 {
        self.len() as u32
    }

    #[inline]
    fn write_bytes(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.as_bytes());
    }

    fn read_bytes(bytes: &[u8]) -> Result<Self, PlainError> {
        String::from_utf8(bytes.to_vec()).map_err(|_| PlainError::Utf8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_round_trip_and_validation() {
        let text = String::from("héllo");
        let mut out = Vec::new();
        text.write_bytes(&mut out);
        assert_eq!(text.dynamic_size() as usize, out.len());
        assert_eq!(String::read_bytes(&out), Ok(text));
        assert_eq!(String::read_bytes(&[0xFF, 0xFE]), Err(PlainError::Utf8));
    }
}
