// Bounds-checked little/big-endian reads over a borrowed buffer
// Every accessor fails with OutOfBounds instead of slicing past the end

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use mftparse_core::{MftError, MftResult};
use uuid::Uuid;

/// Read-only view over the bytes of one attribute record (or any NTFS structure).
#[derive(Debug, Clone, Copy)]
pub struct ByteReader<'a> {
    data: &'a [u8],
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The whole underlying buffer
    pub fn bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Borrow `length` bytes starting at `offset`
    pub fn slice(&self, offset: usize, length: usize) -> MftResult<&'a [u8]> {
        let out_of_bounds = || MftError::OutOfBounds {
            offset,
            width: length,
            len: self.data.len(),
        };

        let end = offset.checked_add(length).ok_or_else(out_of_bounds)?;
        if end > self.data.len() {
            return Err(out_of_bounds());
        }

        Ok(&self.data[offset..end])
    }

    pub fn read_u8(&self, offset: usize) -> MftResult<u8> {
        Ok(self.slice(offset, 1)?[0])
    }

    pub fn read_u16(&self, offset: usize) -> MftResult<u16> {
        Ok(LittleEndian::read_u16(self.slice(offset, 2)?))
    }

    pub fn read_u32(&self, offset: usize) -> MftResult<u32> {
        Ok(LittleEndian::read_u32(self.slice(offset, 4)?))
    }

    pub fn read_u64(&self, offset: usize) -> MftResult<u64> {
        Ok(LittleEndian::read_u64(self.slice(offset, 8)?))
    }

    pub fn read_u16_be(&self, offset: usize) -> MftResult<u16> {
        Ok(BigEndian::read_u16(self.slice(offset, 2)?))
    }

    pub fn read_u32_be(&self, offset: usize) -> MftResult<u32> {
        Ok(BigEndian::read_u32(self.slice(offset, 4)?))
    }

    pub fn read_u64_be(&self, offset: usize) -> MftResult<u64> {
        Ok(BigEndian::read_u64(self.slice(offset, 8)?))
    }

    /// Read a `width`-byte little-endian two's complement integer, sign bit in the
    /// most significant byte of the field. A zero-width field reads as 0.
    /// Widths above 8 do not fit an i64 and are reported as out of bounds.
    pub fn read_signed_le(&self, offset: usize, width: usize) -> MftResult<i64> {
        let bytes = self.slice(offset, width)?;

        match width {
            0 => Ok(0),
            1..=8 => Ok(LittleEndian::read_int(bytes, width)),
            _ => Err(MftError::OutOfBounds {
                offset,
                width,
                len: self.data.len(),
            }),
        }
    }

    /// Decode `length` bytes of UTF-16LE text
    pub fn read_utf16(&self, offset: usize, length: usize) -> MftResult<String> {
        decode_utf16le(self.slice(offset, length)?, offset)
    }

    /// Read a 16-byte GUID stored in Windows (mixed-endian) byte order
    pub fn read_uuid(&self, offset: usize) -> MftResult<Uuid> {
        let bytes = self.slice(offset, 16)?;
        Uuid::from_slice_le(bytes).map_err(|_| MftError::OutOfBounds {
            offset,
            width: 16,
            len: self.data.len(),
        })
    }
}

/// Split UTF-16LE bytes into code units, rejecting a dangling odd byte
pub(crate) fn utf16_units(bytes: &[u8], offset: usize) -> MftResult<Vec<u16>> {
    if bytes.len() % 2 != 0 {
        return Err(MftError::MalformedName { offset });
    }

    Ok(bytes.chunks_exact(2).map(LittleEndian::read_u16).collect())
}

/// Decode UTF-16LE bytes; `offset` is only used for error reporting
pub(crate) fn decode_utf16le(bytes: &[u8], offset: usize) -> MftResult<String> {
    String::from_utf16(&utf16_units(bytes, offset)?).map_err(|_| MftError::MalformedName { offset })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_width_reads() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        let reader = ByteReader::new(&data);

        assert_eq!(reader.read_u8(0).unwrap(), 0x01);
        assert_eq!(reader.read_u16(0).unwrap(), 0x0201);
        assert_eq!(reader.read_u32(0).unwrap(), 0x04030201);
        assert_eq!(reader.read_u64(0).unwrap(), 0x0807060504030201);
        assert_eq!(reader.read_u16_be(0).unwrap(), 0x0102);
        assert_eq!(reader.read_u32_be(4).unwrap(), 0x05060708);
        assert_eq!(reader.read_u64_be(0).unwrap(), 0x0102030405060708);
    }

    #[test]
    fn test_out_of_bounds() {
        let data = [0u8; 4];
        let reader = ByteReader::new(&data);

        assert!(reader.read_u32(0).is_ok());
        match reader.read_u32(1) {
            Err(MftError::OutOfBounds { offset, width, len }) => {
                assert_eq!((offset, width, len), (1, 4, 4));
            }
            other => panic!("expected OutOfBounds, got {:?}", other),
        }
        assert!(reader.read_u64(0).is_err());
        assert!(reader.read_u8(4).is_err());
        assert!(reader.slice(usize::MAX, 2).is_err());
    }

    #[test]
    fn test_signed_reads() {
        // 0x87 == -121, 0xF634 == -2508
        let data = [0x87, 0x34, 0xF6, 0x34, 0x56, 0x00];
        let reader = ByteReader::new(&data);

        assert_eq!(reader.read_signed_le(0, 1).unwrap(), -121);
        assert_eq!(reader.read_signed_le(1, 2).unwrap(), -2508);
        assert_eq!(reader.read_signed_le(3, 2).unwrap(), 0x5634);
        assert_eq!(reader.read_signed_le(3, 3).unwrap(), 0x5634);
        assert_eq!(reader.read_signed_le(0, 0).unwrap(), 0);
    }

    #[test]
    fn test_signed_read_full_width() {
        let data = 0x2132435445342312i64.to_le_bytes();
        let reader = ByteReader::new(&data);
        assert_eq!(reader.read_signed_le(0, 8).unwrap(), 0x2132435445342312);

        let data = (-2i64).to_le_bytes();
        let reader = ByteReader::new(&data);
        assert_eq!(reader.read_signed_le(0, 8).unwrap(), -2);
    }

    #[test]
    fn test_signed_read_too_wide() {
        let data = [0u8; 12];
        let reader = ByteReader::new(&data);
        assert!(reader.read_signed_le(0, 9).is_err());
    }

    #[test]
    fn test_utf16() {
        let data = [b't', 0, b'e', 0, b's', 0, b't', 0];
        let reader = ByteReader::new(&data);
        assert_eq!(reader.read_utf16(0, 8).unwrap(), "test");
        assert_eq!(reader.read_utf16(2, 4).unwrap(), "es");

        // Lone high surrogate
        let bad = [0x00, 0xD8, b'a', 0];
        let reader = ByteReader::new(&bad);
        assert!(matches!(reader.read_utf16(0, 4), Err(MftError::MalformedName { offset: 0 })));
        assert!(matches!(reader.read_utf16(0, 3), Err(MftError::MalformedName { .. })));
    }

    #[test]
    fn test_uuid() {
        let data = [
            0x33, 0x22, 0x11, 0x00, 0x55, 0x44, 0x77, 0x66,
            0x88, 0x99, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF,
        ];
        let reader = ByteReader::new(&data);
        let uuid = reader.read_uuid(0).unwrap();
        assert_eq!(uuid.to_string(), "00112233-4455-6677-8899-aabbccddeeff");
        assert!(reader.read_uuid(1).is_err());
    }
}
