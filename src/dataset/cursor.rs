//! Sequential / random-access reader over a fixed byte source
//!
//! The cursor borrows its source (a memory map or an in-memory buffer),
//! so `read_exact` hands back sub-slices without copying.

use crate::utils::DatasetError;

/// Cursor over a byte slice with big-endian integer reads
#[derive(Debug, Clone, Copy)]
pub struct ByteCursor<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteCursor<'a> {
    /// Create a cursor positioned at offset 0
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Current absolute offset
    #[inline]
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Total source length in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of unread bytes
    #[inline]
    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.offset)
    }

    /// Read the next `n` bytes, advancing by `n`
    ///
    /// Fails with `TruncatedInput` without moving the cursor when fewer
    /// than `n` bytes remain.
    pub fn read_exact(&mut self, n: usize) -> Result<&'a [u8], DatasetError> {
        let available = self.remaining();
        if n > available {
            return Err(DatasetError::TruncatedInput {
                offset: self.offset,
                needed: n,
                available,
            });
        }
        let start = self.offset;
        self.offset += n;
        Ok(&self.bytes[start..start + n])
    }

    /// Read a fixed-size array
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DatasetError> {
        let bytes = self.read_exact(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Read an unsigned 32-bit big-endian integer (MSB first)
    pub fn read_u32_be(&mut self) -> Result<u32, DatasetError> {
        Ok(u32::from_be_bytes(self.read_array::<4>()?))
    }

    /// Read one unsigned byte
    pub fn read_u8(&mut self) -> Result<u8, DatasetError> {
        Ok(self.read_exact(1)?[0])
    }

    /// Reposition to an absolute offset
    ///
    /// Seeking exactly to the end is allowed; anything past it is not.
    pub fn seek(&mut self, offset: usize) -> Result<(), DatasetError> {
        if offset > self.bytes.len() {
            return Err(DatasetError::InvalidSeek {
                offset,
                len: self.bytes.len(),
            });
        }
        self.offset = offset;
        Ok(())
    }
}

impl<'a> From<&'a [u8]> for ByteCursor<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        ByteCursor::new(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_u32_be_is_msb_first() {
        let bytes = [0x00, 0x00, 0x08, 0x03, 0xFF, 0xFF, 0xFF, 0xFF];
        let mut cursor = ByteCursor::new(&bytes);
        assert_eq!(cursor.read_u32_be().unwrap(), 2051);
        // No sign extension
        assert_eq!(cursor.read_u32_be().unwrap(), u32::MAX);
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn test_read_exact_advances() {
        let bytes = [1u8, 2, 3, 4, 5];
        let mut cursor = ByteCursor::new(&bytes);
        assert_eq!(cursor.read_exact(2).unwrap(), &[1, 2]);
        assert_eq!(cursor.position(), 2);
        assert_eq!(cursor.read_u8().unwrap(), 3);
        assert_eq!(cursor.remaining(), 2);
    }

    #[test]
    fn test_truncated_read_reports_offset() {
        let bytes = [1u8, 2, 3];
        let mut cursor = ByteCursor::new(&bytes);
        cursor.read_u8().unwrap();

        let err = cursor.read_u32_be().unwrap_err();
        match err {
            DatasetError::TruncatedInput {
                offset,
                needed,
                available,
            } => {
                assert_eq!(offset, 1);
                assert_eq!(needed, 4);
                assert_eq!(available, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        // Position is untouched by the failed read
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn test_seek() {
        let bytes = [10u8, 20, 30, 40];
        let mut cursor = ByteCursor::new(&bytes);

        cursor.seek(3).unwrap();
        assert_eq!(cursor.read_u8().unwrap(), 40);

        cursor.seek(0).unwrap();
        assert_eq!(cursor.read_u8().unwrap(), 10);

        cursor.seek(4).unwrap();
        assert_eq!(cursor.remaining(), 0);

        assert!(matches!(
            cursor.seek(5),
            Err(DatasetError::InvalidSeek { offset: 5, len: 4 })
        ));
    }

    #[test]
    fn test_empty_source() {
        let mut cursor = ByteCursor::new(&[]);
        assert!(cursor.is_empty());
        assert!(cursor.read_u8().is_err());
    }
}
