//! IDX header structure and schema validation
//!
//! An IDX file starts with a big-endian u32 magic number, a u32 item
//! count, then one u32 per dimension of a single record. The two
//! variants handled here:
//!
//! ```text
//! images: [magic 0x00000803][count][rows][cols][count*rows*cols u8]
//! labels: [magic 0x00000801][count][count u8]
//! ```

use super::cursor::ByteCursor;
use crate::utils::DatasetError;

/// Magic number of an IDX image file (u8 data, 3 dimensions)
pub const IMAGE_MAGIC: u32 = 0x0000_0803;

/// Magic number of an IDX label file (u8 data, 1 dimension)
pub const LABEL_MAGIC: u32 = 0x0000_0801;

/// Static descriptor of an expected header layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderSchema {
    /// Magic number the file must start with
    pub expected_magic: u32,
    /// Number of per-record dimension fields after the item count
    pub dim_count: u32,
}

impl HeaderSchema {
    /// Image files: magic 0x803, rows and cols
    pub const IMAGES: HeaderSchema = HeaderSchema {
        expected_magic: IMAGE_MAGIC,
        dim_count: 2,
    };

    /// Label files: magic 0x801, no per-record dims
    pub const LABELS: HeaderSchema = HeaderSchema {
        expected_magic: LABEL_MAGIC,
        dim_count: 0,
    };

    /// Header size in bytes: magic + count + dims
    pub fn header_len(&self) -> usize {
        4 * (2 + self.dim_count as usize)
    }

    /// Read and validate a header from the cursor's current position
    ///
    /// Only the magic number is checked. Item count and dims are taken as
    /// declared; matching them against expected dataset sizes is up to
    /// the caller.
    pub fn validate(&self, cursor: &mut ByteCursor<'_>) -> Result<RecordFileHeader, DatasetError> {
        let magic = cursor.read_u32_be()?;
        if magic != self.expected_magic {
            return Err(DatasetError::BadMagicNumber {
                found: magic,
                expected: self.expected_magic,
            });
        }

        let item_count = cursor.read_u32_be()?;
        let dims = (0..self.dim_count)
            .map(|_| cursor.read_u32_be())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RecordFileHeader {
            magic,
            item_count,
            dims,
        })
    }
}

/// A validated IDX header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFileHeader {
    pub magic: u32,
    pub item_count: u32,
    /// Per-record dims (rows, cols for images; empty for labels)
    pub dims: Vec<u32>,
}

impl RecordFileHeader {
    /// Serialized header length in bytes
    pub fn header_len(&self) -> usize {
        4 * (2 + self.dims.len())
    }

    /// Bytes per record: product of dims, 1 for scalar records
    ///
    /// Saturates at `usize::MAX`, a length no source can hold, so an
    /// oversized header always ends in `TruncatedInput`.
    pub fn record_len(&self) -> usize {
        self.dims
            .iter()
            .fold(1usize, |len, &d| len.saturating_mul(d as usize))
    }

    /// Total payload bytes declared by the header, saturating like `record_len`
    pub fn payload_len(&self) -> usize {
        (self.item_count as usize).saturating_mul(self.record_len())
    }

    /// Encode back to big-endian header bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.header_len());
        out.extend_from_slice(&self.magic.to_be_bytes());
        out.extend_from_slice(&self.item_count.to_be_bytes());
        for dim in &self.dims {
            out.extend_from_slice(&dim.to_be_bytes());
        }
        out
    }

    /// Short human-readable description
    pub fn summary(&self) -> String {
        let kind = match self.magic {
            IMAGE_MAGIC => "images",
            LABEL_MAGIC => "labels",
            _ => "records",
        };
        if self.dims.is_empty() {
            format!("{} {} (magic=0x{:08X})", self.item_count, kind, self.magic)
        } else {
            let shape = self
                .dims
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join("x");
            format!(
                "{} {} of {} (magic=0x{:08X})",
                self.item_count, kind, shape, self.magic
            )
        }
    }
}
