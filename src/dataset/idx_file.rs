//! Memory-mapped IDX file
//!
//! The file is mapped read-only and its header validated once at open.
//! Records are read through `ByteCursor`s borrowing the mapping, so
//! decoding never copies more than the output buffer itself.

use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use tracing::debug;

use super::cursor::ByteCursor;
use super::decoder::{IdxDecoder, Record};
use super::header::{HeaderSchema, RecordFileHeader};
use crate::array::NumericBuffer;
use crate::utils::DatasetError;

/// An opened and header-validated IDX file
///
/// The file handle is closed once the mapping exists; the mapping is
/// released when this value is dropped.
pub struct IdxFile {
    mmap: Mmap,
    path: PathBuf,
    header: RecordFileHeader,
    record_len: usize,
}

impl IdxFile {
    /// Open `path` and validate its header against `schema`
    pub fn open<P: AsRef<Path>>(path: P, schema: &HeaderSchema) -> Result<Self, DatasetError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| DatasetError::OpenFailed {
            path: path.clone(),
            source,
        })?;

        // SAFETY: The mapping is read-only and never written through
        let mmap = unsafe { Mmap::map(&file) }.map_err(|source| DatasetError::OpenFailed {
            path: path.clone(),
            source,
        })?;
        drop(file);

        let header = schema.validate(&mut ByteCursor::new(&mmap))?;
        let record_len = header.record_len();

        let idx = Self {
            mmap,
            path,
            header,
            record_len,
        };

        let trailing = idx.trailing_bytes();
        if trailing > 0 {
            debug!(
                "{}: {} bytes past the declared {} records are ignored",
                idx.path.display(),
                trailing,
                idx.header.item_count
            );
        }

        Ok(idx)
    }

    /// Open an image file (magic 0x803, rows x cols records)
    pub fn open_images<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        Self::open(path, &HeaderSchema::IMAGES)
    }

    /// Open a label file (magic 0x801, one byte per record)
    pub fn open_labels<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        Self::open(path, &HeaderSchema::LABELS)
    }

    // === Accessors ===

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &RecordFileHeader {
        &self.header
    }

    #[inline]
    pub fn item_count(&self) -> u32 {
        self.header.item_count
    }

    #[inline]
    pub fn record_len(&self) -> usize {
        self.record_len
    }

    /// Mapped file size in bytes
    pub fn file_len(&self) -> usize {
        self.mmap.len()
    }

    /// Bytes beyond the header-declared payload
    pub fn trailing_bytes(&self) -> usize {
        self.file_len().saturating_sub(self.declared_len())
    }

    // === Decoding ===

    /// Cursor positioned at the first record
    pub fn cursor(&self) -> ByteCursor<'_> {
        let mut cursor = ByteCursor::new(&self.mmap);
        let seeked = cursor.seek(self.header.header_len());
        debug_assert!(seeked.is_ok(), "validated header lies within the mapping");
        cursor
    }

    /// Lazy record sequence from the first record
    pub fn decoder(&self) -> IdxDecoder<'_> {
        IdxDecoder::new(self.cursor(), self.header.clone())
    }

    /// Decode every record into one contiguous u8 buffer
    pub fn decode_all(&self) -> Result<NumericBuffer<u8>, DatasetError> {
        self.decoder().decode_all()
    }

    /// Random access to record `k` (0-based)
    pub fn record(&self, k: u32) -> Result<Record<'_>, DatasetError> {
        let offset = (k as usize)
            .saturating_mul(self.record_len)
            .saturating_add(self.header.header_len());
        if k >= self.header.item_count {
            return Err(DatasetError::InvalidSeek {
                offset,
                len: self.declared_len(),
            });
        }

        let mut cursor = ByteCursor::new(&self.mmap);
        cursor.seek(offset)?;
        let bytes = cursor.read_exact(self.record_len)?;
        Ok(Record::from_bytes(&self.header.dims, bytes))
    }

    /// Header plus declared payload, saturating at `usize::MAX`
    fn declared_len(&self) -> usize {
        self.header.header_len().saturating_add(self.header.payload_len())
    }

    /// One-line description for logs
    pub fn summary(&self) -> String {
        format!(
            "{}: {}, {} bytes",
            self.path.display(),
            self.header.summary(),
            self.file_len()
        )
    }
}
