//! Record decoder over a validated IDX source
//!
//! Yields one record per `next_record` call, reading the whole record
//! with a single bulk `read_exact`. The sequence is finite (the header's
//! item count) and not restartable: it consumes the cursor.

use super::cursor::ByteCursor;
use super::header::{HeaderSchema, RecordFileHeader};
use crate::array::NumericBuffer;
use crate::utils::DatasetError;

/// One decoded record, borrowing from the source bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Record<'a> {
    /// Row-major pixel grid
    Image {
        rows: usize,
        cols: usize,
        pixels: &'a [u8],
    },
    /// A single label byte. Values outside 0..=9 are passed through.
    Label(u8),
}

impl<'a> Record<'a> {
    /// Interpret one record's bytes according to the header dims
    pub(crate) fn from_bytes(dims: &[u32], bytes: &'a [u8]) -> Self {
        match dims {
            [] => Record::Label(bytes[0]),
            [rows, cols] => Record::Image {
                rows: *rows as usize,
                cols: *cols as usize,
                pixels: bytes,
            },
            // IdxDecoder::new accepts any header, so ranks other than 0
            // and 2 can arrive here; they are flattened to a single row
            _ => Record::Image {
                rows: 1,
                cols: bytes.len(),
                pixels: bytes,
            },
        }
    }

    /// Pixel bytes of an image record
    pub fn pixels(&self) -> Option<&'a [u8]> {
        match *self {
            Record::Image { pixels, .. } => Some(pixels),
            Record::Label(_) => None,
        }
    }

    /// Number of elements in the record
    pub fn len(&self) -> usize {
        match self {
            Record::Image { pixels, .. } => pixels.len(),
            Record::Label(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pixel row `r` of an image record
    pub fn row(&self, r: usize) -> Option<&'a [u8]> {
        match *self {
            Record::Image { rows, cols, pixels } if r < rows => {
                Some(&pixels[r * cols..(r + 1) * cols])
            }
            _ => None,
        }
    }

    /// Label value, if this is a label record
    pub fn label(&self) -> Option<u8> {
        match self {
            Record::Label(value) => Some(*value),
            Record::Image { .. } => None,
        }
    }
}

/// Streaming decoder for fixed-size IDX records
#[derive(Debug)]
pub struct IdxDecoder<'a> {
    cursor: ByteCursor<'a>,
    header: RecordFileHeader,
    record_len: usize,
    /// Records handed out so far
    decoded: u32,
    /// Set after the first failed read; the sequence ends there
    failed: bool,
}

impl<'a> IdxDecoder<'a> {
    /// Create a decoder from a cursor already positioned past `header`
    pub fn new(cursor: ByteCursor<'a>, header: RecordFileHeader) -> Self {
        let record_len = header.record_len();
        Self {
            cursor,
            header,
            record_len,
            decoded: 0,
            failed: false,
        }
    }

    /// Validate the header of `bytes` against `schema` and decode the rest
    pub fn from_bytes(bytes: &'a [u8], schema: &HeaderSchema) -> Result<Self, DatasetError> {
        let mut cursor = ByteCursor::new(bytes);
        let header = schema.validate(&mut cursor)?;
        Ok(Self::new(cursor, header))
    }

    /// Header this decoder was built from
    pub fn header(&self) -> &RecordFileHeader {
        &self.header
    }

    /// Bytes per record
    #[inline]
    pub fn record_len(&self) -> usize {
        self.record_len
    }

    /// Records not yet decoded
    #[inline]
    pub fn records_left(&self) -> u32 {
        self.header.item_count - self.decoded
    }

    /// Bytes in the source beyond the declared records
    ///
    /// These are never read; the header's item count wins over file length.
    pub fn trailing_bytes(&self) -> usize {
        self.cursor.remaining().saturating_sub(self.declared_len())
    }

    /// Decode the next record
    ///
    /// Returns `Ok(None)` once `item_count` records have been produced.
    pub fn next_record(&mut self) -> Result<Option<Record<'a>>, DatasetError> {
        if self.failed || self.decoded >= self.header.item_count {
            return Ok(None);
        }

        let bytes = match self.cursor.read_exact(self.record_len) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.failed = true;
                return Err(e);
            }
        };
        self.decoded += 1;

        Ok(Some(Record::from_bytes(&self.header.dims, bytes)))
    }

    /// Read every remaining record into one contiguous buffer
    ///
    /// The declared length is checked against the source before anything
    /// is allocated. On failure the error names the first record that
    /// does not fit, exactly as `next_record` would, and no buffer is
    /// returned.
    pub fn decode_all(mut self) -> Result<NumericBuffer<u8>, DatasetError> {
        let total = self.declared_len();
        if total > self.cursor.remaining() {
            return Err(self.truncation_error());
        }

        let bytes = self.cursor.read_exact(total)?;
        Ok(NumericBuffer::from_vec(bytes.to_vec()))
    }

    /// Bytes the remaining records occupy, saturating at `usize::MAX`
    fn declared_len(&self) -> usize {
        (self.records_left() as usize).saturating_mul(self.record_len)
    }

    /// Truncation at the first remaining record that does not fit
    fn truncation_error(&self) -> DatasetError {
        let available = self.cursor.remaining();
        let whole = available.checked_div(self.record_len).unwrap_or(0);
        let consumed = whole * self.record_len;
        DatasetError::TruncatedInput {
            offset: self.cursor.position() + consumed,
            needed: self.record_len,
            available: available - consumed,
        }
    }
}

impl<'a> Iterator for IdxDecoder<'a> {
    type Item = Result<Record<'a>, DatasetError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        let left = self.records_left() as usize;
        (0, Some(left))
    }
}

impl std::iter::FusedIterator for IdxDecoder<'_> {}
