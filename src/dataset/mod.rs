//! IDX dataset decoding
//!
//! IDX files start with a big-endian header (magic, item count, then one
//! u32 per record dimension) followed by `item_count` fixed-size records
//! of unsigned bytes. Files are memory-mapped and decoded through a
//! bounds-checked `ByteCursor`, so records are borrowed straight from the
//! mapping until they are copied into a `NumericBuffer`.

pub mod cursor;
pub mod decoder;
pub mod header;
pub mod idx_file;

pub use cursor::ByteCursor;
pub use decoder::{IdxDecoder, Record};
pub use header::{HeaderSchema, RecordFileHeader, IMAGE_MAGIC, LABEL_MAGIC};
pub use idx_file::IdxFile;
