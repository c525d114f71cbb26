//! Flat array files
//!
//! A flat array file is the raw native-endian bytes of a buffer's
//! elements and nothing else: no header, no length, no dtype tag. The
//! reader must be told the element type; reading with a different type
//! than was written yields wrong values, not an error.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use super::buffer::{DType, Element, NumericBuffer};
use crate::utils::ArrayError;

/// Elements encoded per write call
const WRITE_CHUNK: usize = 16 * 1024;

/// Reader/writer for headerless flat array files
pub struct FlatArrayCodec;

impl FlatArrayCodec {
    /// Write `buffer` to `path`, creating or truncating it
    ///
    /// On failure the file contents are unspecified.
    pub fn write<T: Element, P: AsRef<Path>>(
        path: P,
        buffer: &NumericBuffer<T>,
    ) -> Result<(), ArrayError> {
        let path = path.as_ref();
        let io_err = |source| ArrayError::IoWrite {
            path: path.to_path_buf(),
            source,
        };

        let file = File::create(path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        let mut scratch = Vec::with_capacity(WRITE_CHUNK * T::SIZE);

        for chunk in buffer.as_slice().chunks(WRITE_CHUNK) {
            scratch.clear();
            for &value in chunk {
                value.write_ne(&mut scratch);
            }
            writer.write_all(&scratch).map_err(io_err)?;
        }

        // Flush explicitly so errors surface here rather than in drop
        writer.flush().map_err(io_err)?;
        writer
            .into_inner()
            .map_err(|e| io_err(e.into_error()))?
            .sync_all()
            .map_err(io_err)?;

        debug!(
            "Wrote {} {} elements ({} bytes) to {}",
            buffer.len(),
            T::DTYPE,
            buffer.byte_len(),
            path.display()
        );
        Ok(())
    }

    /// Read a whole flat array file as elements of type `T`
    ///
    /// Fails with `SizeMismatch` when the file length is not a multiple of
    /// the element size, or when `expected_count` is given and differs
    /// from the derived element count.
    pub fn read<T: Element, P: AsRef<Path>>(
        path: P,
        expected_count: Option<usize>,
    ) -> Result<NumericBuffer<T>, ArrayError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| ArrayError::IoRead {
            path: path.to_path_buf(),
            source,
        })?;

        let mismatch = || ArrayError::SizeMismatch {
            path: path.to_path_buf(),
            byte_len: bytes.len(),
            element_size: T::SIZE,
            expected_count,
        };

        if bytes.len() % T::SIZE != 0 {
            return Err(mismatch());
        }
        let count = bytes.len() / T::SIZE;
        if expected_count.is_some_and(|expected| expected != count) {
            return Err(mismatch());
        }

        Ok(NumericBuffer::from_ne_bytes(&bytes))
    }

    /// Read with the element type chosen at runtime
    pub fn read_dtype<P: AsRef<Path>>(
        path: P,
        dtype: DType,
        expected_count: Option<usize>,
    ) -> Result<FlatArray, ArrayError> {
        Ok(match dtype {
            DType::Uint8 => FlatArray::Uint8(Self::read(path, expected_count)?),
            DType::Float32 => FlatArray::Float32(Self::read(path, expected_count)?),
        })
    }
}

/// A flat array whose element type was picked at runtime
#[derive(Debug, Clone, PartialEq)]
pub enum FlatArray {
    Uint8(NumericBuffer<u8>),
    Float32(NumericBuffer<f32>),
}

impl FlatArray {
    pub fn dtype(&self) -> DType {
        match self {
            FlatArray::Uint8(_) => DType::Uint8,
            FlatArray::Float32(_) => DType::Float32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FlatArray::Uint8(b) => b.len(),
            FlatArray::Float32(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// L2 norm of the element-wise difference of two buffers
///
/// Buffers of different lengths are compared over their common prefix;
/// callers check lengths first.
pub fn difference_norm<T: Element>(a: &NumericBuffer<T>, b: &NumericBuffer<T>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x.to_f64() - y.to_f64();
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f32_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("X_tr.dat");

        let buffer = NumericBuffer::from_vec(vec![0.0f32, 0.25, 0.5, 1.0]);
        FlatArrayCodec::write(&path, &buffer).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), 16);

        let read: NumericBuffer<f32> = FlatArrayCodec::read(&path, None).unwrap();
        assert_eq!(read, buffer);

        let read: NumericBuffer<f32> = FlatArrayCodec::read(&path, Some(4)).unwrap();
        assert_eq!(difference_norm(&read, &buffer), 0.0);
    }

    #[test]
    fn test_u8_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("y_tr.dat");

        let buffer = NumericBuffer::from_vec(vec![5u8, 0, 4, 1, 9]);
        FlatArrayCodec::write(&path, &buffer).unwrap();

        let read = FlatArrayCodec::read_dtype(&path, DType::Uint8, Some(5)).unwrap();
        assert_eq!(read, FlatArray::Uint8(buffer));
    }

    #[test]
    fn test_large_buffer_spans_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.dat");

        let data: Vec<f32> = (0..(WRITE_CHUNK * 2 + 17)).map(|i| i as f32 * 0.5).collect();
        let buffer = NumericBuffer::from_vec(data);
        FlatArrayCodec::write(&path, &buffer).unwrap();

        let read: NumericBuffer<f32> = FlatArrayCodec::read(&path, Some(buffer.len())).unwrap();
        assert_eq!(read, buffer);
    }

    #[test]
    fn test_write_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("y.dat");

        FlatArrayCodec::write(&path, &NumericBuffer::from_vec(vec![1u8; 100])).unwrap();
        FlatArrayCodec::write(&path, &NumericBuffer::from_vec(vec![2u8; 3])).unwrap();

        let read: NumericBuffer<u8> = FlatArrayCodec::read(&path, None).unwrap();
        assert_eq!(read.as_slice(), &[2, 2, 2]);
    }

    #[test]
    fn test_size_mismatch_not_multiple() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("odd.dat");
        fs::write(&path, [0u8; 6]).unwrap();

        let err = FlatArrayCodec::read::<f32, _>(&path, None).unwrap_err();
        assert!(matches!(
            err,
            ArrayError::SizeMismatch {
                byte_len: 6,
                element_size: 4,
                expected_count: None,
                ..
            }
        ));
    }

    #[test]
    fn test_size_mismatch_expected_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eight.dat");
        fs::write(&path, [0u8; 8]).unwrap();

        let err = FlatArrayCodec::read::<f32, _>(&path, Some(3)).unwrap_err();
        assert!(matches!(
            err,
            ArrayError::SizeMismatch {
                expected_count: Some(3),
                ..
            }
        ));
    }

    #[test]
    fn test_dtype_mismatch_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("X.dat");
        FlatArrayCodec::write(&path, &NumericBuffer::from_vec(vec![1.0f32, 2.0])).unwrap();

        // Same bytes, wrong type: no error, just different values
        let read: NumericBuffer<u8> = FlatArrayCodec::read(&path, None).unwrap();
        assert_eq!(read.len(), 8);
    }

    #[test]
    fn test_read_missing_file() {
        let err = FlatArrayCodec::read::<u8, _>("/nonexistent/y.dat", None).unwrap_err();
        assert!(matches!(err, ArrayError::IoRead { .. }));
    }

    #[test]
    fn test_write_to_missing_directory() {
        let buffer = NumericBuffer::from_vec(vec![1u8]);
        let err = FlatArrayCodec::write("/nonexistent/dir/y.dat", &buffer).unwrap_err();
        assert!(matches!(err, ArrayError::IoWrite { .. }));
    }
}
