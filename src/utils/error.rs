//! Error types for idx-prep

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum PrepError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Array error: {0}")]
    Array(#[from] ArrayError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// IDX source errors (cursor, header, decoder)
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Truncated input at offset {offset}: needed {needed} bytes, {available} available")]
    TruncatedInput {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Bad magic number: expected 0x{expected:08X}, found 0x{found:08X}")]
    BadMagicNumber { found: u32, expected: u32 },

    #[error("Invalid seek to offset {offset} (source length {len})")]
    InvalidSeek { offset: usize, len: usize },

    #[error("Failed to open {}: {source}", .path.display())]
    OpenFailed { path: PathBuf, source: io::Error },
}

/// Numeric buffer errors (normalization, stats, flat-array files)
#[derive(Error, Debug)]
pub enum ArrayError {
    #[error("Degenerate range: every element equals {value}")]
    DegenerateRange { value: f64 },

    #[error(
        "Size mismatch in {}: {byte_len} bytes with element size {element_size}{}",
        .path.display(),
        expected_suffix(.expected_count)
    )]
    SizeMismatch {
        path: PathBuf,
        byte_len: usize,
        element_size: usize,
        expected_count: Option<usize>,
    },

    #[error("Statistics requested on an empty buffer")]
    EmptyBuffer,

    #[error("Failed to write {}: {source}", .path.display())]
    IoWrite { path: PathBuf, source: io::Error },

    #[error("Failed to read {}: {source}", .path.display())]
    IoRead { path: PathBuf, source: io::Error },
}

fn expected_suffix(expected_count: &Option<usize>) -> String {
    match expected_count {
        Some(count) => format!(", expected {} elements", count),
        None => String::new(),
    }
}

/// Plan file errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unsupported plan version: {0}")]
    UnsupportedVersion(u32),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, PrepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_magic_message_is_hex() {
        let err = DatasetError::BadMagicNumber {
            found: 0x0802,
            expected: 0x0803,
        };
        assert_eq!(
            err.to_string(),
            "Bad magic number: expected 0x00000803, found 0x00000802"
        );
    }

    #[test]
    fn test_size_mismatch_message() {
        let err = ArrayError::SizeMismatch {
            path: PathBuf::from("X_tr.dat"),
            byte_len: 6,
            element_size: 4,
            expected_count: None,
        };
        assert_eq!(
            err.to_string(),
            "Size mismatch in X_tr.dat: 6 bytes with element size 4"
        );

        let err = ArrayError::SizeMismatch {
            path: PathBuf::from("y_tr.dat"),
            byte_len: 8,
            element_size: 1,
            expected_count: Some(10),
        };
        assert!(err.to_string().ends_with("expected 10 elements"));
    }

    #[test]
    fn test_prep_error_from_dataset_error() {
        let err: PrepError = DatasetError::InvalidSeek { offset: 20, len: 16 }.into();
        assert!(matches!(err, PrepError::Dataset(DatasetError::InvalidSeek { .. })));
    }
}
