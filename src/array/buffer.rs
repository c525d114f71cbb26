//! Homogeneous numeric buffers
//!
//! `NumericBuffer<T>` owns a contiguous run of elements of one type. The
//! `Element` trait carries what the codec and statistics need to know
//! about that type: its dtype tag, byte width, native-endian encoding and
//! widening to f64.

use std::fmt;

use clap::ValueEnum;
use serde::Deserialize;

/// Element data type, as named in plans and on the command line
#[derive(Debug, Clone, Copy, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    #[serde(alias = "u8")]
    #[value(alias = "u8")]
    Uint8,
    #[serde(alias = "f32")]
    #[value(alias = "f32")]
    Float32,
}

impl DType {
    /// Get byte size for this data type
    pub fn byte_size(&self) -> usize {
        match self {
            DType::Uint8 => 1,
            DType::Float32 => 4,
        }
    }

    /// Get string representation for display
    pub fn as_str(&self) -> &'static str {
        match self {
            DType::Uint8 => "uint8",
            DType::Float32 => "float32",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scalar type that can live in a `NumericBuffer`
pub trait Element: Copy + PartialOrd + fmt::Debug + Send + Sync + 'static {
    /// Dtype tag for this element type
    const DTYPE: DType;
    /// Size in bytes of one element
    const SIZE: usize;

    /// Append the native-endian encoding of `self`
    fn write_ne(self, out: &mut Vec<u8>);

    /// Decode from exactly `SIZE` native-endian bytes
    fn read_ne(bytes: &[u8]) -> Self;

    /// Widen to f64 for statistics
    fn to_f64(self) -> f64;
}

impl Element for u8 {
    const DTYPE: DType = DType::Uint8;
    const SIZE: usize = 1;

    #[inline]
    fn write_ne(self, out: &mut Vec<u8>) {
        out.push(self);
    }

    #[inline]
    fn read_ne(bytes: &[u8]) -> Self {
        bytes[0]
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Element for f32 {
    const DTYPE: DType = DType::Float32;
    const SIZE: usize = 4;

    #[inline]
    fn write_ne(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_ne_bytes());
    }

    #[inline]
    fn read_ne(bytes: &[u8]) -> Self {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&bytes[..4]);
        f32::from_ne_bytes(raw)
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }
}

/// Fixed-length, exclusively owned sequence of `T`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NumericBuffer<T: Element> {
    data: Vec<T>,
}

impl<T: Element> NumericBuffer<T> {
    /// Take ownership of `data`
    pub fn from_vec(data: Vec<T>) -> Self {
        Self { data }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Element type tag
    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    /// Size of the buffer's elements in bytes
    pub fn byte_len(&self) -> usize {
        self.data.len() * T::SIZE
    }

    /// Native-endian byte encoding of every element, in order
    pub fn to_ne_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_len());
        for &value in &self.data {
            value.write_ne(&mut out);
        }
        out
    }

    /// Rebuild from native-endian bytes; `bytes.len()` must be a multiple of `T::SIZE`
    pub(crate) fn from_ne_bytes(bytes: &[u8]) -> Self {
        let data = bytes.chunks_exact(T::SIZE).map(T::read_ne).collect();
        Self { data }
    }
}

impl<T: Element> From<Vec<T>> for NumericBuffer<T> {
    fn from(data: Vec<T>) -> Self {
        Self::from_vec(data)
    }
}

impl<T: Element> AsRef<[T]> for NumericBuffer<T> {
    fn as_ref(&self) -> &[T] {
        &self.data
    }
}

impl<'a, T: Element> IntoIterator for &'a NumericBuffer<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_size() {
        assert_eq!(DType::Uint8.byte_size(), 1);
        assert_eq!(DType::Float32.byte_size(), 4);
        assert_eq!(<f32 as Element>::SIZE, std::mem::size_of::<f32>());
    }

    #[test]
    fn test_dtype_parse() {
        let dtype: DType = serde_yaml::from_str("float32").unwrap();
        assert_eq!(dtype, DType::Float32);
        let dtype: DType = serde_yaml::from_str("u8").unwrap();
        assert_eq!(dtype, DType::Uint8);
    }

    #[test]
    fn test_native_bytes() {
        let buffer = NumericBuffer::from_vec(vec![1.0f32, -2.5]);
        let bytes = buffer.to_ne_bytes();
        assert_eq!(bytes.len(), 8);
        assert_eq!(&bytes[..4], &1.0f32.to_ne_bytes());
        assert_eq!(NumericBuffer::<f32>::from_ne_bytes(&bytes), buffer);
    }
}
