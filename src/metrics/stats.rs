//! Descriptive statistics over numeric buffers
//!
//! Read-only diagnostics: nothing here modifies the buffer it is given.
//! Every statistic fails with `EmptyBuffer` on empty input instead of
//! returning NaN.

use crate::array::{value_range, Element, NumericBuffer};
use crate::utils::ArrayError;

/// Number of buckets in a byte histogram
pub const BYTE_BUCKETS: usize = 256;

/// Summary statistics of one buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation (divides by n)
    pub stddev: f64,
}

impl BufferStats {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "count": self.count,
            "min": self.min,
            "max": self.max,
            "mean": self.mean,
            "median": self.median,
            "stddev": self.stddev,
        })
    }
}

/// Per-value counts of a u8 buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteHistogram {
    counts: Vec<u64>,
}

impl ByteHistogram {
    /// Count of elements equal to `value`
    #[inline]
    pub fn count(&self, value: u8) -> u64 {
        self.counts[value as usize]
    }

    /// All 256 bucket counts
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Total number of elements counted
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Counts up to and including the largest value present
    ///
    /// Matches the usual `bincount` shape: empty when nothing was counted.
    pub fn bincount(&self) -> &[u64] {
        let end = self
            .counts
            .iter()
            .rposition(|&c| c > 0)
            .map_or(0, |last| last + 1);
        &self.counts[..end]
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!(self.bincount())
    }
}

/// Statistics calculator
pub struct StatsReporter;

impl StatsReporter {
    pub fn min<T: Element>(buffer: &NumericBuffer<T>) -> Result<f64, ArrayError> {
        Ok(Self::range(buffer)?.0)
    }

    pub fn max<T: Element>(buffer: &NumericBuffer<T>) -> Result<f64, ArrayError> {
        Ok(Self::range(buffer)?.1)
    }

    /// Arithmetic mean
    pub fn mean<T: Element>(buffer: &NumericBuffer<T>) -> Result<f64, ArrayError> {
        if buffer.is_empty() {
            return Err(ArrayError::EmptyBuffer);
        }
        let sum: f64 = buffer.iter().map(|v| v.to_f64()).sum();
        Ok(sum / buffer.len() as f64)
    }

    /// Median; the mean of the two middle values for even counts
    pub fn median<T: Element>(buffer: &NumericBuffer<T>) -> Result<f64, ArrayError> {
        if buffer.is_empty() {
            return Err(ArrayError::EmptyBuffer);
        }
        let mut sorted: Vec<f64> = buffer.iter().map(|v| v.to_f64()).collect();
        sorted.sort_unstable_by(|a, b| a.total_cmp(b));

        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            Ok((sorted[mid - 1] + sorted[mid]) / 2.0)
        } else {
            Ok(sorted[mid])
        }
    }

    /// Population standard deviation
    pub fn stddev<T: Element>(buffer: &NumericBuffer<T>) -> Result<f64, ArrayError> {
        let mean = Self::mean(buffer)?;
        Ok(Self::stddev_around(buffer, mean))
    }

    /// All summary statistics at once
    pub fn summarize<T: Element>(buffer: &NumericBuffer<T>) -> Result<BufferStats, ArrayError> {
        let (min, max) = Self::range(buffer)?;
        let mean = Self::mean(buffer)?;
        Ok(BufferStats {
            count: buffer.len(),
            min,
            max,
            mean,
            median: Self::median(buffer)?,
            stddev: Self::stddev_around(buffer, mean),
        })
    }

    /// 256-bucket histogram of a byte buffer
    ///
    /// An empty buffer yields all-zero counts.
    pub fn histogram(buffer: &NumericBuffer<u8>) -> ByteHistogram {
        let mut counts = vec![0u64; BYTE_BUCKETS];
        for &value in buffer {
            counts[value as usize] += 1;
        }
        ByteHistogram { counts }
    }

    fn range<T: Element>(buffer: &NumericBuffer<T>) -> Result<(f64, f64), ArrayError> {
        value_range(buffer.as_slice()).ok_or(ArrayError::EmptyBuffer)
    }

    fn stddev_around<T: Element>(buffer: &NumericBuffer<T>, mean: f64) -> f64 {
        let sq_sum: f64 = buffer
            .iter()
            .map(|v| {
                let d = v.to_f64() - mean;
                d * d
            })
            .sum();
        (sq_sum / buffer.len() as f64).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_determinism() {
        let buffer = NumericBuffer::from_vec(vec![1u8, 2, 3, 4, 5]);
        let stats = StatsReporter::summarize(&buffer).unwrap();

        assert_eq!(stats.count, 5);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
        assert_eq!(stats.mean, 3.0);
        assert_eq!(stats.median, 3.0);
        assert!((stats.stddev - 2.0f64.sqrt()).abs() < 1e-12);

        assert_eq!(StatsReporter::min(&buffer).unwrap(), 1.0);
        assert_eq!(StatsReporter::max(&buffer).unwrap(), 5.0);
        assert!((StatsReporter::stddev(&buffer).unwrap() - 1.4142).abs() < 1e-4);
    }

    #[test]
    fn test_median_even_count() {
        let buffer = NumericBuffer::from_vec(vec![4.0f32, 1.0, 3.0, 2.0]);
        assert_eq!(StatsReporter::median(&buffer).unwrap(), 2.5);
    }

    #[test]
    fn test_float_stats() {
        let buffer = NumericBuffer::from_vec(vec![0.0f32, 0.25, 0.5, 1.0]);
        let stats = StatsReporter::summarize(&buffer).unwrap();
        assert_eq!(stats.min, 0.0);
        assert_eq!(stats.max, 1.0);
        assert_eq!(stats.mean, 0.4375);
        assert_eq!(stats.median, 0.375);
    }

    #[test]
    fn test_empty_buffer_fails() {
        let buffer = NumericBuffer::<u8>::from_vec(vec![]);
        assert!(matches!(StatsReporter::min(&buffer), Err(ArrayError::EmptyBuffer)));
        assert!(matches!(StatsReporter::max(&buffer), Err(ArrayError::EmptyBuffer)));
        assert!(matches!(StatsReporter::mean(&buffer), Err(ArrayError::EmptyBuffer)));
        assert!(matches!(StatsReporter::median(&buffer), Err(ArrayError::EmptyBuffer)));
        assert!(matches!(StatsReporter::stddev(&buffer), Err(ArrayError::EmptyBuffer)));
        assert!(matches!(StatsReporter::summarize(&buffer), Err(ArrayError::EmptyBuffer)));
    }

    #[test]
    fn test_histogram() {
        let buffer = NumericBuffer::from_vec(vec![5u8, 0, 4, 1, 9, 2, 1, 3, 1, 4]);
        let hist = StatsReporter::histogram(&buffer);

        assert_eq!(hist.counts().len(), BYTE_BUCKETS);
        assert_eq!(hist.total(), 10);
        assert_eq!(hist.count(1), 3);
        assert_eq!(hist.count(255), 0);
        assert_eq!(hist.bincount(), &[1, 3, 1, 1, 2, 1, 0, 0, 0, 1]);
    }

    #[test]
    fn test_histogram_empty() {
        let hist = StatsReporter::histogram(&NumericBuffer::from_vec(vec![]));
        assert_eq!(hist.total(), 0);
        assert!(hist.bincount().is_empty());
    }

    #[test]
    fn test_stats_to_json() {
        let buffer = NumericBuffer::from_vec(vec![1u8, 3]);
        let json = StatsReporter::summarize(&buffer).unwrap().to_json();
        assert_eq!(json["count"], 2);
        assert_eq!(json["mean"], 2.0);
    }
}
