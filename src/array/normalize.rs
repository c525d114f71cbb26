//! Normalization transforms
//!
//! Scaling takes its statistics from the input buffer before producing
//! anything and returns a new buffer; the input is never modified.

use super::buffer::{Element, NumericBuffer};
use crate::utils::ArrayError;

/// Minimum and maximum of `values` in one pass, widened to f64
pub fn value_range<T: Element>(values: &[T]) -> Option<(f64, f64)> {
    let mut iter = values.iter().map(|v| v.to_f64());
    let first = iter.next()?;
    Some(iter.fold((first, first), |(min, max), v| (min.min(v), max.max(v))))
}

/// Min-max scale `buffer` into the unit interval
///
/// `out[i] = (in[i] - min) / (max - min)`, so the minimum maps to exactly
/// 0.0 and the maximum to exactly 1.0. Fails with `DegenerateRange` when
/// every element is equal and with `EmptyBuffer` on empty input.
pub fn min_max_scale<T: Element>(buffer: &NumericBuffer<T>) -> Result<NumericBuffer<f32>, ArrayError> {
    let (min, max) = value_range(buffer.as_slice()).ok_or(ArrayError::EmptyBuffer)?;
    if max == min {
        return Err(ArrayError::DegenerateRange { value: min });
    }

    let span = max - min;
    let data = buffer
        .iter()
        .map(|&v| ((v.to_f64() - min) / span) as f32)
        .collect();
    Ok(NumericBuffer::from_vec(data))
}
