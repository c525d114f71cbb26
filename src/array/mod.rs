//! Numeric arrays: buffers, scaling and the flat file codec

pub mod buffer;
pub mod codec;
pub mod normalize;

pub use buffer::{DType, Element, NumericBuffer};
pub use codec::{difference_norm, FlatArray, FlatArrayCodec};
pub use normalize::{min_max_scale, value_range};
