//! Tensor types: contiguous row-major N-dimensional arrays
//!
//! Axes are ordered `[batch, channel, (depth,) height, width]` for the
//! convolution operands in this crate; the tensor type itself is
//! rank-agnostic.

mod core;
mod layout;

pub use self::core::Tensor;
pub use self::layout::{Layout, Shape, Strides};
