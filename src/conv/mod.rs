//! Convolution semantics: parameter resolution, the brute-force reference
//! engine, and the built-in direct fast path.

pub mod direct;
pub mod params;
pub mod reference;

pub use direct::DirectConv;
pub use params::{ConvConfig, ConvParams, WeightSet, compute_output_size};
pub use reference::reference_convolution;
