//! # convparity
//!
//! **Correctness verification for optimized convolution implementations.**
//!
//! convparity pairs a brute-force reference convolution (grouped, dilated,
//! strided, zero-padded, 2-D or volumetric, with optional bias) with an
//! equivalence-verification protocol that sweeps an implementation under test
//! across realistic parameter configurations and asserts element-wise
//! agreement within a fixed tolerance.
//!
//! ## Why convparity?
//!
//! - **Ground truth, not throughput**: the reference engine is deliberately
//!   sequential, loop-explicit, and addressed through a single row-major
//!   index mapper, so its results are easy to trust and reproduce
//! - **Black-box verification**: implementations under test plug in through
//!   one `forward` trait method; their internals stay their own
//! - **Failure isolation**: every scenario reports independently with
//!   per-element diagnostics; one failure never aborts a sweep
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use convparity::prelude::*;
//!
//! let reports = run_scenarios::<f32, _>(&DirectConv, &scenarios::alexnet_tower());
//! for report in &reports {
//!     assert!(report.passed(), "{report}");
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `rayon` (default): parallel built-in fast path (the reference engine is
//!   always sequential)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod conv;
pub mod dtype;
pub mod error;
pub mod fill;
pub mod tensor;
pub mod verify;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::conv::{
        ConvConfig, ConvParams, DirectConv, WeightSet, reference_convolution,
    };
    pub use crate::dtype::Element;
    pub use crate::error::{Error, Result};
    pub use crate::tensor::{Layout, Tensor};
    pub use crate::verify::{
        ConvForward, Mismatch, Outcome, Report, Scenario, compare_elementwise, run_scenario,
        run_scenarios, scenarios,
    };
}
