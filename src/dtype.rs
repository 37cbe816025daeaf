//! Element trait for tensor scalar types

use std::fmt::{Debug, Display};
use std::ops::{Add, Div, Mul, Sub};

/// Trait for floating-point types that can be elements of a tensor.
///
/// The reference engine accumulates in the element type itself (no implicit
/// widening), so the trait only needs arithmetic, comparison, and f64
/// conversion for diagnostics and random fills.
///
/// # Bounds
/// - `Copy + Send + Sync + 'static` - Basic trait requirements
/// - `Add + Sub + Mul + Div` - Arithmetic operations (Output = Self)
/// - `PartialOrd` - Comparison for tolerance checks
pub trait Element:
    Copy
    + Send
    + Sync
    + 'static
    + Debug
    + Display
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + PartialOrd
{
    /// Convert to f64 for diagnostics and generic numeric code
    fn to_f64(self) -> f64;

    /// Convert from f64 to this type
    fn from_f64(v: f64) -> Self;

    /// Zero value
    fn zero() -> Self;
}

impl Element for f64 {
    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v
    }

    #[inline]
    fn zero() -> Self {
        0.0
    }
}

impl Element for f32 {
    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v as f32
    }

    #[inline]
    fn zero() -> Self {
        0.0
    }
}
