//! Layout: shape and row-major strides for tensor memory layout

use smallvec::SmallVec;
use std::fmt;

/// Stack allocation threshold for dimensions.
/// Most tensors here are 4-D; volumetric (5-D) ones spill to the heap.
const STACK_DIMS: usize = 4;

/// Shape type: dimensions of a tensor
pub type Shape = SmallVec<[usize; STACK_DIMS]>;

/// Strides type: element offsets between consecutive indices along each dimension
pub type Strides = SmallVec<[usize; STACK_DIMS]>;

/// Layout describes the memory layout of a contiguous tensor.
///
/// All tensors in this crate are stored in row-major (C) order. The layout is
/// the single source of truth for coordinate-to-offset mapping: the reference
/// engine and every consumer of a tensor address elements through
/// [`Layout::linear_offset`], so reference and optimized outputs can only
/// disagree numerically, never on placement.
///
/// Offset of element at indices `[i0, i1, ..., in]`:
///   `i0 * strides[0] + i1 * strides[1] + ... + in * strides[n]`
#[derive(Clone, PartialEq, Eq)]
pub struct Layout {
    /// Shape: size along each dimension
    shape: Shape,
    /// Strides: offset (in elements) between consecutive indices along each dimension
    strides: Strides,
}

impl Layout {
    /// Create a contiguous (row-major/C-order) layout from a shape
    ///
    /// # Example
    /// ```
    /// use convparity::tensor::Layout;
    /// let layout = Layout::contiguous(&[2, 3, 4]);
    /// assert_eq!(layout.shape(), &[2, 3, 4]);
    /// assert_eq!(layout.strides(), &[12, 4, 1]);
    /// ```
    pub fn contiguous(shape: &[usize]) -> Self {
        let shape: Shape = shape.iter().copied().collect();
        let strides = Self::compute_contiguous_strides(&shape);
        Self { shape, strides }
    }

    /// Compute contiguous strides for a given shape (row-major order)
    fn compute_contiguous_strides(shape: &[usize]) -> Strides {
        if shape.is_empty() {
            return SmallVec::new();
        }

        let mut strides: Strides = SmallVec::from_elem(1, shape.len());
        for i in (0..shape.len() - 1).rev() {
            strides[i] = strides[i + 1] * shape[i + 1].max(1);
        }
        strides
    }

    /// Shape of the layout
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Strides of the layout, in elements
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Number of dimensions
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Total number of elements (product of extents)
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// Map an axis-ordered coordinate tuple to a linear storage offset.
    ///
    /// Pure row-major polynomial: `((c0 * e1 + c1) * e2 + c2) ...`, expressed
    /// through the precomputed strides. Out-of-range coordinates are a
    /// precondition violation; callers are expected to have clipped already.
    #[inline]
    pub fn linear_offset(&self, coords: &[usize]) -> usize {
        debug_assert_eq!(coords.len(), self.shape.len());
        let mut offset = 0;
        for (i, &c) in coords.iter().enumerate() {
            debug_assert!(c < self.shape[i], "coordinate {c} out of range on axis {i}");
            offset += c * self.strides[i];
        }
        offset
    }

    /// Decode a linear offset back into an axis-ordered coordinate tuple.
    ///
    /// Inverse of [`Self::linear_offset`]; used for mismatch diagnostics.
    pub fn coords_of(&self, mut offset: usize) -> Shape {
        let mut coords: Shape = SmallVec::from_elem(0, self.shape.len());
        for (i, &stride) in self.strides.iter().enumerate() {
            if stride > 0 {
                coords[i] = offset / stride;
                offset %= stride;
            }
        }
        coords
    }
}

impl fmt::Debug for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layout")
            .field("shape", &self.shape.as_slice())
            .field("strides", &self.strides.as_slice())
            .finish()
    }
}
