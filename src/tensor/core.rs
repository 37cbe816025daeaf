//! Tensor: an N-dimensional array with a contiguous row-major backing store

use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::tensor::layout::{Layout, Shape};

/// An N-dimensional array over a float element type.
///
/// Storage is always contiguous and row-major; there are no views or
/// broadcasting here. Both the reference convolution engine and any
/// implementation under test read and write through the same
/// [`Layout`] offset arithmetic.
#[derive(Clone, Debug)]
pub struct Tensor<T: Element> {
    layout: Layout,
    data: Vec<T>,
}

impl<T: Element> Tensor<T> {
    /// Create a tensor from a slice of data with the given shape.
    ///
    /// Panics if `data.len()` does not match the shape's element count.
    /// For a fallible alternative, use [`Self::try_from_slice`].
    pub fn from_slice(data: &[T], shape: &[usize]) -> Self {
        Self::try_from_slice(data, shape).expect("Tensor::from_slice failed")
    }

    /// Create a tensor from a slice of data with the given shape.
    pub fn try_from_slice(data: &[T], shape: &[usize]) -> Result<Self> {
        let layout = Layout::contiguous(shape);
        if data.len() != layout.numel() {
            return Err(Error::InvalidArgument {
                arg: "data",
                reason: format!(
                    "shape {:?} requires {} elements, got {}",
                    shape,
                    layout.numel(),
                    data.len()
                ),
            });
        }
        Ok(Self {
            layout,
            data: data.to_vec(),
        })
    }

    /// Create a zero-filled tensor of the given shape
    pub fn zeros(shape: &[usize]) -> Self {
        Self::full(shape, T::zero())
    }

    /// Create a tensor filled with a constant value
    pub fn full(shape: &[usize], value: T) -> Self {
        let layout = Layout::contiguous(shape);
        let data = vec![value; layout.numel()];
        Self { layout, data }
    }

    /// Shape of the tensor
    pub fn shape(&self) -> &[usize] {
        self.layout.shape()
    }

    /// Number of dimensions
    pub fn ndim(&self) -> usize {
        self.layout.ndim()
    }

    /// Total number of elements
    pub fn numel(&self) -> usize {
        self.layout.numel()
    }

    /// The tensor's memory layout
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Linear storage offset of an axis-ordered coordinate tuple
    #[inline]
    pub fn offset(&self, coords: &[usize]) -> usize {
        self.layout.linear_offset(coords)
    }

    /// Decode a linear offset into coordinates
    pub fn coords_of(&self, offset: usize) -> Shape {
        self.layout.coords_of(offset)
    }

    /// Element at an axis-ordered coordinate tuple
    #[inline]
    pub fn at(&self, coords: &[usize]) -> T {
        self.data[self.offset(coords)]
    }

    /// Mutable element at an axis-ordered coordinate tuple
    #[inline]
    pub fn at_mut(&mut self, coords: &[usize]) -> &mut T {
        let offset = self.offset(coords);
        &mut self.data[offset]
    }

    /// The backing store in row-major order
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// The backing store in row-major order, mutable
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Copy the backing store into a `Vec`
    pub fn to_vec(&self) -> Vec<T> {
        self.data.clone()
    }
}
