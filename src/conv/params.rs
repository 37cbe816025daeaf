//! Convolution configuration: sparse user-facing parameters and their
//! fully-resolved, axis-complete form.
//!
//! Validation happens here, before any tensor access, so both engines can
//! assume a well-formed parameter set.

use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::tensor::{Shape, Tensor};
use smallvec::smallvec;

/// Validates that stride, dilation, groups, and kernel extents are non-zero.
#[inline]
fn validate_positive(value: usize, name: &'static str, op: &'static str) -> Result<()> {
    if value == 0 {
        return Err(Error::InvalidArgument {
            arg: name,
            reason: format!("{} requires {} > 0, got 0", op, name),
        });
    }
    Ok(())
}

/// Validates that channels are divisible by groups.
#[inline]
fn validate_groups(c_in: usize, c_out: usize, groups: usize, op: &'static str) -> Result<()> {
    if !c_in.is_multiple_of(groups) {
        return Err(Error::InvalidArgument {
            arg: "groups",
            reason: format!(
                "{} requires C_in ({}) to be divisible by groups ({})",
                op, c_in, groups
            ),
        });
    }
    if !c_out.is_multiple_of(groups) {
        return Err(Error::InvalidArgument {
            arg: "groups",
            reason: format!(
                "{} requires C_out ({}) to be divisible by groups ({})",
                op, c_out, groups
            ),
        });
    }
    Ok(())
}

/// Computes the output extent for a single spatial axis.
///
/// output_size = floor((input_size + 2 * pad - dilation * (kernel_size - 1) - 1) / stride) + 1
#[inline]
pub fn compute_output_size(
    input_size: usize,
    kernel_size: usize,
    stride: usize,
    dilation: usize,
    pad: usize,
) -> usize {
    let effective_kernel = dilation * (kernel_size - 1) + 1;
    let padded_size = input_size + 2 * pad;
    if padded_size < effective_kernel {
        0
    } else {
        (padded_size - effective_kernel) / stride + 1
    }
}

/// Possibly-sparse convolution configuration.
///
/// Each category (kernel, stride, pad) may be given either as a single shared
/// scalar or as explicit height/width values; per-axis values win where
/// present. Dilation is always a shared scalar. Unset pad defaults to 0, unset
/// stride and dilation to 1. The depth axis of a volumetric convolution has no
/// independent parameters: it takes the height axis's resolved values.
#[derive(Debug, Clone)]
pub struct ConvConfig {
    /// Number of output channels
    pub num_output: usize,
    /// Shared kernel extent for all spatial axes
    pub kernel_size: Option<usize>,
    /// Kernel height override
    pub kernel_h: Option<usize>,
    /// Kernel width override
    pub kernel_w: Option<usize>,
    /// Shared stride for all spatial axes (default 1)
    pub stride: Option<usize>,
    /// Stride height override
    pub stride_h: Option<usize>,
    /// Stride width override
    pub stride_w: Option<usize>,
    /// Shared zero-padding for all spatial axes (default 0)
    pub pad: Option<usize>,
    /// Padding height override
    pub pad_h: Option<usize>,
    /// Padding width override
    pub pad_w: Option<usize>,
    /// Shared dilation for all spatial axes (default 1); no per-axis form
    pub dilation: Option<usize>,
    /// Number of channel groups (default 1)
    pub groups: usize,
    /// Whether a per-output-channel bias is added
    pub bias_term: bool,
}

impl ConvConfig {
    /// A configuration with the given output channel count and everything
    /// else at its defaults (kernel unset, stride 1, pad 0, dilation 1,
    /// groups 1, bias on).
    pub fn new(num_output: usize) -> Self {
        Self {
            num_output,
            kernel_size: None,
            kernel_h: None,
            kernel_w: None,
            stride: None,
            stride_h: None,
            stride_w: None,
            pad: None,
            pad_h: None,
            pad_w: None,
            dilation: None,
            groups: 1,
            bias_term: true,
        }
    }

    /// Resolve this configuration against a concrete input shape.
    ///
    /// Volumetric mode is selected when the input has 5 axes
    /// (`[batch, channel, depth, height, width]`); with 4 axes the depth axis
    /// degenerates to extent 1 with a unit kernel, so one loop nest serves
    /// both ranks. All configuration errors are raised here, before any
    /// tensor data is touched.
    pub fn resolve(&self, input_shape: &[usize]) -> Result<ConvParams> {
        const OP: &str = "conv";

        let has_depth = match input_shape.len() {
            4 => false,
            5 => true,
            ndim => {
                return Err(Error::InvalidArgument {
                    arg: "input",
                    reason: format!("{} expects a 4D or 5D tensor, got {}D", OP, ndim),
                });
            }
        };

        let kernel_h = self.kernel_h.or(self.kernel_size).ok_or_else(|| {
            Error::InvalidArgument {
                arg: "kernel_size",
                reason: format!("{} requires kernel_size or kernel_h/kernel_w", OP),
            }
        })?;
        let kernel_w = self.kernel_w.or(self.kernel_size).ok_or_else(|| {
            Error::InvalidArgument {
                arg: "kernel_size",
                reason: format!("{} requires kernel_size or kernel_h/kernel_w", OP),
            }
        })?;
        let stride_h = self.stride_h.or(self.stride).unwrap_or(1);
        let stride_w = self.stride_w.or(self.stride).unwrap_or(1);
        let pad_h = self.pad_h.or(self.pad).unwrap_or(0);
        let pad_w = self.pad_w.or(self.pad).unwrap_or(0);
        let dilation = self.dilation.unwrap_or(1);

        // Depth takes the height axis's resolved values; in 2-D mode it
        // degenerates to a single unit tap with no padding.
        let (kernel_d, stride_d, pad_d, dilation_d) = if has_depth {
            (kernel_h, stride_h, pad_h, dilation)
        } else {
            (1, 1, 0, 1)
        };

        validate_positive(kernel_h, "kernel_h", OP)?;
        validate_positive(kernel_w, "kernel_w", OP)?;
        validate_positive(stride_h, "stride_h", OP)?;
        validate_positive(stride_w, "stride_w", OP)?;
        validate_positive(dilation, "dilation", OP)?;
        validate_positive(self.groups, "groups", OP)?;
        validate_positive(self.num_output, "num_output", OP)?;

        let batch = input_shape[0];
        let c_in = input_shape[1];
        let spatial = &input_shape[2..];
        let (in_d, in_h, in_w) = if has_depth {
            (spatial[0], spatial[1], spatial[2])
        } else {
            (1, spatial[0], spatial[1])
        };

        validate_groups(c_in, self.num_output, self.groups, OP)?;

        let out_d = compute_output_size(in_d, kernel_d, stride_d, dilation_d, pad_d);
        let out_h = compute_output_size(in_h, kernel_h, stride_h, dilation, pad_h);
        let out_w = compute_output_size(in_w, kernel_w, stride_w, dilation, pad_w);

        Ok(ConvParams {
            has_depth,
            batch,
            c_in,
            in_d,
            in_h,
            in_w,
            num_output: self.num_output,
            kernel_d,
            kernel_h,
            kernel_w,
            stride_d,
            stride_h,
            stride_w,
            pad_d,
            pad_h,
            pad_w,
            dilation_d,
            dilation_h: dilation,
            dilation_w: dilation,
            groups: self.groups,
            bias_term: self.bias_term,
            out_d,
            out_h,
            out_w,
        })
    }
}

/// Fully resolved, axis-complete convolution parameters.
///
/// In 2-D mode the depth fields are fixed at
/// `in_d = out_d = kernel_d = stride_d = dilation_d = 1`, `pad_d = 0`, so
/// index arithmetic over `(d, h, w)` is valid for both ranks.
#[derive(Debug, Clone, Copy)]
pub struct ConvParams {
    /// Whether the operation is volumetric (5 tensor axes)
    pub has_depth: bool,
    /// Batch size
    pub batch: usize,
    /// Input channel count
    pub c_in: usize,
    /// Input depth extent (1 in 2-D mode)
    pub in_d: usize,
    /// Input height extent
    pub in_h: usize,
    /// Input width extent
    pub in_w: usize,
    /// Output channel count
    pub num_output: usize,
    /// Kernel depth extent (1 in 2-D mode)
    pub kernel_d: usize,
    /// Kernel height extent
    pub kernel_h: usize,
    /// Kernel width extent
    pub kernel_w: usize,
    /// Stride along depth (1 in 2-D mode)
    pub stride_d: usize,
    /// Stride along height
    pub stride_h: usize,
    /// Stride along width
    pub stride_w: usize,
    /// Zero-padding along depth (0 in 2-D mode)
    pub pad_d: usize,
    /// Zero-padding along height
    pub pad_h: usize,
    /// Zero-padding along width
    pub pad_w: usize,
    /// Dilation along depth (1 in 2-D mode)
    pub dilation_d: usize,
    /// Dilation along height
    pub dilation_h: usize,
    /// Dilation along width
    pub dilation_w: usize,
    /// Number of channel groups
    pub groups: usize,
    /// Whether a bias is added after accumulation
    pub bias_term: bool,
    /// Output depth extent (1 in 2-D mode)
    pub out_d: usize,
    /// Output height extent
    pub out_h: usize,
    /// Output width extent
    pub out_w: usize,
}

impl ConvParams {
    /// Input channels owned by each group
    #[inline]
    pub fn c_in_per_group(&self) -> usize {
        self.c_in / self.groups
    }

    /// Output channels owned by each group
    #[inline]
    pub fn c_out_per_group(&self) -> usize {
        self.num_output / self.groups
    }

    /// The input shape these parameters were resolved for
    pub fn input_shape(&self) -> Shape {
        if self.has_depth {
            smallvec![self.batch, self.c_in, self.in_d, self.in_h, self.in_w]
        } else {
            smallvec![self.batch, self.c_in, self.in_h, self.in_w]
        }
    }

    /// Output shape implied by the standard convolution output-size formula
    pub fn output_shape(&self) -> Shape {
        if self.has_depth {
            smallvec![
                self.batch,
                self.num_output,
                self.out_d,
                self.out_h,
                self.out_w
            ]
        } else {
            smallvec![self.batch, self.num_output, self.out_h, self.out_w]
        }
    }

    /// Filter tensor shape: `[C_out, C_in/groups, (K_d,) K_h, K_w]`
    pub fn filter_shape(&self) -> Shape {
        if self.has_depth {
            smallvec![
                self.num_output,
                self.c_in_per_group(),
                self.kernel_d,
                self.kernel_h,
                self.kernel_w
            ]
        } else {
            smallvec![
                self.num_output,
                self.c_in_per_group(),
                self.kernel_h,
                self.kernel_w
            ]
        }
    }
}

/// Filter tensor plus optional bias, owned by the verification driver and
/// read-only to both engines.
#[derive(Clone, Debug)]
pub struct WeightSet<T: Element> {
    /// Filter tensor of shape `[C_out, C_in/groups, (K_d,) K_h, K_w]`
    pub filter: Tensor<T>,
    /// Bias of shape `[C_out]`, present iff the configuration has a bias term
    pub bias: Option<Tensor<T>>,
}

impl<T: Element> WeightSet<T> {
    /// Bundle a filter and optional bias
    pub fn new(filter: Tensor<T>, bias: Option<Tensor<T>>) -> Self {
        Self { filter, bias }
    }

    /// Check this weight set against resolved parameters.
    ///
    /// The filter shape must match [`ConvParams::filter_shape`] exactly, and
    /// the bias must be present iff `bias_term` is set, with length `C_out`.
    pub fn check(&self, params: &ConvParams) -> Result<()> {
        let expected = params.filter_shape();
        if self.filter.shape() != expected.as_slice() {
            return Err(Error::shape_mismatch(&expected, self.filter.shape()));
        }
        match (&self.bias, params.bias_term) {
            (Some(bias), true) => {
                if bias.shape() != [params.num_output] {
                    return Err(Error::shape_mismatch(&[params.num_output], bias.shape()));
                }
            }
            (None, false) => {}
            (Some(_), false) => {
                return Err(Error::InvalidArgument {
                    arg: "bias",
                    reason: "bias supplied but bias_term is false".to_string(),
                });
            }
            (None, true) => {
                return Err(Error::InvalidArgument {
                    arg: "bias",
                    reason: "bias_term is true but no bias supplied".to_string(),
                });
            }
        }
        Ok(())
    }
}
