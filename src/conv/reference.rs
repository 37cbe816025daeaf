//! Brute-force reference convolution.
//!
//! Ground truth for equivalence verification: explicit loops over groups,
//! channels, and kernel taps, addressing every tensor through the row-major
//! index mapper. Deliberately sequential and unoptimized.

use crate::conv::params::{ConvParams, WeightSet};
use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::tensor::{Shape, Tensor};
use smallvec::smallvec;

/// Compute the grouped, dilated, strided, zero-padded convolution of `input`
/// with `weights`, returning a freshly allocated output tensor of the shape
/// implied by `params`.
///
/// The accumulation order is fixed: batch, group, output channel within
/// group, output position, then input channel within group and kernel
/// offsets in (depth, height, width) order. Every term whose source
/// coordinate falls outside the input's spatial extents contributes exactly
/// zero without touching memory. Accumulation happens in `T` itself; bias is
/// added in a separate pass after all accumulation, iff the configuration
/// has a bias term.
pub fn reference_convolution<T: Element>(
    input: &Tensor<T>,
    params: &ConvParams,
    weights: &WeightSet<T>,
) -> Result<Tensor<T>> {
    let expected_in = params.input_shape();
    if input.shape() != expected_in.as_slice() {
        return Err(Error::shape_mismatch(&expected_in, input.shape()));
    }
    weights.check(params)?;

    let p = *params;
    let has_depth = p.has_depth;
    let k_g = p.c_in_per_group();
    let o_g = p.c_out_per_group();

    let mut out = Tensor::<T>::zeros(&p.output_shape());

    let in_data = input.as_slice();
    let filter = &weights.filter;
    let filter_data = filter.as_slice();

    for n in 0..p.batch {
        for g in 0..p.groups {
            let o_head = o_g * g;
            let k_head = k_g * g;
            for o in 0..o_g {
                for z in 0..p.out_d {
                    for y in 0..p.out_h {
                        for x in 0..p.out_w {
                            let mut acc = T::zero();
                            for k in 0..k_g {
                                for kz in 0..p.kernel_d {
                                    for ky in 0..p.kernel_h {
                                        for kx in 0..p.kernel_w {
                                            let in_z = (z * p.stride_d + kz * p.dilation_d)
                                                as isize
                                                - p.pad_d as isize;
                                            let in_y = (y * p.stride_h + ky * p.dilation_h)
                                                as isize
                                                - p.pad_h as isize;
                                            let in_x = (x * p.stride_w + kx * p.dilation_w)
                                                as isize
                                                - p.pad_w as isize;
                                            // Implicit zero padding: clipped taps contribute
                                            // nothing and never read memory.
                                            if in_z < 0
                                                || in_z as usize >= p.in_d
                                                || in_y < 0
                                                || in_y as usize >= p.in_h
                                                || in_x < 0
                                                || in_x as usize >= p.in_w
                                            {
                                                continue;
                                            }
                                            let in_coords: Shape = if has_depth {
                                                smallvec![
                                                    n,
                                                    k_head + k,
                                                    in_z as usize,
                                                    in_y as usize,
                                                    in_x as usize
                                                ]
                                            } else {
                                                smallvec![
                                                    n,
                                                    k_head + k,
                                                    in_y as usize,
                                                    in_x as usize
                                                ]
                                            };
                                            let w_coords: Shape = if has_depth {
                                                smallvec![o_head + o, k, kz, ky, kx]
                                            } else {
                                                smallvec![o_head + o, k, ky, kx]
                                            };
                                            let in_val = in_data[input.offset(&in_coords)];
                                            let w_val = filter_data[filter.offset(&w_coords)];
                                            acc = acc + in_val * w_val;
                                        }
                                    }
                                }
                            }
                            let out_coords: Shape = if has_depth {
                                smallvec![n, o_head + o, z, y, x]
                            } else {
                                smallvec![n, o_head + o, y, x]
                            };
                            let offset = out.offset(&out_coords);
                            out.as_mut_slice()[offset] = acc;
                        }
                    }
                }
            }
        }
    }

    if p.bias_term {
        // checked above: bias_term implies the bias tensor is present
        let bias = weights.bias.as_ref().unwrap();
        let bias_data = bias.as_slice();
        for n in 0..p.batch {
            for o in 0..p.num_output {
                for z in 0..p.out_d {
                    for y in 0..p.out_h {
                        for x in 0..p.out_w {
                            let out_coords: Shape = if has_depth {
                                smallvec![n, o, z, y, x]
                            } else {
                                smallvec![n, o, y, x]
                            };
                            let offset = out.offset(&out_coords);
                            let slot = &mut out.as_mut_slice()[offset];
                            *slot = *slot + bias_data[o];
                        }
                    }
                }
            }
        }
    }

    Ok(out)
}
