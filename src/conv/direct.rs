//! Direct convolution: the built-in fast path under test.
//!
//! Computes the same grouped/dilated/padded/strided convolution as the
//! reference engine, but with raw offset arithmetic instead of the index
//! mapper, kernel taps in the outer accumulation position (channels inner),
//! bias seeded into the accumulator instead of a post-pass, and optional
//! rayon parallelism over (batch, output-channel) planes. The different
//! summation order is the point: equivalence with the reference is within
//! tolerance, not bit-for-bit.

use crate::conv::params::{ConvParams, WeightSet};
use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::tensor::Tensor;
use crate::verify::ConvForward;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Direct (im2col-free) convolution implementing [`ConvForward`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectConv;

impl<T: Element> ConvForward<T> for DirectConv {
    fn forward(
        &self,
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
        let mut out = Tensor::<T>::zeros(&p.output_shape());
        if out.numel() == 0 {
            return Ok(out);
        }

        let k_g = p.c_in_per_group();
        let o_g = p.c_out_per_group();
        let out_spatial = p.out_d * p.out_h * p.out_w;

        let in_data = input.as_slice();
        let filter_data = weights.filter.as_slice();
        let bias_data = weights.bias.as_ref().map(|b| b.as_slice());

        // One closure per contiguous (batch, output-channel) output plane;
        // planes are disjoint, so they can run in any order or in parallel.
        let run_plane = |plane: usize, out_plane: &mut [T]| {
            let n = plane / p.num_output;
            let oc = plane % p.num_output;
            let g = oc / o_g;
            let k_head = g * k_g;
            let filter_base = oc * k_g * p.kernel_d * p.kernel_h * p.kernel_w;
            let in_spatial = p.in_d * p.in_h * p.in_w;
            let seed = match bias_data {
                Some(bias) => bias[oc],
                None => T::zero(),
            };

            for z in 0..p.out_d {
                for y in 0..p.out_h {
                    for x in 0..p.out_w {
                        let mut acc = seed;
                        for r in 0..p.kernel_d {
                            let in_z =
                                (z * p.stride_d + r * p.dilation_d) as isize - p.pad_d as isize;
                            if in_z < 0 || in_z as usize >= p.in_d {
                                continue;
                            }
                            for ky in 0..p.kernel_h {
                                let in_y = (y * p.stride_h + ky * p.dilation_h) as isize
                                    - p.pad_h as isize;
                                if in_y < 0 || in_y as usize >= p.in_h {
                                    continue;
                                }
                                for kx in 0..p.kernel_w {
                                    let in_x = (x * p.stride_w + kx * p.dilation_w) as isize
                                        - p.pad_w as isize;
                                    if in_x < 0 || in_x as usize >= p.in_w {
                                        continue;
                                    }
                                    let tap = (r * p.kernel_h + ky) * p.kernel_w + kx;
                                    let in_pos = ((in_z as usize) * p.in_h + in_y as usize)
                                        * p.in_w
                                        + in_x as usize;
                                    for k in 0..k_g {
                                        let in_idx =
                                            (n * p.c_in + k_head + k) * in_spatial + in_pos;
                                        let w_idx = filter_base
                                            + k * p.kernel_d * p.kernel_h * p.kernel_w
                                            + tap;
                                        acc = acc + in_data[in_idx] * filter_data[w_idx];
                                    }
                                }
                            }
                        }
                        out_plane[(z * p.out_h + y) * p.out_w + x] = acc;
                    }
                }
            }
        };

        #[cfg(feature = "rayon")]
        out.as_mut_slice()
            .par_chunks_mut(out_spatial)
            .enumerate()
            .for_each(|(plane, chunk)| run_plane(plane, chunk));

        #[cfg(not(feature = "rayon"))]
        for (plane, chunk) in out.as_mut_slice().chunks_mut(out_spatial).enumerate() {
            run_plane(plane, chunk);
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conv::params::ConvConfig;
    use crate::conv::reference::reference_convolution;
    use crate::fill;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn random_case(input_shape: &[usize], config: ConvConfig, seed: u64) {
        let params = config.resolve(input_shape).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut input = Tensor::<f64>::zeros(input_shape);
        fill::gaussian(&mut input, 1.0, &mut rng);
        let mut filter = Tensor::<f64>::zeros(&params.filter_shape());
        fill::gaussian(&mut filter, 1.0, &mut rng);
        let bias = params
            .bias_term
            .then(|| Tensor::full(&[params.num_output], 0.5f64));
        let weights = WeightSet::new(filter, bias);

        let expected = reference_convolution(&input, &params, &weights).unwrap();
        let got = DirectConv.forward(&input, &params, &weights).unwrap();

        assert_eq!(got.shape(), expected.shape());
        for (a, e) in got.as_slice().iter().zip(expected.as_slice()) {
            assert!((a - e).abs() < 1e-10, "{} vs {}", a, e);
        }
    }

    #[test]
    fn test_matches_reference_basic() {
        let config = ConvConfig {
            kernel_size: Some(3),
            pad: Some(1),
            ..ConvConfig::new(6)
        };
        random_case(&[2, 4, 7, 7], config, 11);
    }

    #[test]
    fn test_matches_reference_grouped_strided() {
        let config = ConvConfig {
            kernel_size: Some(3),
            stride: Some(2),
            pad: Some(1),
            groups: 3,
            bias_term: false,
            ..ConvConfig::new(9)
        };
        random_case(&[1, 6, 9, 9], config, 12);
    }

    #[test]
    fn test_matches_reference_dilated_rect() {
        let config = ConvConfig {
            kernel_h: Some(3),
            kernel_w: Some(2),
            stride_w: Some(2),
            pad_h: Some(2),
            dilation: Some(2),
            ..ConvConfig::new(5)
        };
        random_case(&[1, 3, 8, 10], config, 13);
    }

    #[test]
    fn test_matches_reference_volumetric() {
        let config = ConvConfig {
            kernel_size: Some(3),
            pad: Some(1),
            ..ConvConfig::new(4)
        };
        random_case(&[1, 2, 5, 6, 7], config, 14);
    }

    #[test]
    fn test_zero_size_output() {
        // Receptive field larger than the padded input: empty output, no work.
        let config = ConvConfig {
            kernel_size: Some(7),
            bias_term: false,
            ..ConvConfig::new(2)
        };
        let params = config.resolve(&[1, 1, 3, 3]).unwrap();
        let input = Tensor::<f32>::zeros(&[1, 1, 3, 3]);
        let weights = WeightSet::new(Tensor::zeros(&[2, 1, 7, 7]), None);
        let out = DirectConv.forward(&input, &params, &weights).unwrap();
        assert_eq!(out.shape(), &[1, 2, 0, 0]);
        assert_eq!(out.numel(), 0);
    }
}
