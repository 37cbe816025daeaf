//! Scenario definitions and the shipped parameter sweeps.
//!
//! The sweeps mirror convolution shapes from real network topologies: the
//! AlexNet/CaffeNet tower (kernel 11/stride 4 down to pointwise 1x1) plus
//! structural variants (grouping, depthwise, dilation, non-square kernels,
//! volumetric).

use crate::conv::{ConvConfig, ConvParams};

/// One independent verification scenario: an input shape, a convolution
/// configuration, seeded fill parameters, and the acceptance tolerance.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Human-readable name used in reports
    pub name: String,
    /// Input tensor shape, `[batch, channel, (depth,) height, width]`
    pub input_shape: Vec<usize>,
    /// The (possibly sparse) convolution configuration to resolve and run
    pub config: ConvConfig,
    /// Absolute element-wise tolerance for equivalence
    pub tolerance: f64,
    /// Seed for the scenario's Gaussian fills
    pub seed: u64,
    /// Standard deviation of the Gaussian input fill. Weight fills use
    /// [`Scenario::weight_std`], which scales this down by the receptive-field
    /// size.
    pub fill_std: f64,
    /// Constant bias fill value (ignored when the config has no bias term)
    pub bias_value: f64,
}

/// The default absolute tolerance for f32 sweeps.
pub const DEFAULT_TOLERANCE: f64 = 1e-4;

impl Scenario {
    /// A scenario with the sweep defaults: tolerance `1e-4`, a seed derived
    /// from the name, unit-variance fills, zero bias.
    pub fn new(name: &str, input_shape: &[usize], config: ConvConfig) -> Self {
        // Stable per-name seed so sweeps are reproducible but not all
        // sampling the same values (FNV-1a).
        let seed = name
            .bytes()
            .fold(0xcbf2_9ce4_8422_2325u64, |h, b| {
                (h ^ b as u64).wrapping_mul(0x0000_0100_0000_01b3)
            });
        Self {
            name: name.to_string(),
            input_shape: input_shape.to_vec(),
            config,
            tolerance: DEFAULT_TOLERANCE,
            seed,
            fill_std: 1.0,
            bias_value: 0.0,
        }
    }

    /// Same scenario with a different constant bias fill
    pub fn with_bias_value(mut self, value: f64) -> Self {
        self.bias_value = value;
        self
    }

    /// Same scenario with a different tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Standard deviation for the weight fills: `fill_std` divided by the
    /// square root of the fan-in (channels per group times kernel volume).
    ///
    /// Output elements accumulate fan-in many products, so without this
    /// scaling their magnitude grows with the receptive field and a fixed
    /// absolute tolerance stops meaning anything. With it, outputs stay at
    /// the scale of `fill_std` for every kernel size in a sweep.
    pub fn weight_std(&self, params: &ConvParams) -> f64 {
        let fan_in =
            params.c_in_per_group() * params.kernel_d * params.kernel_h * params.kernel_w;
        self.fill_std / (fan_in as f64).sqrt()
    }
}

/// Shorthand for the tower configs below.
fn conv(num_output: usize, kernel: usize, stride: usize, pad: usize) -> ConvConfig {
    ConvConfig {
        kernel_size: Some(kernel),
        stride: Some(stride),
        pad: Some(pad),
        ..ConvConfig::new(num_output)
    }
}

/// The CaffeNet-derived sweep over a `[1, 256, 13, 13]` activation map.
///
/// Covers the conv1..conv5 shapes of the AlexNet tower plus the classic 9x9,
/// over-padded 3x3, wide 3x3, strided 5x5, and pointwise 1x1 cases, all at
/// the fixed `1e-4` tolerance.
pub fn alexnet_tower() -> Vec<Scenario> {
    const INPUT: [usize; 4] = [1, 256, 13, 13];
    vec![
        Scenario::new("conv1_11x11_s4_p2_o64", &INPUT, conv(64, 11, 4, 2)),
        Scenario::new("conv_9x9_s1_o50", &INPUT, conv(50, 9, 1, 0)).with_bias_value(0.1),
        Scenario::new("conv2_5x5_s1_p2_o192", &INPUT, conv(192, 5, 1, 2)).with_bias_value(0.7),
        Scenario::new("conv3_3x3_s1_p1_o384", &INPUT, conv(384, 3, 1, 1)),
        Scenario::new("conv4_3x3_s1_p1_o256", &INPUT, conv(256, 3, 1, 1)).with_bias_value(0.7),
        Scenario::new("conv_3x3_s1_p3_o100", &INPUT, conv(100, 3, 1, 3)).with_bias_value(0.1),
        Scenario::new("conv_3x3_s1_o1024", &INPUT, conv(1024, 3, 1, 0)).with_bias_value(0.1),
        Scenario::new("conv_5x5_s2_p5_o1024", &INPUT, conv(1024, 5, 2, 5)).with_bias_value(0.7),
        Scenario::new("conv_1x1_s1_o100", &INPUT, conv(100, 1, 1, 0)).with_bias_value(0.1),
    ]
}

/// Structural variants the tower does not exercise: grouping, depthwise,
/// dilation, non-square kernel/stride/pad, and a volumetric case.
pub fn structural_sweep() -> Vec<Scenario> {
    vec![
        Scenario::new("grouped_3x3_g4_o64", &[1, 256, 13, 13], ConvConfig {
            groups: 4,
            ..conv(64, 3, 1, 1)
        }),
        Scenario::new("depthwise_3x3_o32", &[1, 32, 13, 13], ConvConfig {
            groups: 32,
            ..conv(32, 3, 1, 1)
        })
        .with_bias_value(0.1),
        Scenario::new("dilated_3x3_d2_o96", &[1, 64, 13, 13], ConvConfig {
            dilation: Some(2),
            ..conv(96, 3, 1, 2)
        }),
        Scenario::new("rect_3x5_s2x1_p1x2_o32", &[1, 48, 13, 13], ConvConfig {
            kernel_h: Some(3),
            kernel_w: Some(5),
            stride_h: Some(2),
            stride_w: Some(1),
            pad_h: Some(1),
            pad_w: Some(2),
            ..ConvConfig::new(32)
        })
        .with_bias_value(0.7),
        Scenario::new("volumetric_3x3x3_p1_o16", &[1, 8, 6, 13, 13], conv(16, 3, 1, 1)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_seeds_are_stable_and_distinct() {
        let a = Scenario::new("conv1", &[1, 1, 3, 3], conv(1, 3, 1, 0));
        let b = Scenario::new("conv1", &[1, 1, 3, 3], conv(1, 3, 1, 0));
        let c = Scenario::new("conv2", &[1, 1, 3, 3], conv(1, 3, 1, 0));
        assert_eq!(a.seed, b.seed);
        assert_ne!(a.seed, c.seed);
    }

    #[test]
    fn test_shipped_sweeps_resolve() {
        for scenario in alexnet_tower().into_iter().chain(structural_sweep()) {
            assert!(
                scenario.config.resolve(&scenario.input_shape).is_ok(),
                "scenario {} does not resolve",
                scenario.name
            );
        }
    }
}
