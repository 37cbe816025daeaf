//! Equivalence sweeps: the built-in direct path against the brute-force
//! reference, plus deliberately broken implementations to exercise the
//! verifier's diagnostics and failure isolation.

mod common;

use common::conv_config;
use convparity::conv::{ConvParams, DirectConv, WeightSet, reference_convolution};
use convparity::error::Result;
use convparity::fill;
use convparity::tensor::Tensor;
use convparity::verify::{ConvForward, Outcome, run_scenario, run_scenarios, scenarios};
use rand::SeedableRng;
use rand::rngs::StdRng;

#[test]
fn alexnet_tower_passes_within_tolerance() {
    let reports = run_scenarios::<f32, _>(&DirectConv, &scenarios::alexnet_tower());
    assert_eq!(reports.len(), 9);
    for report in &reports {
        assert!(report.passed(), "{report}");
    }
}

#[test]
fn structural_sweep_passes_within_tolerance() {
    let reports = run_scenarios::<f32, _>(&DirectConv, &scenarios::structural_sweep());
    for report in &reports {
        assert!(report.passed(), "{report}");
    }
}

#[test]
fn alexnet_tower_passes_in_f64() {
    // The same sweep at double precision, at a much tighter tolerance.
    let sweep: Vec<_> = scenarios::alexnet_tower()
        .into_iter()
        .map(|s| s.with_tolerance(1e-9))
        .collect();
    let reports = run_scenarios::<f64, _>(&DirectConv, &sweep);
    for report in &reports {
        assert!(report.passed(), "{report}");
    }
}

#[test]
fn tower_weight_fills_scale_down_with_fan_in() {
    // conv1 accumulates 256 * 11 * 11 products per output element; unit
    // variance weights there push f32 output magnitudes to ~200, where the
    // rounding drift between summation orders alone exceeds 1e-4.
    let tower = scenarios::alexnet_tower();
    let conv1 = &tower[0];
    let params = conv1.config.resolve(&conv1.input_shape).unwrap();
    let fan_in = 256.0f64 * 11.0 * 11.0;
    assert!((conv1.weight_std(&params) - 1.0 / fan_in.sqrt()).abs() < 1e-15);
}

#[test]
fn tower_reference_outputs_stay_at_unit_scale() {
    // Fills built exactly as the scenario runner builds them: the largest
    // receptive field in the tower must still produce O(1) outputs, so the
    // fixed 1e-4 bound keeps headroom over f32 rounding drift.
    let tower = scenarios::alexnet_tower();
    let conv1 = &tower[0];
    let params = conv1.config.resolve(&conv1.input_shape).unwrap();

    let mut rng = StdRng::seed_from_u64(conv1.seed);
    let mut input = Tensor::<f32>::zeros(&conv1.input_shape);
    fill::gaussian(&mut input, conv1.fill_std, &mut rng);
    let mut filter = Tensor::<f32>::zeros(&params.filter_shape());
    fill::gaussian(&mut filter, conv1.weight_std(&params), &mut rng);
    let bias = Tensor::full(&[params.num_output], conv1.bias_value as f32);
    let weights = WeightSet::new(filter, Some(bias));

    let out = reference_convolution(&input, &params, &weights).unwrap();
    let max = out.as_slice().iter().fold(0.0f32, |m, v| m.max(v.abs()));
    assert!(max < 10.0, "output magnitude {} too large", max);
    assert!(max > 0.1, "degenerate output, max magnitude {}", max);
}

/// Produces correct values but lies about the output shape.
struct WrongShapeConv;

impl ConvForward<f32> for WrongShapeConv {
    fn forward(
        &self,
        input: &Tensor<f32>,
        params: &ConvParams,
        weights: &WeightSet<f32>,
    ) -> Result<Tensor<f32>> {
        let out = DirectConv.forward(input, params, weights)?;
        // Same data, transposed extents
        let mut shape = out.shape().to_vec();
        shape.swap(0, 1);
        Ok(Tensor::from_slice(out.as_slice(), &shape))
    }
}

#[test]
fn wrong_output_shape_is_reported_per_scenario() {
    let scenario = scenarios::Scenario::new(
        "wrong_shape",
        &[2, 4, 9, 9],
        conv_config(8, 3, 1, 1),
    );
    let report = run_scenario(&WrongShapeConv, &scenario);
    assert!(!report.passed());
    match &report.outcome {
        Outcome::ShapeMismatch { expected, got } => {
            assert_eq!(expected, &[2, 8, 9, 9]);
            assert_eq!(got, &[8, 2, 9, 9]);
        }
        other => panic!("expected ShapeMismatch, got {other:?}"),
    }
}

/// Correct convolution with a single corrupted element.
struct PerturbedConv {
    index: usize,
    delta: f32,
}

impl ConvForward<f32> for PerturbedConv {
    fn forward(
        &self,
        input: &Tensor<f32>,
        params: &ConvParams,
        weights: &WeightSet<f32>,
    ) -> Result<Tensor<f32>> {
        let mut out = DirectConv.forward(input, params, weights)?;
        out.as_mut_slice()[self.index] += self.delta;
        Ok(out)
    }
}

#[test]
fn tolerance_violation_reports_index_and_values() {
    let scenario = scenarios::Scenario::new(
        "perturbed",
        &[1, 2, 5, 5],
        conv_config(3, 3, 1, 1),
    );
    let under_test = PerturbedConv {
        index: 7,
        delta: 0.5,
    };
    let report = run_scenario(&under_test, &scenario);
    assert!(!report.passed());
    match &report.outcome {
        Outcome::ToleranceExceeded {
            tolerance,
            mismatches,
            total_mismatches,
        } => {
            assert_eq!(*tolerance, 1e-4);
            assert_eq!(*total_mismatches, 1);
            let m = &mismatches[0];
            assert_eq!(m.index, 7);
            // output is [1, 3, 5, 5]: index 7 is channel 0, row 1, col 2
            assert_eq!(m.coords, vec![0, 0, 1, 2]);
            assert!((m.actual - m.expected - 0.5).abs() < 1e-3);
        }
        other => panic!("expected ToleranceExceeded, got {other:?}"),
    }
}

#[test]
fn failing_scenario_does_not_abort_the_sweep() {
    let good = |name: &str| {
        scenarios::Scenario::new(name, &[1, 4, 7, 7], conv_config(4, 3, 1, 1))
    };
    // 4 input channels are not divisible by 3 groups: rejected at resolution.
    let bad = scenarios::Scenario::new("indivisible_groups", &[1, 4, 7, 7], {
        let mut config = conv_config(6, 3, 1, 1);
        config.groups = 3;
        config
    });

    let sweep = vec![good("before"), bad, good("after")];
    let reports = run_scenarios::<f32, _>(&DirectConv, &sweep);

    assert_eq!(reports.len(), 3);
    assert!(reports[0].passed());
    assert!(matches!(reports[1].outcome, Outcome::InvalidConfig(_)));
    assert!(reports[2].passed());
}

#[test]
fn zero_bias_sweep_equals_bias_free_plus_zero() {
    // bias_term with a zero fill and no bias_term must verify identically.
    let with_zero_bias = scenarios::Scenario::new(
        "zero_bias",
        &[1, 8, 9, 9],
        conv_config(8, 3, 1, 1),
    );
    let mut config = conv_config(8, 3, 1, 1);
    config.bias_term = false;
    let without = scenarios::Scenario::new("zero_bias", &[1, 8, 9, 9], config);

    assert!(run_scenario::<f32, _>(&DirectConv, &with_zero_bias).passed());
    assert!(run_scenario::<f32, _>(&DirectConv, &without).passed());
}
