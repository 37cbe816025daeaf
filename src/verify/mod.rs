//! Equivalence verification: drive an implementation under test and the
//! reference engine over the same tensors and compare element-wise.
//!
//! Scenarios are independent; a failing scenario produces a failed
//! [`Report`], never aborts the rest of a sweep.

pub mod scenarios;

use crate::conv::{ConvParams, WeightSet, reference_convolution};
use crate::dtype::Element;
use crate::error::{Error, Result};
use crate::fill;
use crate::tensor::Tensor;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fmt;

pub use self::scenarios::Scenario;

/// The injected capability under test: a synchronous, black-box forward pass.
///
/// Given resolved parameters and weights, an implementor must produce an
/// output tensor of the shape computed by the standard output-size formula,
/// numerically equivalent to the reference within the scenario's tolerance.
/// How it gets there (loop order, tiling, internal parallelism) is its own
/// business.
pub trait ConvForward<T: Element> {
    /// Run the forward convolution pass.
    fn forward(
        &self,
        input: &Tensor<T>,
        params: &ConvParams,
        weights: &WeightSet<T>,
    ) -> Result<Tensor<T>>;
}

/// Cap on recorded [`Mismatch`] diagnostics per comparison, so a completely
/// wrong output doesn't allocate one record per element. The total count is
/// still reported.
pub const MAX_REPORTED_MISMATCHES: usize = 16;

/// One element-wise disagreement between optimized and reference outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct Mismatch {
    /// Linear index into the row-major output buffer
    pub index: usize,
    /// The same position as an axis-ordered coordinate tuple
    pub coords: Vec<usize>,
    /// Reference (expected) value
    pub expected: f64,
    /// Value produced by the implementation under test
    pub actual: f64,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "at {:?} (index {}): expected {}, got {} (|diff| = {:e})",
            self.coords,
            self.index,
            self.expected,
            self.actual,
            (self.actual - self.expected).abs()
        )
    }
}

/// Result of an element-wise comparison.
#[derive(Debug, Clone)]
pub struct Comparison {
    /// First [`MAX_REPORTED_MISMATCHES`] mismatches, in index order
    pub mismatches: Vec<Mismatch>,
    /// Total number of mismatching elements
    pub total_mismatches: usize,
}

impl Comparison {
    /// True if every element agreed within tolerance
    pub fn is_match(&self) -> bool {
        self.total_mismatches == 0
    }
}

/// Compare two same-shaped tensors element-wise within an absolute tolerance.
///
/// An element passes when `|actual - reference| <= tolerance` (NaN on either
/// side fails). Returns an error if the shapes disagree; for scenario runs,
/// [`run_scenario`] has already checked the shape against the output-size
/// formula before calling this.
pub fn compare_elementwise<T: Element>(
    actual: &Tensor<T>,
    reference: &Tensor<T>,
    tolerance: f64,
) -> Result<Comparison> {
    if actual.shape() != reference.shape() {
        return Err(Error::shape_mismatch(reference.shape(), actual.shape()));
    }

    let mut mismatches = Vec::new();
    let mut total = 0;
    for (index, (&a, &e)) in actual
        .as_slice()
        .iter()
        .zip(reference.as_slice())
        .enumerate()
    {
        let a = a.to_f64();
        let e = e.to_f64();
        let diff = (a - e).abs();
        if diff.is_nan() || diff > tolerance {
            total += 1;
            if mismatches.len() < MAX_REPORTED_MISMATCHES {
                mismatches.push(Mismatch {
                    index,
                    coords: reference.coords_of(index).to_vec(),
                    expected: e,
                    actual: a,
                });
            }
        }
    }

    Ok(Comparison {
        mismatches,
        total_mismatches: total,
    })
}

/// Outcome of a single scenario.
#[derive(Debug)]
pub enum Outcome {
    /// Optimized and reference outputs agreed everywhere within tolerance
    Pass,
    /// The configuration was rejected before any computation
    InvalidConfig(Error),
    /// The implementation under test returned an error
    ForwardError(Error),
    /// The implementation's declared output shape disagrees with the
    /// output-size formula
    ShapeMismatch {
        /// Shape implied by the formula
        expected: Vec<usize>,
        /// Shape the implementation produced
        got: Vec<usize>,
    },
    /// Element-wise disagreement beyond the scenario tolerance
    ToleranceExceeded {
        /// The absolute tolerance that was applied
        tolerance: f64,
        /// Diagnostic details (capped at [`MAX_REPORTED_MISMATCHES`])
        mismatches: Vec<Mismatch>,
        /// Total number of mismatching elements
        total_mismatches: usize,
    },
}

/// Per-scenario verification result.
#[derive(Debug)]
pub struct Report {
    /// Name of the scenario that produced this report
    pub scenario: String,
    /// What happened
    pub outcome: Outcome,
}

impl Report {
    /// True if the scenario passed
    pub fn passed(&self) -> bool {
        matches!(self.outcome, Outcome::Pass)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Outcome::Pass => write!(f, "[{}] pass", self.scenario),
            Outcome::InvalidConfig(e) => write!(f, "[{}] invalid config: {}", self.scenario, e),
            Outcome::ForwardError(e) => write!(f, "[{}] forward failed: {}", self.scenario, e),
            Outcome::ShapeMismatch { expected, got } => write!(
                f,
                "[{}] output shape {:?} does not match expected {:?}",
                self.scenario, got, expected
            ),
            Outcome::ToleranceExceeded {
                tolerance,
                mismatches,
                total_mismatches,
            } => {
                writeln!(
                    f,
                    "[{}] {} element(s) beyond tolerance {:e}:",
                    self.scenario, total_mismatches, tolerance
                )?;
                for m in mismatches {
                    writeln!(f, "  {}", m)?;
                }
                Ok(())
            }
        }
    }
}

/// Run one scenario: build seeded tensors, run both paths, compare.
///
/// The element type `T` is the working precision of the whole scenario:
/// input, weights, and both accumulations.
pub fn run_scenario<T, F>(under_test: &F, scenario: &Scenario) -> Report
where
    T: Element,
    F: ConvForward<T>,
{
    let report = |outcome| Report {
        scenario: scenario.name.clone(),
        outcome,
    };

    let params = match scenario.config.resolve(&scenario.input_shape) {
        Ok(params) => params,
        Err(e) => return report(Outcome::InvalidConfig(e)),
    };

    let mut rng = StdRng::seed_from_u64(scenario.seed);
    let mut input = Tensor::<T>::zeros(&scenario.input_shape);
    fill::gaussian(&mut input, scenario.fill_std, &mut rng);
    let mut filter = Tensor::<T>::zeros(&params.filter_shape());
    fill::gaussian(&mut filter, scenario.weight_std(&params), &mut rng);
    let bias = params
        .bias_term
        .then(|| Tensor::full(&[params.num_output], T::from_f64(scenario.bias_value)));
    let weights = WeightSet::new(filter, bias);

    let reference = match reference_convolution(&input, &params, &weights) {
        Ok(out) => out,
        Err(e) => return report(Outcome::InvalidConfig(e)),
    };

    let actual = match under_test.forward(&input, &params, &weights) {
        Ok(out) => out,
        Err(e) => return report(Outcome::ForwardError(e)),
    };

    let expected_shape = params.output_shape();
    if actual.shape() != expected_shape.as_slice() {
        return report(Outcome::ShapeMismatch {
            expected: expected_shape.to_vec(),
            got: actual.shape().to_vec(),
        });
    }

    // Shapes are equal at this point, so the comparison cannot fail.
    let comparison = compare_elementwise(&actual, &reference, scenario.tolerance)
        .expect("shape already checked");
    if comparison.is_match() {
        report(Outcome::Pass)
    } else {
        report(Outcome::ToleranceExceeded {
            tolerance: scenario.tolerance,
            mismatches: comparison.mismatches,
            total_mismatches: comparison.total_mismatches,
        })
    }
}

/// Run a sweep of scenarios with per-scenario failure isolation, collecting
/// one [`Report`] each.
pub fn run_scenarios<T, F>(under_test: &F, scenarios: &[Scenario]) -> Vec<Report>
where
    T: Element,
    F: ConvForward<T>,
{
    scenarios
        .iter()
        .map(|scenario| run_scenario(under_test, scenario))
        .collect()
}
