//! Pseudo-random tensor fills for test data generation.
//!
//! Only used to produce non-degenerate inputs and weights; not part of the
//! convolution semantics themselves.

use crate::dtype::Element;
use crate::tensor::Tensor;
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Fill a tensor with samples from `Normal(0, std_dev)`.
///
/// `std_dev` must be finite and positive.
pub fn gaussian<T: Element, R: Rng + ?Sized>(tensor: &mut Tensor<T>, std_dev: f64, rng: &mut R) {
    let dist = Normal::new(0.0, std_dev).expect("invalid gaussian std_dev");
    for elem in tensor.as_mut_slice() {
        *elem = T::from_f64(dist.sample(rng));
    }
}
