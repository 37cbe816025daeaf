//! Common test utilities
#![allow(dead_code)]

use convparity::conv::ConvConfig;

/// Shorthand for a square-kernel configuration
pub fn conv_config(num_output: usize, kernel: usize, stride: usize, pad: usize) -> ConvConfig {
    ConvConfig {
        kernel_size: Some(kernel),
        stride: Some(stride),
        pad: Some(pad),
        ..ConvConfig::new(num_output)
    }
}

/// Assert two f64 slices are element-wise close within an absolute tolerance
pub fn assert_allclose_f64(a: &[f64], b: &[f64], atol: f64, msg: &str) {
    assert_eq!(a.len(), b.len(), "{}: length mismatch", msg);
    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        let diff = (x - y).abs();
        assert!(
            diff <= atol,
            "{}: element {} differs: {} vs {} (diff={}, atol={})",
            msg,
            i,
            x,
            y,
            diff,
            atol
        );
    }
}
