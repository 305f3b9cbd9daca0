use std::f64::consts::PI;

use ndarray::Array1;

const BH_A0: f64 = 0.35875;
const BH_A1: f64 = 0.48829;
const BH_A2: f64 = 0.14128;
const BH_A3: f64 = 0.01168;

/// Symmetric 4-term Blackman-Harris window of `length` points.
pub fn blackman_harris(length: usize) -> Array1<f64> {
    if length <= 1 {
        return Array1::ones(length);
    }
    let denom = (length - 1) as f64;
    Array1::from_iter((0..length).map(|n| {
        let x = 2.0 * PI * n as f64 / denom;
        BH_A0 - BH_A1 * x.cos() + BH_A2 * (2.0 * x).cos() - BH_A3 * (3.0 * x).cos()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_symmetric_with_unit_peak() {
        let window = blackman_harris(33);
        for n in 0..33 {
            assert!((window[n] - window[32 - n]).abs() < 1e-12);
        }
        assert!((window[16] - 1.0).abs() < 1e-12);
        assert!(window[0] < 1e-4);
    }

    #[test]
    fn degenerate_lengths() {
        assert_eq!(blackman_harris(0).len(), 0);
        assert_eq!(blackman_harris(1)[0], 1.0);
    }
}
