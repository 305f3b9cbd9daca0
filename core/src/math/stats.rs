use ndarray::{Array1, Array2, Axis};
use num_complex::Complex64;

pub struct StatsHelper;

impl StatsHelper {
    /// Mean of each column, i.e. across the rows of `matrix`.
    pub fn column_mean(matrix: &Array2<Complex64>) -> Array1<Complex64> {
        let rows = matrix.nrows();
        if rows == 0 {
            return Array1::zeros(matrix.ncols());
        }
        let mut mean = matrix.sum_axis(Axis(0));
        mean.mapv_inplace(|v| v / rows as f64);
        mean
    }

    /// `n` evenly spaced points over `[start, end]`, endpoints included.
    pub fn linspace(start: f64, end: f64, n: usize) -> Array1<f64> {
        let step = if n > 1 {
            (end - start) / (n - 1) as f64
        } else {
            0.0
        };
        Array1::from_iter((0..n).map(|i| start + i as f64 * step))
    }
}
