use std::sync::Arc;

use ndarray::{Array2, Axis};
use num_complex::Complex64;
use rustfft::{num_traits::Zero, Fft, FftPlanner};

/// Helper that wraps a `rustfft` plan together with its scratch space.
pub struct FftHelper {
    fft: Arc<dyn Fft<f64>>,
    scratch: Vec<Complex64>,
    column: Vec<Complex64>,
}

impl FftHelper {
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size.max(1));
        let scratch = vec![Complex64::zero(); fft.get_inplace_scratch_len()];
        let column = vec![Complex64::zero(); fft.len()];
        Self {
            fft,
            scratch,
            column,
        }
    }

    /// Transforms `buffer` in place. The buffer length must equal the planned size.
    pub fn forward(&mut self, buffer: &mut [Complex64]) {
        self.fft.process_with_scratch(buffer, &mut self.scratch);
    }

    /// Transforms every row of `matrix` in place (row length must equal the planned size).
    pub fn forward_rows(&mut self, matrix: &mut Array2<Complex64>) {
        for mut row in matrix.axis_iter_mut(Axis(0)) {
            match row.as_slice_mut() {
                Some(slice) => self.fft.process_with_scratch(slice, &mut self.scratch),
                None => {
                    for (dst, src) in self.column.iter_mut().zip(row.iter()) {
                        *dst = *src;
                    }
                    self.fft
                        .process_with_scratch(&mut self.column, &mut self.scratch);
                    for (dst, src) in row.iter_mut().zip(self.column.iter()) {
                        *dst = *src;
                    }
                }
            }
        }
    }

    /// Transforms every column of `matrix` in place (column length must equal the planned size).
    pub fn forward_columns(&mut self, matrix: &mut Array2<Complex64>) {
        for mut column in matrix.axis_iter_mut(Axis(1)) {
            for (dst, src) in self.column.iter_mut().zip(column.iter()) {
                *dst = *src;
            }
            self.fft
                .process_with_scratch(&mut self.column, &mut self.scratch);
            for (dst, src) in column.iter_mut().zip(self.column.iter()) {
                *dst = *src;
            }
        }
    }
}
