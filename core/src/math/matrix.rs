use ndarray::Array2;

pub struct MatrixHelper;

impl MatrixHelper {
    /// Circularly shifts rows so that row 0 lands at `nrows / 2` (numpy `fftshift` on axis 0).
    pub fn fftshift_rows<T: Clone>(matrix: &mut Array2<T>) {
        let rows = matrix.nrows();
        let cols = matrix.ncols();
        if rows < 2 {
            return;
        }
        let shift = (rows / 2) * cols;
        match matrix.as_slice_mut() {
            Some(slice) => slice.rotate_right(shift),
            None => {
                let shifted = Array2::from_shape_fn((rows, cols), |(r, c)| {
                    matrix[[(r + rows - rows / 2) % rows, c]].clone()
                });
                *matrix = shifted;
            }
        }
    }

    /// Position and value of the largest cell; ties keep the first in row-major order.
    pub fn argmax(matrix: &Array2<f64>) -> Option<((usize, usize), f64)> {
        let mut best: Option<((usize, usize), f64)> = None;
        for (index, &value) in matrix.indexed_iter() {
            let replace = match best {
                Some((_, current)) => value > current,
                None => true,
            };
            if replace {
                best = Some((index, value));
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fftshift_moves_first_row_to_centre() {
        let mut matrix = Array2::from_shape_vec((4, 1), vec![0, 1, 2, 3]).unwrap();
        MatrixHelper::fftshift_rows(&mut matrix);
        assert_eq!(matrix.column(0).to_vec(), vec![2, 3, 0, 1]);

        let mut odd = Array2::from_shape_vec((5, 1), vec![0, 1, 2, 3, 4]).unwrap();
        MatrixHelper::fftshift_rows(&mut odd);
        assert_eq!(odd.column(0).to_vec(), vec![3, 4, 0, 1, 2]);
    }

    #[test]
    fn fftshift_handles_transposed_layout() {
        let base = Array2::from_shape_vec((2, 3), vec![0, 1, 2, 3, 4, 5]).unwrap();
        let mut transposed = base.reversed_axes();
        MatrixHelper::fftshift_rows(&mut transposed);
        assert_eq!(transposed.column(0).to_vec(), vec![2, 0, 1]);
    }

    #[test]
    fn argmax_prefers_first_occurrence() {
        let matrix = Array2::from_shape_vec((2, 2), vec![1.0, 5.0, 5.0, 2.0]).unwrap();
        assert_eq!(MatrixHelper::argmax(&matrix), Some(((0, 1), 5.0)));
        assert_eq!(MatrixHelper::argmax(&Array2::<f64>::zeros((0, 3))), None);
    }
}
