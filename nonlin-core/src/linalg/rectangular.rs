//! Row-wise sparse rectangular matrix.
//!
//! The constraint Jacobian is stored as one sparse gradient per constraint,
//! which is the shape the oracle produces and the shape the subproblems
//! consume (row scans for linearized bounds, transpose products for
//! stationarity residuals).

use crate::linalg::sparse_vector::SparseVector;

#[derive(Debug, Clone, Default)]
pub struct RectangularMatrix {
    rows: Vec<SparseVector>,
    number_columns: usize,
}

impl RectangularMatrix {
    pub fn new(number_rows: usize, number_columns: usize) -> Self {
        Self {
            rows: (0..number_rows).map(|_| SparseVector::default()).collect(),
            number_columns,
        }
    }

    pub fn number_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn number_columns(&self) -> usize {
        self.number_columns
    }

    pub fn row(&self, row_index: usize) -> &SparseVector {
        &self.rows[row_index]
    }

    pub fn row_mut(&mut self, row_index: usize) -> &mut SparseVector {
        &mut self.rows[row_index]
    }

    pub fn clear(&mut self) {
        for row in &mut self.rows {
            row.clear();
        }
    }

    /// result += scaling * A^T * y, accumulating row by row.
    pub fn add_transpose_product_to(&self, y: &[f64], scaling: f64, result: &mut [f64]) {
        for (row_index, row) in self.rows.iter().enumerate() {
            let multiplier = y[row_index];
            if multiplier != 0. {
                row.add_to_dense(scaling * multiplier, result);
            }
        }
    }

    /// Row products: result[j] = (A x)[j].
    pub fn product(&self, x: &[f64], result: &mut [f64]) {
        for (row_index, row) in self.rows.iter().enumerate() {
            result[row_index] = row.dot(x);
        }
    }

    pub fn has_non_finite(&self) -> bool {
        self.rows.iter().any(SparseVector::has_non_finite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_products() {
        // A = [[1, 2], [0, 3]]
        let mut jacobian = RectangularMatrix::new(2, 2);
        jacobian.row_mut(0).insert(0, 1.);
        jacobian.row_mut(0).insert(1, 2.);
        jacobian.row_mut(1).insert(1, 3.);

        let x = [1., 1.];
        let mut ax = [0., 0.];
        jacobian.product(&x, &mut ax);
        assert_eq!(ax, [3., 3.]);

        let y = [1., 2.];
        let mut aty = [0., 0.];
        jacobian.add_transpose_product_to(&y, 1., &mut aty);
        assert_eq!(aty, [1., 8.]);
    }
}
