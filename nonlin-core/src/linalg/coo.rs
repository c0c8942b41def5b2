//! Symmetric matrix in coordinate (triplet) format.
//!
//! Only the lower triangle is stored (`row >= column`). Entries with repeated
//! coordinates are allowed and sum; the CSC conversion in
//! [`crate::linalg::sparse`] accumulates them before factorization.

/// Lower-triangular coordinate storage of a symmetric matrix.
#[derive(Debug, Clone)]
pub struct SymmetricCooMatrix {
    dimension: usize,
    rows: Vec<usize>,
    columns: Vec<usize>,
    values: Vec<f64>,
}

impl SymmetricCooMatrix {
    pub fn new(dimension: usize, capacity: usize) -> Self {
        Self {
            dimension,
            rows: Vec::with_capacity(capacity),
            columns: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn number_nonzeros(&self) -> usize {
        self.values.len()
    }

    /// Reset to an empty matrix of a (possibly new) dimension, keeping the
    /// allocated capacity.
    pub fn reset(&mut self, dimension: usize) {
        self.dimension = dimension;
        self.rows.clear();
        self.columns.clear();
        self.values.clear();
    }

    /// Insert an entry of the lower triangle.
    pub fn insert(&mut self, row: usize, column: usize, value: f64) {
        debug_assert!(row >= column, "symmetric matrices store the lower triangle");
        debug_assert!(row < self.dimension);
        self.rows.push(row);
        self.columns.push(column);
        self.values.push(value);
    }

    /// Visit every stored nonzero exactly once.
    pub fn for_each(&self, mut visit: impl FnMut(usize, usize, f64)) {
        for entry in 0..self.values.len() {
            visit(self.rows[entry], self.columns[entry], self.values[entry]);
        }
    }

    /// Smallest diagonal entry (0 if no diagonal entry is stored).
    /// Duplicated diagonal coordinates are summed first.
    pub fn smallest_diagonal_entry(&self) -> f64 {
        let mut diagonal = vec![0.; self.dimension];
        self.for_each(|row, column, value| {
            if row == column {
                diagonal[row] += value;
            }
        });
        diagonal.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Symmetric matrix-vector product: result += scaling * A * x.
    pub fn add_product_to(&self, x: &[f64], scaling: f64, result: &mut [f64]) {
        self.for_each(|row, column, value| {
            result[row] += scaling * value * x[column];
            if row != column {
                result[column] += scaling * value * x[row];
            }
        });
    }

    /// Quadratic form x^T A x.
    pub fn quadratic_form(&self, x: &[f64]) -> f64 {
        let mut total = 0.;
        self.for_each(|row, column, value| {
            total += if row == column {
                value * x[row] * x[row]
            } else {
                2. * value * x[row] * x[column]
            };
        });
        total
    }

    pub fn has_non_finite(&self) -> bool {
        self.values.iter().any(|value| !value.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_each_and_products() {
        // [[2, 1], [1, 3]]
        let mut matrix = SymmetricCooMatrix::new(2, 3);
        matrix.insert(0, 0, 2.);
        matrix.insert(1, 0, 1.);
        matrix.insert(1, 1, 3.);

        let mut count = 0;
        matrix.for_each(|_, _, _| count += 1);
        assert_eq!(count, 3);

        let x = [1., 2.];
        let mut result = [0., 0.];
        matrix.add_product_to(&x, 1., &mut result);
        assert_eq!(result, [4., 7.]);
        assert_eq!(matrix.quadratic_form(&x), 18.);
        assert_eq!(matrix.smallest_diagonal_entry(), 2.);
    }

    #[test]
    fn test_duplicates_sum_in_diagonal() {
        let mut matrix = SymmetricCooMatrix::new(1, 2);
        matrix.insert(0, 0, 1.);
        matrix.insert(0, 0, -3.);
        assert_eq!(matrix.smallest_diagonal_entry(), -2.);
    }
}
