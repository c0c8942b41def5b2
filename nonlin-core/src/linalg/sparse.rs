//! CSC utilities built on `sprs`.
//!
//! The factorization backend consumes the upper triangle in CSC format; the
//! conversion from the solver's lower-triangular coordinate storage happens
//! here. Triplet conversion sums duplicate coordinates, which is what lets
//! matrix assembly repeat coordinates freely.

use sprs::{CsMat, TriMat};

use crate::linalg::coo::SymmetricCooMatrix;

/// Sparse matrix in CSC format.
pub type SparseCsc = CsMat<f64>;

/// Build a sparse CSC matrix from (row, col, value) triplets.
pub fn from_triplets<I>(nrows: usize, ncols: usize, triplets: I) -> SparseCsc
where
    I: IntoIterator<Item = (usize, usize, f64)>,
{
    let mut tri = TriMat::new((nrows, ncols));
    for (i, j, v) in triplets {
        tri.add_triplet(i, j, v);
    }
    tri.to_csc()
}

/// Convert lower-triangular symmetric coordinate storage to upper-triangle
/// CSC, mirroring each entry across the diagonal. Duplicates sum.
pub fn symmetric_to_upper_csc(matrix: &SymmetricCooMatrix) -> SparseCsc {
    let n = matrix.dimension();
    let mut tri = TriMat::new((n, n));
    matrix.for_each(|row, column, value| {
        // (row, column) with row >= column mirrors to upper entry (column, row)
        tri.add_triplet(column, row, value);
    });
    tri.to_csc()
}

/// Sparse matrix-vector product: y = alpha * A * x + beta * y.
pub fn spmv(a: &SparseCsc, x: &[f64], y: &mut [f64], alpha: f64, beta: f64) {
    assert_eq!(a.cols(), x.len());
    assert_eq!(a.rows(), y.len());

    if beta == 0. {
        y.fill(0.);
    } else if beta != 1. {
        for yi in y.iter_mut() {
            *yi *= beta;
        }
    }

    if alpha != 0. {
        for (val, (row, col)) in a.iter() {
            y[row] += alpha * (*val) * x[col];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_to_upper_csc_sums_duplicates() {
        let mut matrix = SymmetricCooMatrix::new(2, 4);
        matrix.insert(0, 0, 1.);
        matrix.insert(1, 0, 2.);
        matrix.insert(1, 0, 3.); // duplicate coordinate
        matrix.insert(1, 1, 4.);

        let csc = symmetric_to_upper_csc(&matrix);
        assert_eq!(csc.rows(), 2);
        assert_eq!(csc.nnz(), 3);
        // entry (0, 1) of the upper triangle holds 2 + 3
        assert_eq!(*csc.get(0, 1).unwrap(), 5.);
        assert_eq!(*csc.get(0, 0).unwrap(), 1.);
        assert_eq!(*csc.get(1, 1).unwrap(), 4.);
    }

    #[test]
    fn test_spmv() {
        // [[1, 2], [3, 4]]
        let a = from_triplets(2, 2, vec![(0, 0, 1.), (0, 1, 2.), (1, 0, 3.), (1, 1, 4.)]);
        let x = [1., 2.];
        let mut y = [0., 0.];
        spmv(&a, &x, &mut y, 1., 0.);
        assert_eq!(y, [5., 11.]);
    }
}
