//! Symmetric indefinite linear solver.
//!
//! Wraps the `ldl` crate's LDL^T factorization behind a contract that the
//! rest of the engine relies on: factorize a possibly indefinite symmetric
//! matrix, solve linear systems with optional iterative refinement, and
//! report the inertia (n+, n-, n0) read off the signs of the D diagonal.
//!
//! Symbolic and numeric phases are separated. The elimination tree is reused
//! across factorizations as long as the sparsity pattern is unchanged, which
//! is the common case for the regularization loops upstream (they only bump
//! diagonal values that are always present in the pattern).
//!
//! No pivot is ever modified here: the inertia correction upstream owns
//! regularization, and it needs the true inertia to drive it.

use crate::error::LinearSolverError;
use crate::linalg::coo::SymmetricCooMatrix;
use crate::linalg::sparse::{symmetric_to_upper_csc, SparseCsc};

/// LDL^T factorization of symmetric indefinite matrices, with inertia.
pub struct LdlSolver {
    max_dimension: usize,
    n: usize,

    // symbolic factorization (valid while the pattern is unchanged)
    etree: Vec<Option<usize>>,
    l_nz: Vec<usize>,
    pattern_indptr: Vec<usize>,
    pattern_indices: Vec<usize>,

    // numeric factorization
    l_p: Vec<usize>,
    l_i: Vec<usize>,
    l_x: Vec<f64>,
    d: Vec<f64>,
    d_inv: Vec<f64>,
    factorized: bool,
    singular: bool,
    inertia: (usize, usize, usize),

    // reusable factorization workspaces
    bwork: Vec<ldl::Marker>,
    iwork: Vec<usize>,
    fwork: Vec<f64>,
    residual: Vec<f64>,

    /// Refinement sweeps applied in `solve` (0 disables refinement).
    pub refinement_iterations: usize,
}

impl LdlSolver {
    /// Create a solver with workspaces sized to the largest matrix dimension
    /// that will ever be factorized.
    pub fn new(max_dimension: usize) -> Self {
        Self {
            max_dimension,
            n: 0,
            etree: vec![None; max_dimension],
            l_nz: vec![0; max_dimension],
            pattern_indptr: Vec::new(),
            pattern_indices: Vec::new(),
            l_p: vec![0; max_dimension + 1],
            l_i: Vec::new(),
            l_x: Vec::new(),
            d: vec![0.; max_dimension],
            d_inv: vec![0.; max_dimension],
            factorized: false,
            singular: false,
            inertia: (0, 0, 0),
            bwork: vec![ldl::Marker::Unused; max_dimension],
            iwork: vec![0; 3 * max_dimension],
            fwork: vec![0.; max_dimension],
            residual: vec![0.; max_dimension],
            refinement_iterations: 1,
        }
    }

    /// Factorize K = L D L^T. Reuses the symbolic factorization when the
    /// sparsity pattern matches the previous call.
    ///
    /// A zero pivot does not error: the factorization is marked singular and
    /// the caller reads [`Self::is_singular`] / [`Self::inertia`] to react
    /// (typically by regularizing and factorizing again).
    pub fn factorize(&mut self, matrix: &SymmetricCooMatrix) -> Result<(), LinearSolverError> {
        if matrix.dimension() > self.max_dimension {
            return Err(LinearSolverError::InsufficientWorkspace {
                expected: self.max_dimension,
                actual: matrix.dimension(),
            });
        }
        let csc = symmetric_to_upper_csc(matrix);

        if self.pattern_changed(&csc) {
            self.do_symbolic_factorization(&csc)?;
        }
        self.do_numeric_factorization(&csc);
        Ok(())
    }

    fn pattern_changed(&self, csc: &SparseCsc) -> bool {
        let indptr = csc.indptr();
        self.pattern_indptr != indptr.raw_storage() || self.pattern_indices != csc.indices()
    }

    fn do_symbolic_factorization(&mut self, csc: &SparseCsc) -> Result<(), LinearSolverError> {
        self.n = csc.rows();
        let indptr = csc.indptr();
        let a_p = indptr.raw_storage();
        let a_i = csc.indices();

        let mut work = vec![0; self.n];
        self.etree[..self.n].fill(None);
        self.l_nz[..self.n].fill(0);

        ldl::etree(
            self.n,
            a_p,
            a_i,
            &mut work,
            &mut self.l_nz[..self.n],
            &mut self.etree[..self.n],
        )
        .map_err(|_| LinearSolverError::NumericalSingular)?;

        let nnz_l: usize = self.l_nz[..self.n].iter().sum();
        self.l_i.resize(nnz_l, 0);
        self.l_x.resize(nnz_l, 0.);

        self.pattern_indptr = a_p.to_vec();
        self.pattern_indices = a_i.to_vec();
        self.factorized = false;
        Ok(())
    }

    fn do_numeric_factorization(&mut self, csc: &SparseCsc) {
        let indptr = csc.indptr();
        let a_p = indptr.raw_storage();
        let a_i = csc.indices();
        let a_x = csc.data();

        self.bwork[..self.n].fill(ldl::Marker::Unused);
        self.iwork[..3 * self.n].fill(0);
        self.fwork[..self.n].fill(0.);
        self.d[..self.n].fill(0.);
        self.d_inv[..self.n].fill(0.);

        let result = ldl::factor(
            self.n,
            a_p,
            a_i,
            a_x,
            &mut self.l_p[..self.n + 1],
            &mut self.l_i,
            &mut self.l_x,
            &mut self.d[..self.n],
            &mut self.d_inv[..self.n],
            &self.l_nz[..self.n],
            &self.etree[..self.n],
            &mut self.bwork[..self.n],
            &mut self.iwork[..3 * self.n],
            &mut self.fwork[..self.n],
        );

        match result {
            Ok(_) => {
                self.factorized = true;
                self.classify_inertia();
            }
            Err(_) => {
                // exact zero pivot: the matrix is structurally or numerically
                // singular for an LDL^T without pivoting
                self.factorized = false;
                self.singular = true;
                self.inertia = (0, 0, self.n);
            }
        }
    }

    /// Count pivot signs. Pivots below a relative threshold count as zero
    /// eigenvalues, which is what drives the dual regularization upstream on
    /// rank-deficient constraint Jacobians.
    fn classify_inertia(&mut self) {
        let max_abs = self.d[..self.n].iter().fold(0., |acc: f64, &di| acc.max(di.abs()));
        let zero_threshold = 1e-12 * max_abs.max(1.);
        let mut positive = 0;
        let mut negative = 0;
        let mut zero = 0;
        for &pivot in &self.d[..self.n] {
            if pivot > zero_threshold {
                positive += 1;
            } else if pivot < -zero_threshold {
                negative += 1;
            } else {
                zero += 1;
            }
        }
        self.inertia = (positive, negative, zero);
        self.singular = zero > 0;
    }

    /// Solve K x = rhs using the current factorization, with iterative
    /// refinement against the original matrix.
    pub fn solve(
        &mut self,
        matrix: &SymmetricCooMatrix,
        rhs: &[f64],
        solution: &mut [f64],
    ) -> Result<(), LinearSolverError> {
        if rhs.len() != self.n || solution.len() != self.n {
            return Err(LinearSolverError::DimensionMismatch {
                expected: self.n,
                actual: rhs.len(),
            });
        }
        if !self.factorized {
            return Err(LinearSolverError::NumericalSingular);
        }

        solution.copy_from_slice(rhs);
        ldl::solve(self.n, &self.l_p[..self.n + 1], &self.l_i, &self.l_x, &self.d_inv[..self.n], solution);

        for _ in 0..self.refinement_iterations {
            // residual = rhs - K * solution
            let residual = &mut self.residual[..self.n];
            residual.copy_from_slice(rhs);
            matrix.add_product_to(solution, -1., residual);

            ldl::solve(self.n, &self.l_p[..self.n + 1], &self.l_i, &self.l_x, &self.d_inv[..self.n], residual);
            for (xi, correction) in solution.iter_mut().zip(residual.iter()) {
                *xi += correction;
            }
        }
        Ok(())
    }

    /// Inertia (n+, n-, n0) of the last factorized matrix.
    pub fn inertia(&self) -> (usize, usize, usize) {
        self.inertia
    }

    pub fn is_singular(&self) -> bool {
        self.singular
    }

    /// rank = n+ + n-.
    pub fn rank(&self) -> usize {
        self.inertia.0 + self.inertia.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solve_system(matrix: &SymmetricCooMatrix, rhs: &[f64]) -> Vec<f64> {
        let mut solver = LdlSolver::new(matrix.dimension());
        solver.factorize(matrix).unwrap();
        let mut solution = vec![0.; rhs.len()];
        solver.solve(matrix, rhs, &mut solution).unwrap();
        solution
    }

    #[test]
    fn test_positive_definite() {
        // [[2, 1], [1, 2]], solution of K x = [3, 3] is [1, 1]
        let mut matrix = SymmetricCooMatrix::new(2, 3);
        matrix.insert(0, 0, 2.);
        matrix.insert(1, 0, 1.);
        matrix.insert(1, 1, 2.);

        let mut solver = LdlSolver::new(2);
        solver.factorize(&matrix).unwrap();
        assert_eq!(solver.inertia(), (2, 0, 0));
        assert!(!solver.is_singular());
        assert_eq!(solver.rank(), 2);

        let mut x = vec![0.; 2];
        solver.solve(&matrix, &[3., 3.], &mut x).unwrap();
        assert!((x[0] - 1.).abs() < 1e-10);
        assert!((x[1] - 1.).abs() < 1e-10);
    }

    #[test]
    fn test_indefinite_saddle_point() {
        // [[1, 0, 1], [0, 1, 1], [1, 1, 0]]: a KKT-shaped matrix with
        // inertia (2, 1, 0). The zero diagonal entry is stored explicitly,
        // as the KKT assemblies do.
        let mut matrix = SymmetricCooMatrix::new(3, 6);
        matrix.insert(0, 0, 1.);
        matrix.insert(1, 1, 1.);
        matrix.insert(2, 0, 1.);
        matrix.insert(2, 1, 1.);
        matrix.insert(2, 2, 0.);

        let mut solver = LdlSolver::new(3);
        solver.factorize(&matrix).unwrap();
        assert_eq!(solver.inertia(), (2, 1, 0));

        // verify K x = b by residual
        let b = [1., 2., 3.];
        let x = solve_system(&matrix, &b);
        let mut kx = vec![0.; 3];
        matrix.add_product_to(&x, 1., &mut kx);
        for i in 0..3 {
            assert!((kx[i] - b[i]).abs() < 1e-9, "residual too large at {i}");
        }
    }

    #[test]
    fn test_singular_matrix_reports_zero_eigenvalue() {
        // [[1, 1], [1, 1]] is rank 1
        let mut matrix = SymmetricCooMatrix::new(2, 3);
        matrix.insert(0, 0, 1.);
        matrix.insert(1, 0, 1.);
        matrix.insert(1, 1, 1.);

        let mut solver = LdlSolver::new(2);
        solver.factorize(&matrix).unwrap();
        assert!(solver.is_singular());
        assert!(solver.rank() < 2);
    }

    #[test]
    fn test_workspace_too_small() {
        let matrix = SymmetricCooMatrix::new(5, 0);
        let mut solver = LdlSolver::new(3);
        assert!(matches!(
            solver.factorize(&matrix),
            Err(LinearSolverError::InsufficientWorkspace { .. })
        ));
    }

    #[test]
    fn test_pattern_reuse_with_changed_values() {
        let mut matrix = SymmetricCooMatrix::new(2, 3);
        matrix.insert(0, 0, 2.);
        matrix.insert(1, 0, 1.);
        matrix.insert(1, 1, 2.);

        let mut solver = LdlSolver::new(2);
        solver.factorize(&matrix).unwrap();

        // same pattern, new values: symbolic factorization is reused
        let mut updated = SymmetricCooMatrix::new(2, 3);
        updated.insert(0, 0, 4.);
        updated.insert(1, 0, 1.);
        updated.insert(1, 1, 4.);
        solver.factorize(&updated).unwrap();

        let mut x = vec![0.; 2];
        solver.solve(&updated, &[5., 5.], &mut x).unwrap();
        assert!((x[0] - 1.).abs() < 1e-10);
        assert!((x[1] - 1.).abs() < 1e-10);
    }
}
