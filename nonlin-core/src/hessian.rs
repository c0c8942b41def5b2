//! Hessian models for the SQP family of subproblems.
//!
//! `Exact` evaluates the Lagrangian Hessian of the current problem view,
//! optionally convexified by adding alpha*I with alpha found by trial
//! factorizations until the matrix is positive definite (Nocedal & Wright,
//! ch. 3 seeding from the smallest diagonal entry). `Zero` produces an empty
//! matrix and turns the quadratic subproblem into an LP.

use crate::error::{EvaluationError, SolverError};
use crate::iterate::Iterate;
use crate::linalg::coo::SymmetricCooMatrix;
use crate::reformulation::OptimizationProblem;
use crate::solvers::ldl_solver::LdlSolver;

pub enum HessianModel {
    Exact {
        convexify: bool,
        trial_solver: LdlSolver,
    },
    Zero,
}

impl HessianModel {
    pub fn from_option(
        name: &str,
        convexify: bool,
        max_dimension: usize,
    ) -> Result<Self, SolverError> {
        match name {
            "exact" => Ok(HessianModel::Exact {
                convexify,
                trial_solver: LdlSolver::new(max_dimension),
            }),
            "zero" => Ok(HessianModel::Zero),
            other => Err(SolverError::InvalidOption(format!(
                "unknown hessian model {other}"
            ))),
        }
    }

    /// True when the subproblem has no quadratic term at all (LP mode).
    pub fn is_zero(&self) -> bool {
        matches!(self, HessianModel::Zero)
    }

    /// Evaluate the (possibly convexified) Lagrangian Hessian of `problem`
    /// at the iterate's primal point.
    pub fn evaluate(
        &mut self,
        problem: &dyn OptimizationProblem,
        iterate: &mut Iterate,
        constraint_multipliers: &[f64],
        hessian: &mut SymmetricCooMatrix,
    ) -> Result<(), EvaluationError> {
        match self {
            HessianModel::Zero => {
                hessian.reset(problem.number_variables());
                Ok(())
            }
            HessianModel::Exact { convexify, trial_solver } => {
                problem.evaluate_lagrangian_hessian(iterate, constraint_multipliers, hessian)?;
                if *convexify {
                    convexify_by_trial_factorization(trial_solver, hessian);
                }
                Ok(())
            }
        }
    }
}

/// Add alpha*I, doubling alpha until the trial factorization reports a
/// positive definite matrix.
fn convexify_by_trial_factorization(solver: &mut LdlSolver, hessian: &mut SymmetricCooMatrix) {
    const BETA: f64 = 1e-4;
    let dimension = hessian.dimension();

    let smallest_diagonal_entry = hessian.smallest_diagonal_entry();
    let mut shift = if smallest_diagonal_entry <= 0. {
        BETA - smallest_diagonal_entry
    } else {
        0.
    };
    if 0. < shift {
        add_identity_multiple(hessian, shift);
    }

    loop {
        let positive_definite = match solver.factorize(hessian) {
            Ok(()) => !solver.is_singular() && solver.inertia() == (dimension, 0, 0),
            Err(_) => false,
        };
        if positive_definite {
            return;
        }
        let previous_shift = shift;
        shift = if shift == 0. { BETA } else { 2. * shift };
        add_identity_multiple(hessian, shift - previous_shift);
    }
}

fn add_identity_multiple(hessian: &mut SymmetricCooMatrix, factor: f64) {
    let dimension = hessian.dimension();
    for i in 0..dimension {
        hessian.insert(i, i, factor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convexification_of_indefinite_matrix() {
        // [[0, 1], [1, 0]] has eigenvalues -1 and 1
        let mut hessian = SymmetricCooMatrix::new(2, 8);
        hessian.insert(1, 0, 1.);

        let mut solver = LdlSolver::new(2);
        convexify_by_trial_factorization(&mut solver, &mut hessian);

        solver.factorize(&hessian).unwrap();
        assert_eq!(solver.inertia(), (2, 0, 0));
    }

    #[test]
    fn test_positive_definite_matrix_untouched() {
        let mut hessian = SymmetricCooMatrix::new(2, 8);
        hessian.insert(0, 0, 2.);
        hessian.insert(1, 1, 3.);
        let nnz_before = hessian.number_nonzeros();

        let mut solver = LdlSolver::new(2);
        convexify_by_trial_factorization(&mut solver, &mut hessian);
        assert_eq!(hessian.number_nonzeros(), nnz_before);
    }
}
