//! Numerical solver backends: the symmetric indefinite LDL^T factorization
//! and the bound-constrained QP/LP solver. Both are specified by their
//! contracts; the rest of the engine never sees pivoting or barrier details.

pub mod ldl_solver;
pub mod qp_solver;

use crate::error::SolverError;
use crate::options::Options;

/// Build the symmetric indefinite solver selected by the `linear_solver`
/// option, with workspaces sized to the largest matrix dimension the caller
/// will ever factorize.
pub fn create_symmetric_indefinite_solver(
    options: &Options,
    max_dimension: usize,
) -> Result<ldl_solver::LdlSolver, SolverError> {
    match options.get_string("linear_solver")? {
        "LDL" => Ok(ldl_solver::LdlSolver::new(max_dimension)),
        other => Err(SolverError::InvalidOption(format!(
            "unknown linear solver {other}"
        ))),
    }
}
