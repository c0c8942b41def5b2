//! Problem views.
//!
//! The algorithm never touches the raw model directly: it works on views
//! that may reformulate the problem (objective scaling, elastic variables,
//! penalty and proximal terms). Every view satisfies
//! `number_variables = n + k` and `number_constraints = m` where the first
//! `n` variables are the model's own.

mod elastic;
mod feasibility;
mod l1_relaxed;
mod optimality;

pub use feasibility::FeasibilityProblem;
pub use l1_relaxed::L1RelaxedProblem;
pub use optimality::OptimalityProblem;

use crate::error::EvaluationError;
use crate::iterate::Iterate;
use crate::linalg::coo::SymmetricCooMatrix;
use crate::linalg::rectangular::RectangularMatrix;
use crate::model::{BoundType, Model};

/// A (possibly reformulated) optimization problem handed to a subproblem.
///
/// All evaluations go through the iterate so that model quantities are
/// computed once and memoized; elastic and penalty contributions are added on
/// top of the cached values.
pub trait OptimizationProblem {
    fn model(&self) -> &dyn Model;
    fn number_variables(&self) -> usize;
    fn number_constraints(&self) -> usize;
    /// sigma: 1 in the optimality phase, 0 in the pure feasibility phase.
    fn objective_multiplier(&self) -> f64;

    fn evaluate_objective(&self, iterate: &mut Iterate) -> Result<f64, EvaluationError>;
    /// Dense objective gradient over the view variables.
    fn evaluate_objective_gradient(
        &self,
        iterate: &mut Iterate,
        gradient: &mut [f64],
    ) -> Result<(), EvaluationError>;
    /// Constraint values over the view variables (elastics folded in).
    fn evaluate_constraints(
        &self,
        iterate: &mut Iterate,
        constraints: &mut [f64],
    ) -> Result<(), EvaluationError>;
    fn evaluate_constraint_jacobian(
        &self,
        iterate: &mut Iterate,
        jacobian: &mut RectangularMatrix,
    ) -> Result<(), EvaluationError>;
    /// Lagrangian Hessian of the view at the iterate, with the view's sigma.
    fn evaluate_lagrangian_hessian(
        &self,
        iterate: &mut Iterate,
        constraint_multipliers: &[f64],
        hessian: &mut SymmetricCooMatrix,
    ) -> Result<(), EvaluationError>;

    fn variable_lower_bound(&self, variable_index: usize) -> f64;
    fn variable_upper_bound(&self, variable_index: usize) -> f64;
    fn constraint_lower_bound(&self, constraint_index: usize) -> f64;
    fn constraint_upper_bound(&self, constraint_index: usize) -> f64;

    fn variable_bound_type(&self, variable_index: usize) -> BoundType {
        BoundType::from_bounds(
            self.variable_lower_bound(variable_index),
            self.variable_upper_bound(variable_index),
        )
    }

    fn constraint_bound_type(&self, constraint_index: usize) -> BoundType {
        BoundType::from_bounds(
            self.constraint_lower_bound(constraint_index),
            self.constraint_upper_bound(constraint_index),
        )
    }
}
