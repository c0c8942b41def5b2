//! Model oracle.
//!
//! The user provides a [`Model`]: a purely algebraic description of
//!
//! ```text
//! minimize    f(x)
//! subject to  g_L <= c(x) <= g_U
//!             x_L <= x <= x_U
//! ```
//!
//! where f and c are twice continuously differentiable. The solver never
//! parses a modeling format; it only evaluates this trait.

use std::cell::Cell;

use crate::error::SolverError;
use crate::iterate::Iterate;
use crate::linalg::coo::SymmetricCooMatrix;
use crate::linalg::rectangular::RectangularMatrix;
use crate::linalg::sparse_vector::SparseVector;
use crate::linalg::vector::{norm, Norm};
use crate::result::TerminationStatus;

/// Values above this magnitude are treated as infinite bounds.
pub const INFINITY: f64 = 1e30;

/// Classification of a variable or constraint with respect to its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundType {
    EqualBounds,
    BoundedLower,
    BoundedUpper,
    BoundedBothSides,
    Unbounded,
}

impl BoundType {
    /// Classify a `[lower, upper]` interval.
    pub fn from_bounds(lower: f64, upper: f64) -> Self {
        let lower_finite = -INFINITY < lower;
        let upper_finite = upper < INFINITY;
        if lower_finite && upper_finite {
            if lower == upper {
                BoundType::EqualBounds
            } else {
                BoundType::BoundedBothSides
            }
        } else if lower_finite {
            BoundType::BoundedLower
        } else if upper_finite {
            BoundType::BoundedUpper
        } else {
            BoundType::Unbounded
        }
    }

    pub fn has_lower_bound(self) -> bool {
        matches!(self, BoundType::EqualBounds | BoundType::BoundedLower | BoundType::BoundedBothSides)
    }

    pub fn has_upper_bound(self) -> bool {
        matches!(self, BoundType::EqualBounds | BoundType::BoundedUpper | BoundType::BoundedBothSides)
    }
}

/// Constraint function classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionType {
    Linear,
    Nonlinear,
}

/// User-supplied optimization model.
///
/// Gradients are sparse; the Lagrangian Hessian is the lower triangle of
/// `sigma * D2 f + sum_j lambda_j * D2 c_j`. Bounds may be infinite
/// (any magnitude above [`INFINITY`]).
pub trait Model {
    fn name(&self) -> &str;
    fn number_variables(&self) -> usize;
    fn number_constraints(&self) -> usize;

    fn evaluate_objective(&self, x: &[f64]) -> f64;
    fn evaluate_objective_gradient(&self, x: &[f64], gradient: &mut SparseVector);
    fn evaluate_constraints(&self, x: &[f64], constraints: &mut [f64]);
    fn evaluate_constraint_gradient(&self, x: &[f64], constraint_index: usize, gradient: &mut SparseVector);
    fn evaluate_constraint_jacobian(&self, x: &[f64], jacobian: &mut RectangularMatrix);
    fn evaluate_lagrangian_hessian(
        &self,
        x: &[f64],
        objective_multiplier: f64,
        multipliers: &[f64],
        hessian: &mut SymmetricCooMatrix,
    );

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

    fn constraint_type(&self, _constraint_index: usize) -> FunctionType {
        FunctionType::Nonlinear
    }

    /// Objective sign: +1 minimizes, -1 maximizes.
    fn objective_sign(&self) -> f64 {
        1.
    }

    /// Upper bound on the number of nonzeros of the Lagrangian Hessian.
    fn number_hessian_nonzeros(&self) -> usize {
        let n = self.number_variables();
        n * (n + 1) / 2
    }

    /// Upper bound on the number of nonzeros of the constraint Jacobian.
    fn number_jacobian_nonzeros(&self) -> usize {
        self.number_variables() * self.number_constraints()
    }

    fn initial_primal_point(&self, x: &mut [f64]);

    fn initial_dual_point(&self, multipliers: &mut [f64]) {
        multipliers.fill(0.);
    }

    /// Hook invoked by the driver on the final iterate.
    fn postprocess_solution(&self, _iterate: &mut Iterate, _status: TerminationStatus) {}
}

/// Check dimensions and bound consistency before solving.
pub fn validate_model(model: &dyn Model) -> Result<(), SolverError> {
    for variable_index in 0..model.number_variables() {
        let lb = model.variable_lower_bound(variable_index);
        let ub = model.variable_upper_bound(variable_index);
        if lb > ub {
            return Err(SolverError::InvalidModel(format!(
                "variable {variable_index} has lower bound {lb} > upper bound {ub}"
            )));
        }
    }
    for constraint_index in 0..model.number_constraints() {
        let lb = model.constraint_lower_bound(constraint_index);
        let ub = model.constraint_upper_bound(constraint_index);
        if lb > ub {
            return Err(SolverError::InvalidModel(format!(
                "constraint {constraint_index} has lower bound {lb} > upper bound {ub}"
            )));
        }
    }
    Ok(())
}

/// Project a primal point onto the variable bounds, componentwise.
/// Idempotent: projecting a projected point changes nothing.
pub fn project_onto_variable_bounds(model: &dyn Model, x: &mut [f64]) {
    for variable_index in 0..model.number_variables() {
        let lb = model.variable_lower_bound(variable_index);
        let ub = model.variable_upper_bound(variable_index);
        x[variable_index] = x[variable_index].clamp(lb, ub);
    }
}

/// Move a value strictly inside an interval, by a `fraction` of the bound
/// magnitude (capped by the interval width when both sides are finite).
/// Used to start barrier iterations from the relative interior.
pub(crate) fn push_to_interior(value: f64, lower: f64, upper: f64, fraction: f64) -> f64 {
    let mut result = value;
    if -INFINITY < lower {
        let push = if upper < INFINITY {
            (fraction * (upper - lower)).min(fraction * lower.abs().max(1.))
        } else {
            fraction * lower.abs().max(1.)
        };
        result = result.max(lower + push);
    }
    if upper < INFINITY {
        let push = if -INFINITY < lower {
            (fraction * (upper - lower)).min(fraction * upper.abs().max(1.))
        } else {
            fraction * upper.abs().max(1.)
        };
        result = result.min(upper - push);
    }
    result
}

/// Constraint violation of an evaluated constraint vector, in the given norm:
/// componentwise distance of c to the box [g_L, g_U].
pub fn constraint_violation(model: &dyn Model, constraints: &[f64], norm_kind: Norm) -> f64 {
    norm(
        (0..model.number_constraints()).map(|constraint_index| {
            let value = constraints[constraint_index];
            let lb = model.constraint_lower_bound(constraint_index);
            let ub = model.constraint_upper_bound(constraint_index);
            (lb - value).max(0.).max(value - ub)
        }),
        norm_kind,
    )
}

/// Violation restricted to a subset of constraints (restoration phase measure).
pub fn constraint_violation_subset(
    model: &dyn Model,
    constraints: &[f64],
    subset: &[usize],
    norm_kind: Norm,
) -> f64 {
    norm(
        subset.iter().map(|&constraint_index| {
            let value = constraints[constraint_index];
            let lb = model.constraint_lower_bound(constraint_index);
            let ub = model.constraint_upper_bound(constraint_index);
            (lb - value).max(0.).max(value - ub)
        }),
        norm_kind,
    )
}

/// Evaluation counters, tallied by [`CountingModel`].
#[derive(Debug, Default, Clone)]
pub struct EvaluationCounts {
    pub objective: usize,
    pub objective_gradient: usize,
    pub constraints: usize,
    pub jacobian: usize,
    pub hessian: usize,
}

/// Wrapper that counts oracle calls. Counters use `Cell` so that evaluation
/// keeps going through `&dyn Model`; the solver is single-threaded.
pub struct CountingModel<'a> {
    inner: &'a dyn Model,
    objective: Cell<usize>,
    objective_gradient: Cell<usize>,
    constraints: Cell<usize>,
    jacobian: Cell<usize>,
    hessian: Cell<usize>,
}

impl<'a> CountingModel<'a> {
    pub fn new(inner: &'a dyn Model) -> Self {
        Self {
            inner,
            objective: Cell::new(0),
            objective_gradient: Cell::new(0),
            constraints: Cell::new(0),
            jacobian: Cell::new(0),
            hessian: Cell::new(0),
        }
    }

    pub fn counts(&self) -> EvaluationCounts {
        EvaluationCounts {
            objective: self.objective.get(),
            objective_gradient: self.objective_gradient.get(),
            constraints: self.constraints.get(),
            jacobian: self.jacobian.get(),
            hessian: self.hessian.get(),
        }
    }
}

impl Model for CountingModel<'_> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn number_variables(&self) -> usize {
        self.inner.number_variables()
    }

    fn number_constraints(&self) -> usize {
        self.inner.number_constraints()
    }

    fn evaluate_objective(&self, x: &[f64]) -> f64 {
        self.objective.set(self.objective.get() + 1);
        self.inner.evaluate_objective(x)
    }

    fn evaluate_objective_gradient(&self, x: &[f64], gradient: &mut SparseVector) {
        self.objective_gradient.set(self.objective_gradient.get() + 1);
        self.inner.evaluate_objective_gradient(x, gradient)
    }

    fn evaluate_constraints(&self, x: &[f64], constraints: &mut [f64]) {
        self.constraints.set(self.constraints.get() + 1);
        self.inner.evaluate_constraints(x, constraints)
    }

    fn evaluate_constraint_gradient(&self, x: &[f64], constraint_index: usize, gradient: &mut SparseVector) {
        self.inner.evaluate_constraint_gradient(x, constraint_index, gradient)
    }

    fn evaluate_constraint_jacobian(&self, x: &[f64], jacobian: &mut RectangularMatrix) {
        self.jacobian.set(self.jacobian.get() + 1);
        self.inner.evaluate_constraint_jacobian(x, jacobian)
    }

    fn evaluate_lagrangian_hessian(
        &self,
        x: &[f64],
        objective_multiplier: f64,
        multipliers: &[f64],
        hessian: &mut SymmetricCooMatrix,
    ) {
        self.hessian.set(self.hessian.get() + 1);
        self.inner
            .evaluate_lagrangian_hessian(x, objective_multiplier, multipliers, hessian)
    }

    fn variable_lower_bound(&self, variable_index: usize) -> f64 {
        self.inner.variable_lower_bound(variable_index)
    }

    fn variable_upper_bound(&self, variable_index: usize) -> f64 {
        self.inner.variable_upper_bound(variable_index)
    }

    fn constraint_lower_bound(&self, constraint_index: usize) -> f64 {
        self.inner.constraint_lower_bound(constraint_index)
    }

    fn constraint_upper_bound(&self, constraint_index: usize) -> f64 {
        self.inner.constraint_upper_bound(constraint_index)
    }

    fn constraint_type(&self, constraint_index: usize) -> FunctionType {
        self.inner.constraint_type(constraint_index)
    }

    fn objective_sign(&self) -> f64 {
        self.inner.objective_sign()
    }

    fn number_hessian_nonzeros(&self) -> usize {
        self.inner.number_hessian_nonzeros()
    }

    fn number_jacobian_nonzeros(&self) -> usize {
        self.inner.number_jacobian_nonzeros()
    }

    fn initial_primal_point(&self, x: &mut [f64]) {
        self.inner.initial_primal_point(x)
    }

    fn initial_dual_point(&self, multipliers: &mut [f64]) {
        self.inner.initial_dual_point(multipliers)
    }

    fn postprocess_solution(&self, iterate: &mut Iterate, status: TerminationStatus) {
        self.inner.postprocess_solution(iterate, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bound_type() {
        assert_eq!(BoundType::from_bounds(0., 0.), BoundType::EqualBounds);
        assert_eq!(BoundType::from_bounds(0., 1.), BoundType::BoundedBothSides);
        assert_eq!(BoundType::from_bounds(0., f64::INFINITY), BoundType::BoundedLower);
        assert_eq!(BoundType::from_bounds(f64::NEG_INFINITY, 1.), BoundType::BoundedUpper);
        assert_eq!(
            BoundType::from_bounds(f64::NEG_INFINITY, f64::INFINITY),
            BoundType::Unbounded
        );
        // sentinel values beyond 1e30 count as infinite
        assert_eq!(BoundType::from_bounds(-1e31, 1e31), BoundType::Unbounded);
    }
}
