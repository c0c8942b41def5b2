//! Optimality residuals and their scaling factors.
//!
//! Stationarity and complementarity are measured on the original model, in
//! the norm selected by the `residual_norm` option, and divided by
//! multiplier-magnitude scalings before any comparison with the tolerance.

use crate::error::EvaluationError;
use crate::iterate::Iterate;
use crate::model::{Model, INFINITY};
use crate::linalg::vector::{norm, norm_1, Norm};

/// Residuals cached on an iterate.
#[derive(Debug, Clone)]
pub struct Residuals {
    /// Constraint violation in the residual norm
    pub infeasibility: f64,
    /// Lagrangian gradient norm with sigma = 1
    pub optimality_stationarity: f64,
    /// Lagrangian gradient norm with sigma = 0
    pub feasibility_stationarity: f64,
    /// Complementarity error with the sigma = 1 multipliers
    pub optimality_complementarity: f64,
    /// Complementarity error ignoring the objective
    pub feasibility_complementarity: f64,
    /// s_d: stationarity scaling
    pub stationarity_scaling: f64,
    /// s_c: complementarity scaling
    pub complementarity_scaling: f64,
}

impl Default for Residuals {
    fn default() -> Self {
        Self {
            infeasibility: f64::INFINITY,
            optimality_stationarity: f64::INFINITY,
            feasibility_stationarity: f64::INFINITY,
            optimality_complementarity: f64::INFINITY,
            feasibility_complementarity: f64::INFINITY,
            stationarity_scaling: 1.,
            complementarity_scaling: 1.,
        }
    }
}

/// Dense Lagrangian gradient `sigma * grad f + J^T lambda - z_L - z_U` on the
/// model variables.
pub fn lagrangian_gradient(
    model: &dyn Model,
    iterate: &Iterate,
    objective_multiplier: f64,
    gradient: &mut [f64],
) {
    let n = model.number_variables();
    gradient[..n].fill(0.);
    if objective_multiplier != 0. {
        iterate
            .evaluations
            .objective_gradient
            .add_to_dense(objective_multiplier, gradient);
    }
    iterate
        .evaluations
        .constraint_jacobian
        .add_transpose_product_to(&iterate.multipliers.constraints, 1., gradient);
    for i in 0..n {
        gradient[i] -= iterate.multipliers.lower_bounds[i] + iterate.multipliers.upper_bounds[i];
    }
}

/// Complementarity error of the bound and constraint pairs.
///
/// Outside the barrier subproblem (`barrier_parameter == 0`) each pair
/// contributes `|min(slack, multiplier)|`; in the barrier subproblem the
/// shifted products `|multiplier * slack - mu|` are used instead.
pub fn complementarity_error(
    model: &dyn Model,
    iterate: &Iterate,
    barrier_parameter: f64,
    norm_kind: Norm,
) -> f64 {
    let n = model.number_variables();
    let m = model.number_constraints();
    let mut entries: Vec<f64> = Vec::with_capacity(2 * (n + m));

    let pair = |slack: f64, multiplier: f64| -> f64 {
        if 0. < barrier_parameter {
            multiplier * slack - barrier_parameter
        } else {
            slack.min(multiplier)
        }
    };

    for i in 0..n {
        let xi = iterate.primals[i];
        let lb = model.variable_lower_bound(i);
        let ub = model.variable_upper_bound(i);
        if -INFINITY < lb {
            entries.push(pair(xi - lb, iterate.multipliers.lower_bounds[i]));
        }
        if ub < INFINITY {
            entries.push(pair(ub - xi, -iterate.multipliers.upper_bounds[i]));
        }
    }
    for j in 0..m {
        let cj = iterate.evaluations.constraints[j];
        let lb = model.constraint_lower_bound(j);
        let ub = model.constraint_upper_bound(j);
        let lambda = iterate.multipliers.constraints[j];
        // split the constraint multiplier into its lower/upper parts
        if -INFINITY < lb && lb < ub {
            entries.push(pair((cj - lb).max(0.), (-lambda).max(0.)));
        }
        if ub < INFINITY && lb < ub {
            entries.push(pair((ub - cj).max(0.), lambda.max(0.)));
        }
    }
    norm(entries.into_iter(), norm_kind)
}

/// Evaluate and cache all residuals and scalings of an iterate.
pub fn compute_residuals(
    model: &dyn Model,
    iterate: &mut Iterate,
    norm_kind: Norm,
    s_max: f64,
    barrier_parameter: f64,
) -> Result<(), EvaluationError> {
    iterate.evaluate_constraints(model)?;
    iterate.evaluate_objective_gradient(model)?;
    iterate.evaluate_constraint_jacobian(model)?;

    let n = model.number_variables();
    let m = model.number_constraints();

    let mut gradient = vec![0.; n];
    lagrangian_gradient(model, iterate, 1., &mut gradient);
    iterate.residuals.optimality_stationarity = norm(gradient.iter().copied(), norm_kind);
    lagrangian_gradient(model, iterate, 0., &mut gradient);
    iterate.residuals.feasibility_stationarity = norm(gradient.iter().copied(), norm_kind);

    iterate.residuals.infeasibility = crate::model::constraint_violation(
        model,
        &iterate.evaluations.constraints,
        norm_kind,
    );

    iterate.residuals.optimality_complementarity =
        complementarity_error(model, iterate, barrier_parameter, norm_kind);
    iterate.residuals.feasibility_complementarity = iterate.residuals.optimality_complementarity;

    // scaling factors, capped from below by s_max
    let multiplier_mass = norm_1(&iterate.multipliers.constraints[..m])
        + norm_1(&iterate.multipliers.lower_bounds[..n])
        + norm_1(&iterate.multipliers.upper_bounds[..n]);
    iterate.residuals.stationarity_scaling =
        s_max.max(multiplier_mass / ((n + m) as f64)) / s_max;

    let bound_multiplier_mass: f64 = (0..n)
        .map(|i| (iterate.multipliers.lower_bounds[i] + iterate.multipliers.upper_bounds[i]).abs())
        .sum();
    iterate.residuals.complementarity_scaling =
        s_max.max(bound_multiplier_mass / (n as f64)) / s_max;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::coo::SymmetricCooMatrix;
    use crate::linalg::rectangular::RectangularMatrix;
    use crate::linalg::sparse_vector::SparseVector;

    /// min x0 + x1 s.t. x0 + x1 >= 1, x >= 0
    struct Toy;

    impl Model for Toy {
        fn name(&self) -> &str {
            "toy"
        }
        fn number_variables(&self) -> usize {
            2
        }
        fn number_constraints(&self) -> usize {
            1
        }
        fn evaluate_objective(&self, x: &[f64]) -> f64 {
            x[0] + x[1]
        }
        fn evaluate_objective_gradient(&self, _x: &[f64], gradient: &mut SparseVector) {
            gradient.insert(0, 1.);
            gradient.insert(1, 1.);
        }
        fn evaluate_constraints(&self, x: &[f64], constraints: &mut [f64]) {
            constraints[0] = x[0] + x[1];
        }
        fn evaluate_constraint_gradient(&self, _x: &[f64], _j: usize, gradient: &mut SparseVector) {
            gradient.insert(0, 1.);
            gradient.insert(1, 1.);
        }
        fn evaluate_constraint_jacobian(&self, x: &[f64], jacobian: &mut RectangularMatrix) {
            self.evaluate_constraint_gradient(x, 0, jacobian.row_mut(0));
        }
        fn evaluate_lagrangian_hessian(
            &self,
            _x: &[f64],
            _sigma: f64,
            _multipliers: &[f64],
            _hessian: &mut SymmetricCooMatrix,
        ) {
        }
        fn variable_lower_bound(&self, _i: usize) -> f64 {
            0.
        }
        fn variable_upper_bound(&self, _i: usize) -> f64 {
            f64::INFINITY
        }
        fn constraint_lower_bound(&self, _j: usize) -> f64 {
            1.
        }
        fn constraint_upper_bound(&self, _j: usize) -> f64 {
            f64::INFINITY
        }
        fn initial_primal_point(&self, x: &mut [f64]) {
            x.fill(0.5);
        }
    }

    #[test]
    fn test_kkt_point_residuals_vanish() {
        let model = Toy;
        // solution x = (0.5, 0.5) with lambda = -1 (active lower constraint
        // bound) satisfies grad f + J^T lambda = 0
        let mut iterate = Iterate::new(2, 2, 1);
        iterate.primals.copy_from_slice(&[0.5, 0.5]);
        iterate.multipliers.constraints[0] = -1.;

        compute_residuals(&model, &mut iterate, Norm::Inf, 100., 0.).unwrap();
        assert!(iterate.residuals.optimality_stationarity < 1e-12);
        assert!(iterate.residuals.infeasibility < 1e-12);
        assert!(iterate.residuals.optimality_complementarity < 1e-12);
        assert_eq!(iterate.residuals.stationarity_scaling, 1.);
    }

    #[test]
    fn test_scaling_kicks_in_for_large_multipliers() {
        let model = Toy;
        let mut iterate = Iterate::new(2, 2, 1);
        iterate.primals.copy_from_slice(&[0.5, 0.5]);
        iterate.multipliers.constraints[0] = -1e6;
        compute_residuals(&model, &mut iterate, Norm::Inf, 100., 0.).unwrap();
        // s_d = (1e6 / 3) / 100 >> 1
        assert!(iterate.residuals.stationarity_scaling > 1e3);
    }
}
