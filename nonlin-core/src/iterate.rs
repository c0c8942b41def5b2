//! Primal-dual iterate with lazily evaluated, memoized model quantities.

use crate::error::EvaluationError;
use crate::linalg::rectangular::RectangularMatrix;
use crate::linalg::sparse_vector::SparseVector;
use crate::linalg::vector::norm_1;
use crate::model::Model;
use crate::residuals::Residuals;
use crate::result::TerminationStatus;

/// Multipliers of a primal-dual point.
///
/// Sign convention (fixed across the whole engine): `lower_bounds >= 0`,
/// `upper_bounds <= 0`. The Lagrangian is
/// `sigma f + lambda^T c - z_L^T (x - x_L) - z_U^T (x - x_U)`.
#[derive(Debug, Clone)]
pub struct Multipliers {
    pub constraints: Vec<f64>,
    pub lower_bounds: Vec<f64>,
    pub upper_bounds: Vec<f64>,
}

impl Multipliers {
    pub fn new(number_variables: usize, number_constraints: usize) -> Self {
        Self {
            constraints: vec![0.; number_constraints],
            lower_bounds: vec![0.; number_variables],
            upper_bounds: vec![0.; number_variables],
        }
    }

    /// True if some multiplier is significantly nonzero. At a Fritz-John
    /// point the combined magnitude may not vanish.
    pub fn not_all_zero(&self, number_variables: usize, tolerance: f64) -> bool {
        for &multiplier in &self.constraints {
            if tolerance < multiplier.abs() {
                return true;
            }
        }
        for variable_index in 0..number_variables {
            let combined = self.lower_bounds[variable_index] + self.upper_bounds[variable_index];
            if tolerance < combined.abs() {
                return true;
            }
        }
        false
    }

    pub fn norm_1(&self) -> f64 {
        norm_1(&self.constraints) + norm_1(&self.lower_bounds) + norm_1(&self.upper_bounds)
    }
}

/// Cached evaluations of the model at the iterate's primal point, each
/// guarded by an evaluated flag.
#[derive(Debug, Clone)]
pub struct Evaluations {
    pub objective: f64,
    pub constraints: Vec<f64>,
    pub objective_gradient: SparseVector,
    pub constraint_jacobian: RectangularMatrix,
    pub is_objective_computed: bool,
    pub are_constraints_computed: bool,
    pub is_objective_gradient_computed: bool,
    pub is_constraint_jacobian_computed: bool,
}

/// Progress measures used by the globalization strategies: infeasibility
/// (theta) and the phase-dependent optimality measure (phi).
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressMeasures {
    pub infeasibility: f64,
    pub optimality: f64,
}

impl ProgressMeasures {
    pub fn reset(&mut self) {
        self.infeasibility = 0.;
        self.optimality = 0.;
    }
}

/// A complete primal-dual point.
///
/// The iterate may temporarily live in a reformulated space with more
/// variables than the model (elastics); `number_variables` tracks the current
/// dimension while the buffers are sized once for the largest reformulation.
#[derive(Debug, Clone)]
pub struct Iterate {
    pub number_variables: usize,
    pub number_constraints: usize,
    pub primals: Vec<f64>,
    pub multipliers: Multipliers,
    /// 1 in the optimality phase, 0 in the pure feasibility phase.
    pub objective_multiplier: f64,
    pub evaluations: Evaluations,
    pub progress: ProgressMeasures,
    pub residuals: Residuals,
    pub status: TerminationStatus,
}

impl Iterate {
    /// Allocate an iterate. `max_variables` sizes the primal and bound
    /// multiplier buffers; `number_variables` is the model dimension.
    pub fn new(number_variables: usize, max_variables: usize, number_constraints: usize) -> Self {
        Self {
            number_variables,
            number_constraints,
            primals: vec![0.; max_variables],
            multipliers: Multipliers::new(max_variables, number_constraints),
            objective_multiplier: 1.,
            evaluations: Evaluations {
                objective: 0.,
                constraints: vec![0.; number_constraints],
                objective_gradient: SparseVector::with_capacity(number_variables),
                constraint_jacobian: RectangularMatrix::new(number_constraints, number_variables),
                is_objective_computed: false,
                are_constraints_computed: false,
                is_objective_gradient_computed: false,
                is_constraint_jacobian_computed: false,
            },
            progress: ProgressMeasures::default(),
            residuals: Residuals::default(),
            status: TerminationStatus::NotOptimal,
        }
    }

    /// Change the current dimension (entering or leaving a reformulated
    /// space). Newly exposed components are zeroed.
    pub fn set_number_variables(&mut self, number_variables: usize) {
        debug_assert!(number_variables <= self.primals.len());
        if number_variables > self.number_variables {
            for i in self.number_variables..number_variables {
                self.primals[i] = 0.;
                self.multipliers.lower_bounds[i] = 0.;
                self.multipliers.upper_bounds[i] = 0.;
            }
        }
        self.number_variables = number_variables;
    }

    /// Forget all cached evaluations (the primal point changed).
    pub fn reset_evaluations(&mut self) {
        self.evaluations.is_objective_computed = false;
        self.evaluations.are_constraints_computed = false;
        self.evaluations.is_objective_gradient_computed = false;
        self.evaluations.is_constraint_jacobian_computed = false;
        self.progress.reset();
        self.status = TerminationStatus::NotOptimal;
    }

    pub fn evaluate_objective(&mut self, model: &dyn Model) -> Result<f64, EvaluationError> {
        if !self.evaluations.is_objective_computed {
            let value = model.evaluate_objective(&self.primals[..model.number_variables()]);
            if !value.is_finite() {
                return Err(EvaluationError::NonFiniteValue);
            }
            self.evaluations.objective = value;
            self.evaluations.is_objective_computed = true;
        }
        Ok(self.evaluations.objective)
    }

    pub fn evaluate_constraints(&mut self, model: &dyn Model) -> Result<(), EvaluationError> {
        if !self.evaluations.are_constraints_computed {
            model.evaluate_constraints(
                &self.primals[..model.number_variables()],
                &mut self.evaluations.constraints,
            );
            if self.evaluations.constraints.iter().any(|value| !value.is_finite()) {
                return Err(EvaluationError::NonFiniteValue);
            }
            self.evaluations.are_constraints_computed = true;
        }
        Ok(())
    }

    pub fn evaluate_objective_gradient(&mut self, model: &dyn Model) -> Result<(), EvaluationError> {
        if !self.evaluations.is_objective_gradient_computed {
            self.evaluations.objective_gradient.clear();
            model.evaluate_objective_gradient(
                &self.primals[..model.number_variables()],
                &mut self.evaluations.objective_gradient,
            );
            if self.evaluations.objective_gradient.has_non_finite() {
                return Err(EvaluationError::NonFiniteValue);
            }
            self.evaluations.is_objective_gradient_computed = true;
        }
        Ok(())
    }

    pub fn evaluate_constraint_jacobian(&mut self, model: &dyn Model) -> Result<(), EvaluationError> {
        if !self.evaluations.is_constraint_jacobian_computed {
            self.evaluations.constraint_jacobian.clear();
            model.evaluate_constraint_jacobian(
                &self.primals[..model.number_variables()],
                &mut self.evaluations.constraint_jacobian,
            );
            if self.evaluations.constraint_jacobian.has_non_finite() {
                return Err(EvaluationError::NonFiniteValue);
            }
            self.evaluations.is_constraint_jacobian_computed = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_all_zero() {
        let mut multipliers = Multipliers::new(2, 1);
        assert!(!multipliers.not_all_zero(2, 1e-8));
        multipliers.lower_bounds[1] = 1e-3;
        assert!(multipliers.not_all_zero(2, 1e-8));
        // lower and upper cancelling still counts per component sum
        multipliers.lower_bounds[1] = 0.;
        multipliers.constraints[0] = -0.5;
        assert!(multipliers.not_all_zero(2, 1e-8));
    }

    #[test]
    fn test_set_number_variables_zeroes_new_components() {
        let mut iterate = Iterate::new(2, 5, 1);
        iterate.primals[..2].copy_from_slice(&[1., 2.]);
        iterate.set_number_variables(4);
        assert_eq!(iterate.primals[2], 0.);
        assert_eq!(iterate.primals[3], 0.);
        assert_eq!(iterate.number_variables, 4);
        iterate.set_number_variables(2);
        assert_eq!(iterate.number_variables, 2);
    }
}
