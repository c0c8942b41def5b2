//! Feasibility (phase-1) view: sigma = 0, elastic variables, and an optional
//! proximal term around a reference point.
//!
//! ```text
//! minimize    coef * sum(p + n) + rho/2 ||x - x_ref||^2
//! subject to  g_L <= c(x) + p - n <= g_U,   x_L <= x <= x_U,   p, n >= 0
//! ```

use crate::error::EvaluationError;
use crate::iterate::Iterate;
use crate::linalg::coo::SymmetricCooMatrix;
use crate::linalg::rectangular::RectangularMatrix;
use crate::model::Model;
use crate::reformulation::{elastic, OptimizationProblem};

pub struct FeasibilityProblem<'a> {
    model: &'a dyn Model,
    /// l1 coefficient on the elastic variables
    elastic_objective_coefficient: f64,
    use_proximal_term: bool,
    proximal_coefficient: f64,
    proximal_reference_point: Vec<f64>,
}

impl<'a> FeasibilityProblem<'a> {
    pub fn new(
        model: &'a dyn Model,
        elastic_objective_coefficient: f64,
        use_proximal_term: bool,
    ) -> Self {
        Self {
            model,
            elastic_objective_coefficient,
            use_proximal_term,
            proximal_coefficient: 0.,
            proximal_reference_point: vec![0.; model.number_variables()],
        }
    }

    pub fn set_proximal_coefficient(&mut self, coefficient: f64) {
        self.proximal_coefficient = coefficient;
    }

    pub fn set_proximal_reference_point(&mut self, reference: &[f64]) {
        let n = self.model.number_variables();
        self.proximal_reference_point.copy_from_slice(&reference[..n]);
    }

    /// Initialize the iterate's elastics from its constraint values.
    pub fn set_elastic_variables(&self, iterate: &mut Iterate) -> Result<(), EvaluationError> {
        elastic::set_elastic_variables(self.model, iterate)
    }

    /// Linearized constraints still infeasible at the given direction.
    pub fn violated_linearized_constraints(
        &self,
        iterate: &Iterate,
        direction_primals: &[f64],
        tolerance: f64,
    ) -> Vec<usize> {
        elastic::violated_linearized_constraints(self.model, iterate, direction_primals, tolerance)
    }

    fn proximal_active(&self) -> bool {
        self.use_proximal_term && 0. < self.proximal_coefficient
    }
}

impl OptimizationProblem for FeasibilityProblem<'_> {
    fn model(&self) -> &dyn Model {
        self.model
    }

    fn number_variables(&self) -> usize {
        elastic::number_variables(self.model)
    }

    fn number_constraints(&self) -> usize {
        self.model.number_constraints()
    }

    fn objective_multiplier(&self) -> f64 {
        0.
    }

    fn evaluate_objective(&self, iterate: &mut Iterate) -> Result<f64, EvaluationError> {
        let mut objective = 0.;
        for j in 0..self.model.number_constraints() {
            objective += iterate.primals[elastic::positive_elastic_index(self.model, j)]
                + iterate.primals[elastic::negative_elastic_index(self.model, j)];
        }
        objective *= self.elastic_objective_coefficient;

        if self.proximal_active() {
            let mut distance = 0.;
            for i in 0..self.model.number_variables() {
                let deviation = iterate.primals[i] - self.proximal_reference_point[i];
                distance += deviation * deviation;
            }
            objective += 0.5 * self.proximal_coefficient * distance;
        }
        Ok(objective)
    }

    fn evaluate_objective_gradient(
        &self,
        iterate: &mut Iterate,
        gradient: &mut [f64],
    ) -> Result<(), EvaluationError> {
        let total = self.number_variables();
        gradient[..total].fill(0.);
        for j in 0..self.model.number_constraints() {
            gradient[elastic::positive_elastic_index(self.model, j)] =
                self.elastic_objective_coefficient;
            gradient[elastic::negative_elastic_index(self.model, j)] =
                self.elastic_objective_coefficient;
        }
        if self.proximal_active() {
            for i in 0..self.model.number_variables() {
                gradient[i] = self.proximal_coefficient
                    * (iterate.primals[i] - self.proximal_reference_point[i]);
            }
        }
        Ok(())
    }

    fn evaluate_constraints(
        &self,
        iterate: &mut Iterate,
        constraints: &mut [f64],
    ) -> Result<(), EvaluationError> {
        elastic::evaluate_constraints(self.model, iterate, constraints)
    }

    fn evaluate_constraint_jacobian(
        &self,
        iterate: &mut Iterate,
        jacobian: &mut RectangularMatrix,
    ) -> Result<(), EvaluationError> {
        elastic::evaluate_constraint_jacobian(self.model, iterate, jacobian)
    }

    fn evaluate_lagrangian_hessian(
        &self,
        iterate: &mut Iterate,
        constraint_multipliers: &[f64],
        hessian: &mut SymmetricCooMatrix,
    ) -> Result<(), EvaluationError> {
        // sigma = 0: only the constraint curvature contributes; the elastics
        // are linear
        hessian.reset(self.number_variables());
        self.model.evaluate_lagrangian_hessian(
            &iterate.primals[..self.model.number_variables()],
            0.,
            constraint_multipliers,
            hessian,
        );
        if self.proximal_active() {
            for i in 0..self.model.number_variables() {
                hessian.insert(i, i, self.proximal_coefficient);
            }
        }
        if hessian.has_non_finite() {
            return Err(EvaluationError::NonFiniteValue);
        }
        Ok(())
    }

    fn variable_lower_bound(&self, variable_index: usize) -> f64 {
        elastic::variable_lower_bound(self.model, variable_index)
    }

    fn variable_upper_bound(&self, variable_index: usize) -> f64 {
        elastic::variable_upper_bound(self.model, variable_index)
    }

    fn constraint_lower_bound(&self, constraint_index: usize) -> f64 {
        self.model.constraint_lower_bound(constraint_index)
    }

    fn constraint_upper_bound(&self, constraint_index: usize) -> f64 {
        self.model.constraint_upper_bound(constraint_index)
    }
}
