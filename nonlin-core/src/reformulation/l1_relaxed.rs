//! l1-relaxed view: the original objective plus a penalty on the elastic
//! constraint violations.
//!
//! ```text
//! minimize    f(x) + eta * sum(p + n)
//! subject to  g_L <= c(x) + p - n <= g_U,   x_L <= x <= x_U,   p, n >= 0
//! ```
//!
//! The penalty eta is owned by the relaxation strategy, which raises it until
//! the computed directions make enough progress on infeasibility.

use crate::error::EvaluationError;
use crate::iterate::Iterate;
use crate::linalg::coo::SymmetricCooMatrix;
use crate::linalg::rectangular::RectangularMatrix;
use crate::model::Model;
use crate::reformulation::{elastic, OptimizationProblem};

pub struct L1RelaxedProblem<'a> {
    model: &'a dyn Model,
    penalty_parameter: f64,
}

impl<'a> L1RelaxedProblem<'a> {
    pub fn new(model: &'a dyn Model, initial_penalty: f64) -> Self {
        Self {
            model,
            penalty_parameter: initial_penalty,
        }
    }

    pub fn penalty_parameter(&self) -> f64 {
        self.penalty_parameter
    }

    pub fn set_penalty_parameter(&mut self, penalty: f64) {
        self.penalty_parameter = penalty;
    }

    pub fn set_elastic_variables(&self, iterate: &mut Iterate) -> Result<(), EvaluationError> {
        elastic::set_elastic_variables(self.model, iterate)
    }

    pub fn violated_linearized_constraints(
        &self,
        iterate: &Iterate,
        direction_primals: &[f64],
        tolerance: f64,
    ) -> Vec<usize> {
        elastic::violated_linearized_constraints(self.model, iterate, direction_primals, tolerance)
    }

    /// Total elastic mass p + n at the iterate: the linearized infeasibility.
    pub fn elastic_mass(&self, primals: &[f64]) -> f64 {
        let mut total = 0.;
        for j in 0..self.model.number_constraints() {
            total += primals[elastic::positive_elastic_index(self.model, j)]
                + primals[elastic::negative_elastic_index(self.model, j)];
        }
        total
    }
}

impl OptimizationProblem for L1RelaxedProblem<'_> {
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
        1.
    }

    fn evaluate_objective(&self, iterate: &mut Iterate) -> Result<f64, EvaluationError> {
        let objective = iterate.evaluate_objective(self.model)?;
        let mut penalized = self.model.objective_sign() * objective;
        for j in 0..self.model.number_constraints() {
            penalized += self.penalty_parameter
                * (iterate.primals[elastic::positive_elastic_index(self.model, j)]
                    + iterate.primals[elastic::negative_elastic_index(self.model, j)]);
        }
        Ok(penalized)
    }

    fn evaluate_objective_gradient(
        &self,
        iterate: &mut Iterate,
        gradient: &mut [f64],
    ) -> Result<(), EvaluationError> {
        iterate.evaluate_objective_gradient(self.model)?;
        let total = self.number_variables();
        gradient[..total].fill(0.);
        iterate
            .evaluations
            .objective_gradient
            .add_to_dense(self.model.objective_sign(), gradient);
        for j in 0..self.model.number_constraints() {
            gradient[elastic::positive_elastic_index(self.model, j)] = self.penalty_parameter;
            gradient[elastic::negative_elastic_index(self.model, j)] = self.penalty_parameter;
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
        hessian.reset(self.number_variables());
        self.model.evaluate_lagrangian_hessian(
            &iterate.primals[..self.model.number_variables()],
            self.model.objective_sign(),
            constraint_multipliers,
            hessian,
        );
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
