//! Pass-through view of the original model (sigma = 1).
//!
//! The only transformation is the objective sign, folded in so that the rest
//! of the engine always minimizes.

use crate::error::EvaluationError;
use crate::iterate::Iterate;
use crate::linalg::coo::SymmetricCooMatrix;
use crate::linalg::rectangular::RectangularMatrix;
use crate::model::Model;
use crate::reformulation::OptimizationProblem;

pub struct OptimalityProblem<'a> {
    model: &'a dyn Model,
}

impl<'a> OptimalityProblem<'a> {
    pub fn new(model: &'a dyn Model) -> Self {
        Self { model }
    }
}

impl OptimizationProblem for OptimalityProblem<'_> {
    fn model(&self) -> &dyn Model {
        self.model
    }

    fn number_variables(&self) -> usize {
        self.model.number_variables()
    }

    fn number_constraints(&self) -> usize {
        self.model.number_constraints()
    }

    fn objective_multiplier(&self) -> f64 {
        1.
    }

    fn evaluate_objective(&self, iterate: &mut Iterate) -> Result<f64, EvaluationError> {
        let objective = iterate.evaluate_objective(self.model)?;
        Ok(self.model.objective_sign() * objective)
    }

    fn evaluate_objective_gradient(
        &self,
        iterate: &mut Iterate,
        gradient: &mut [f64],
    ) -> Result<(), EvaluationError> {
        iterate.evaluate_objective_gradient(self.model)?;
        let n = self.number_variables();
        gradient[..n].fill(0.);
        iterate
            .evaluations
            .objective_gradient
            .add_to_dense(self.model.objective_sign(), gradient);
        Ok(())
    }

    fn evaluate_constraints(
        &self,
        iterate: &mut Iterate,
        constraints: &mut [f64],
    ) -> Result<(), EvaluationError> {
        iterate.evaluate_constraints(self.model)?;
        constraints[..self.number_constraints()]
            .copy_from_slice(&iterate.evaluations.constraints);
        Ok(())
    }

    fn evaluate_constraint_jacobian(
        &self,
        iterate: &mut Iterate,
        jacobian: &mut RectangularMatrix,
    ) -> Result<(), EvaluationError> {
        iterate.evaluate_constraint_jacobian(self.model)?;
        jacobian.clear();
        for j in 0..self.number_constraints() {
            for (index, value) in iterate.evaluations.constraint_jacobian.row(j).iter() {
                jacobian.row_mut(j).insert(index, value);
            }
        }
        Ok(())
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
        self.model.variable_lower_bound(variable_index)
    }

    fn variable_upper_bound(&self, variable_index: usize) -> f64 {
        self.model.variable_upper_bound(variable_index)
    }

    fn constraint_lower_bound(&self, constraint_index: usize) -> f64 {
        self.model.constraint_lower_bound(constraint_index)
    }

    fn constraint_upper_bound(&self, constraint_index: usize) -> f64 {
        self.model.constraint_upper_bound(constraint_index)
    }
}
