//! Shared elastic-variable plumbing for the reformulated views.
//!
//! Both relaxed views extend the model with nonnegative elastics p, n (one
//! pair per constraint) so that `c(x) + p - n` fits the constraint bounds:
//! variable layout `[x (n), p (m), n (m)]`.

use crate::error::EvaluationError;
use crate::iterate::Iterate;
use crate::linalg::rectangular::RectangularMatrix;
use crate::model::Model;

pub(super) fn number_variables(model: &dyn Model) -> usize {
    model.number_variables() + 2 * model.number_constraints()
}

pub(super) fn positive_elastic_index(model: &dyn Model, constraint_index: usize) -> usize {
    model.number_variables() + constraint_index
}

pub(super) fn negative_elastic_index(model: &dyn Model, constraint_index: usize) -> usize {
    model.number_variables() + model.number_constraints() + constraint_index
}

/// c_j(x) + p_j - n_j for every constraint.
pub(super) fn evaluate_constraints(
    model: &dyn Model,
    iterate: &mut Iterate,
    constraints: &mut [f64],
) -> Result<(), EvaluationError> {
    iterate.evaluate_constraints(model)?;
    for j in 0..model.number_constraints() {
        constraints[j] = iterate.evaluations.constraints[j]
            + iterate.primals[positive_elastic_index(model, j)]
            - iterate.primals[negative_elastic_index(model, j)];
    }
    Ok(())
}

/// Model Jacobian rows extended with the +1/-1 elastic columns.
pub(super) fn evaluate_constraint_jacobian(
    model: &dyn Model,
    iterate: &mut Iterate,
    jacobian: &mut RectangularMatrix,
) -> Result<(), EvaluationError> {
    iterate.evaluate_constraint_jacobian(model)?;
    jacobian.clear();
    for j in 0..model.number_constraints() {
        for (index, value) in iterate.evaluations.constraint_jacobian.row(j).iter() {
            jacobian.row_mut(j).insert(index, value);
        }
        jacobian.row_mut(j).insert(positive_elastic_index(model, j), 1.);
        jacobian.row_mut(j).insert(negative_elastic_index(model, j), -1.);
    }
    Ok(())
}

/// Initialize the elastics of an iterate so the reformulated constraints are
/// satisfied at the current primal point: p absorbs lower-bound violation,
/// n absorbs upper-bound violation.
pub(super) fn set_elastic_variables(model: &dyn Model, iterate: &mut Iterate) -> Result<(), EvaluationError> {
    iterate.evaluate_constraints(model)?;
    iterate.set_number_variables(number_variables(model));
    for j in 0..model.number_constraints() {
        let value = iterate.evaluations.constraints[j];
        let lower = model.constraint_lower_bound(j);
        let upper = model.constraint_upper_bound(j);
        iterate.primals[positive_elastic_index(model, j)] = (lower - value).max(0.);
        iterate.primals[negative_elastic_index(model, j)] = (value - upper).max(0.);
    }
    Ok(())
}

/// Indices of linearized constraints still violated after moving both the
/// primal point and the elastics along `direction`.
pub(super) fn violated_linearized_constraints(
    model: &dyn Model,
    iterate: &Iterate,
    direction_primals: &[f64],
    tolerance: f64,
) -> Vec<usize> {
    let mut violated = Vec::new();
    for j in 0..model.number_constraints() {
        let positive = positive_elastic_index(model, j);
        let negative = negative_elastic_index(model, j);
        let trial_elastics = iterate.primals[positive] + direction_primals[positive]
            + iterate.primals[negative]
            + direction_primals[negative];
        if tolerance < trial_elastics {
            violated.push(j);
        }
    }
    violated
}

/// Elastic bounds: [0, inf).
pub(super) fn variable_lower_bound(model: &dyn Model, variable_index: usize) -> f64 {
    if variable_index < model.number_variables() {
        model.variable_lower_bound(variable_index)
    } else {
        0.
    }
}

pub(super) fn variable_upper_bound(model: &dyn Model, variable_index: usize) -> f64 {
    if variable_index < model.number_variables() {
        model.variable_upper_bound(variable_index)
    } else {
        f64::INFINITY
    }
}
