//! Constraint-relaxation strategies.
//!
//! They translate the original problem into the sequence of reformulated
//! problems handed to the subproblem, own the globalization strategies, and
//! decide when to work on feasibility instead of optimality.

mod feasibility_restoration;
mod l1_relaxation;

pub use feasibility_restoration::FeasibilityRestoration;
pub use l1_relaxation::L1Relaxation;

use crate::direction::{Direction, WarmstartInformation};
use crate::error::{EvaluationError, SolverError};
use crate::iterate::Iterate;
use crate::model::Model;
use crate::options::Options;
use crate::subproblem::PredictedReductionModel;

/// Phase of the relaxation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    FeasibilityRestoration = 1,
    Optimality = 2,
}

pub trait ConstraintRelaxationStrategy {
    fn initialize(&mut self, first_iterate: &mut Iterate) -> Result<(), SolverError>;

    /// Compute a trial direction at the current iterate, switching to the
    /// feasibility problem when the subproblem reports infeasibility.
    fn compute_feasible_direction(
        &mut self,
        current_iterate: &mut Iterate,
        warmstart: &WarmstartInformation,
    ) -> Result<Direction, SolverError>;

    /// Evaluate the trial iterate's progress and apply the globalization
    /// strategy of the current phase (possibly switching phase first).
    /// An evaluation error means the trial point must be rejected.
    fn is_acceptable(
        &mut self,
        current_iterate: &mut Iterate,
        trial_iterate: &mut Iterate,
        direction: &Direction,
        predicted_reduction_model: &PredictedReductionModel,
        step_length: f64,
    ) -> Result<bool, EvaluationError>;

    fn compute_second_order_correction(
        &mut self,
        trial_iterate: &mut Iterate,
    ) -> Result<Direction, SolverError>;

    /// Direction aimed purely at feasibility, regardless of the current
    /// phase. The mechanisms call this when regular steps stall.
    fn compute_feasibility_direction(
        &mut self,
        current_iterate: &mut Iterate,
    ) -> Result<Direction, SolverError>;

    fn generate_predicted_reduction_model(&self, direction: &Direction) -> PredictedReductionModel;

    fn set_trust_region_radius(&mut self, radius: Option<f64>);

    /// Hook applied to a freshly accepted iterate (multiplier safeguards,
    /// penalty updates, residual bookkeeping).
    fn register_accepted_iterate(&mut self, iterate: &mut Iterate) -> Result<(), EvaluationError>;

    /// Whether the current infeasibility alone is acceptable to the active
    /// globalization strategy.
    fn is_infeasibility_acceptable(&self, infeasibility: f64) -> bool;

    fn current_phase(&self) -> Phase;

    /// Largest variable dimension any reformulation of this strategy uses.
    fn maximum_number_variables(&self) -> usize;

    fn number_subproblems_solved(&self) -> usize;
}

/// Build the relaxation strategy selected by the `constraint_relaxation`
/// option. The returned object borrows the model for its problem views.
pub fn create_constraint_relaxation_strategy<'a>(
    model: &'a dyn Model,
    options: &Options,
) -> Result<Box<dyn ConstraintRelaxationStrategy + 'a>, SolverError> {
    match options.get_string("constraint_relaxation")? {
        "feasibility-restoration" => Ok(Box::new(FeasibilityRestoration::new(model, options)?)),
        "l1-relaxation" => Ok(Box::new(L1Relaxation::new(model, options)?)),
        other => Err(SolverError::InvalidOption(format!(
            "unknown constraint relaxation strategy {other}"
        ))),
    }
}
