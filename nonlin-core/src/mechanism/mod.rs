//! Globalization mechanisms: the outer step-length / radius drivers looping
//! around the relaxation strategy and its acceptance logic.

mod line_search;
mod trust_region;

pub use line_search::LineSearch;
pub use trust_region::TrustRegion;

use crate::direction::Direction;
use crate::error::SolverError;
use crate::iterate::Iterate;
use crate::model::{project_onto_variable_bounds, Model};
use crate::options::Options;
use crate::relaxation::ConstraintRelaxationStrategy;
use crate::result::TerminationStatus;

/// Outcome of one outer iteration: the accepted iterate and the norm of the
/// step that produced it.
pub struct AcceptedIterate {
    pub iterate: Iterate,
    pub step_norm: f64,
}

pub trait GlobalizationMechanism {
    fn initialize(&mut self, first_iterate: &mut Iterate) -> Result<(), SolverError>;

    /// Produce the next accepted iterate from the current one.
    fn compute_acceptable_iterate(
        &mut self,
        model: &dyn Model,
        current_iterate: &mut Iterate,
    ) -> Result<AcceptedIterate, SolverError>;

    /// Convergence test on an accepted iterate.
    fn check_termination(
        &mut self,
        model: &dyn Model,
        current_iterate: &mut Iterate,
        step_norm: f64,
    ) -> TerminationStatus;

    fn number_subproblems_solved(&self) -> usize;
}

/// Build the mechanism selected by the `mechanism` option; it takes
/// exclusive ownership of the relaxation strategy.
pub fn create_mechanism<'a>(
    options: &Options,
    constraint_relaxation_strategy: Box<dyn ConstraintRelaxationStrategy + 'a>,
) -> Result<Box<dyn GlobalizationMechanism + 'a>, SolverError> {
    match options.get_string("mechanism")? {
        "LS" => Ok(Box::new(LineSearch::new(options, constraint_relaxation_strategy)?)),
        "TR" => Ok(Box::new(TrustRegion::new(options, constraint_relaxation_strategy)?)),
        other => Err(SolverError::InvalidOption(format!(
            "unknown globalization mechanism {other}"
        ))),
    }
}

/// Assemble a trial iterate: scaled primal step projected onto the variable
/// bounds, then each multiplier block advanced by its own step length. Bound
/// multipliers always receive the full bound-dual step length.
pub(crate) fn assemble_trial_iterate(
    model: &dyn Model,
    current_iterate: &Iterate,
    trial_iterate: &mut Iterate,
    direction: &Direction,
    primal_step_length: f64,
    dual_step_length: f64,
    bound_dual_step_length: f64,
) {
    let number_variables = direction.number_variables;
    trial_iterate.set_number_variables(number_variables);
    for i in 0..number_variables {
        trial_iterate.primals[i] =
            current_iterate.primals[i] + primal_step_length * direction.primals[i];
    }
    // clean floating-point drift: model variables onto their bounds,
    // elastics onto nonnegativity
    project_onto_variable_bounds(model, &mut trial_iterate.primals[..model.number_variables()]);
    for i in model.number_variables()..number_variables {
        trial_iterate.primals[i] = trial_iterate.primals[i].max(0.);
    }

    for j in 0..direction.number_constraints {
        trial_iterate.multipliers.constraints[j] = current_iterate.multipliers.constraints[j]
            + dual_step_length * direction.multipliers.constraints[j];
    }
    for i in 0..number_variables {
        trial_iterate.multipliers.lower_bounds[i] = current_iterate.multipliers.lower_bounds[i]
            + bound_dual_step_length * direction.multipliers.lower_bounds[i];
        trial_iterate.multipliers.upper_bounds[i] = current_iterate.multipliers.upper_bounds[i]
            + bound_dual_step_length * direction.multipliers.upper_bounds[i];
    }
    trial_iterate.objective_multiplier = direction.objective_multiplier;
    trial_iterate.reset_evaluations();
}

/// Termination logic shared by the mechanisms: convergence is tested against
/// the tight tolerance, then against a loose tolerance that must hold for a
/// number of consecutive iterations, then against the small-step threshold.
pub(crate) struct TerminationChecker {
    tight_tolerance: f64,
    loose_tolerance: f64,
    loose_tolerance_consecutive_iteration_threshold: usize,
    loose_tolerance_consecutive_iterations: usize,
    small_step_threshold: f64,
    unbounded_objective_threshold: f64,
    /// set by a mechanism that diagnosed the outcome itself
    pub forced_status: Option<TerminationStatus>,
}

impl TerminationChecker {
    pub fn new(options: &Options) -> Result<Self, SolverError> {
        Ok(Self {
            tight_tolerance: options.get_double("tolerance")?,
            loose_tolerance: options.get_double("loose_tolerance")?,
            loose_tolerance_consecutive_iteration_threshold: options
                .get_usize("loose_tolerance_consecutive_iteration_threshold")?,
            loose_tolerance_consecutive_iterations: 0,
            small_step_threshold: options.get_double("tolerance")?
                / options.get_double("small_step_factor")?,
            unbounded_objective_threshold: options.get_double("unbounded_objective_threshold")?,
            forced_status: None,
        })
    }

    pub fn check(
        &mut self,
        model: &dyn Model,
        iterate: &Iterate,
        step_norm: f64,
    ) -> TerminationStatus {
        if let Some(status) = self.forced_status.take() {
            return status;
        }

        let status_tight = self.check_with_tolerance(model, iterate, self.tight_tolerance);
        if status_tight != TerminationStatus::NotOptimal
            || self.loose_tolerance <= self.tight_tolerance
        {
            return self.or_small_step(status_tight, iterate, step_norm);
        }

        let status_loose = self.check_with_tolerance(model, iterate, self.loose_tolerance);
        if status_loose != TerminationStatus::NotOptimal {
            self.loose_tolerance_consecutive_iterations += 1;
            if self.loose_tolerance_consecutive_iteration_threshold
                <= self.loose_tolerance_consecutive_iterations
            {
                return status_loose;
            }
        } else {
            self.loose_tolerance_consecutive_iterations = 0;
        }
        self.or_small_step(TerminationStatus::NotOptimal, iterate, step_norm)
    }

    fn or_small_step(
        &self,
        status: TerminationStatus,
        iterate: &Iterate,
        step_norm: f64,
    ) -> TerminationStatus {
        if status != TerminationStatus::NotOptimal {
            return status;
        }
        if step_norm <= self.small_step_threshold {
            if iterate.residuals.infeasibility <= self.tight_tolerance {
                return TerminationStatus::FeasibleSmallStep;
            }
            return TerminationStatus::InfeasibleSmallStep;
        }
        TerminationStatus::NotOptimal
    }

    fn check_with_tolerance(
        &self,
        model: &dyn Model,
        iterate: &Iterate,
        tolerance: f64,
    ) -> TerminationStatus {
        let residuals = &iterate.residuals;
        let optimality_stationarity =
            residuals.optimality_stationarity / residuals.stationarity_scaling <= tolerance;
        let feasibility_stationarity =
            residuals.feasibility_stationarity / residuals.stationarity_scaling <= tolerance;
        let optimality_complementarity =
            residuals.optimality_complementarity / residuals.complementarity_scaling <= tolerance;
        let feasibility_complementarity =
            residuals.feasibility_complementarity / residuals.complementarity_scaling <= tolerance;
        let primal_feasibility = residuals.infeasibility <= tolerance;
        let no_trivial_duals = iterate
            .multipliers
            .not_all_zero(model.number_variables(), tolerance);

        if iterate.evaluations.is_objective_computed
            && iterate.evaluations.objective < self.unbounded_objective_threshold
        {
            return TerminationStatus::Unbounded;
        }
        if optimality_complementarity && primal_feasibility {
            if 0. < iterate.objective_multiplier && optimality_stationarity {
                return TerminationStatus::FeasibleKktPoint;
            }
            if feasibility_stationarity && no_trivial_duals {
                return TerminationStatus::FjPoint;
            }
        } else if !primal_feasibility
            && feasibility_complementarity
            && feasibility_stationarity
            && no_trivial_duals
        {
            return TerminationStatus::InfeasibleStationaryPoint;
        }
        TerminationStatus::NotOptimal
    }
}
