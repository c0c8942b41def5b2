//! Backtracking line search.
//!
//! One direction per outer iteration; the step length starts at the
//! direction's fraction-to-boundary cap and decreases geometrically until
//! the relaxation strategy accepts the trial iterate. When the step length
//! hits its floor the mechanism tries one second-order correction, then asks
//! the relaxation strategy for a pure feasibility direction, and finally
//! gives up with a small step (the termination check turns that into a
//! small-step status).

use crate::direction::{Direction, SubproblemStatus, WarmstartInformation};
use crate::error::SolverError;
use crate::iterate::Iterate;
use crate::mechanism::{
    assemble_trial_iterate, AcceptedIterate, GlobalizationMechanism, TerminationChecker,
};
use crate::model::Model;
use crate::options::Options;
use crate::relaxation::ConstraintRelaxationStrategy;
use crate::result::TerminationStatus;

pub struct LineSearch<'a> {
    constraint_relaxation_strategy: Box<dyn ConstraintRelaxationStrategy + 'a>,
    termination: TerminationChecker,
    backtracking_ratio: f64,
    min_step_length: f64,
    verbose: bool,
}

impl<'a> LineSearch<'a> {
    pub fn new(
        options: &Options,
        constraint_relaxation_strategy: Box<dyn ConstraintRelaxationStrategy + 'a>,
    ) -> Result<Self, SolverError> {
        let backtracking_ratio = options.get_double("LS_ratio")?;
        if !(0. < backtracking_ratio && backtracking_ratio < 1.) {
            return Err(SolverError::InvalidOption(
                "LS_ratio must lie in (0, 1)".to_string(),
            ));
        }
        Ok(Self {
            constraint_relaxation_strategy,
            termination: TerminationChecker::new(options)?,
            backtracking_ratio,
            min_step_length: options.get_double("LS_min_step_length")?,
            verbose: options.get_bool("verbose")?,
        })
    }

    fn new_trial_iterate(&self, current_iterate: &Iterate) -> Iterate {
        Iterate::new(
            current_iterate.number_variables,
            self.constraint_relaxation_strategy.maximum_number_variables(),
            current_iterate.number_constraints,
        )
    }

    /// Backtrack along one direction. Returns the accepted iterate, or None
    /// if the step length bottomed out.
    fn backtrack(
        &mut self,
        model: &dyn Model,
        current_iterate: &mut Iterate,
        direction: &Direction,
    ) -> Result<Option<AcceptedIterate>, SolverError> {
        let predicted_reduction_model = self
            .constraint_relaxation_strategy
            .generate_predicted_reduction_model(direction);
        let mut step_length: f64 = 1.;

        while self.min_step_length <= step_length {
            let primal_step_length = step_length * direction.primal_step_length_limit;
            let mut trial_iterate = self.new_trial_iterate(current_iterate);
            assemble_trial_iterate(
                model,
                current_iterate,
                &mut trial_iterate,
                direction,
                primal_step_length,
                primal_step_length,
                direction.bound_dual_step_length,
            );

            let accepted = self
                .constraint_relaxation_strategy
                .is_acceptable(
                    current_iterate,
                    &mut trial_iterate,
                    direction,
                    &predicted_reduction_model,
                    primal_step_length,
                )
                // an evaluation error rejects the trial point
                .unwrap_or(false);

            if accepted {
                if self.verbose {
                    eprintln!(
                        "LS: accepted step length {primal_step_length:.3e}, step norm {:.3e}",
                        primal_step_length * direction.norm
                    );
                }
                self.constraint_relaxation_strategy
                    .register_accepted_iterate(&mut trial_iterate)
                    .map_err(|_| {
                        SolverError::Internal("evaluation failed at an accepted iterate".to_string())
                    })?;
                return Ok(Some(AcceptedIterate {
                    step_norm: primal_step_length * direction.norm,
                    iterate: trial_iterate,
                }));
            }
            step_length *= self.backtracking_ratio;
        }
        Ok(None)
    }

    /// Maratos fix: one extra solve with the constraints re-evaluated at the
    /// rejected trial point, tried as a full composite step.
    fn try_second_order_correction(
        &mut self,
        model: &dyn Model,
        current_iterate: &mut Iterate,
        direction: &Direction,
    ) -> Result<Option<AcceptedIterate>, SolverError> {
        let mut trial_iterate = self.new_trial_iterate(current_iterate);
        assemble_trial_iterate(
            model,
            current_iterate,
            &mut trial_iterate,
            direction,
            direction.primal_step_length_limit,
            direction.primal_step_length_limit,
            direction.bound_dual_step_length,
        );
        let correction = self
            .constraint_relaxation_strategy
            .compute_second_order_correction(&mut trial_iterate)?;
        if correction.status != SubproblemStatus::Optimal {
            return Ok(None);
        }

        let predicted_reduction_model = self
            .constraint_relaxation_strategy
            .generate_predicted_reduction_model(&correction);
        let mut corrected_iterate = self.new_trial_iterate(current_iterate);
        assemble_trial_iterate(
            model,
            &trial_iterate,
            &mut corrected_iterate,
            &correction,
            correction.primal_step_length_limit,
            correction.primal_step_length_limit,
            correction.bound_dual_step_length,
        );
        let accepted = self
            .constraint_relaxation_strategy
            .is_acceptable(
                current_iterate,
                &mut corrected_iterate,
                &correction,
                &predicted_reduction_model,
                correction.primal_step_length_limit,
            )
            .unwrap_or(false);
        if accepted {
            if self.verbose {
                eprintln!("LS: second-order correction accepted");
            }
            self.constraint_relaxation_strategy
                .register_accepted_iterate(&mut corrected_iterate)
                .map_err(|_| {
                    SolverError::Internal("evaluation failed at an accepted iterate".to_string())
                })?;
            let step_norm = correction.norm.max(direction.norm * direction.primal_step_length_limit);
            return Ok(Some(AcceptedIterate {
                step_norm,
                iterate: corrected_iterate,
            }));
        }
        Ok(None)
    }
}

impl GlobalizationMechanism for LineSearch<'_> {
    fn initialize(&mut self, first_iterate: &mut Iterate) -> Result<(), SolverError> {
        self.constraint_relaxation_strategy.initialize(first_iterate)
    }

    fn compute_acceptable_iterate(
        &mut self,
        model: &dyn Model,
        current_iterate: &mut Iterate,
    ) -> Result<AcceptedIterate, SolverError> {
        let direction = self.constraint_relaxation_strategy.compute_feasible_direction(
            current_iterate,
            &WarmstartInformation::everything_changed(),
        )?;
        if direction.status == SubproblemStatus::Error {
            return Err(SolverError::Internal("subproblem solve failed".to_string()));
        }

        if let Some(accepted) = self.backtrack(model, current_iterate, &direction)? {
            return Ok(accepted);
        }
        if let Some(accepted) =
            self.try_second_order_correction(model, current_iterate, &direction)?
        {
            return Ok(accepted);
        }

        // stalled: hand control back to the relaxation strategy for a pure
        // feasibility direction and backtrack once more
        let feasibility_direction = self
            .constraint_relaxation_strategy
            .compute_feasibility_direction(current_iterate)?;
        if feasibility_direction.status != SubproblemStatus::Error {
            if let Some(accepted) =
                self.backtrack(model, current_iterate, &feasibility_direction)?
            {
                return Ok(accepted);
            }
        }

        // no progress in any direction: report the current point with a
        // vanishing step so that termination declares a small step
        Ok(AcceptedIterate {
            iterate: current_iterate.clone(),
            step_norm: 0.,
        })
    }

    fn check_termination(
        &mut self,
        model: &dyn Model,
        current_iterate: &mut Iterate,
        step_norm: f64,
    ) -> TerminationStatus {
        self.termination.check(model, current_iterate, step_norm)
    }

    fn number_subproblems_solved(&self) -> usize {
        self.constraint_relaxation_strategy.number_subproblems_solved()
    }
}
