//! Trust-region mechanism.
//!
//! Directions are computed under the box `|d_i| <= radius`. Accepted steps
//! with a good actual-to-predicted ratio grow the radius; rejected steps
//! shrink it and retry without advancing the iterate. When the radius
//! collapses, either the feasibility phase takes over (optimality phase) or
//! the point is declared a stationary point of the constraint violation
//! (feasibility phase).

use crate::direction::{SubproblemStatus, WarmstartInformation};
use crate::error::SolverError;
use crate::iterate::Iterate;
use crate::mechanism::{
    assemble_trial_iterate, AcceptedIterate, GlobalizationMechanism, TerminationChecker,
};
use crate::model::Model;
use crate::options::Options;
use crate::relaxation::ConstraintRelaxationStrategy;
use crate::result::TerminationStatus;

const MAX_INNER_ITERATIONS: usize = 200;

pub struct TrustRegion<'a> {
    constraint_relaxation_strategy: Box<dyn ConstraintRelaxationStrategy + 'a>,
    termination: TerminationChecker,
    radius: f64,
    minimum_radius: f64,
    maximum_radius: f64,
    shrink_factor: f64,
    expand_factor: f64,
    eta_success: f64,
    eta_expand: f64,
    verbose: bool,
}

impl<'a> TrustRegion<'a> {
    pub fn new(
        options: &Options,
        constraint_relaxation_strategy: Box<dyn ConstraintRelaxationStrategy + 'a>,
    ) -> Result<Self, SolverError> {
        Ok(Self {
            constraint_relaxation_strategy,
            termination: TerminationChecker::new(options)?,
            radius: options.get_double("TR_initial_radius")?,
            minimum_radius: options.get_double("TR_minimum_radius")?,
            maximum_radius: options.get_double("TR_maximum_radius")?,
            shrink_factor: options.get_double("TR_shrink_factor")?,
            expand_factor: options.get_double("TR_expand_factor")?,
            eta_success: options.get_double("TR_eta_success")?,
            eta_expand: options.get_double("TR_eta_expand")?,
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
}

impl GlobalizationMechanism for TrustRegion<'_> {
    fn initialize(&mut self, first_iterate: &mut Iterate) -> Result<(), SolverError> {
        self.constraint_relaxation_strategy.initialize(first_iterate)
    }

    fn compute_acceptable_iterate(
        &mut self,
        model: &dyn Model,
        current_iterate: &mut Iterate,
    ) -> Result<AcceptedIterate, SolverError> {
        let mut warmstart = WarmstartInformation::everything_changed();
        let mut force_feasibility = false;

        for _inner_iteration in 0..MAX_INNER_ITERATIONS {
            self.constraint_relaxation_strategy
                .set_trust_region_radius(Some(self.radius));
            let direction = if force_feasibility {
                force_feasibility = false;
                self.constraint_relaxation_strategy
                    .compute_feasibility_direction(current_iterate)?
            } else {
                self.constraint_relaxation_strategy
                    .compute_feasible_direction(current_iterate, &warmstart)?
            };
            if direction.status == SubproblemStatus::Error {
                return Err(SolverError::Internal("subproblem solve failed".to_string()));
            }

            let predicted_reduction_model = self
                .constraint_relaxation_strategy
                .generate_predicted_reduction_model(&direction);
            let primal_step_length = direction.primal_step_length_limit;
            let mut trial_iterate = self.new_trial_iterate(current_iterate);
            assemble_trial_iterate(
                model,
                current_iterate,
                &mut trial_iterate,
                &direction,
                primal_step_length,
                primal_step_length,
                direction.bound_dual_step_length,
            );

            let accepted = self
                .constraint_relaxation_strategy
                .is_acceptable(
                    current_iterate,
                    &mut trial_iterate,
                    &direction,
                    &predicted_reduction_model,
                    primal_step_length,
                )
                .unwrap_or(false);

            if accepted {
                // actual-to-predicted ratio drives the radius update
                let predicted = predicted_reduction_model.evaluate(primal_step_length);
                let actual =
                    current_iterate.progress.optimality - trial_iterate.progress.optimality;
                let ratio = if 0. < predicted { actual / predicted } else { f64::INFINITY };
                let hit_boundary = 0.9 * self.radius <= direction.norm;
                if self.eta_expand <= ratio && hit_boundary {
                    self.radius = (self.expand_factor * self.radius).min(self.maximum_radius);
                } else if ratio < self.eta_success {
                    // poor objective model: track the accepted step scale
                    // rather than keeping a radius the model cannot support
                    self.radius = (self.shrink_factor * self.radius)
                        .max(direction.norm * primal_step_length)
                        .max(self.minimum_radius);
                }
                if self.verbose {
                    eprintln!(
                        "TR: accepted step norm {:.3e}, ratio {ratio:.3e}, radius -> {:.3e}",
                        direction.norm * primal_step_length,
                        self.radius
                    );
                }
                self.constraint_relaxation_strategy
                    .register_accepted_iterate(&mut trial_iterate)
                    .map_err(|_| {
                        SolverError::Internal("evaluation failed at an accepted iterate".to_string())
                    })?;
                return Ok(AcceptedIterate {
                    step_norm: direction.norm * primal_step_length,
                    iterate: trial_iterate,
                });
            }

            // rejected: shrink around the rejected step and retry in place
            self.radius = self.shrink_factor * self.radius.min(direction.norm.max(self.minimum_radius));
            if self.radius < self.minimum_radius {
                if direction.objective_multiplier == 0. {
                    // the violation cannot be reduced further in any radius:
                    // stationary point of the constraint violation
                    if self.constraint_relaxation_strategy.is_infeasibility_acceptable(
                        current_iterate.progress.infeasibility,
                    ) {
                        self.termination.forced_status =
                            Some(TerminationStatus::InfeasibleSmallStep);
                    } else {
                        self.termination.forced_status =
                            Some(TerminationStatus::InfeasibleStationaryPoint);
                    }
                    return Ok(AcceptedIterate {
                        iterate: current_iterate.clone(),
                        step_norm: 0.,
                    });
                }
                // optimality phase stalled: restart with a feasibility
                // direction and a fresh radius
                self.radius = self.minimum_radius * 1e4;
                force_feasibility = true;
                warmstart = WarmstartInformation::everything_changed();
                continue;
            }
            warmstart = WarmstartInformation::only_bounds_changed();
        }

        // inner loop exhausted without acceptance
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
