//! l1 relaxation.
//!
//! The problem is reformulated once into a smooth penalty problem
//! `min f(x) + eta (sum p + sum n)` over the elastic constraints, and eta is
//! raised until the penalized direction achieves a fraction of the best
//! possible decrease of the linearized infeasibility (the criterion of
//! Byrd, Nocedal & Waltz), while the predicted model reduction keeps pace
//! with the penalized infeasibility decrease.

use crate::direction::{ConstraintPartition, Direction, WarmstartInformation};
use crate::error::{EvaluationError, SolverError};
use crate::iterate::Iterate;
use crate::linalg::vector::Norm;
use crate::model::{constraint_violation, Model};
use crate::options::Options;
use crate::reformulation::{FeasibilityProblem, L1RelaxedProblem, OptimizationProblem};
use crate::relaxation::{ConstraintRelaxationStrategy, Phase};
use crate::residuals::compute_residuals;
use crate::strategy::{create_strategy, GlobalizationStrategy};
use crate::subproblem::{create_subproblem, PredictedReductionModel, Subproblem};

const PENALTY_CAP: f64 = 1e12;
const MAX_PENALTY_UPDATES: usize = 20;

pub struct L1Relaxation<'a> {
    model: &'a dyn Model,
    relaxed_problem: L1RelaxedProblem<'a>,
    feasibility_problem: FeasibilityProblem<'a>,
    subproblem: Box<dyn Subproblem>,
    strategy: Box<dyn GlobalizationStrategy>,

    epsilon1: f64,
    epsilon2: f64,
    penalty_increase_factor: f64,
    residual_norm: Norm,
    s_max: f64,
    small_step_threshold: f64,
    tolerance: f64,
    penalty_changed: bool,
}

impl<'a> L1Relaxation<'a> {
    pub fn new(model: &'a dyn Model, options: &Options) -> Result<Self, SolverError> {
        let maximum_number_variables = model.number_variables() + 2 * model.number_constraints();
        Ok(Self {
            model,
            relaxed_problem: L1RelaxedProblem::new(
                model,
                options.get_double("l1_initial_parameter")?,
            ),
            feasibility_problem: FeasibilityProblem::new(
                model,
                options.get_double("l1_constraint_violation_coefficient")?,
                options.get_bool("l1_use_proximal_term")?,
            ),
            subproblem: create_subproblem(
                options,
                maximum_number_variables,
                model.number_constraints(),
            )?,
            strategy: create_strategy(options)?,
            epsilon1: options.get_double("l1_epsilon1")?,
            epsilon2: options.get_double("l1_epsilon2")?,
            penalty_increase_factor: options.get_double("l1_parameter_increase_factor")?,
            residual_norm: Norm::from_option(options.get_string("residual_norm")?)?,
            s_max: options.get_double("s_max")?,
            small_step_threshold: options.get_double("tolerance")?
                / options.get_double("small_step_factor")?,
            tolerance: options.get_double("tolerance")?,
            penalty_changed: false,
        })
    }

    fn compute_infeasibility_measure(&self, iterate: &mut Iterate) -> Result<f64, EvaluationError> {
        iterate.evaluate_constraints(self.model)?;
        Ok(constraint_violation(
            self.model,
            &iterate.evaluations.constraints,
            Norm::L1,
        ))
    }

    /// Linearized infeasibility after the step: total elastic mass at
    /// `current + direction`.
    fn linearized_residual(&self, iterate: &Iterate, direction: &Direction) -> f64 {
        let n = self.model.number_variables();
        let m = self.model.number_constraints();
        let mut residual = 0.;
        for elastic_index in n..n + 2 * m {
            residual +=
                (iterate.primals[elastic_index] + direction.primals[elastic_index]).max(0.);
        }
        residual
    }
}

impl ConstraintRelaxationStrategy for L1Relaxation<'_> {
    fn initialize(&mut self, first_iterate: &mut Iterate) -> Result<(), SolverError> {
        self.relaxed_problem
            .set_elastic_variables(first_iterate)
            .map_err(|_| SolverError::Internal("elastic initialization failed".to_string()))?;
        self.subproblem
            .initialize(&self.relaxed_problem, first_iterate)?;

        first_iterate.progress.infeasibility = self
            .compute_infeasibility_measure(first_iterate)
            .map_err(|_| SolverError::Internal("evaluation failed at the initial point".to_string()))?;
        first_iterate.progress.optimality = self
            .subproblem
            .compute_optimality_measure(&self.relaxed_problem, first_iterate)
            .map_err(|_| SolverError::Internal("evaluation failed at the initial point".to_string()))?;
        compute_residuals(
            self.model,
            first_iterate,
            self.residual_norm,
            self.s_max,
            0.,
        )
        .map_err(|_| SolverError::Internal("evaluation failed at the initial point".to_string()))?;

        self.strategy.initialize(first_iterate.progress);
        Ok(())
    }

    fn compute_feasible_direction(
        &mut self,
        current_iterate: &mut Iterate,
        warmstart: &WarmstartInformation,
    ) -> Result<Direction, SolverError> {
        self.relaxed_problem
            .set_elastic_variables(current_iterate)
            .map_err(|_| SolverError::Internal("elastic initialization failed".to_string()))?;
        let initial_linearized = self.relaxed_problem.elastic_mass(&current_iterate.primals);

        let mut direction =
            self.subproblem
                .solve(&self.relaxed_problem, current_iterate, warmstart)?;
        let mut residual = self.linearized_residual(current_iterate, &direction);
        let mut predicted_reduction = self
            .subproblem
            .generate_predicted_reduction_model(&self.relaxed_problem, &direction)
            .evaluate(1.);

        if self.tolerance < residual {
            // best achievable linearized residual, from the pure feasibility
            // problem started at the penalized solution
            self.feasibility_problem
                .set_proximal_coefficient(self.subproblem.proximal_coefficient());
            self.feasibility_problem
                .set_proximal_reference_point(&current_iterate.primals);
            self.subproblem.set_initial_point(Some(&direction.primals));
            let feasibility_direction = self.subproblem.solve(
                &self.feasibility_problem,
                current_iterate,
                &WarmstartInformation::everything_changed(),
            )?;
            let ideal_residual =
                self.linearized_residual(current_iterate, &feasibility_direction);
            let mut model_is_stale = true;

            // raise the penalty until the achieved infeasibility decrease is
            // a fraction of the best possible one and the model reduction
            // covers the penalized decrease
            let target_decrease = self.epsilon1 * (initial_linearized - ideal_residual);
            if self.tolerance < initial_linearized - ideal_residual {
                for _update in 0..MAX_PENALTY_UPDATES {
                    let achieved_decrease = initial_linearized - residual;
                    let enough_feasibility_progress = target_decrease <= achieved_decrease;
                    let enough_model_reduction = self.epsilon2
                        * self.relaxed_problem.penalty_parameter()
                        * achieved_decrease
                        <= predicted_reduction + self.tolerance;
                    if (enough_feasibility_progress && enough_model_reduction)
                        || PENALTY_CAP < self.relaxed_problem.penalty_parameter()
                    {
                        break;
                    }
                    let penalty = self.relaxed_problem.penalty_parameter()
                        * self.penalty_increase_factor;
                    self.relaxed_problem.set_penalty_parameter(penalty);
                    self.penalty_changed = true;
                    direction = self.subproblem.solve(
                        &self.relaxed_problem,
                        current_iterate,
                        &WarmstartInformation::everything_changed(),
                    )?;
                    residual = self.linearized_residual(current_iterate, &direction);
                    predicted_reduction = self
                        .subproblem
                        .generate_predicted_reduction_model(&self.relaxed_problem, &direction)
                        .evaluate(1.);
                    model_is_stale = false;
                }
            }

            // the subproblem's stored local model must describe the returned
            // direction; refresh it if the feasibility probe was solved last
            if model_is_stale {
                direction = self.subproblem.solve(
                    &self.relaxed_problem,
                    current_iterate,
                    &WarmstartInformation::everything_changed(),
                )?;
            }
        }

        direction.objective_multiplier = 1.;
        direction.norm = crate::linalg::vector::norm_inf(
            &direction.primals[..self.model.number_variables()],
        );
        let infeasible = self.relaxed_problem.violated_linearized_constraints(
            current_iterate,
            &direction.primals,
            self.tolerance,
        );
        let feasible = (0..self.model.number_constraints())
            .filter(|j| !infeasible.contains(j))
            .collect();
        direction.constraint_partition = Some(ConstraintPartition {
            feasible,
            infeasible,
        });
        Ok(direction)
    }

    fn is_acceptable(
        &mut self,
        current_iterate: &mut Iterate,
        trial_iterate: &mut Iterate,
        direction: &Direction,
        predicted_reduction_model: &PredictedReductionModel,
        step_length: f64,
    ) -> Result<bool, EvaluationError> {
        if self.penalty_changed || self.subproblem.definition_changed() {
            current_iterate.progress.optimality = self
                .subproblem
                .compute_optimality_measure(&self.relaxed_problem, current_iterate)?;
            self.strategy.reset();
            self.penalty_changed = false;
            self.subproblem.reset_definition_changed();
        }

        trial_iterate.progress.infeasibility = self.compute_infeasibility_measure(trial_iterate)?;
        trial_iterate.progress.optimality = self
            .subproblem
            .compute_optimality_measure(&self.relaxed_problem, trial_iterate)?;

        let accept = if direction.norm * step_length <= self.small_step_threshold {
            true
        } else {
            let predicted_reduction = predicted_reduction_model.evaluate(step_length);
            self.strategy.is_iterate_acceptable(
                current_iterate.progress,
                trial_iterate.progress,
                direction.objective_multiplier,
                predicted_reduction,
            )
        };

        if accept {
            compute_residuals(
                self.model,
                trial_iterate,
                self.residual_norm,
                self.s_max,
                0.,
            )?;
        }
        Ok(accept)
    }

    fn compute_feasibility_direction(
        &mut self,
        current_iterate: &mut Iterate,
    ) -> Result<Direction, SolverError> {
        // stalling: make infeasibility much more expensive and recompute
        let penalty = self.relaxed_problem.penalty_parameter() * self.penalty_increase_factor;
        if penalty <= PENALTY_CAP {
            self.relaxed_problem.set_penalty_parameter(penalty);
            self.penalty_changed = true;
        }
        self.compute_feasible_direction(
            current_iterate,
            &WarmstartInformation::everything_changed(),
        )
    }

    fn compute_second_order_correction(
        &mut self,
        trial_iterate: &mut Iterate,
    ) -> Result<Direction, SolverError> {
        self.subproblem
            .compute_second_order_correction(&self.relaxed_problem, trial_iterate)
    }

    fn generate_predicted_reduction_model(&self, direction: &Direction) -> PredictedReductionModel {
        self.subproblem
            .generate_predicted_reduction_model(&self.relaxed_problem, direction)
    }

    fn set_trust_region_radius(&mut self, radius: Option<f64>) {
        self.subproblem.set_trust_region_radius(radius);
    }

    fn register_accepted_iterate(&mut self, iterate: &mut Iterate) -> Result<(), EvaluationError> {
        iterate.objective_multiplier = 1.;
        self.subproblem
            .postprocess_accepted_iterate(&self.relaxed_problem, iterate);
        Ok(())
    }

    fn is_infeasibility_acceptable(&self, infeasibility: f64) -> bool {
        self.strategy.is_infeasibility_acceptable(infeasibility)
    }

    fn current_phase(&self) -> Phase {
        Phase::Optimality
    }

    fn maximum_number_variables(&self) -> usize {
        self.relaxed_problem.number_variables()
    }

    fn number_subproblems_solved(&self) -> usize {
        self.subproblem.number_subproblems_solved()
    }
}
