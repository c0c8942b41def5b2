//! Feasibility restoration.
//!
//! Keeps two views of the problem: the optimality view (sigma = 1, original
//! constraints) and the feasibility view (sigma = 0, elastics, optional
//! proximal stabilization). When the subproblem declares the linearization
//! infeasible, or an acceptable direction carries a zero objective
//! multiplier, the strategy enters the restoration phase and minimizes the
//! violation of the infeasible constraint subset; once the linearized
//! infeasible set empties, it returns to optimality. Each phase owns its own
//! globalization strategy; switching resets the entered phase's strategy and
//! registers the abandoned iterate with the other.

use crate::direction::{ConstraintPartition, Direction, SubproblemStatus, WarmstartInformation};
use crate::error::{EvaluationError, SolverError};
use crate::iterate::Iterate;
use crate::linalg::vector::{norm_inf, Norm};
use crate::model::{constraint_violation, constraint_violation_subset, Model};
use crate::options::Options;
use crate::reformulation::{FeasibilityProblem, OptimalityProblem, OptimizationProblem};
use crate::relaxation::{ConstraintRelaxationStrategy, Phase};
use crate::residuals::compute_residuals;
use crate::strategy::{create_strategy, GlobalizationStrategy};
use crate::subproblem::{create_subproblem, PredictedReductionModel, Subproblem};

pub struct FeasibilityRestoration<'a> {
    model: &'a dyn Model,
    optimality_problem: OptimalityProblem<'a>,
    feasibility_problem: FeasibilityProblem<'a>,
    subproblem: Box<dyn Subproblem>,
    phase_1_strategy: Box<dyn GlobalizationStrategy>,
    phase_2_strategy: Box<dyn GlobalizationStrategy>,
    current_phase: Phase,

    residual_norm: Norm,
    s_max: f64,
    small_step_threshold: f64,
    linearization_tolerance: f64,
    /// infeasible subset driving the restoration optimality measure
    infeasible_constraints: Vec<usize>,
}

impl<'a> FeasibilityRestoration<'a> {
    pub fn new(model: &'a dyn Model, options: &Options) -> Result<Self, SolverError> {
        let maximum_number_variables = model.number_variables() + 2 * model.number_constraints();
        Ok(Self {
            model,
            optimality_problem: OptimalityProblem::new(model),
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
            phase_1_strategy: create_strategy(options)?,
            phase_2_strategy: create_strategy(options)?,
            current_phase: Phase::Optimality,
            residual_norm: Norm::from_option(options.get_string("residual_norm")?)?,
            s_max: options.get_double("s_max")?,
            small_step_threshold: options.get_double("tolerance")?
                / options.get_double("small_step_factor")?,
            linearization_tolerance: options.get_double("tolerance")?,
            infeasible_constraints: Vec::new(),
        })
    }

    /// l1 violation of the original constraints.
    fn compute_infeasibility_measure(&self, iterate: &mut Iterate) -> Result<f64, EvaluationError> {
        iterate.evaluate_constraints(self.model)?;
        Ok(constraint_violation(
            self.model,
            &iterate.evaluations.constraints,
            Norm::L1,
        ))
    }

    /// Restoration optimality measure: violation of the infeasible subset.
    fn compute_restoration_measure(&self, iterate: &mut Iterate) -> Result<f64, EvaluationError> {
        iterate.evaluate_constraints(self.model)?;
        Ok(constraint_violation_subset(
            self.model,
            &iterate.evaluations.constraints,
            &self.infeasible_constraints,
            Norm::L1,
        ))
    }

    fn solve_optimality_problem(
        &mut self,
        current_iterate: &mut Iterate,
        warmstart: &WarmstartInformation,
    ) -> Result<Direction, SolverError> {
        let mut direction =
            self.subproblem
                .solve(&self.optimality_problem, current_iterate, warmstart)?;
        direction.objective_multiplier = 1.;
        direction.norm = norm_inf(&direction.primals[..self.model.number_variables()]);

        // infeasible linearization: fall back to minimizing the violation
        if direction.status == SubproblemStatus::Infeasible {
            let phase_2_primals = direction.primals.clone();
            direction = self.solve_feasibility_problem(current_iterate, Some(&phase_2_primals))?;
        }
        Ok(direction)
    }

    fn solve_feasibility_problem(
        &mut self,
        current_iterate: &mut Iterate,
        phase_2_solution: Option<&[f64]>,
    ) -> Result<Direction, SolverError> {
        self.feasibility_problem
            .set_proximal_coefficient(self.subproblem.proximal_coefficient());
        self.feasibility_problem
            .set_proximal_reference_point(&current_iterate.primals);
        self.feasibility_problem
            .set_elastic_variables(current_iterate)
            .map_err(|_| SolverError::Internal("elastic initialization failed".to_string()))?;

        self.subproblem.set_initial_point(phase_2_solution);
        let mut direction = self.subproblem.solve(
            &self.feasibility_problem,
            current_iterate,
            &WarmstartInformation::everything_changed(),
        )?;
        direction.objective_multiplier = 0.;
        direction.norm = norm_inf(&direction.primals[..self.model.number_variables()]);
        let infeasible = self.feasibility_problem.violated_linearized_constraints(
            current_iterate,
            &direction.primals,
            self.linearization_tolerance,
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

    fn switch_to_feasibility_restoration(
        &mut self,
        current_iterate: &mut Iterate,
        direction: &Direction,
    ) -> Result<(), EvaluationError> {
        self.current_phase = Phase::FeasibilityRestoration;
        self.phase_2_strategy
            .register_current_progress(current_iterate.progress);
        self.phase_1_strategy.reset();
        if let Some(partition) = &direction.constraint_partition {
            self.infeasible_constraints = partition.infeasible.clone();
        }
        current_iterate.progress.optimality = self.compute_restoration_measure(current_iterate)?;
        self.phase_1_strategy
            .register_current_progress(current_iterate.progress);
        Ok(())
    }

    fn switch_to_optimality(
        &mut self,
        current_iterate: &mut Iterate,
        trial_iterate: &mut Iterate,
    ) -> Result<(), EvaluationError> {
        self.current_phase = Phase::Optimality;
        self.infeasible_constraints.clear();
        let number_variables = self.optimality_problem.number_variables();
        current_iterate.set_number_variables(number_variables);
        trial_iterate.set_number_variables(number_variables);
        current_iterate.progress.optimality = self
            .subproblem
            .compute_optimality_measure(&self.optimality_problem, current_iterate)?;
        Ok(())
    }

    /// Possibly switch phase, then evaluate the trial progress measures.
    /// Returns which strategy judges the trial iterate.
    fn switch_phase(
        &mut self,
        current_iterate: &mut Iterate,
        trial_iterate: &mut Iterate,
        direction: &Direction,
    ) -> Result<(), EvaluationError> {
        if self.current_phase == Phase::Optimality && direction.objective_multiplier == 0. {
            self.switch_to_feasibility_restoration(current_iterate, direction)?;
        } else if self.current_phase == Phase::FeasibilityRestoration {
            let empty_infeasible_set = direction
                .constraint_partition
                .as_ref()
                .is_some_and(|partition| partition.infeasible.is_empty());
            if empty_infeasible_set {
                self.switch_to_optimality(current_iterate, trial_iterate)?;
            }
        }

        trial_iterate.progress.infeasibility = self.compute_infeasibility_measure(trial_iterate)?;
        trial_iterate.progress.optimality = match self.current_phase {
            Phase::Optimality => self
                .subproblem
                .compute_optimality_measure(&self.optimality_problem, trial_iterate)?,
            Phase::FeasibilityRestoration => self.compute_restoration_measure(trial_iterate)?,
        };
        Ok(())
    }
}

impl ConstraintRelaxationStrategy for FeasibilityRestoration<'_> {
    fn initialize(&mut self, first_iterate: &mut Iterate) -> Result<(), SolverError> {
        self.subproblem
            .initialize(&self.optimality_problem, first_iterate)?;

        first_iterate.progress.infeasibility = self
            .compute_infeasibility_measure(first_iterate)
            .map_err(|_| SolverError::Internal("evaluation failed at the initial point".to_string()))?;
        first_iterate.progress.optimality = self
            .subproblem
            .compute_optimality_measure(&self.optimality_problem, first_iterate)
            .map_err(|_| SolverError::Internal("evaluation failed at the initial point".to_string()))?;
        compute_residuals(
            self.model,
            first_iterate,
            self.residual_norm,
            self.s_max,
            0.,
        )
        .map_err(|_| SolverError::Internal("evaluation failed at the initial point".to_string()))?;

        self.phase_1_strategy.initialize(first_iterate.progress);
        self.phase_2_strategy.initialize(first_iterate.progress);
        Ok(())
    }

    fn compute_feasible_direction(
        &mut self,
        current_iterate: &mut Iterate,
        warmstart: &WarmstartInformation,
    ) -> Result<Direction, SolverError> {
        match self.current_phase {
            Phase::Optimality => self.solve_optimality_problem(current_iterate, warmstart),
            Phase::FeasibilityRestoration => self.solve_feasibility_problem(current_iterate, None),
        }
    }

    fn is_acceptable(
        &mut self,
        current_iterate: &mut Iterate,
        trial_iterate: &mut Iterate,
        direction: &Direction,
        predicted_reduction_model: &PredictedReductionModel,
        step_length: f64,
    ) -> Result<bool, EvaluationError> {
        // a changed local model (smaller barrier parameter) invalidates the
        // stored optimality measures
        if self.subproblem.definition_changed() {
            current_iterate.progress.optimality = self
                .subproblem
                .compute_optimality_measure(&self.optimality_problem, current_iterate)?;
            self.phase_2_strategy.reset();
            self.subproblem.reset_definition_changed();
        }

        self.switch_phase(current_iterate, trial_iterate, direction)?;

        let accept = if direction.norm * step_length <= self.small_step_threshold {
            true
        } else {
            let predicted_reduction = predicted_reduction_model.evaluate(step_length);
            let strategy = match self.current_phase {
                Phase::Optimality => &mut self.phase_2_strategy,
                Phase::FeasibilityRestoration => &mut self.phase_1_strategy,
            };
            strategy.is_iterate_acceptable(
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
        self.solve_feasibility_problem(current_iterate, None)
    }

    fn compute_second_order_correction(
        &mut self,
        trial_iterate: &mut Iterate,
    ) -> Result<Direction, SolverError> {
        match self.current_phase {
            Phase::Optimality => self
                .subproblem
                .compute_second_order_correction(&self.optimality_problem, trial_iterate),
            Phase::FeasibilityRestoration => self
                .subproblem
                .compute_second_order_correction(&self.feasibility_problem, trial_iterate),
        }
    }

    fn generate_predicted_reduction_model(&self, direction: &Direction) -> PredictedReductionModel {
        match self.current_phase {
            Phase::Optimality => self
                .subproblem
                .generate_predicted_reduction_model(&self.optimality_problem, direction),
            Phase::FeasibilityRestoration => self
                .subproblem
                .generate_predicted_reduction_model(&self.feasibility_problem, direction),
        }
    }

    fn set_trust_region_radius(&mut self, radius: Option<f64>) {
        self.subproblem.set_trust_region_radius(radius);
    }

    fn register_accepted_iterate(&mut self, iterate: &mut Iterate) -> Result<(), EvaluationError> {
        match self.current_phase {
            Phase::Optimality => {
                iterate.objective_multiplier = 1.;
                self.subproblem
                    .postprocess_accepted_iterate(&self.optimality_problem, iterate);
            }
            Phase::FeasibilityRestoration => {
                iterate.objective_multiplier = 0.;
                self.subproblem
                    .postprocess_accepted_iterate(&self.feasibility_problem, iterate);
            }
        }
        Ok(())
    }

    fn is_infeasibility_acceptable(&self, infeasibility: f64) -> bool {
        match self.current_phase {
            Phase::Optimality => self.phase_2_strategy.is_infeasibility_acceptable(infeasibility),
            Phase::FeasibilityRestoration => {
                self.phase_1_strategy.is_infeasibility_acceptable(infeasibility)
            }
        }
    }

    fn current_phase(&self) -> Phase {
        self.current_phase
    }

    fn maximum_number_variables(&self) -> usize {
        self.feasibility_problem.number_variables()
    }

    fn number_subproblems_solved(&self) -> usize {
        self.subproblem.number_subproblems_solved()
    }
}
