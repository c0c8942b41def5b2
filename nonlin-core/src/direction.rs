//! Search directions produced by the subproblems.

use crate::iterate::Multipliers;

/// Status reported by a subproblem solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubproblemStatus {
    Optimal,
    Infeasible,
    Unbounded,
    Error,
}

/// Variables and linearized constraints at a bound at the subproblem
/// solution.
#[derive(Debug, Clone, Default)]
pub struct ActiveSet {
    pub variables_at_lower_bound: Vec<usize>,
    pub variables_at_upper_bound: Vec<usize>,
    pub constraints_at_lower_bound: Vec<usize>,
    pub constraints_at_upper_bound: Vec<usize>,
}

impl ActiveSet {
    pub fn clear(&mut self) {
        self.variables_at_lower_bound.clear();
        self.variables_at_upper_bound.clear();
        self.constraints_at_lower_bound.clear();
        self.constraints_at_upper_bound.clear();
    }
}

/// Feasibility split of the linearized constraints at the direction.
#[derive(Debug, Clone, Default)]
pub struct ConstraintPartition {
    pub feasible: Vec<usize>,
    pub infeasible: Vec<usize>,
}

/// A trial step: primal direction plus the displacement of every multiplier.
///
/// Multipliers here are displacements relative to the current iterate; the
/// globalization mechanism scales them by the dual step lengths when it
/// assembles the trial iterate.
#[derive(Debug, Clone)]
pub struct Direction {
    pub number_variables: usize,
    pub number_constraints: usize,
    pub primals: Vec<f64>,
    pub multipliers: Multipliers,
    pub status: SubproblemStatus,
    /// Infinity norm of the primal block.
    pub norm: f64,
    /// Optimal value of the local model.
    pub subproblem_objective: f64,
    /// sigma of the problem view the direction was computed for.
    pub objective_multiplier: f64,
    pub active_set: ActiveSet,
    pub constraint_partition: Option<ConstraintPartition>,
    /// Fraction-to-boundary cap on the primal step length (1 when inactive).
    pub primal_step_length_limit: f64,
    /// Step length applied to the bound multipliers.
    pub bound_dual_step_length: f64,
}

impl Direction {
    pub fn new(number_variables: usize, number_constraints: usize) -> Self {
        Self {
            number_variables,
            number_constraints,
            primals: vec![0.; number_variables],
            multipliers: Multipliers::new(number_variables, number_constraints),
            status: SubproblemStatus::Optimal,
            norm: 0.,
            subproblem_objective: 0.,
            objective_multiplier: 1.,
            active_set: ActiveSet::default(),
            constraint_partition: None,
            primal_step_length_limit: 1.,
            bound_dual_step_length: 1.,
        }
    }
}

/// What changed in the subproblem since the last solve. Mis-declaring
/// "unchanged" for data that did change yields silent wrong answers, so
/// callers err on the side of marking things changed.
#[derive(Debug, Clone, Copy)]
pub struct WarmstartInformation {
    pub objective_changed: bool,
    pub constraints_changed: bool,
    pub variable_bounds_changed: bool,
    pub constraint_bounds_changed: bool,
    pub problem_structure_changed: bool,
}

impl WarmstartInformation {
    pub fn everything_changed() -> Self {
        Self {
            objective_changed: true,
            constraints_changed: true,
            variable_bounds_changed: true,
            constraint_bounds_changed: true,
            problem_structure_changed: true,
        }
    }

    /// Only the bounds moved (same model, new trust-region radius).
    pub fn only_bounds_changed() -> Self {
        Self {
            objective_changed: false,
            constraints_changed: false,
            variable_bounds_changed: true,
            constraint_bounds_changed: false,
            problem_structure_changed: false,
        }
    }
}
