//! Subproblems: the local models solved once per outer iteration.
//!
//! Two families share one interface: sequential QP/LP (built from the QP
//! solver and a Hessian model) and the primal-dual interior-point iteration
//! (built on the symmetric indefinite factorization).

mod interior_point;
mod sqp;

pub use interior_point::InteriorPointSubproblem;
pub use sqp::SqpSubproblem;

use crate::direction::{Direction, WarmstartInformation};
use crate::error::{EvaluationError, SolverError};
use crate::iterate::Iterate;
use crate::options::Options;
use crate::reformulation::OptimizationProblem;

/// Local model of the progress promised by a direction, evaluated at a step
/// length in (0, 1].
#[derive(Debug, Clone, Copy)]
pub enum PredictedReductionModel {
    /// Quadratic model: pred(alpha) = -(alpha g.d + alpha^2/2 d.H.d)
    Quadratic {
        gradient_dot_direction: f64,
        curvature: f64,
    },
    /// Barrier model: pred(alpha) = -alpha * (grad phi_mu . d)
    Barrier { directional_derivative: f64 },
}

impl PredictedReductionModel {
    pub fn evaluate(&self, step_length: f64) -> f64 {
        match *self {
            PredictedReductionModel::Quadratic {
                gradient_dot_direction,
                curvature,
            } => -(step_length * gradient_dot_direction
                + 0.5 * step_length * step_length * curvature),
            PredictedReductionModel::Barrier { directional_derivative } => {
                -step_length * directional_derivative
            }
        }
    }
}

/// One iteration's local model.
pub trait Subproblem {
    /// Prepare internal state for the initial iterate (may move it strictly
    /// inside the bounds for barrier methods).
    fn initialize(
        &mut self,
        problem: &dyn OptimizationProblem,
        first_iterate: &mut Iterate,
    ) -> Result<(), SolverError>;

    /// Assemble and solve the local model at the current iterate. Returned
    /// multipliers are displacements.
    fn solve(
        &mut self,
        problem: &dyn OptimizationProblem,
        current_iterate: &mut Iterate,
        warmstart: &WarmstartInformation,
    ) -> Result<Direction, SolverError>;

    /// Seed the next solve with a starting point (e.g. the optimality-phase
    /// solution when entering restoration).
    fn set_initial_point(&mut self, point: Option<&[f64]>);

    /// Box constraint `|d_i| <= radius` enforced on the next solves
    /// (trust-region mechanism); `None` removes it.
    fn set_trust_region_radius(&mut self, radius: Option<f64>);

    /// Extra direction computed after a rejected trial step, with constraints
    /// re-evaluated at the trial point.
    fn compute_second_order_correction(
        &mut self,
        problem: &dyn OptimizationProblem,
        trial_iterate: &mut Iterate,
    ) -> Result<Direction, SolverError>;

    fn generate_predicted_reduction_model(
        &self,
        problem: &dyn OptimizationProblem,
        direction: &Direction,
    ) -> PredictedReductionModel;

    /// Phase-dependent optimality measure phi of an iterate (objective for
    /// SQP, barrier function for interior point).
    fn compute_optimality_measure(
        &mut self,
        problem: &dyn OptimizationProblem,
        iterate: &mut Iterate,
    ) -> Result<f64, EvaluationError>;

    /// Hook called once a trial iterate is accepted (multiplier safeguards,
    /// slack updates).
    fn postprocess_accepted_iterate(
        &mut self,
        problem: &dyn OptimizationProblem,
        iterate: &mut Iterate,
    );

    /// True when the local model changed between outer iterations (barrier
    /// parameter reduced): progress measures must be recomputed and the
    /// globalization strategy reset.
    fn definition_changed(&self) -> bool;
    fn reset_definition_changed(&mut self);

    fn number_subproblems_solved(&self) -> usize;

    /// Proximal coefficient the feasibility reformulation should use.
    fn proximal_coefficient(&self) -> f64 {
        0.
    }
}

/// Build the subproblem selected by the `subproblem` option.
pub fn create_subproblem(
    options: &Options,
    max_variables: usize,
    number_constraints: usize,
) -> Result<Box<dyn Subproblem>, SolverError> {
    match options.get_string("subproblem")? {
        "QP" => Ok(Box::new(SqpSubproblem::new(
            options,
            max_variables,
            number_constraints,
            /* use_quadratic_model: */ true,
        )?)),
        "LP" => Ok(Box::new(SqpSubproblem::new(
            options,
            max_variables,
            number_constraints,
            /* use_quadratic_model: */ false,
        )?)),
        "primal-dual-interior-point" => Ok(Box::new(InteriorPointSubproblem::new(
            options,
            max_variables,
            number_constraints,
        )?)),
        other => Err(SolverError::InvalidOption(format!(
            "unknown subproblem {other}"
        ))),
    }
}
