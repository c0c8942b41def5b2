//! Sequential QP / LP subproblem.
//!
//! Linearizes the constraints and builds a quadratic (or, in LP mode, zero)
//! model of the objective at the current iterate:
//!
//! ```text
//! minimize    g^T d + 1/2 d^T H d
//! subject to  gL - c(x) <= A d <= gU - c(x)
//!             xL - x <= d <= xU - x   (intersected with the trust region)
//! ```
//!
//! H comes from the Hessian model, convexified when no trust region bounds
//! the model from below.

use crate::direction::{Direction, WarmstartInformation};
use crate::error::{EvaluationError, SolverError};
use crate::hessian::HessianModel;
use crate::iterate::Iterate;
use crate::linalg::coo::SymmetricCooMatrix;
use crate::linalg::rectangular::RectangularMatrix;
use crate::linalg::vector::{dot, norm_inf};
use crate::options::Options;
use crate::reformulation::OptimizationProblem;
use crate::solvers::qp_solver::{QpProblem, QpSolver};
use crate::subproblem::{PredictedReductionModel, Subproblem};

pub struct SqpSubproblem {
    use_quadratic_model: bool,
    hessian_model: HessianModel,
    qp_solver: QpSolver,

    // model of the last solve, kept for predicted reduction and corrections
    gradient: Vec<f64>,
    constraints: Vec<f64>,
    jacobian: RectangularMatrix,
    hessian: SymmetricCooMatrix,
    variable_lower: Vec<f64>,
    variable_upper: Vec<f64>,
    constraint_lower: Vec<f64>,
    constraint_upper: Vec<f64>,

    initial_point: Option<Vec<f64>>,
    trust_region_radius: Option<f64>,
    proximal_coefficient: f64,
    number_subproblems_solved: usize,
}

impl SqpSubproblem {
    pub fn new(
        options: &Options,
        max_variables: usize,
        number_constraints: usize,
        use_quadratic_model: bool,
    ) -> Result<Self, SolverError> {
        let hessian_name = if use_quadratic_model {
            options.get_string("hessian_model")?.to_string()
        } else {
            "zero".to_string()
        };
        // without a trust region, an indefinite model would be unbounded;
        // convexification keeps the line-search QP well posed
        let convexify = options.get_string("mechanism")? == "LS";
        let hessian_model = HessianModel::from_option(&hessian_name, convexify, max_variables)?;

        Ok(Self {
            use_quadratic_model,
            hessian_model,
            qp_solver: QpSolver::new(
                max_variables,
                number_constraints,
                options.get_double("qp_tolerance")?,
                options.get_usize("qp_max_iterations")?,
            ),
            gradient: vec![0.; max_variables],
            constraints: vec![0.; number_constraints],
            jacobian: RectangularMatrix::new(number_constraints, max_variables),
            hessian: SymmetricCooMatrix::new(max_variables, 0),
            variable_lower: vec![0.; max_variables],
            variable_upper: vec![0.; max_variables],
            constraint_lower: vec![0.; number_constraints],
            constraint_upper: vec![0.; number_constraints],
            initial_point: None,
            trust_region_radius: None,
            proximal_coefficient: options.get_double("proximal_coefficient")?,
            number_subproblems_solved: 0,
        })
    }

    fn assemble_model(
        &mut self,
        problem: &dyn OptimizationProblem,
        iterate: &mut Iterate,
    ) -> Result<(), EvaluationError> {
        let nv = problem.number_variables();
        let m = problem.number_constraints();

        problem.evaluate_objective_gradient(iterate, &mut self.gradient)?;
        problem.evaluate_constraints(iterate, &mut self.constraints)?;
        self.jacobian = RectangularMatrix::new(m, nv);
        problem.evaluate_constraint_jacobian(iterate, &mut self.jacobian)?;
        if self.use_quadratic_model {
            let multipliers = iterate.multipliers.constraints.clone();
            self.hessian_model
                .evaluate(problem, iterate, &multipliers, &mut self.hessian)?;
        } else {
            self.hessian.reset(nv);
        }

        let radius = self.trust_region_radius.unwrap_or(f64::INFINITY);
        for i in 0..nv {
            let xi = iterate.primals[i];
            self.variable_lower[i] = (problem.variable_lower_bound(i) - xi).max(-radius);
            self.variable_upper[i] = (problem.variable_upper_bound(i) - xi).min(radius);
        }
        for j in 0..m {
            self.constraint_lower[j] = problem.constraint_lower_bound(j) - self.constraints[j];
            self.constraint_upper[j] = problem.constraint_upper_bound(j) - self.constraints[j];
        }
        Ok(())
    }

    /// Turn the QP solver's absolute multipliers into displacements with
    /// respect to the given iterate.
    fn to_displacements(direction: &mut Direction, iterate: &Iterate) {
        for j in 0..direction.number_constraints {
            direction.multipliers.constraints[j] -= iterate.multipliers.constraints[j];
        }
        for i in 0..direction.number_variables {
            direction.multipliers.lower_bounds[i] -= iterate.multipliers.lower_bounds[i];
            direction.multipliers.upper_bounds[i] -= iterate.multipliers.upper_bounds[i];
        }
    }

    fn run_qp(&mut self, nv: usize, m: usize, warmstart: &WarmstartInformation) -> Direction {
        let qp = QpProblem {
            number_variables: nv,
            number_constraints: m,
            hessian: if self.use_quadratic_model { Some(&self.hessian) } else { None },
            linear_objective: &self.gradient[..nv],
            jacobian: &self.jacobian,
            variable_lower_bounds: &self.variable_lower[..nv],
            variable_upper_bounds: &self.variable_upper[..nv],
            constraint_lower_bounds: &self.constraint_lower[..m],
            constraint_upper_bounds: &self.constraint_upper[..m],
        };
        let start = match &self.initial_point {
            Some(point) => point.clone(),
            None => vec![0.; nv],
        };
        self.number_subproblems_solved += 1;
        if self.use_quadratic_model {
            self.qp_solver.solve_qp(&qp, &start, warmstart)
        } else {
            self.qp_solver.solve_lp(&qp, &start, warmstart)
        }
    }
}

impl Subproblem for SqpSubproblem {
    fn initialize(
        &mut self,
        _problem: &dyn OptimizationProblem,
        _first_iterate: &mut Iterate,
    ) -> Result<(), SolverError> {
        Ok(())
    }

    fn solve(
        &mut self,
        problem: &dyn OptimizationProblem,
        current_iterate: &mut Iterate,
        warmstart: &WarmstartInformation,
    ) -> Result<Direction, SolverError> {
        let nv = problem.number_variables();
        let m = problem.number_constraints();
        self.assemble_model(problem, current_iterate)
            .map_err(|_| SolverError::Internal("evaluation failed at an accepted iterate".to_string()))?;

        let mut direction = self.run_qp(nv, m, warmstart);
        self.initial_point = None;
        direction.objective_multiplier = problem.objective_multiplier();
        direction.norm = norm_inf(&direction.primals[..nv]);
        Self::to_displacements(&mut direction, current_iterate);
        Ok(direction)
    }

    fn set_initial_point(&mut self, point: Option<&[f64]>) {
        self.initial_point = point.map(|point| point.to_vec());
    }

    fn set_trust_region_radius(&mut self, radius: Option<f64>) {
        self.trust_region_radius = radius;
    }

    fn compute_second_order_correction(
        &mut self,
        problem: &dyn OptimizationProblem,
        trial_iterate: &mut Iterate,
    ) -> Result<Direction, SolverError> {
        let nv = problem.number_variables();
        let m = problem.number_constraints();

        // same model, constraint bounds recentered on the trial constraint
        // values (Maratos correction)
        problem
            .evaluate_constraints(trial_iterate, &mut self.constraints)
            .map_err(|_| SolverError::Internal("evaluation failed during correction".to_string()))?;
        for j in 0..m {
            self.constraint_lower[j] = problem.constraint_lower_bound(j) - self.constraints[j];
            self.constraint_upper[j] = problem.constraint_upper_bound(j) - self.constraints[j];
        }

        let warmstart = WarmstartInformation {
            objective_changed: false,
            constraints_changed: false,
            variable_bounds_changed: false,
            constraint_bounds_changed: true,
            problem_structure_changed: false,
        };
        let mut correction = self.run_qp(nv, m, &warmstart);
        correction.objective_multiplier = problem.objective_multiplier();
        correction.norm = norm_inf(&correction.primals[..nv]);
        Self::to_displacements(&mut correction, trial_iterate);
        Ok(correction)
    }

    fn generate_predicted_reduction_model(
        &self,
        problem: &dyn OptimizationProblem,
        direction: &Direction,
    ) -> PredictedReductionModel {
        let nv = problem.number_variables();
        PredictedReductionModel::Quadratic {
            gradient_dot_direction: dot(&self.gradient[..nv], &direction.primals[..nv]),
            curvature: if self.use_quadratic_model {
                self.hessian.quadratic_form(&direction.primals[..nv])
            } else {
                0.
            },
        }
    }

    fn compute_optimality_measure(
        &mut self,
        problem: &dyn OptimizationProblem,
        iterate: &mut Iterate,
    ) -> Result<f64, EvaluationError> {
        problem.evaluate_objective(iterate)
    }

    fn postprocess_accepted_iterate(
        &mut self,
        _problem: &dyn OptimizationProblem,
        _iterate: &mut Iterate,
    ) {
    }

    fn definition_changed(&self) -> bool {
        false
    }

    fn reset_definition_changed(&mut self) {}

    fn number_subproblems_solved(&self) -> usize {
        self.number_subproblems_solved
    }

    fn proximal_coefficient(&self) -> f64 {
        self.proximal_coefficient
    }
}
