//! Bound-constrained QP/LP solver.
//!
//! Solves
//!
//! ```text
//! minimize    1/2 d^T H d + g^T d
//! subject to  bL <= A d <= bU,   l <= d <= u
//! ```
//!
//! with a primal-dual interior-point iteration: two-sided rows get a boxed
//! row slack, the resulting KKT system is factorized by [`LdlSolver`], and
//! bound multipliers follow the usual perturbed-complementarity recovery with
//! a fraction-to-boundary rule. LP mode is the same path with H absent.
//!
//! When the linearized constraints are inconsistent, a second pass minimizes
//! the l1 norm of elastic violations and the solver reports `Infeasible`
//! together with the minimum-infeasibility direction and the partition of
//! violated rows; the caller uses that to switch into its feasibility phase.
//!
//! The caller declares what changed since the previous solve through
//! [`WarmstartInformation`]; an unchanged structure keeps the previous
//! primal-dual state as starting point and reuses the symbolic
//! factorization through the pattern check in the LDL backend.

use crate::direction::{
    ActiveSet, ConstraintPartition, Direction, SubproblemStatus, WarmstartInformation,
};
use crate::iterate::Multipliers;
use crate::linalg::coo::SymmetricCooMatrix;
use crate::linalg::rectangular::RectangularMatrix;
use crate::linalg::vector::norm_inf;
use crate::model::{push_to_interior, INFINITY};

const FRACTION_TO_BOUNDARY: f64 = 0.995;
const MULTIPLIER_SAFEGUARD: f64 = 1e10;
const DIVERGENCE_THRESHOLD: f64 = 1e10;

/// One QP/LP instance, borrowed from the calling subproblem.
pub struct QpProblem<'a> {
    pub number_variables: usize,
    pub number_constraints: usize,
    /// Lower-triangular quadratic term; `None` selects LP mode.
    pub hessian: Option<&'a SymmetricCooMatrix>,
    pub linear_objective: &'a [f64],
    pub jacobian: &'a RectangularMatrix,
    pub variable_lower_bounds: &'a [f64],
    pub variable_upper_bounds: &'a [f64],
    pub constraint_lower_bounds: &'a [f64],
    pub constraint_upper_bounds: &'a [f64],
}

enum CoreStatus {
    Converged,
    PrimalInfeasible,
    Unbounded,
    Failure,
}

/// Interior-point solver for box- and linearly-constrained QPs and LPs.
pub struct QpSolver {
    tolerance: f64,
    max_iterations: usize,
    linear_solver: crate::solvers::ldl_solver::LdlSolver,

    // primal-dual state of the last solve, reused for warm starts
    w: Vec<f64>,
    y: Vec<f64>,
    z_lower: Vec<f64>,
    z_upper: Vec<f64>,
    state_dimensions: (usize, usize),

    // per-solve layout and scratch, sized once at construction
    slack_slot: Vec<Option<usize>>,
    lower: Vec<f64>,
    upper: Vec<f64>,
    kkt: SymmetricCooMatrix,
    rhs: Vec<f64>,
    solution: Vec<f64>,
    gradient_part: Vec<f64>,
    primal_residual: Vec<f64>,
}

impl QpSolver {
    /// Workspaces cover the elastic phase-1 reformulation, which is the
    /// largest system this solver ever builds.
    pub fn new(max_variables: usize, max_constraints: usize, tolerance: f64, max_iterations: usize) -> Self {
        let max_core_variables = max_variables + 2 * max_constraints;
        let max_w = max_core_variables + max_constraints;
        let max_kkt = max_w + max_constraints;
        Self {
            tolerance,
            max_iterations,
            linear_solver: crate::solvers::ldl_solver::LdlSolver::new(max_kkt),
            w: vec![0.; max_w],
            y: vec![0.; max_constraints],
            z_lower: vec![0.; max_w],
            z_upper: vec![0.; max_w],
            state_dimensions: (0, 0),
            slack_slot: vec![None; max_constraints],
            lower: vec![0.; max_w],
            upper: vec![0.; max_w],
            kkt: SymmetricCooMatrix::new(max_kkt, 0),
            rhs: vec![0.; max_kkt],
            solution: vec![0.; max_kkt],
            gradient_part: vec![0.; max_w],
            primal_residual: vec![0.; max_constraints],
        }
    }

    /// Solve a QP. `initial_point` seeds the primal variables.
    pub fn solve_qp(
        &mut self,
        problem: &QpProblem<'_>,
        initial_point: &[f64],
        warmstart: &WarmstartInformation,
    ) -> Direction {
        self.solve_subproblem(problem, initial_point, warmstart)
    }

    /// Solve an LP (quadratic term ignored even if present).
    pub fn solve_lp(
        &mut self,
        problem: &QpProblem<'_>,
        initial_point: &[f64],
        warmstart: &WarmstartInformation,
    ) -> Direction {
        let lp = QpProblem { hessian: None, ..*problem };
        self.solve_subproblem(&lp, initial_point, warmstart)
    }

    fn solve_subproblem(
        &mut self,
        problem: &QpProblem<'_>,
        initial_point: &[f64],
        warmstart: &WarmstartInformation,
    ) -> Direction {
        let nv = problem.number_variables;
        let m = problem.number_constraints;
        let mut direction = Direction::new(nv, m);

        let warm = !warmstart.problem_structure_changed && self.state_dimensions == (nv, m);
        let status = self.core_solve(
            problem.hessian,
            problem.linear_objective,
            problem.jacobian,
            problem.variable_lower_bounds,
            problem.variable_upper_bounds,
            problem.constraint_lower_bounds,
            problem.constraint_upper_bounds,
            nv,
            m,
            initial_point,
            warm,
        );
        self.state_dimensions = (nv, m);

        match status {
            CoreStatus::Converged => {
                self.export_solution(problem, nv, m, &mut direction);
                direction.status = SubproblemStatus::Optimal;
                direction.constraint_partition = Some(ConstraintPartition {
                    feasible: (0..m).collect(),
                    infeasible: Vec::new(),
                });
            }
            CoreStatus::Unbounded => {
                self.export_solution(problem, nv, m, &mut direction);
                direction.status = SubproblemStatus::Unbounded;
            }
            CoreStatus::PrimalInfeasible => {
                self.solve_l1_feasibility(problem, initial_point, &mut direction);
            }
            CoreStatus::Failure => {
                direction.status = SubproblemStatus::Error;
            }
        }
        direction
    }

    /// Minimize the l1 norm of elastic constraint violations:
    /// `min sum(p + n)  s.t.  bL <= A d + p - n <= bU, l <= d <= u, p, n >= 0`.
    /// Always feasible; the optimum is the minimum-l1-infeasibility direction.
    fn solve_l1_feasibility(
        &mut self,
        problem: &QpProblem<'_>,
        initial_point: &[f64],
        direction: &mut Direction,
    ) {
        let nv = problem.number_variables;
        let m = problem.number_constraints;
        let nv_elastic = nv + 2 * m;

        let mut gradient = vec![0.; nv_elastic];
        gradient[nv..].fill(1.);

        let mut jacobian = RectangularMatrix::new(m, nv_elastic);
        for j in 0..m {
            for (index, value) in problem.jacobian.row(j).iter() {
                jacobian.row_mut(j).insert(index, value);
            }
            jacobian.row_mut(j).insert(nv + j, 1.);
            jacobian.row_mut(j).insert(nv + m + j, -1.);
        }

        let mut lower = problem.variable_lower_bounds.to_vec();
        let mut upper = problem.variable_upper_bounds.to_vec();
        lower.resize(nv_elastic, 0.);
        upper.resize(nv_elastic, f64::INFINITY);

        let mut start = initial_point.to_vec();
        start.resize(nv_elastic, 1.);

        let status = self.core_solve(
            None,
            &gradient,
            &jacobian,
            &lower,
            &upper,
            problem.constraint_lower_bounds,
            problem.constraint_upper_bounds,
            nv_elastic,
            m,
            &start,
            false,
        );
        // elastic state must not leak into the next warm start
        self.state_dimensions = (0, 0);

        if matches!(status, CoreStatus::Converged) {
            let elastic_tolerance = 1e3 * self.tolerance.max(1e-11);
            let mut partition = ConstraintPartition::default();
            for j in 0..m {
                let violation = self.w[nv + j] + self.w[nv + m + j];
                if elastic_tolerance < violation {
                    partition.infeasible.push(j);
                } else {
                    partition.feasible.push(j);
                }
            }
            let elastic_problem = QpProblem { hessian: None, ..*problem };
            self.export_solution(&elastic_problem, nv, m, direction);
            direction.status = SubproblemStatus::Infeasible;
            direction.constraint_partition = Some(partition);
        } else {
            direction.status = SubproblemStatus::Error;
        }
    }

    fn export_solution(
        &self,
        problem: &QpProblem<'_>,
        nv: usize,
        m: usize,
        direction: &mut Direction,
    ) {
        direction.primals[..nv].copy_from_slice(&self.w[..nv]);
        direction.multipliers = Multipliers::new(nv, m);
        direction.multipliers.constraints.copy_from_slice(&self.y[..m]);
        direction.multipliers.lower_bounds.copy_from_slice(&self.z_lower[..nv]);
        direction.multipliers.upper_bounds.copy_from_slice(&self.z_upper[..nv]);
        direction.norm = norm_inf(&self.w[..nv]);

        let mut objective: f64 = crate::linalg::vector::dot(
            &problem.linear_objective[..nv],
            &self.w[..nv],
        );
        if let Some(hessian) = problem.hessian {
            objective += 0.5 * hessian.quadratic_form(&self.w[..nv]);
        }
        direction.subproblem_objective = objective;

        direction.active_set.clear();
        let activity_tolerance = 1e-7;
        for i in 0..nv {
            let lb = problem.variable_lower_bounds[i];
            let ub = problem.variable_upper_bounds[i];
            if -INFINITY < lb && self.w[i] - lb <= activity_tolerance * lb.abs().max(1.) {
                direction.active_set.variables_at_lower_bound.push(i);
            } else if ub < INFINITY && ub - self.w[i] <= activity_tolerance * ub.abs().max(1.) {
                direction.active_set.variables_at_upper_bound.push(i);
            }
        }
        for j in 0..m {
            let lb = problem.constraint_lower_bounds[j];
            let ub = problem.constraint_upper_bounds[j];
            let row_value = problem.jacobian.row(j).dot(&self.w[..nv]);
            if -INFINITY < lb && row_value - lb <= activity_tolerance * lb.abs().max(1.) {
                direction.active_set.constraints_at_lower_bound.push(j);
            } else if ub < INFINITY && ub - row_value <= activity_tolerance * ub.abs().max(1.) {
                direction.active_set.constraints_at_upper_bound.push(j);
            }
        }
    }

    /// Interior-point core. On return, `self.w/y/z_lower/z_upper` hold the
    /// final primal-dual point of the (possibly elastic) system.
    #[allow(clippy::too_many_arguments)]
    fn core_solve(
        &mut self,
        hessian: Option<&SymmetricCooMatrix>,
        gradient: &[f64],
        jacobian: &RectangularMatrix,
        variable_lower: &[f64],
        variable_upper: &[f64],
        constraint_lower: &[f64],
        constraint_upper: &[f64],
        nv: usize,
        m: usize,
        initial_point: &[f64],
        warm: bool,
    ) -> CoreStatus {
        // layout: w = (d, row slacks for two-sided rows)
        let mut number_slacks = 0;
        for j in 0..m {
            let two_sided = constraint_lower[j] < constraint_upper[j];
            self.slack_slot[j] = if two_sided {
                number_slacks += 1;
                Some(nv + number_slacks - 1)
            } else {
                None
            };
        }
        let nw = nv + number_slacks;
        let kkt_dimension = nw + m;

        // variable box, with degenerate intervals opened slightly so the
        // barrier stays defined
        for i in 0..nw {
            let (lb, ub) = if i < nv {
                (variable_lower[i], variable_upper[i])
            } else {
                let j = (0..m).find(|&j| self.slack_slot[j] == Some(i)).unwrap();
                (constraint_lower[j], constraint_upper[j])
            };
            let width_floor = 1e-10 * lb.abs().max(1.);
            if lb > -INFINITY && ub < INFINITY && ub - lb < width_floor {
                self.lower[i] = lb - width_floor;
                self.upper[i] = ub + width_floor;
            } else {
                self.lower[i] = lb;
                self.upper[i] = ub;
            }
        }

        // starting point strictly inside the box
        let interior_push = 1e-2;
        if !warm {
            self.y[..m].fill(0.);
            for i in 0..nw {
                self.z_lower[i] = if -INFINITY < self.lower[i] { 1. } else { 0. };
                self.z_upper[i] = if self.upper[i] < INFINITY { -1. } else { 0. };
            }
        }
        for i in 0..nv {
            self.w[i] = initial_point.get(i).copied().unwrap_or(0.);
        }
        for j in 0..m {
            if let Some(slot) = self.slack_slot[j] {
                self.w[slot] = jacobian.row(j).dot(&self.w[..nv]);
            }
        }
        for i in 0..nw {
            self.w[i] = push_to_interior(self.w[i], self.lower[i], self.upper[i], interior_push);
            if warm {
                // keep previous multipliers but make them usable barriers again
                if -INFINITY < self.lower[i] {
                    self.z_lower[i] = self.z_lower[i].max(1e-8);
                }
                if self.upper[i] < INFINITY {
                    self.z_upper[i] = self.z_upper[i].min(-1e-8);
                }
            }
        }

        let mut static_regularization = 1e-8;
        let mut barrier: f64 = if warm { 1e-2 } else { 0.1 };

        for _iteration in 0..self.max_iterations {
            // residuals at the current point
            self.compute_gradient_part(hessian, gradient, jacobian, nv, nw, m);
            let mut stationarity_error: f64 = 0.;
            for i in 0..nw {
                stationarity_error = stationarity_error
                    .max((self.gradient_part[i] - self.z_lower[i] - self.z_upper[i]).abs());
            }
            for j in 0..m {
                let row_value = jacobian.row(j).dot(&self.w[..nv]);
                self.primal_residual[j] = match self.slack_slot[j] {
                    Some(slot) => row_value - self.w[slot],
                    None => row_value - constraint_lower[j],
                };
            }
            let primal_error = norm_inf(&self.primal_residual[..m]);

            let (complementarity, count) = self.complementarity_average(nw);
            let dual_scale = 1f64
                .max(norm_inf(&self.y[..m]))
                .max(norm_inf(&self.z_lower[..nw]))
                .max(norm_inf(&self.z_upper[..nw]));
            let primal_scale = 1f64.max(norm_inf(&self.w[..nw]));

            if stationarity_error <= self.tolerance * dual_scale
                && primal_error <= self.tolerance * primal_scale
                && complementarity <= self.tolerance * dual_scale
            {
                return CoreStatus::Converged;
            }
            if DIVERGENCE_THRESHOLD < norm_inf(&self.w[..nv]) {
                return CoreStatus::Unbounded;
            }
            if DIVERGENCE_THRESHOLD < dual_scale && self.tolerance * 1e3 < primal_error {
                // multipliers blowing up while the linearization stays
                // violated: inconsistent constraints
                return CoreStatus::PrimalInfeasible;
            }

            let barrier_target = if count == 0 {
                0.
            } else {
                (0.1 * complementarity).max(self.tolerance * 0.1)
            };
            barrier = barrier.min(barrier_target.max(self.tolerance * 0.1));

            // assemble and factorize the KKT system; an indefinite quadratic
            // term is pushed to the right inertia by raising the
            // regularization
            self.assemble_kkt(hessian, jacobian, nv, nw, m, static_regularization);
            let mut factorized = false;
            for _attempt in 0..6 {
                if self.linear_solver.factorize(&self.kkt).is_err() {
                    return CoreStatus::Failure;
                }
                if !self.linear_solver.is_singular() && self.linear_solver.inertia() == (nw, m, 0) {
                    factorized = true;
                    break;
                }
                static_regularization *= 100.;
                self.assemble_kkt(hessian, jacobian, nv, nw, m, static_regularization);
            }
            if !factorized {
                return CoreStatus::Failure;
            }

            // right-hand side with the barrier-perturbed stationarity
            for i in 0..nw {
                let mut value = -self.gradient_part[i];
                if -INFINITY < self.lower[i] {
                    value += barrier / (self.w[i] - self.lower[i]);
                }
                if self.upper[i] < INFINITY {
                    value -= barrier / (self.upper[i] - self.w[i]);
                }
                self.rhs[i] = value;
            }
            for j in 0..m {
                self.rhs[nw + j] = -self.primal_residual[j];
            }
            if self
                .linear_solver
                .solve(&self.kkt, &self.rhs[..kkt_dimension], &mut self.solution[..kkt_dimension])
                .is_err()
            {
                return CoreStatus::Failure;
            }
            if self.solution[..kkt_dimension].iter().any(|value| !value.is_finite()) {
                return CoreStatus::Failure;
            }

            self.take_step(nw, m, barrier);
        }

        // out of iterations: decide between near-optimal, infeasible and failure
        let primal_error = norm_inf(&self.primal_residual[..m]);
        let loose = 1e-6;
        if primal_error > loose * 1f64.max(norm_inf(&self.w[..nw])) {
            CoreStatus::PrimalInfeasible
        } else {
            CoreStatus::Converged
        }
    }

    /// gradient_part[i] = (H d + g + A^T y)_i for variables, -y_j for slacks.
    fn compute_gradient_part(
        &mut self,
        hessian: Option<&SymmetricCooMatrix>,
        gradient: &[f64],
        jacobian: &RectangularMatrix,
        nv: usize,
        nw: usize,
        m: usize,
    ) {
        self.gradient_part[..nw].fill(0.);
        self.gradient_part[..nv].copy_from_slice(&gradient[..nv]);
        if let Some(hessian) = hessian {
            hessian.add_product_to(&self.w[..nv], 1., &mut self.gradient_part[..nv]);
        }
        jacobian.add_transpose_product_to(&self.y[..m], 1., &mut self.gradient_part[..nv]);
        for j in 0..m {
            if let Some(slot) = self.slack_slot[j] {
                self.gradient_part[slot] = -self.y[j];
            }
        }
    }

    fn complementarity_average(&self, nw: usize) -> (f64, usize) {
        let mut total = 0.;
        let mut count = 0;
        for i in 0..nw {
            if -INFINITY < self.lower[i] {
                total += self.z_lower[i] * (self.w[i] - self.lower[i]);
                count += 1;
            }
            if self.upper[i] < INFINITY {
                total += -self.z_upper[i] * (self.upper[i] - self.w[i]);
                count += 1;
            }
        }
        if count == 0 {
            (0., 0)
        } else {
            (total / count as f64, count)
        }
    }

    fn assemble_kkt(
        &mut self,
        hessian: Option<&SymmetricCooMatrix>,
        jacobian: &RectangularMatrix,
        nv: usize,
        nw: usize,
        m: usize,
        static_regularization: f64,
    ) {
        self.kkt.reset(nw + m);
        if let Some(hessian) = hessian {
            hessian.for_each(|row, column, value| {
                self.kkt.insert(row, column, value);
            });
        }
        for i in 0..nw {
            let mut diagonal = static_regularization;
            if -INFINITY < self.lower[i] {
                diagonal += self.z_lower[i] / (self.w[i] - self.lower[i]);
            }
            if self.upper[i] < INFINITY {
                diagonal += -self.z_upper[i] / (self.upper[i] - self.w[i]);
            }
            self.kkt.insert(i, i, diagonal);
        }
        for j in 0..m {
            let row = nw + j;
            for (index, value) in jacobian.row(j).iter() {
                self.kkt.insert(row, index, value);
            }
            if let Some(slot) = self.slack_slot[j] {
                self.kkt.insert(row, slot, -1.);
            }
            self.kkt.insert(row, row, -static_regularization);
        }
    }

    fn take_step(&mut self, nw: usize, m: usize, barrier: f64) {
        // recover bound multiplier displacements from perturbed complementarity
        let mut delta_z_lower = vec![0.; nw];
        let mut delta_z_upper = vec![0.; nw];
        for i in 0..nw {
            let dw = self.solution[i];
            if -INFINITY < self.lower[i] {
                let slack = self.w[i] - self.lower[i];
                delta_z_lower[i] =
                    barrier / slack - self.z_lower[i] - self.z_lower[i] * dw / slack;
            }
            if self.upper[i] < INFINITY {
                let slack = self.upper[i] - self.w[i];
                delta_z_upper[i] =
                    -barrier / slack - self.z_upper[i] + self.z_upper[i] * dw / slack;
            }
        }

        // fraction to boundary
        let mut alpha_primal: f64 = 1.;
        let mut alpha_dual: f64 = 1.;
        for i in 0..nw {
            let dw = self.solution[i];
            if -INFINITY < self.lower[i] && dw < 0. {
                alpha_primal =
                    alpha_primal.min(-FRACTION_TO_BOUNDARY * (self.w[i] - self.lower[i]) / dw);
            }
            if self.upper[i] < INFINITY && 0. < dw {
                alpha_primal =
                    alpha_primal.min(FRACTION_TO_BOUNDARY * (self.upper[i] - self.w[i]) / dw);
            }
            if delta_z_lower[i] < 0. && 0. < self.z_lower[i] {
                alpha_dual =
                    alpha_dual.min(-FRACTION_TO_BOUNDARY * self.z_lower[i] / delta_z_lower[i]);
            }
            if 0. < delta_z_upper[i] && self.z_upper[i] < 0. {
                alpha_dual =
                    alpha_dual.min(-FRACTION_TO_BOUNDARY * self.z_upper[i] / delta_z_upper[i]);
            }
        }

        for i in 0..nw {
            self.w[i] += alpha_primal * self.solution[i];
        }
        for j in 0..m {
            self.y[j] += alpha_dual * self.solution[nw + j];
        }
        for i in 0..nw {
            self.z_lower[i] += alpha_dual * delta_z_lower[i];
            self.z_upper[i] += alpha_dual * delta_z_upper[i];

            // keep multipliers within the safeguard box around mu/slack
            if 0. < barrier {
                if -INFINITY < self.lower[i] {
                    let slack = self.w[i] - self.lower[i];
                    let low = barrier / (MULTIPLIER_SAFEGUARD * slack);
                    let high = MULTIPLIER_SAFEGUARD * barrier / slack;
                    self.z_lower[i] = self.z_lower[i].clamp(low, high);
                }
                if self.upper[i] < INFINITY {
                    let slack = self.upper[i] - self.w[i];
                    let low = barrier / (MULTIPLIER_SAFEGUARD * slack);
                    let high = MULTIPLIER_SAFEGUARD * barrier / slack;
                    self.z_upper[i] = self.z_upper[i].clamp(-high, -low);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unbounded_box(n: usize) -> (Vec<f64>, Vec<f64>) {
        (vec![f64::NEG_INFINITY; n], vec![f64::INFINITY; n])
    }

    #[test]
    fn test_unconstrained_qp() {
        // min 1/2 (d0^2 + d1^2) - d0 - 2 d1: solution (1, 2)
        let mut hessian = SymmetricCooMatrix::new(2, 2);
        hessian.insert(0, 0, 1.);
        hessian.insert(1, 1, 1.);
        let gradient = [-1., -2.];
        let jacobian = RectangularMatrix::new(0, 2);
        let (lower, upper) = unbounded_box(2);

        let mut solver = QpSolver::new(2, 0, 1e-10, 100);
        let problem = QpProblem {
            number_variables: 2,
            number_constraints: 0,
            hessian: Some(&hessian),
            linear_objective: &gradient,
            jacobian: &jacobian,
            variable_lower_bounds: &lower,
            variable_upper_bounds: &upper,
            constraint_lower_bounds: &[],
            constraint_upper_bounds: &[],
        };
        let direction = solver.solve_qp(&problem, &[0., 0.], &WarmstartInformation::everything_changed());
        assert_eq!(direction.status, SubproblemStatus::Optimal);
        assert!((direction.primals[0] - 1.).abs() < 1e-6);
        assert!((direction.primals[1] - 2.).abs() < 1e-6);
    }

    #[test]
    fn test_box_constrained_qp() {
        // min 1/2 d^2 - 2 d with d <= 1: solution at the bound d = 1
        let mut hessian = SymmetricCooMatrix::new(1, 1);
        hessian.insert(0, 0, 1.);
        let jacobian = RectangularMatrix::new(0, 1);
        let mut solver = QpSolver::new(1, 0, 1e-10, 100);
        let problem = QpProblem {
            number_variables: 1,
            number_constraints: 0,
            hessian: Some(&hessian),
            linear_objective: &[-2.],
            jacobian: &jacobian,
            variable_lower_bounds: &[f64::NEG_INFINITY],
            variable_upper_bounds: &[1.],
            constraint_lower_bounds: &[],
            constraint_upper_bounds: &[],
        };
        let direction = solver.solve_qp(&problem, &[0.], &WarmstartInformation::everything_changed());
        assert_eq!(direction.status, SubproblemStatus::Optimal);
        assert!((direction.primals[0] - 1.).abs() < 1e-6);
        // at the upper bound, z_U = -(g + Hd) = -(-2 + 1) = ... stationarity:
        // H d + g - z_U = 0 => z_U = d - 2 = -1
        assert!((direction.multipliers.upper_bounds[0] + 1.).abs() < 1e-5);
        assert_eq!(direction.active_set.variables_at_upper_bound, vec![0]);
    }

    #[test]
    fn test_lp_vertex() {
        // min -d0 - d1 s.t. d0 + d1 <= 1, d >= 0: optimum value -1 on the
        // vertex edge
        let mut jacobian = RectangularMatrix::new(1, 2);
        jacobian.row_mut(0).insert(0, 1.);
        jacobian.row_mut(0).insert(1, 1.);
        let mut solver = QpSolver::new(2, 1, 1e-10, 100);
        let problem = QpProblem {
            number_variables: 2,
            number_constraints: 1,
            hessian: None,
            linear_objective: &[-1., -1.],
            jacobian: &jacobian,
            variable_lower_bounds: &[0., 0.],
            variable_upper_bounds: &[f64::INFINITY, f64::INFINITY],
            constraint_lower_bounds: &[f64::NEG_INFINITY],
            constraint_upper_bounds: &[1.],
        };
        let direction = solver.solve_lp(&problem, &[0., 0.], &WarmstartInformation::everything_changed());
        assert_eq!(direction.status, SubproblemStatus::Optimal);
        assert!((direction.subproblem_objective + 1.).abs() < 1e-6);
        assert!((direction.primals[0] + direction.primals[1] - 1.).abs() < 1e-6);
    }

    #[test]
    fn test_equality_constrained_qp() {
        // min 1/2 ||d||^2 s.t. d0 + d1 = 1: solution (0.5, 0.5)
        let mut hessian = SymmetricCooMatrix::new(2, 2);
        hessian.insert(0, 0, 1.);
        hessian.insert(1, 1, 1.);
        let mut jacobian = RectangularMatrix::new(1, 2);
        jacobian.row_mut(0).insert(0, 1.);
        jacobian.row_mut(0).insert(1, 1.);
        let (lower, upper) = unbounded_box(2);
        let mut solver = QpSolver::new(2, 1, 1e-10, 100);
        let problem = QpProblem {
            number_variables: 2,
            number_constraints: 1,
            hessian: Some(&hessian),
            linear_objective: &[0., 0.],
            jacobian: &jacobian,
            variable_lower_bounds: &lower,
            variable_upper_bounds: &upper,
            constraint_lower_bounds: &[1.],
            constraint_upper_bounds: &[1.],
        };
        let direction = solver.solve_qp(&problem, &[0., 0.], &WarmstartInformation::everything_changed());
        assert_eq!(direction.status, SubproblemStatus::Optimal);
        assert!((direction.primals[0] - 0.5).abs() < 1e-6);
        assert!((direction.primals[1] - 0.5).abs() < 1e-6);
        // H d + lambda a = 0 => lambda = -0.5
        assert!((direction.multipliers.constraints[0] + 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_infeasible_constraints_return_min_l1_direction() {
        // d = 1 and d = 2 cannot both hold; the minimum-l1 point is any
        // d in [1, 2] with total violation 1
        let mut jacobian = RectangularMatrix::new(2, 1);
        jacobian.row_mut(0).insert(0, 1.);
        jacobian.row_mut(1).insert(0, 1.);
        let (lower, upper) = unbounded_box(1);
        let mut solver = QpSolver::new(1, 2, 1e-10, 100);
        let problem = QpProblem {
            number_variables: 1,
            number_constraints: 2,
            hessian: None,
            linear_objective: &[0.],
            jacobian: &jacobian,
            variable_lower_bounds: &lower,
            variable_upper_bounds: &upper,
            constraint_lower_bounds: &[1., 2.],
            constraint_upper_bounds: &[1., 2.],
        };
        let direction = solver.solve_lp(&problem, &[0.], &WarmstartInformation::everything_changed());
        assert_eq!(direction.status, SubproblemStatus::Infeasible);
        let partition = direction.constraint_partition.as_ref().unwrap();
        assert!(!partition.infeasible.is_empty());
        assert!(1. - 1e-6 <= direction.primals[0] && direction.primals[0] <= 2. + 1e-6);
    }
}
