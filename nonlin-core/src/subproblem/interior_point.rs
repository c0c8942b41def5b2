//! Primal-dual interior-point subproblem.
//!
//! Inequality constraints get slack variables so every general constraint is
//! an equality with bound constraints; the barrier treats all bounds. Each
//! call assembles the primal-dual KKT system
//!
//! ```text
//! [ W + Sigma_x + delta_w I     J^T        ]
//! [ J                          -delta_c I  ]
//! ```
//!
//! corrects its inertia to exactly (n, m, 0) by raising delta_w (and
//! delta_c when zero pivots appear), solves for the primal and constraint
//! multiplier displacements, recovers the bound multiplier displacements
//! from perturbed complementarity, and caps the step lengths with the
//! fraction-to-boundary rule. The barrier parameter is driven to zero once
//! the scaled KKT error at the current mu is small enough.

use crate::direction::{Direction, SubproblemStatus, WarmstartInformation};
use crate::error::{EvaluationError, SolverError};
use crate::iterate::Iterate;
use crate::linalg::coo::SymmetricCooMatrix;
use crate::linalg::rectangular::RectangularMatrix;
use crate::linalg::vector::norm_inf;
use crate::model::{push_to_interior, INFINITY};
use crate::options::Options;
use crate::reformulation::OptimizationProblem;
use crate::solvers::ldl_solver::LdlSolver;
use crate::subproblem::{PredictedReductionModel, Subproblem};

/// Barrier strategy constants (see the `tau_min` .. `kappa` options).
struct BarrierParameters {
    tau_min: f64,
    k_sigma: f64,
    s_max: f64,
    k_mu: f64,
    theta_mu: f64,
    k_epsilon: f64,
    /// fraction used to push points strictly inside their bounds
    kappa: f64,
}

/// Inertia correction constants.
struct RegularizationParameters {
    initial_value: f64,
    increase_first_factor: f64,
    increase_factor: f64,
    decrease_factor: f64,
    constraint_scaling: f64,
    constraint_exponent: f64,
}

const UNSTABLE_REGULARIZATION: f64 = 1e40;
const DEFAULT_BOUND_MULTIPLIER: f64 = 1.;

/// Distance to a bound, floored away from zero so that barrier quotients
/// stay finite on degenerate (fixed) intervals.
#[inline]
fn floored(distance: f64, bound: f64) -> f64 {
    distance.max(1e-12 * bound.abs().max(1.))
}

pub struct InteriorPointSubproblem {
    barrier_parameter: f64,
    tolerance: f64,
    parameters: BarrierParameters,
    regularization: RegularizationParameters,
    linear_solver: LdlSolver,

    // local model storage
    gradient: Vec<f64>,
    constraints: Vec<f64>,
    jacobian: RectangularMatrix,
    hessian: SymmetricCooMatrix,
    kkt_matrix: SymmetricCooMatrix,

    // preallocated solve buffers
    rhs: Vec<f64>,
    solution: Vec<f64>,
    lower_delta_z: Vec<f64>,
    upper_delta_z: Vec<f64>,

    // slack state of the inequality constraints (owned by the subproblem)
    slack_slot: Vec<Option<usize>>,
    slacks: Vec<f64>,
    slack_lower_multipliers: Vec<f64>,
    slack_upper_multipliers: Vec<f64>,
    slack_direction: Vec<f64>,
    slack_lower_delta: Vec<f64>,
    slack_upper_delta: Vec<f64>,
    last_bound_dual_step_length: f64,

    primal_regularization_last: f64,
    first_correction_done: bool,
    trust_region_radius: Option<f64>,
    definition_changed: bool,
    number_subproblems_solved: usize,
    directional_derivative: f64,
}

impl InteriorPointSubproblem {
    pub fn new(
        options: &Options,
        max_variables: usize,
        number_constraints: usize,
    ) -> Result<Self, SolverError> {
        let kkt_max = max_variables + 2 * number_constraints;
        Ok(Self {
            barrier_parameter: options.get_double("barrier_initial_parameter")?,
            tolerance: options.get_double("tolerance")?,
            parameters: BarrierParameters {
                tau_min: options.get_double("tau_min")?,
                k_sigma: options.get_double("k_sigma")?,
                s_max: options.get_double("s_max")?,
                k_mu: options.get_double("k_mu")?,
                theta_mu: options.get_double("theta_mu")?,
                k_epsilon: options.get_double("k_epsilon")?,
                kappa: options.get_double("kappa")?,
            },
            regularization: RegularizationParameters {
                initial_value: options.get_double("regularization_initial_value")?,
                increase_first_factor: options.get_double("regularization_increase_first_factor")?,
                increase_factor: options.get_double("regularization_increase_factor")?,
                decrease_factor: options.get_double("regularization_decrease_factor")?,
                constraint_scaling: options.get_double("regularization_constraint_scaling")?,
                constraint_exponent: options.get_double("regularization_constraint_exponent")?,
            },
            linear_solver: crate::solvers::create_symmetric_indefinite_solver(options, kkt_max)?,
            gradient: vec![0.; max_variables],
            constraints: vec![0.; number_constraints],
            jacobian: RectangularMatrix::new(number_constraints, max_variables),
            hessian: SymmetricCooMatrix::new(max_variables, 0),
            kkt_matrix: SymmetricCooMatrix::new(kkt_max, 0),
            rhs: vec![0.; kkt_max],
            solution: vec![0.; kkt_max],
            lower_delta_z: vec![0.; max_variables],
            upper_delta_z: vec![0.; max_variables],
            slack_slot: vec![None; number_constraints],
            slacks: vec![0.; number_constraints],
            slack_lower_multipliers: vec![DEFAULT_BOUND_MULTIPLIER; number_constraints],
            slack_upper_multipliers: vec![-DEFAULT_BOUND_MULTIPLIER; number_constraints],
            slack_direction: vec![0.; number_constraints],
            slack_lower_delta: vec![0.; number_constraints],
            slack_upper_delta: vec![0.; number_constraints],
            last_bound_dual_step_length: 1.,
            primal_regularization_last: 0.,
            first_correction_done: false,
            trust_region_radius: None,
            definition_changed: false,
            number_subproblems_solved: 0,
            directional_derivative: 0.,
        })
    }

    /// Number of slacked (non-equality) constraints and the slot layout.
    fn refresh_slack_layout(&mut self, problem: &dyn OptimizationProblem) -> usize {
        let m = problem.number_constraints();
        let mut number_slacks = 0;
        for j in 0..m {
            let equality = problem.constraint_lower_bound(j) == problem.constraint_upper_bound(j);
            self.slack_slot[j] = if equality {
                None
            } else {
                number_slacks += 1;
                Some(number_slacks - 1)
            };
        }
        number_slacks
    }

    /// Interior margin used when projecting slacks: proportional to the
    /// barrier parameter, so that active constraints can close the gap
    /// between c(x) and the slack as mu goes to zero.
    fn slack_interior_fraction(&self) -> f64 {
        self.parameters.kappa * self.barrier_parameter.min(1.)
    }

    /// Reset the slacks to the constraint values, projected strictly inside
    /// the constraint bounds.
    fn reset_slacks(&mut self, problem: &dyn OptimizationProblem) {
        let fraction = self.slack_interior_fraction();
        for j in 0..problem.number_constraints() {
            if let Some(slot) = self.slack_slot[j] {
                self.slacks[slot] = push_to_interior(
                    self.constraints[j],
                    problem.constraint_lower_bound(j),
                    problem.constraint_upper_bound(j),
                    fraction,
                );
            }
        }
    }

    fn evaluate_local_model(
        &mut self,
        problem: &dyn OptimizationProblem,
        iterate: &mut Iterate,
    ) -> Result<(), EvaluationError> {
        let m = problem.number_constraints();
        let nv = problem.number_variables();
        problem.evaluate_objective_gradient(iterate, &mut self.gradient)?;
        problem.evaluate_constraints(iterate, &mut self.constraints[..m])?;
        self.jacobian = RectangularMatrix::new(m, nv);
        problem.evaluate_constraint_jacobian(iterate, &mut self.jacobian)?;
        let multipliers = iterate.multipliers.constraints.clone();
        problem.evaluate_lagrangian_hessian(iterate, &multipliers, &mut self.hessian)?;
        Ok(())
    }

    /// Scaled KKT error of the barrier problem at the given mu: the maximum
    /// of stationarity, complementarity and primal infeasibility, divided by
    /// the s_max-capped multiplier scalings.
    fn scaled_kkt_error(
        &self,
        problem: &dyn OptimizationProblem,
        iterate: &Iterate,
        mu: f64,
    ) -> f64 {
        let nv = problem.number_variables();
        let m = problem.number_constraints();

        // stationarity over variables and slacks
        let mut stationarity: f64 = 0.;
        let mut residual = self.gradient[..nv].to_vec();
        self.jacobian
            .add_transpose_product_to(&iterate.multipliers.constraints, 1., &mut residual);
        for i in 0..nv {
            residual[i] -=
                iterate.multipliers.lower_bounds[i] + iterate.multipliers.upper_bounds[i];
            stationarity = stationarity.max(residual[i].abs());
        }
        for j in 0..m {
            if let Some(slot) = self.slack_slot[j] {
                let slack_residual = -iterate.multipliers.constraints[j]
                    - self.slack_lower_multipliers[slot]
                    - self.slack_upper_multipliers[slot];
                stationarity = stationarity.max(slack_residual.abs());
            }
        }

        // shifted complementarity and primal residual
        let mut complementarity: f64 = 0.;
        let mut multiplier_mass = 0.;
        let mut bound_multiplier_mass = 0.;
        let mut bound_count = 0usize;
        for i in 0..nv {
            let lb = problem.variable_lower_bound(i);
            let ub = problem.variable_upper_bound(i);
            if -INFINITY < lb {
                let product =
                    iterate.multipliers.lower_bounds[i] * (iterate.primals[i] - lb) - mu;
                complementarity = complementarity.max(product.abs());
                bound_multiplier_mass += iterate.multipliers.lower_bounds[i].abs();
                bound_count += 1;
            }
            if ub < INFINITY {
                let product =
                    iterate.multipliers.upper_bounds[i] * (iterate.primals[i] - ub) - mu;
                complementarity = complementarity.max(product.abs());
                bound_multiplier_mass += iterate.multipliers.upper_bounds[i].abs();
                bound_count += 1;
            }
        }
        let mut primal: f64 = 0.;
        for j in 0..m {
            multiplier_mass += iterate.multipliers.constraints[j].abs();
            match self.slack_slot[j] {
                Some(slot) => {
                    let lb = problem.constraint_lower_bound(j);
                    let ub = problem.constraint_upper_bound(j);
                    if -INFINITY < lb {
                        let product = self.slack_lower_multipliers[slot]
                            * (self.slacks[slot] - lb)
                            - mu;
                        complementarity = complementarity.max(product.abs());
                        bound_multiplier_mass += self.slack_lower_multipliers[slot].abs();
                        bound_count += 1;
                    }
                    if ub < INFINITY {
                        let product = self.slack_upper_multipliers[slot]
                            * (self.slacks[slot] - ub)
                            - mu;
                        complementarity = complementarity.max(product.abs());
                        bound_multiplier_mass += self.slack_upper_multipliers[slot].abs();
                        bound_count += 1;
                    }
                    primal = primal.max((self.constraints[j] - self.slacks[slot]).abs());
                }
                None => {
                    primal =
                        primal.max((self.constraints[j] - problem.constraint_lower_bound(j)).abs());
                }
            }
        }

        let s_max = self.parameters.s_max;
        let total_count = (nv + m).max(1);
        let s_d = s_max.max((multiplier_mass + bound_multiplier_mass) / total_count as f64) / s_max;
        let s_c = s_max.max(bound_multiplier_mass / bound_count.max(1) as f64) / s_max;
        (stationarity / s_d).max(complementarity / s_c).max(primal)
    }

    /// Reduce mu while the barrier KKT error is already below k_epsilon * mu.
    fn update_barrier_parameter(&mut self, problem: &dyn OptimizationProblem, iterate: &Iterate) {
        let floor = self.tolerance / 10.;
        while floor < self.barrier_parameter {
            let error = self.scaled_kkt_error(problem, iterate, self.barrier_parameter);
            if self.parameters.k_epsilon * self.barrier_parameter < error {
                break;
            }
            let mu = self.barrier_parameter;
            self.barrier_parameter = floor.max(
                (self.parameters.k_mu * mu).min(mu.powf(self.parameters.theta_mu)),
            );
            // the local model changed: progress measures must be rebuilt and
            // the acceptance strategy reset
            self.definition_changed = true;
            if self.barrier_parameter == mu {
                break;
            }
        }
    }

    fn assemble_kkt_matrix(
        &mut self,
        problem: &dyn OptimizationProblem,
        iterate: &Iterate,
        number_slacks: usize,
        primal_regularization: f64,
        dual_regularization: f64,
    ) {
        let nv = problem.number_variables();
        let m = problem.number_constraints();
        let dimension = nv + number_slacks + m;
        self.kkt_matrix.reset(dimension);

        // W block
        self.hessian.for_each(|row, column, value| {
            self.kkt_matrix.insert(row, column, value);
        });
        // barrier diagonal, always stored so the pattern survives
        // regularization changes
        for i in 0..nv {
            let mut diagonal = primal_regularization;
            let lb = problem.variable_lower_bound(i);
            let ub = problem.variable_upper_bound(i);
            if -INFINITY < lb {
                diagonal +=
                    iterate.multipliers.lower_bounds[i] / floored(iterate.primals[i] - lb, lb);
            }
            if ub < INFINITY {
                diagonal +=
                    -iterate.multipliers.upper_bounds[i] / floored(ub - iterate.primals[i], ub);
            }
            self.kkt_matrix.insert(i, i, diagonal);
        }
        for j in 0..m {
            if let Some(slot) = self.slack_slot[j] {
                let mut diagonal = primal_regularization;
                let lb = problem.constraint_lower_bound(j);
                let ub = problem.constraint_upper_bound(j);
                if -INFINITY < lb {
                    diagonal +=
                        self.slack_lower_multipliers[slot] / floored(self.slacks[slot] - lb, lb);
                }
                if ub < INFINITY {
                    diagonal +=
                        -self.slack_upper_multipliers[slot] / floored(ub - self.slacks[slot], ub);
                }
                self.kkt_matrix.insert(nv + slot, nv + slot, diagonal);
            }
        }
        // constraint rows
        for j in 0..m {
            let row = nv + number_slacks + j;
            for (index, value) in self.jacobian.row(j).iter() {
                self.kkt_matrix.insert(row, index, value);
            }
            if let Some(slot) = self.slack_slot[j] {
                self.kkt_matrix.insert(row, nv + slot, -1.);
            }
            self.kkt_matrix.insert(row, row, -dual_regularization);
        }
    }

    /// Factorize with inertia exactly (n, m, 0), raising delta_w (and
    /// delta_c on zero eigenvalues) until the factorization is usable.
    fn factorize_with_inertia_correction(
        &mut self,
        problem: &dyn OptimizationProblem,
        iterate: &Iterate,
        number_slacks: usize,
    ) -> Result<(), SolverError> {
        let nv = problem.number_variables();
        let m = problem.number_constraints();
        let expected = (nv + number_slacks, m, 0);

        let mut primal_regularization = 0.;
        let mut dual_regularization = 0.;
        loop {
            self.assemble_kkt_matrix(
                problem,
                iterate,
                number_slacks,
                primal_regularization,
                dual_regularization,
            );
            self.linear_solver
                .factorize(&self.kkt_matrix)
                .map_err(|_| SolverError::Internal("KKT factorization failed".to_string()))?;

            let inertia = self.linear_solver.inertia();
            if !self.linear_solver.is_singular() && inertia == expected {
                if 0. < primal_regularization {
                    self.primal_regularization_last = primal_regularization;
                    self.first_correction_done = true;
                }
                return Ok(());
            }

            // zero eigenvalues indicate a rank-deficient constraint block
            if (self.linear_solver.is_singular() || 0 < inertia.2) && dual_regularization == 0. {
                dual_regularization = self.regularization.constraint_scaling
                    * self.barrier_parameter.powf(self.regularization.constraint_exponent);
            }

            if primal_regularization == 0. {
                primal_regularization = if self.primal_regularization_last == 0. {
                    self.regularization.initial_value
                } else {
                    self.primal_regularization_last / self.regularization.decrease_factor
                };
            } else {
                let growth = if self.first_correction_done {
                    self.regularization.increase_factor
                } else {
                    self.regularization.increase_first_factor
                };
                primal_regularization *= growth;
            }
            if UNSTABLE_REGULARIZATION < primal_regularization {
                return Err(SolverError::UnstableInertiaCorrection);
            }
        }
    }

    fn generate_kkt_rhs(
        &mut self,
        problem: &dyn OptimizationProblem,
        iterate: &Iterate,
        number_slacks: usize,
    ) {
        let nv = problem.number_variables();
        let m = problem.number_constraints();
        let mu = self.barrier_parameter;

        for i in 0..nv {
            let mut value = -self.gradient[i];
            let lb = problem.variable_lower_bound(i);
            let ub = problem.variable_upper_bound(i);
            if -INFINITY < lb {
                value += mu / floored(iterate.primals[i] - lb, lb);
            }
            if ub < INFINITY {
                value -= mu / floored(ub - iterate.primals[i], ub);
            }
            self.rhs[i] = value;
        }
        // subtract J^T lambda
        for j in 0..m {
            let multiplier = iterate.multipliers.constraints[j];
            if multiplier != 0. {
                for (index, value) in self.jacobian.row(j).iter() {
                    self.rhs[index] -= multiplier * value;
                }
            }
        }
        for j in 0..m {
            if let Some(slot) = self.slack_slot[j] {
                let mut value = iterate.multipliers.constraints[j];
                let lb = problem.constraint_lower_bound(j);
                let ub = problem.constraint_upper_bound(j);
                if -INFINITY < lb {
                    value += mu / floored(self.slacks[slot] - lb, lb);
                }
                if ub < INFINITY {
                    value -= mu / floored(ub - self.slacks[slot], ub);
                }
                self.rhs[nv + slot] = value;
            }
        }
        for j in 0..m {
            let row = nv + number_slacks + j;
            self.rhs[row] = match self.slack_slot[j] {
                Some(slot) => -(self.constraints[j] - self.slacks[slot]),
                None => -(self.constraints[j] - problem.constraint_lower_bound(j)),
            };
        }
    }

    /// Delta z from perturbed complementarity, for variables and slacks.
    fn compute_bound_dual_displacements(
        &mut self,
        problem: &dyn OptimizationProblem,
        iterate: &Iterate,
    ) {
        let nv = problem.number_variables();
        let mu = self.barrier_parameter;
        for i in 0..nv {
            let dx = self.solution[i];
            let lb = problem.variable_lower_bound(i);
            let ub = problem.variable_upper_bound(i);
            self.lower_delta_z[i] = if -INFINITY < lb {
                let distance = floored(iterate.primals[i] - lb, lb);
                let multiplier = iterate.multipliers.lower_bounds[i];
                mu / distance - multiplier - multiplier * dx / distance
            } else {
                0.
            };
            self.upper_delta_z[i] = if ub < INFINITY {
                let distance = floored(ub - iterate.primals[i], ub);
                let multiplier = iterate.multipliers.upper_bounds[i];
                -mu / distance - multiplier + multiplier * dx / distance
            } else {
                0.
            };
        }
        for j in 0..problem.number_constraints() {
            if let Some(slot) = self.slack_slot[j] {
                let ds = self.slack_direction[slot];
                let lb = problem.constraint_lower_bound(j);
                let ub = problem.constraint_upper_bound(j);
                self.slack_lower_delta[slot] = if -INFINITY < lb {
                    let distance = floored(self.slacks[slot] - lb, lb);
                    let multiplier = self.slack_lower_multipliers[slot];
                    mu / distance - multiplier - multiplier * ds / distance
                } else {
                    0.
                };
                self.slack_upper_delta[slot] = if ub < INFINITY {
                    let distance = floored(ub - self.slacks[slot], ub);
                    let multiplier = self.slack_upper_multipliers[slot];
                    -mu / distance - multiplier + multiplier * ds / distance
                } else {
                    0.
                };
            }
        }
    }

    /// Largest primal step keeping variables and slacks a fraction tau
    /// inside their bounds (intersected with the trust region if one is set).
    fn primal_fraction_to_boundary(
        &self,
        problem: &dyn OptimizationProblem,
        iterate: &Iterate,
        tau: f64,
    ) -> f64 {
        let nv = problem.number_variables();
        let radius = self.trust_region_radius.unwrap_or(f64::INFINITY);
        let mut alpha: f64 = 1.;
        for i in 0..nv {
            let dx = self.solution[i];
            let lb = problem.variable_lower_bound(i).max(iterate.primals[i] - radius);
            let ub = problem.variable_upper_bound(i).min(iterate.primals[i] + radius);
            if dx < 0. && -INFINITY < lb {
                alpha = alpha.min(-tau * (iterate.primals[i] - lb) / dx);
            }
            if 0. < dx && ub < INFINITY {
                alpha = alpha.min(tau * (ub - iterate.primals[i]) / dx);
            }
        }
        for j in 0..problem.number_constraints() {
            if let Some(slot) = self.slack_slot[j] {
                let ds = self.slack_direction[slot];
                let lb = problem.constraint_lower_bound(j);
                let ub = problem.constraint_upper_bound(j);
                if ds < 0. && -INFINITY < lb {
                    alpha = alpha.min(-tau * (self.slacks[slot] - lb) / ds);
                }
                if 0. < ds && ub < INFINITY {
                    alpha = alpha.min(tau * (ub - self.slacks[slot]) / ds);
                }
            }
        }
        alpha
    }

    /// Largest dual step keeping every bound multiplier strictly on its side
    /// of zero.
    fn dual_fraction_to_boundary(
        &self,
        problem: &dyn OptimizationProblem,
        iterate: &Iterate,
        tau: f64,
    ) -> f64 {
        let nv = problem.number_variables();
        let number_slacks = self.slack_slot.iter().flatten().count();
        let mut alpha: f64 = 1.;
        for i in 0..nv {
            let multiplier = iterate.multipliers.lower_bounds[i];
            let delta = self.lower_delta_z[i];
            if delta < 0. && 0. < multiplier {
                alpha = alpha.min(-tau * multiplier / delta);
            }
            let multiplier = iterate.multipliers.upper_bounds[i];
            let delta = self.upper_delta_z[i];
            if 0. < delta && multiplier < 0. {
                alpha = alpha.min(-tau * multiplier / delta);
            }
        }
        for slot in 0..number_slacks {
            let multiplier = self.slack_lower_multipliers[slot];
            let delta = self.slack_lower_delta[slot];
            if delta < 0. && 0. < multiplier {
                alpha = alpha.min(-tau * multiplier / delta);
            }
            let multiplier = self.slack_upper_multipliers[slot];
            let delta = self.slack_upper_delta[slot];
            if 0. < delta && multiplier < 0. {
                alpha = alpha.min(-tau * multiplier / delta);
            }
        }
        alpha
    }

    /// Directional derivative of the barrier function along the computed
    /// primal (and slack) direction.
    fn barrier_directional_derivative(
        &self,
        problem: &dyn OptimizationProblem,
        iterate: &Iterate,
    ) -> f64 {
        let nv = problem.number_variables();
        let mu = self.barrier_parameter;
        let mut derivative = 0.;
        for i in 0..nv {
            let mut gradient = self.gradient[i];
            let lb = problem.variable_lower_bound(i);
            let ub = problem.variable_upper_bound(i);
            if -INFINITY < lb {
                gradient -= mu / floored(iterate.primals[i] - lb, lb);
            }
            if ub < INFINITY {
                gradient += mu / floored(ub - iterate.primals[i], ub);
            }
            derivative += gradient * self.solution[i];
        }
        for j in 0..problem.number_constraints() {
            if let Some(slot) = self.slack_slot[j] {
                let mut gradient = 0.;
                let lb = problem.constraint_lower_bound(j);
                let ub = problem.constraint_upper_bound(j);
                if -INFINITY < lb {
                    gradient -= mu / floored(self.slacks[slot] - lb, lb);
                }
                if ub < INFINITY {
                    gradient += mu / floored(ub - self.slacks[slot], ub);
                }
                derivative += gradient * self.slack_direction[slot];
            }
        }
        derivative
    }

    /// Project a bound multiplier into the safeguard interval
    /// `[mu / (k_sigma * distance), k_sigma * mu / distance]`.
    fn safeguard_multiplier(multiplier: f64, distance: f64, mu: f64, k_sigma: f64, sign: f64) -> f64 {
        if distance <= 0. || mu <= 0. {
            return multiplier;
        }
        let low = mu / (k_sigma * distance);
        let high = k_sigma * mu / distance;
        sign * (sign * multiplier).clamp(low, high)
    }

    /// Make sure every finite bound carries a strictly signed multiplier and
    /// that the primal point is strictly interior. Needed after a phase
    /// switch extends the iterate with fresh (zero) elastics.
    fn normalize_iterate(&self, problem: &dyn OptimizationProblem, iterate: &mut Iterate) {
        let nv = problem.number_variables();
        let fraction = self.slack_interior_fraction();
        let mut moved = false;
        for i in 0..nv {
            let lb = problem.variable_lower_bound(i);
            let ub = problem.variable_upper_bound(i);
            if -INFINITY < lb {
                if iterate.primals[i] - lb <= 0. {
                    iterate.primals[i] = push_to_interior(iterate.primals[i], lb, ub, fraction);
                    moved = true;
                }
                if iterate.multipliers.lower_bounds[i] <= 0. {
                    iterate.multipliers.lower_bounds[i] = DEFAULT_BOUND_MULTIPLIER;
                }
            } else {
                iterate.multipliers.lower_bounds[i] = 0.;
            }
            if ub < INFINITY {
                if ub - iterate.primals[i] <= 0. {
                    iterate.primals[i] = push_to_interior(iterate.primals[i], lb, ub, fraction);
                    moved = true;
                }
                if 0. <= iterate.multipliers.upper_bounds[i] {
                    iterate.multipliers.upper_bounds[i] = -DEFAULT_BOUND_MULTIPLIER;
                }
            } else {
                iterate.multipliers.upper_bounds[i] = 0.;
            }
        }
        if moved {
            // invalidate only the cached evaluations; the progress measures
            // of the current iterate stay valid for the acceptance test
            iterate.evaluations.is_objective_computed = false;
            iterate.evaluations.are_constraints_computed = false;
            iterate.evaluations.is_objective_gradient_computed = false;
            iterate.evaluations.is_constraint_jacobian_computed = false;
        }
    }
}

impl Subproblem for InteriorPointSubproblem {
    fn initialize(
        &mut self,
        problem: &dyn OptimizationProblem,
        first_iterate: &mut Iterate,
    ) -> Result<(), SolverError> {
        let nv = problem.number_variables();
        for i in 0..nv {
            first_iterate.primals[i] = push_to_interior(
                first_iterate.primals[i],
                problem.variable_lower_bound(i),
                problem.variable_upper_bound(i),
                self.parameters.kappa,
            );
        }
        first_iterate.reset_evaluations();
        self.normalize_iterate(problem, first_iterate);

        self.refresh_slack_layout(problem);
        let m = problem.number_constraints();
        problem
            .evaluate_constraints(first_iterate, &mut self.constraints[..m])
            .map_err(|_| SolverError::Internal("evaluation failed at the initial point".to_string()))?;
        self.reset_slacks(problem);
        for slot in 0..m {
            self.slack_lower_multipliers[slot] = DEFAULT_BOUND_MULTIPLIER;
            self.slack_upper_multipliers[slot] = -DEFAULT_BOUND_MULTIPLIER;
        }
        Ok(())
    }

    fn solve(
        &mut self,
        problem: &dyn OptimizationProblem,
        current_iterate: &mut Iterate,
        _warmstart: &WarmstartInformation,
    ) -> Result<Direction, SolverError> {
        let nv = problem.number_variables();
        let m = problem.number_constraints();
        let number_slacks = self.refresh_slack_layout(problem);
        self.normalize_iterate(problem, current_iterate);
        self.evaluate_local_model(problem, current_iterate)
            .map_err(|_| SolverError::Internal("evaluation failed at an accepted iterate".to_string()))?;
        self.reset_slacks(problem);
        self.update_barrier_parameter(problem, current_iterate);

        self.factorize_with_inertia_correction(problem, current_iterate, number_slacks)?;
        self.generate_kkt_rhs(problem, current_iterate, number_slacks);
        let dimension = nv + number_slacks + m;
        self.linear_solver
            .solve(
                &self.kkt_matrix,
                &self.rhs[..dimension],
                &mut self.solution[..dimension],
            )
            .map_err(|_| SolverError::Internal("KKT solve failed".to_string()))?;
        for j in 0..m {
            if let Some(slot) = self.slack_slot[j] {
                self.slack_direction[slot] = self.solution[nv + slot];
            }
        }
        self.compute_bound_dual_displacements(problem, current_iterate);

        let tau = self.parameters.tau_min.max(1. - self.barrier_parameter);
        let alpha_primal = self.primal_fraction_to_boundary(problem, current_iterate, tau);
        let alpha_dual = self.dual_fraction_to_boundary(problem, current_iterate, tau);
        self.last_bound_dual_step_length = alpha_dual;
        self.directional_derivative = self.barrier_directional_derivative(problem, current_iterate);
        self.number_subproblems_solved += 1;

        let mut direction = Direction::new(nv, m);
        direction.primals.copy_from_slice(&self.solution[..nv]);
        for j in 0..m {
            direction.multipliers.constraints[j] = self.solution[nv + number_slacks + j];
        }
        direction.multipliers.lower_bounds.copy_from_slice(&self.lower_delta_z[..nv]);
        direction.multipliers.upper_bounds.copy_from_slice(&self.upper_delta_z[..nv]);
        direction.status = SubproblemStatus::Optimal;
        direction.norm = norm_inf(&direction.primals);
        direction.subproblem_objective = self.directional_derivative;
        direction.objective_multiplier = problem.objective_multiplier();
        direction.primal_step_length_limit = alpha_primal;
        direction.bound_dual_step_length = alpha_dual;
        Ok(direction)
    }

    fn set_initial_point(&mut self, _point: Option<&[f64]>) {
        // the barrier iteration always starts from the current iterate
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
        let number_slacks = self.slack_slot.iter().flatten().count();
        let dimension = nv + number_slacks + m;

        problem
            .evaluate_constraints(trial_iterate, &mut self.constraints[..m])
            .map_err(|_| SolverError::Internal("evaluation failed during correction".to_string()))?;

        // same factorization, corrected constraint right-hand side
        self.rhs[..nv + number_slacks].fill(0.);
        for j in 0..m {
            let row = nv + number_slacks + j;
            self.rhs[row] = match self.slack_slot[j] {
                Some(slot) => -(self.constraints[j] - self.slacks[slot]),
                None => -(self.constraints[j] - problem.constraint_lower_bound(j)),
            };
        }
        self.linear_solver
            .solve(
                &self.kkt_matrix,
                &self.rhs[..dimension],
                &mut self.solution[..dimension],
            )
            .map_err(|_| SolverError::Internal("KKT solve failed".to_string()))?;
        for j in 0..m {
            if let Some(slot) = self.slack_slot[j] {
                self.slack_direction[slot] = self.solution[nv + slot];
            }
        }
        self.compute_bound_dual_displacements(problem, trial_iterate);

        let tau = self.parameters.tau_min.max(1. - self.barrier_parameter);
        let alpha_primal = self.primal_fraction_to_boundary(problem, trial_iterate, tau);
        let alpha_dual = self.dual_fraction_to_boundary(problem, trial_iterate, tau);

        let mut correction = Direction::new(nv, m);
        correction.primals.copy_from_slice(&self.solution[..nv]);
        for j in 0..m {
            correction.multipliers.constraints[j] = self.solution[nv + number_slacks + j];
        }
        correction.multipliers.lower_bounds.copy_from_slice(&self.lower_delta_z[..nv]);
        correction.multipliers.upper_bounds.copy_from_slice(&self.upper_delta_z[..nv]);
        correction.status = SubproblemStatus::Optimal;
        correction.norm = norm_inf(&correction.primals);
        correction.objective_multiplier = problem.objective_multiplier();
        correction.primal_step_length_limit = alpha_primal;
        correction.bound_dual_step_length = alpha_dual;
        Ok(correction)
    }

    fn generate_predicted_reduction_model(
        &self,
        _problem: &dyn OptimizationProblem,
        _direction: &Direction,
    ) -> PredictedReductionModel {
        PredictedReductionModel::Barrier {
            directional_derivative: self.directional_derivative,
        }
    }

    /// Optimality measure of the barrier subproblem: the objective plus the
    /// log-barrier terms of the variable and constraint bounds, with the
    /// constraint slacks taken at their reset values.
    fn compute_optimality_measure(
        &mut self,
        problem: &dyn OptimizationProblem,
        iterate: &mut Iterate,
    ) -> Result<f64, EvaluationError> {
        let nv = problem.number_variables();
        let m = problem.number_constraints();
        let mu = self.barrier_parameter;
        let mut measure = problem.evaluate_objective(iterate)?;

        for i in 0..nv {
            let lb = problem.variable_lower_bound(i);
            let ub = problem.variable_upper_bound(i);
            if -INFINITY < lb {
                measure -= mu * floored(iterate.primals[i] - lb, lb).ln();
            }
            if ub < INFINITY {
                measure -= mu * floored(ub - iterate.primals[i], ub).ln();
            }
        }

        let mut constraints = vec![0.; m];
        problem.evaluate_constraints(iterate, &mut constraints)?;
        let fraction = self.slack_interior_fraction();
        for j in 0..m {
            if self.slack_slot[j].is_some() {
                let lb = problem.constraint_lower_bound(j);
                let ub = problem.constraint_upper_bound(j);
                let slack = push_to_interior(constraints[j], lb, ub, fraction);
                if -INFINITY < lb {
                    measure -= mu * floored(slack - lb, lb).ln();
                }
                if ub < INFINITY {
                    measure -= mu * floored(ub - slack, ub).ln();
                }
            }
        }
        Ok(measure)
    }

    fn postprocess_accepted_iterate(
        &mut self,
        problem: &dyn OptimizationProblem,
        iterate: &mut Iterate,
    ) {
        let nv = problem.number_variables();
        let m = problem.number_constraints();
        let mu = self.barrier_parameter;
        let k_sigma = self.parameters.k_sigma;
        let alpha = self.last_bound_dual_step_length;

        // advance the subproblem-owned slack multipliers by the full dual step
        for slot in 0..self.slack_slot.iter().flatten().count() {
            self.slack_lower_multipliers[slot] += alpha * self.slack_lower_delta[slot];
            self.slack_upper_multipliers[slot] += alpha * self.slack_upper_delta[slot];
        }

        // multiplier safeguard around mu / distance
        for i in 0..nv {
            let lb = problem.variable_lower_bound(i);
            let ub = problem.variable_upper_bound(i);
            if -INFINITY < lb {
                iterate.multipliers.lower_bounds[i] = Self::safeguard_multiplier(
                    iterate.multipliers.lower_bounds[i],
                    floored(iterate.primals[i] - lb, lb),
                    mu,
                    k_sigma,
                    1.,
                );
            }
            if ub < INFINITY {
                iterate.multipliers.upper_bounds[i] = Self::safeguard_multiplier(
                    iterate.multipliers.upper_bounds[i],
                    floored(ub - iterate.primals[i], ub),
                    mu,
                    k_sigma,
                    -1.,
                );
            }
        }
        if problem.evaluate_constraints(iterate, &mut self.constraints[..m]).is_ok() {
            self.reset_slacks(problem);
            for j in 0..m {
                if let Some(slot) = self.slack_slot[j] {
                    let lb = problem.constraint_lower_bound(j);
                    let ub = problem.constraint_upper_bound(j);
                    if -INFINITY < lb {
                        self.slack_lower_multipliers[slot] = Self::safeguard_multiplier(
                            self.slack_lower_multipliers[slot],
                            floored(self.slacks[slot] - lb, lb),
                            mu,
                            k_sigma,
                            1.,
                        );
                    }
                    if ub < INFINITY {
                        self.slack_upper_multipliers[slot] = Self::safeguard_multiplier(
                            self.slack_upper_multipliers[slot],
                            floored(ub - self.slacks[slot], ub),
                            mu,
                            k_sigma,
                            -1.,
                        );
                    }
                }
            }
        }
    }

    fn definition_changed(&self) -> bool {
        self.definition_changed
    }

    fn reset_definition_changed(&mut self) {
        self.definition_changed = false;
    }

    fn number_subproblems_solved(&self) -> usize {
        self.number_subproblems_solved
    }

    /// Proximal stabilization tied to the barrier parameter, vanishing as
    /// mu goes to zero.
    fn proximal_coefficient(&self) -> f64 {
        self.barrier_parameter.sqrt()
    }
}
