//! Solver options.
//!
//! Options are a keyed string map with typed getters. Every component parses
//! its numeric parameters once at construction, so the map is only touched
//! during assembly. Two presets are provided; they only rewrite values and
//! carry no logic of their own.

use std::collections::HashMap;

use crate::error::SolverError;

/// String-keyed option map with a fully populated default set.
#[derive(Debug, Clone)]
pub struct Options {
    entries: HashMap<String, String>,
}

impl Default for Options {
    fn default() -> Self {
        let mut options = Options { entries: HashMap::new() };
        for (key, value) in DEFAULT_OPTIONS {
            options.entries.insert((*key).to_string(), (*value).to_string());
        }
        options
    }
}

impl Options {
    /// Overwrite (or add) a single option.
    pub fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    /// Preset that emulates an active-set filter method: trust region + QP
    /// subproblem + Leyffer filter + feasibility restoration.
    pub fn filtersqp_preset() -> Self {
        let mut options = Options::default();
        options.set("mechanism", "TR");
        options.set("subproblem", "QP");
        options.set("strategy", "leyffer-filter");
        options.set("constraint_relaxation", "feasibility-restoration");
        options.set("hessian_model", "exact");
        options
    }

    /// Preset that emulates a barrier method: line search + primal-dual
    /// interior point + Waechter filter + feasibility restoration.
    pub fn ipopt_preset() -> Self {
        let mut options = Options::default();
        options.set("mechanism", "LS");
        options.set("subproblem", "primal-dual-interior-point");
        options.set("strategy", "waechter-filter");
        options.set("constraint_relaxation", "feasibility-restoration");
        options.set("hessian_model", "exact");
        options
    }

    pub fn get_string(&self, key: &str) -> Result<&str, SolverError> {
        self.entries
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| SolverError::InvalidOption(format!("unknown option {key}")))
    }

    pub fn get_double(&self, key: &str) -> Result<f64, SolverError> {
        self.get_string(key)?
            .parse::<f64>()
            .map_err(|_| SolverError::InvalidOption(format!("option {key} is not a float")))
    }

    pub fn get_usize(&self, key: &str) -> Result<usize, SolverError> {
        self.get_string(key)?
            .parse::<usize>()
            .map_err(|_| SolverError::InvalidOption(format!("option {key} is not an integer")))
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, SolverError> {
        match self.get_string(key)? {
            "yes" | "true" | "1" => Ok(true),
            "no" | "false" | "0" => Ok(false),
            other => Err(SolverError::InvalidOption(format!(
                "option {key} is not a boolean: {other}"
            ))),
        }
    }
}

/// Default value of every known option.
const DEFAULT_OPTIONS: &[(&str, &str)] = &[
    // termination
    ("tolerance", "1e-8"),
    ("loose_tolerance", "1e-6"),
    ("loose_tolerance_consecutive_iteration_threshold", "15"),
    ("max_iterations", "2000"),
    ("time_limit", "inf"),
    ("small_step_factor", "100"),
    ("residual_norm", "INF"),
    ("unbounded_objective_threshold", "-1e20"),
    // ingredient selection
    ("constraint_relaxation", "feasibility-restoration"),
    ("strategy", "leyffer-filter"),
    ("mechanism", "TR"),
    ("subproblem", "QP"),
    ("hessian_model", "exact"),
    ("linear_solver", "LDL"),
    ("verbose", "no"),
    // barrier subproblem
    ("barrier_initial_parameter", "0.1"),
    ("tau_min", "0.99"),
    ("k_sigma", "1e10"),
    ("s_max", "100"),
    ("k_mu", "0.2"),
    ("theta_mu", "1.5"),
    ("k_epsilon", "10"),
    ("kappa", "1e-2"),
    // inertia correction
    ("regularization_initial_value", "1e-4"),
    ("regularization_increase_first_factor", "100"),
    ("regularization_increase_factor", "8"),
    ("regularization_decrease_factor", "2"),
    ("regularization_constraint_scaling", "1e-8"),
    ("regularization_constraint_exponent", "0.25"),
    // filter strategies
    ("filter_delta", "1"),
    ("filter_ubd", "1e2"),
    ("filter_fact", "1.25"),
    ("filter_switching_infeasibility_exponent", "2"),
    ("filter_gamma_theta", "0.999"),
    ("filter_gamma_phi", "0.001"),
    ("filter_armijo_factor", "1e-4"),
    ("filter_capacity", "50"),
    // l1 merit
    ("merit_initial_penalty", "10"),
    ("merit_sufficient_decrease_factor", "1e-4"),
    // line search
    ("LS_min_step_length", "1e-9"),
    ("LS_ratio", "0.5"),
    // trust region
    ("TR_initial_radius", "10"),
    ("TR_minimum_radius", "1e-8"),
    ("TR_maximum_radius", "1e8"),
    ("TR_shrink_factor", "0.5"),
    ("TR_expand_factor", "2"),
    ("TR_eta_success", "0.1"),
    ("TR_eta_expand", "0.75"),
    // l1 relaxation
    ("l1_initial_parameter", "1"),
    ("l1_parameter_increase_factor", "10"),
    ("l1_epsilon1", "0.1"),
    ("l1_epsilon2", "0.1"),
    ("l1_constraint_violation_coefficient", "1"),
    ("l1_use_proximal_term", "yes"),
    ("proximal_coefficient", "1e-8"),
    // QP/LP subproblem solver
    ("qp_tolerance", "1e-10"),
    ("qp_max_iterations", "100"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_parse() {
        let options = Options::default();
        assert!(options.get_double("tolerance").unwrap() > 0.);
        assert_eq!(options.get_usize("max_iterations").unwrap(), 2000);
        assert!(!options.get_bool("verbose").unwrap());
        assert_eq!(options.get_string("mechanism").unwrap(), "TR");
        // "inf" parses as f64 infinity
        assert!(options.get_double("time_limit").unwrap().is_infinite());
    }

    #[test]
    fn test_unknown_key() {
        let options = Options::default();
        assert!(options.get_string("no_such_option").is_err());
    }

    #[test]
    fn test_presets() {
        let ipopt = Options::ipopt_preset();
        assert_eq!(ipopt.get_string("subproblem").unwrap(), "primal-dual-interior-point");
        let filtersqp = Options::filtersqp_preset();
        assert_eq!(filtersqp.get_string("mechanism").unwrap(), "TR");
    }
}
