//! Outer driver: initialization, the major iteration loop, termination and
//! result assembly.

use std::time::Instant;

use crate::error::{SolverError, SolverResult};
use crate::iterate::Iterate;
use crate::mechanism::create_mechanism;
use crate::model::{project_onto_variable_bounds, validate_model, CountingModel, Model};
use crate::options::Options;
use crate::relaxation::create_constraint_relaxation_strategy;
use crate::result::{OptimizationResult, TerminationStatus};
use crate::statistics::Statistics;

/// Solve the model with the ingredients selected by the options.
///
/// Setup failures (inconsistent options or model) are returned as errors;
/// numerical failures during the iteration are reported through a result
/// with [`TerminationStatus::Error`].
pub fn minimize(model: &dyn Model, options: &Options) -> SolverResult<OptimizationResult> {
    validate_model(model)?;
    let verbose = options.get_bool("verbose")?;
    let max_iterations = options.get_usize("max_iterations")?;
    let time_limit = options.get_double("time_limit")?;

    let counting_model = CountingModel::new(model);
    let constraint_relaxation_strategy =
        create_constraint_relaxation_strategy(&counting_model, options)?;
    let maximum_number_variables = constraint_relaxation_strategy.maximum_number_variables();
    let mut mechanism = create_mechanism(options, constraint_relaxation_strategy)?;

    let n = counting_model.number_variables();
    let m = counting_model.number_constraints();
    if verbose {
        eprintln!("problem {}: {n} variables, {m} constraints", counting_model.name());
    }

    // initial primal-dual point, projected onto the variable bounds
    let mut current_iterate = Iterate::new(n, maximum_number_variables, m);
    counting_model.initial_primal_point(&mut current_iterate.primals[..n]);
    project_onto_variable_bounds(&counting_model, &mut current_iterate.primals[..n]);
    counting_model.initial_dual_point(&mut current_iterate.multipliers.constraints);

    let timer = Instant::now();
    let mut statistics = Statistics::new(verbose);
    let mut status = TerminationStatus::NotOptimal;
    let mut major_iterations = 0;

    match mechanism.initialize(&mut current_iterate) {
        Ok(()) => {
            while status == TerminationStatus::NotOptimal {
                if max_iterations <= major_iterations {
                    status = TerminationStatus::IterationLimit;
                    break;
                }
                if time_limit < timer.elapsed().as_secs_f64() {
                    status = TerminationStatus::TimeLimit;
                    break;
                }
                major_iterations += 1;

                match mechanism.compute_acceptable_iterate(&counting_model, &mut current_iterate) {
                    Ok(accepted) => {
                        current_iterate = accepted.iterate;
                        status = mechanism.check_termination(
                            &counting_model,
                            &mut current_iterate,
                            accepted.step_norm,
                        );
                        statistics.print_iteration(
                            major_iterations,
                            current_iterate.objective_multiplier as usize + 1,
                            accepted.step_norm,
                            current_iterate.evaluations.objective,
                            current_iterate.residuals.infeasibility,
                            current_iterate.residuals.optimality_stationarity,
                            current_iterate.residuals.optimality_complementarity,
                        );
                    }
                    Err(error) => {
                        if let SolverError::UnstableInertiaCorrection = error {
                            eprintln!("nonlin: {error}");
                        } else if verbose {
                            eprintln!("nonlin: {error}");
                        }
                        status = TerminationStatus::Error;
                    }
                }
            }
        }
        Err(error) => {
            if verbose {
                eprintln!("nonlin: {error}");
            }
            status = TerminationStatus::Error;
        }
    }

    current_iterate.status = status;
    current_iterate.set_number_variables(n);
    counting_model.postprocess_solution(&mut current_iterate, status);

    let subproblems_solved = mechanism.number_subproblems_solved();
    Ok(OptimizationResult {
        status,
        iterate: current_iterate,
        number_variables: n,
        number_constraints: m,
        iterations: major_iterations,
        evaluations: counting_model.counts(),
        subproblems_solved,
        solve_time: timer.elapsed(),
    })
}
