//! End-to-end scenarios exercising the full ingredient stack.

mod common;

use common::{
    DegenerateConstraint, Hs71, InconsistentEqualities, RedundantEquality, SimpleLp,
    UnboundedLinear,
};
use nonlin_core::{minimize, Options, TerminationStatus};

const HS71_OBJECTIVE: f64 = 17.014017;
const HS71_SOLUTION: [f64; 4] = [1.0, 4.742_999_4, 3.821_150_3, 1.379_408_2];

fn assert_hs71_solution(result: &nonlin_core::OptimizationResult, tolerance: f64) {
    assert_eq!(result.status, TerminationStatus::FeasibleKktPoint, "status: {}", result.status);
    assert!(
        (result.objective() - HS71_OBJECTIVE).abs() < tolerance,
        "objective {} != {HS71_OBJECTIVE}",
        result.objective()
    );
    for (i, &expected) in HS71_SOLUTION.iter().enumerate() {
        assert!(
            (result.primal_solution()[i] - expected).abs() < tolerance,
            "x[{i}] = {} != {expected}",
            result.primal_solution()[i]
        );
    }
}

#[test]
fn test_hs71_trust_region_sqp() {
    let result = minimize(&Hs71, &Options::filtersqp_preset()).unwrap();
    assert_hs71_solution(&result, 1e-5);
    // KKT residuals hold at the reported point, after scaling
    let residuals = &result.iterate.residuals;
    assert!(residuals.optimality_stationarity / residuals.stationarity_scaling <= 1e-6);
    assert!(residuals.optimality_complementarity / residuals.complementarity_scaling <= 1e-6);
    assert!(residuals.infeasibility <= 1e-6);
}

#[test]
fn test_hs71_interior_point_line_search() {
    let result = minimize(&Hs71, &Options::ipopt_preset()).unwrap();
    assert_hs71_solution(&result, 1e-4);
    // the iterate never leaves the box
    for &xi in result.primal_solution() {
        assert!((1. ..=5.).contains(&xi));
    }
}

#[test]
fn test_unbounded_objective() {
    let mut options = Options::default();
    options.set("unbounded_objective_threshold", "-1e10");
    options.set("max_iterations", "200");
    let result = minimize(&UnboundedLinear, &options).unwrap();
    assert_eq!(result.status, TerminationStatus::Unbounded, "status: {}", result.status);
    assert!(result.iterations <= 200);
}

#[test]
fn test_inconsistent_equalities() {
    let result = minimize(&InconsistentEqualities, &Options::default()).unwrap();
    assert_eq!(
        result.status,
        TerminationStatus::InfeasibleStationaryPoint,
        "status: {}",
        result.status
    );
    // the minimum of |x - 1| + |x - 2| is attained on [1, 2]
    let x = result.primal_solution()[0];
    assert!((1. - 1e-4..=2. + 1e-4).contains(&x), "x = {x}");
}

#[test]
fn test_linear_program() {
    let mut options = Options::default();
    options.set("subproblem", "LP");
    let result = minimize(&SimpleLp, &options).unwrap();
    assert_eq!(result.status, TerminationStatus::FeasibleKktPoint, "status: {}", result.status);
    assert!(result.iterations <= 10, "{} iterations", result.iterations);
    assert!((result.objective() + 1.).abs() < 1e-6, "objective {}", result.objective());
    let x = result.primal_solution();
    assert!((x[0] + x[1] - 1.).abs() < 1e-6);
    assert!(x[0] >= -1e-9 && x[1] >= -1e-9);
}

#[test]
fn test_degenerate_constraint() {
    let result = minimize(&DegenerateConstraint, &Options::default()).unwrap();
    // x = 0 is the only feasible point; the constraint gradient vanishes
    // there, so the point is stationary only in the Fritz-John sense (or is
    // reached through vanishing steps)
    assert!(
        matches!(
            result.status,
            TerminationStatus::FjPoint
                | TerminationStatus::FeasibleKktPoint
                | TerminationStatus::FeasibleSmallStep
        ),
        "status: {}",
        result.status
    );
    assert!(result.primal_solution()[0].abs() < 1e-3, "x = {}", result.primal_solution()[0]);
}

#[test]
fn test_redundant_equality_interior_point() {
    // the rank-deficient Jacobian makes the KKT matrix singular; the dual
    // regularization must kick in for the factorization to succeed
    let result = minimize(&RedundantEquality, &Options::ipopt_preset()).unwrap();
    assert_eq!(result.status, TerminationStatus::FeasibleKktPoint, "status: {}", result.status);
    let x = result.primal_solution();
    assert!((x[0] - 1.).abs() < 1e-5, "x = {x:?}");
    assert!((x[1] - 2.).abs() < 1e-5, "x = {x:?}");
}

#[test]
fn test_redundant_equality_sqp() {
    let result = minimize(&RedundantEquality, &Options::filtersqp_preset()).unwrap();
    assert_eq!(result.status, TerminationStatus::FeasibleKktPoint, "status: {}", result.status);
    let x = result.primal_solution();
    assert!((x[0] - 1.).abs() < 1e-5);
    assert!((x[1] - 2.).abs() < 1e-5);
}

#[test]
fn test_counters_are_populated() {
    let result = minimize(&Hs71, &Options::filtersqp_preset()).unwrap();
    assert!(0 < result.iterations);
    assert!(0 < result.subproblems_solved);
    assert!(0 < result.evaluations.objective);
    assert!(0 < result.evaluations.constraints);
    assert!(0 < result.evaluations.jacobian);
    assert!(0 < result.evaluations.hessian);
}

#[test]
fn test_iteration_limit() {
    let mut options = Options::filtersqp_preset();
    options.set("max_iterations", "1");
    let result = minimize(&Hs71, &options).unwrap();
    assert!(matches!(
        result.status,
        TerminationStatus::IterationLimit | TerminationStatus::FeasibleKktPoint
    ));
    assert!(result.iterations <= 1);
}

#[test]
fn test_time_limit() {
    let mut options = Options::filtersqp_preset();
    options.set("time_limit", "0");
    let result = minimize(&Hs71, &options).unwrap();
    assert_eq!(result.status, TerminationStatus::TimeLimit);
}

#[test]
fn test_l1_relaxation_on_hs71() {
    let mut options = Options::filtersqp_preset();
    options.set("constraint_relaxation", "l1-relaxation");
    let result = minimize(&Hs71, &options).unwrap();
    assert_hs71_solution(&result, 1e-4);
}

#[test]
fn test_merit_function_on_hs71() {
    let mut options = Options::filtersqp_preset();
    options.set("strategy", "l1-merit");
    let result = minimize(&Hs71, &options).unwrap();
    assert_hs71_solution(&result, 1e-4);
}
