//! Structural properties of the problem views and bound handling.

mod common;

use common::Hs71;
use nonlin_core::model::project_onto_variable_bounds;
use nonlin_core::reformulation::{FeasibilityProblem, OptimalityProblem, OptimizationProblem};
use nonlin_core::Iterate;

#[test]
fn test_bound_projection_is_idempotent() {
    let model = Hs71;
    let mut x = vec![-3., 0.2, 7., 2.5];
    project_onto_variable_bounds(&model, &mut x);
    let once = x.clone();
    project_onto_variable_bounds(&model, &mut x);
    assert_eq!(once, x);
    for &xi in &x {
        assert!((1. ..=5.).contains(&xi));
    }
}

#[test]
fn test_views_share_dimensions() {
    let model = Hs71;
    let optimality = OptimalityProblem::new(&model);
    let feasibility = FeasibilityProblem::new(&model, 1., false);
    assert_eq!(optimality.number_variables(), 4);
    assert_eq!(feasibility.number_variables(), 4 + 2 * 2);
    assert_eq!(optimality.number_constraints(), feasibility.number_constraints());
    assert_eq!(optimality.objective_multiplier(), 1.);
    assert_eq!(feasibility.objective_multiplier(), 0.);
}

#[test]
fn test_elastic_reformulation_round_trip_at_feasible_point() {
    let model = Hs71;
    let optimality = OptimalityProblem::new(&model);
    let feasibility = FeasibilityProblem::new(&model, 1., false);

    // a feasible point of HS71
    let mut iterate = Iterate::new(4, 8, 2);
    iterate.primals[..4].copy_from_slice(&[1., 4.742_999_4, 3.821_150_3, 1.379_408_2]);
    feasibility.set_elastic_variables(&mut iterate).unwrap();

    // no violation: the elastics stay at zero and both views agree on the
    // constraint values
    for elastic_index in 4..8 {
        assert!(iterate.primals[elastic_index].abs() < 1e-5);
    }
    let mut from_optimality = vec![0.; 2];
    let mut from_feasibility = vec![0.; 2];
    optimality
        .evaluate_constraints(&mut iterate, &mut from_optimality)
        .unwrap();
    feasibility
        .evaluate_constraints(&mut iterate, &mut from_feasibility)
        .unwrap();
    for j in 0..2 {
        assert!((from_optimality[j] - from_feasibility[j]).abs() < 1e-5);
    }
}

#[test]
fn test_elastics_absorb_violation() {
    let model = Hs71;
    let feasibility = FeasibilityProblem::new(&model, 1., false);

    // infeasible start: both constraints violated
    let mut iterate = Iterate::new(4, 8, 2);
    iterate.primals[..4].copy_from_slice(&[1., 1., 1., 1.]);
    feasibility.set_elastic_variables(&mut iterate).unwrap();

    // the reformulated constraints are feasible by construction
    let mut reformulated = vec![0.; 2];
    feasibility
        .evaluate_constraints(&mut iterate, &mut reformulated)
        .unwrap();
    for j in 0..2 {
        assert!(feasibility.constraint_lower_bound(j) - 1e-12 <= reformulated[j]);
        assert!(reformulated[j] <= feasibility.constraint_upper_bound(j) + 1e-12);
    }
    // c1 = 1 < 25 and c2 = 4 < 40: both lower elastics are active
    assert!((iterate.primals[4] - 24.).abs() < 1e-12);
    assert!((iterate.primals[5] - 36.).abs() < 1e-12);
    assert_eq!(iterate.primals[6], 0.);
    assert_eq!(iterate.primals[7], 0.);
}
