//! Test models shared by the end-to-end suites.
#![allow(dead_code)]

use nonlin_core::{
    Model, RectangularMatrix, SparseVector, SymmetricCooMatrix,
};

/// Hock-Schittkowski 71:
/// min x1 x4 (x1 + x2 + x3) + x3
/// s.t. x1 x2 x3 x4 >= 25, x1^2 + x2^2 + x3^2 + x4^2 = 40, 1 <= x <= 5.
pub struct Hs71;

impl Model for Hs71 {
    fn name(&self) -> &str {
        "HS71"
    }

    fn number_variables(&self) -> usize {
        4
    }

    fn number_constraints(&self) -> usize {
        2
    }

    fn evaluate_objective(&self, x: &[f64]) -> f64 {
        x[0] * x[3] * (x[0] + x[1] + x[2]) + x[2]
    }

    fn evaluate_objective_gradient(&self, x: &[f64], gradient: &mut SparseVector) {
        gradient.insert(0, x[0] * x[3] + x[3] * (x[0] + x[1] + x[2]));
        gradient.insert(1, x[0] * x[3]);
        gradient.insert(2, x[0] * x[3] + 1.);
        gradient.insert(3, x[0] * (x[0] + x[1] + x[2]));
    }

    fn evaluate_constraints(&self, x: &[f64], constraints: &mut [f64]) {
        constraints[0] = x[0] * x[1] * x[2] * x[3];
        constraints[1] = x[0] * x[0] + x[1] * x[1] + x[2] * x[2] + x[3] * x[3];
    }

    fn evaluate_constraint_gradient(&self, x: &[f64], constraint_index: usize, gradient: &mut SparseVector) {
        if constraint_index == 0 {
            gradient.insert(0, x[1] * x[2] * x[3]);
            gradient.insert(1, x[0] * x[2] * x[3]);
            gradient.insert(2, x[0] * x[1] * x[3]);
            gradient.insert(3, x[0] * x[1] * x[2]);
        } else {
            gradient.insert(0, 2. * x[0]);
            gradient.insert(1, 2. * x[1]);
            gradient.insert(2, 2. * x[2]);
            gradient.insert(3, 2. * x[3]);
        }
    }

    fn evaluate_constraint_jacobian(&self, x: &[f64], jacobian: &mut RectangularMatrix) {
        self.evaluate_constraint_gradient(x, 0, jacobian.row_mut(0));
        self.evaluate_constraint_gradient(x, 1, jacobian.row_mut(1));
    }

    fn evaluate_lagrangian_hessian(
        &self,
        x: &[f64],
        objective_multiplier: f64,
        multipliers: &[f64],
        hessian: &mut SymmetricCooMatrix,
    ) {
        let objective_hessian = [
            [2. * x[3], 0., 0., 0.],
            [x[3], 0., 0., 0.],
            [x[3], 0., 0., 0.],
            [2. * x[0] + x[1] + x[2], x[0], x[0], 0.],
        ];
        let product_hessian = [
            [0., 0., 0., 0.],
            [x[2] * x[3], 0., 0., 0.],
            [x[1] * x[3], x[0] * x[3], 0., 0.],
            [x[1] * x[2], x[0] * x[2], x[0] * x[1], 0.],
        ];
        let sphere_hessian = [
            [2., 0., 0., 0.],
            [0., 2., 0., 0.],
            [0., 0., 2., 0.],
            [0., 0., 0., 2.],
        ];
        for row in 0..4 {
            for column in 0..=row {
                hessian.insert(
                    row,
                    column,
                    objective_multiplier * objective_hessian[row][column]
                        + multipliers[0] * product_hessian[row][column]
                        + multipliers[1] * sphere_hessian[row][column],
                );
            }
        }
    }

    fn variable_lower_bound(&self, _i: usize) -> f64 {
        1.
    }

    fn variable_upper_bound(&self, _i: usize) -> f64 {
        5.
    }

    fn constraint_lower_bound(&self, constraint_index: usize) -> f64 {
        [25., 40.][constraint_index]
    }

    fn constraint_upper_bound(&self, constraint_index: usize) -> f64 {
        [f64::INFINITY, 40.][constraint_index]
    }

    fn initial_primal_point(&self, x: &mut [f64]) {
        x.copy_from_slice(&[1., 5., 5., 1.]);
    }
}

/// min -x with x >= 0: unbounded below.
pub struct UnboundedLinear;

impl Model for UnboundedLinear {
    fn name(&self) -> &str {
        "unbounded-linear"
    }

    fn number_variables(&self) -> usize {
        1
    }

    fn number_constraints(&self) -> usize {
        0
    }

    fn evaluate_objective(&self, x: &[f64]) -> f64 {
        -x[0]
    }

    fn evaluate_objective_gradient(&self, _x: &[f64], gradient: &mut SparseVector) {
        gradient.insert(0, -1.);
    }

    fn evaluate_constraints(&self, _x: &[f64], _constraints: &mut [f64]) {}

    fn evaluate_constraint_gradient(&self, _x: &[f64], _j: usize, _gradient: &mut SparseVector) {}

    fn evaluate_constraint_jacobian(&self, _x: &[f64], _jacobian: &mut RectangularMatrix) {}

    fn evaluate_lagrangian_hessian(
        &self,
        _x: &[f64],
        _objective_multiplier: f64,
        _multipliers: &[f64],
        _hessian: &mut SymmetricCooMatrix,
    ) {
    }

    fn variable_lower_bound(&self, _i: usize) -> f64 {
        0.
    }

    fn variable_upper_bound(&self, _i: usize) -> f64 {
        f64::INFINITY
    }

    fn constraint_lower_bound(&self, _j: usize) -> f64 {
        unreachable!()
    }

    fn constraint_upper_bound(&self, _j: usize) -> f64 {
        unreachable!()
    }

    fn initial_primal_point(&self, x: &mut [f64]) {
        x[0] = 1.;
    }
}

/// min x^2 subject to the inconsistent pair x = 1, x = 2.
pub struct InconsistentEqualities;

impl Model for InconsistentEqualities {
    fn name(&self) -> &str {
        "inconsistent-equalities"
    }

    fn number_variables(&self) -> usize {
        1
    }

    fn number_constraints(&self) -> usize {
        2
    }

    fn evaluate_objective(&self, x: &[f64]) -> f64 {
        x[0] * x[0]
    }

    fn evaluate_objective_gradient(&self, x: &[f64], gradient: &mut SparseVector) {
        gradient.insert(0, 2. * x[0]);
    }

    fn evaluate_constraints(&self, x: &[f64], constraints: &mut [f64]) {
        constraints[0] = x[0];
        constraints[1] = x[0];
    }

    fn evaluate_constraint_gradient(&self, _x: &[f64], _j: usize, gradient: &mut SparseVector) {
        gradient.insert(0, 1.);
    }

    fn evaluate_constraint_jacobian(&self, x: &[f64], jacobian: &mut RectangularMatrix) {
        self.evaluate_constraint_gradient(x, 0, jacobian.row_mut(0));
        self.evaluate_constraint_gradient(x, 1, jacobian.row_mut(1));
    }

    fn evaluate_lagrangian_hessian(
        &self,
        _x: &[f64],
        objective_multiplier: f64,
        _multipliers: &[f64],
        hessian: &mut SymmetricCooMatrix,
    ) {
        hessian.insert(0, 0, 2. * objective_multiplier);
    }

    fn variable_lower_bound(&self, _i: usize) -> f64 {
        f64::NEG_INFINITY
    }

    fn variable_upper_bound(&self, _i: usize) -> f64 {
        f64::INFINITY
    }

    fn constraint_lower_bound(&self, constraint_index: usize) -> f64 {
        [1., 2.][constraint_index]
    }

    fn constraint_upper_bound(&self, constraint_index: usize) -> f64 {
        [1., 2.][constraint_index]
    }

    fn initial_primal_point(&self, x: &mut [f64]) {
        x[0] = 0.;
    }
}

/// min -x - y subject to x + y <= 1, x, y >= 0.
pub struct SimpleLp;

impl Model for SimpleLp {
    fn name(&self) -> &str {
        "simple-lp"
    }

    fn number_variables(&self) -> usize {
        2
    }

    fn number_constraints(&self) -> usize {
        1
    }

    fn evaluate_objective(&self, x: &[f64]) -> f64 {
        -x[0] - x[1]
    }

    fn evaluate_objective_gradient(&self, _x: &[f64], gradient: &mut SparseVector) {
        gradient.insert(0, -1.);
        gradient.insert(1, -1.);
    }

    fn evaluate_constraints(&self, x: &[f64], constraints: &mut [f64]) {
        constraints[0] = x[0] + x[1];
    }

    fn evaluate_constraint_gradient(&self, _x: &[f64], _j: usize, gradient: &mut SparseVector) {
        gradient.insert(0, 1.);
        gradient.insert(1, 1.);
    }

    fn evaluate_constraint_jacobian(&self, x: &[f64], jacobian: &mut RectangularMatrix) {
        self.evaluate_constraint_gradient(x, 0, jacobian.row_mut(0));
    }

    fn evaluate_lagrangian_hessian(
        &self,
        _x: &[f64],
        _objective_multiplier: f64,
        _multipliers: &[f64],
        _hessian: &mut SymmetricCooMatrix,
    ) {
    }

    fn variable_lower_bound(&self, _i: usize) -> f64 {
        0.
    }

    fn variable_upper_bound(&self, _i: usize) -> f64 {
        f64::INFINITY
    }

    fn constraint_lower_bound(&self, _j: usize) -> f64 {
        f64::NEG_INFINITY
    }

    fn constraint_upper_bound(&self, _j: usize) -> f64 {
        1.
    }

    fn constraint_type(&self, _j: usize) -> nonlin_core::FunctionType {
        nonlin_core::FunctionType::Linear
    }

    fn initial_primal_point(&self, x: &mut [f64]) {
        x.fill(0.);
    }
}

/// min x subject to x^2 <= 0: the only feasible point is x = 0, where the
/// constraint gradient vanishes (constraint qualification failure).
pub struct DegenerateConstraint;

impl Model for DegenerateConstraint {
    fn name(&self) -> &str {
        "degenerate-constraint"
    }

    fn number_variables(&self) -> usize {
        1
    }

    fn number_constraints(&self) -> usize {
        1
    }

    fn evaluate_objective(&self, x: &[f64]) -> f64 {
        x[0]
    }

    fn evaluate_objective_gradient(&self, _x: &[f64], gradient: &mut SparseVector) {
        gradient.insert(0, 1.);
    }

    fn evaluate_constraints(&self, x: &[f64], constraints: &mut [f64]) {
        constraints[0] = x[0] * x[0];
    }

    fn evaluate_constraint_gradient(&self, x: &[f64], _j: usize, gradient: &mut SparseVector) {
        gradient.insert(0, 2. * x[0]);
    }

    fn evaluate_constraint_jacobian(&self, x: &[f64], jacobian: &mut RectangularMatrix) {
        self.evaluate_constraint_gradient(x, 0, jacobian.row_mut(0));
    }

    fn evaluate_lagrangian_hessian(
        &self,
        _x: &[f64],
        _objective_multiplier: f64,
        multipliers: &[f64],
        hessian: &mut SymmetricCooMatrix,
    ) {
        hessian.insert(0, 0, 2. * multipliers[0]);
    }

    fn variable_lower_bound(&self, _i: usize) -> f64 {
        f64::NEG_INFINITY
    }

    fn variable_upper_bound(&self, _i: usize) -> f64 {
        f64::INFINITY
    }

    fn constraint_lower_bound(&self, _j: usize) -> f64 {
        f64::NEG_INFINITY
    }

    fn constraint_upper_bound(&self, _j: usize) -> f64 {
        0.
    }

    fn initial_primal_point(&self, x: &mut [f64]) {
        x[0] = 0.5;
    }
}

/// min (x-1)^2 + (y-2)^2 subject to the redundant pair
/// x + y = 3 and 2x + 2y = 6 (rank-deficient Jacobian).
pub struct RedundantEquality;

impl Model for RedundantEquality {
    fn name(&self) -> &str {
        "redundant-equality"
    }

    fn number_variables(&self) -> usize {
        2
    }

    fn number_constraints(&self) -> usize {
        2
    }

    fn evaluate_objective(&self, x: &[f64]) -> f64 {
        (x[0] - 1.) * (x[0] - 1.) + (x[1] - 2.) * (x[1] - 2.)
    }

    fn evaluate_objective_gradient(&self, x: &[f64], gradient: &mut SparseVector) {
        gradient.insert(0, 2. * (x[0] - 1.));
        gradient.insert(1, 2. * (x[1] - 2.));
    }

    fn evaluate_constraints(&self, x: &[f64], constraints: &mut [f64]) {
        constraints[0] = x[0] + x[1];
        constraints[1] = 2. * x[0] + 2. * x[1];
    }

    fn evaluate_constraint_gradient(&self, _x: &[f64], constraint_index: usize, gradient: &mut SparseVector) {
        let scale = if constraint_index == 0 { 1. } else { 2. };
        gradient.insert(0, scale);
        gradient.insert(1, scale);
    }

    fn evaluate_constraint_jacobian(&self, x: &[f64], jacobian: &mut RectangularMatrix) {
        self.evaluate_constraint_gradient(x, 0, jacobian.row_mut(0));
        self.evaluate_constraint_gradient(x, 1, jacobian.row_mut(1));
    }

    fn evaluate_lagrangian_hessian(
        &self,
        _x: &[f64],
        objective_multiplier: f64,
        _multipliers: &[f64],
        hessian: &mut SymmetricCooMatrix,
    ) {
        hessian.insert(0, 0, 2. * objective_multiplier);
        hessian.insert(1, 1, 2. * objective_multiplier);
    }

    fn variable_lower_bound(&self, _i: usize) -> f64 {
        f64::NEG_INFINITY
    }

    fn variable_upper_bound(&self, _i: usize) -> f64 {
        f64::INFINITY
    }

    fn constraint_lower_bound(&self, constraint_index: usize) -> f64 {
        [3., 6.][constraint_index]
    }

    fn constraint_upper_bound(&self, constraint_index: usize) -> f64 {
        [3., 6.][constraint_index]
    }

    fn constraint_type(&self, _j: usize) -> nonlin_core::FunctionType {
        nonlin_core::FunctionType::Linear
    }

    fn initial_primal_point(&self, x: &mut [f64]) {
        x.fill(0.);
    }
}
