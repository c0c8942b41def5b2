//! Nonlin: a modular solver for smooth, nonconvex, constrained optimization
//!
//! Solves problems of the form
//!
//! ```text
//! minimize    f(x)
//! subject to  g_L <= c(x) <= g_U,   x_L <= x <= x_U
//! ```
//!
//! where f and c are twice continuously differentiable but not necessarily
//! convex. The solver is an assembly of interchangeable ingredients:
//!
//! - **Globalization mechanism**: backtracking line search or trust region
//! - **Constraint relaxation**: feasibility restoration or l1 relaxation
//! - **Subproblem**: SQP, SLP, or a primal-dual interior-point iteration
//!   with inertia-corrected KKT factorizations
//! - **Globalization strategy**: Fletcher-Leyffer filter, Waechter-Biegler
//!   filter, or an exact l1 merit function
//!
//! The ingredient combination is chosen through string [`Options`]
//! (`mechanism`, `constraint_relaxation`, `subproblem`, `strategy`), with
//! presets emulating well-known solvers.
//!
//! # Example
//!
//! ```ignore
//! use nonlin_core::{minimize, Model, Options};
//!
//! let model = MyModel::new();        // implements the Model trait
//! let options = Options::filtersqp_preset();
//! let result = minimize(&model, &options)?;
//!
//! println!("status: {}", result.status);
//! println!("objective: {}", result.objective());
//! println!("solution: {:?}", result.primal_solution());
//! ```

#![warn(clippy::all)]
#![allow(clippy::too_many_arguments)] // KKT assembly routines carry many blocks
#![allow(clippy::needless_range_loop)] // index loops mirror the math

pub mod direction;
pub mod driver;
pub mod error;
pub mod hessian;
pub mod iterate;
pub mod linalg;
pub mod mechanism;
pub mod model;
pub mod options;
pub mod reformulation;
pub mod relaxation;
pub mod residuals;
pub mod result;
pub mod solvers;
pub mod statistics;
pub mod strategy;
pub mod subproblem;

pub use driver::minimize;
pub use error::{EvaluationError, LinearSolverError, SolverError, SolverResult};
pub use iterate::{Iterate, Multipliers, ProgressMeasures};
pub use linalg::coo::SymmetricCooMatrix;
pub use linalg::rectangular::RectangularMatrix;
pub use linalg::sparse_vector::SparseVector;
pub use model::{BoundType, EvaluationCounts, FunctionType, Model, INFINITY};
pub use options::Options;
pub use result::{OptimizationResult, TerminationStatus};
