//! Linear-algebra primitives: dense vector helpers, sparse vectors, the
//! symmetric coordinate matrix fed to the factorization, the row-wise sparse
//! constraint Jacobian, and CSC utilities built on `sprs`.

pub mod coo;
pub mod rectangular;
pub mod sparse;
pub mod sparse_vector;
pub mod vector;
