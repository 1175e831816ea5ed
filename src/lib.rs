//! # cvxattr
//!
//! Convex attribute elimination for disciplined convex programs.
//!
//! Variables in a problem may carry declarative attributes: `nonneg`,
//! `nonpos`, `symmetric`, `psd` and `nsd`. Solvers only understand plain
//! variables and explicit cone constraints, so before solving these
//! attributes are compiled away by the [`CvxAttr2Constr`](reductions::CvxAttr2Constr)
//! reduction, and solutions are mapped back afterwards.
//!
//! ## Quick Start
//!
//! ```
//! use cvxattr::prelude::*;
//!
//! let x = VariableBuilder::vector(3).nonneg().build();
//! let problem = Problem::minimize(sum(&x)).build();
//!
//! let reduction = CvxAttr2Constr::new();
//! let (rewritten, inverse) = reduction.apply(&problem).unwrap();
//!
//! // x is now a plain variable x' with an explicit x' >= 0.
//! assert_eq!(rewritten.constraints.len(), 1);
//! # let _ = inverse;
//! ```
//!
//! ## What gets rewritten
//!
//! - **nonneg / nonpos**: fresh plain variable plus `x' >= 0` or `x' <= 0`
//! - **psd / nsd**: fresh plain variable plus `X' >> 0` or `X' << 0`
//! - **symmetric**: an n x n variable becomes a packed vector of length
//!   n(n+1)/2, expanded back with a constant fill matrix. No constraint
//!   is needed; symmetry holds by construction.
//! - Anything else (`integer`, `boolean`, no attributes) is left alone.
//!
//! ## Architecture
//!
//! - **Expression trees** built using the `Expr` enum with `Arc` sharing
//! - **Structural copies** via `tree_copy` with an id-keyed substitution table
//! - **Reductions** implement [`Reduction`](reductions::Reduction): `apply` then `invert`
//! - **Numeric evaluation** of expressions and constraints for checking rewrites

pub mod atoms;
pub mod constraints;
pub mod error;
pub mod expr;
pub mod problem;
pub mod reductions;
pub mod solution;
pub mod sparse;

/// Prelude module for convenient imports.
///
/// ```
/// use cvxattr::prelude::*;
/// ```
pub mod prelude {
    // Expression types
    pub use crate::expr::{
        constant, constant_dmatrix, constant_matrix, constant_sparse, constant_vec, eye,
        nonneg_variable, nonpos_variable, nsd_variable, ones, psd_variable, symmetric_variable,
        variable, zeros, Array, Assignment, Attributes, Expr, ExprId, IntoConstant, Shape,
        VariableBuilder, VariableData, VariableExt,
    };

    // Atoms
    pub use crate::atoms::{
        abs, diag, dot, flatten, hstack, index, matmul, norm2, quad_form, reshape, slice, sum,
        sum_axis, sum_squares, trace, transpose, vstack,
    };

    // Constraints
    pub use crate::constraints::{zero, Constraint, ConstraintExt, ConstraintKind};

    // Problem
    pub use crate::problem::{Objective, Problem, ProblemBuilder};

    // Reductions
    pub use crate::reductions::{
        pack_upper_tri, unpack_upper_tri, upper_tri_len, upper_tri_to_full, Attr2ConstrInverse,
        CvxAttr2Constr, Reduction,
    };

    // Solution
    pub use crate::solution::{Solution, SolveStatus};

    // Errors
    pub use crate::error::{CvxError, Result};
}

// Re-export main types at crate root
pub use error::{CvxError, Result};
pub use problem::Problem;
pub use reductions::{CvxAttr2Constr, Reduction};
pub use solution::{Solution, SolveStatus};
