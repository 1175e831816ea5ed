//! Nonlinear atoms.
//!
//! Reductions treat these as opaque interior nodes: they are copied
//! structurally and only their arguments are rewritten.

use std::sync::Arc;

use crate::expr::Expr;

/// L2 norm of the flattened argument: ||x||_2.
pub fn norm2(x: &Expr) -> Expr {
    Expr::Norm2(Arc::new(x.clone()))
}

/// Elementwise absolute value.
pub fn abs(x: &Expr) -> Expr {
    Expr::Abs(Arc::new(x.clone()))
}

/// Sum of squares: ||x||_2^2.
pub fn sum_squares(x: &Expr) -> Expr {
    Expr::SumSquares(Arc::new(x.clone()))
}

/// Quadratic form x' P x for a square constant `p`.
pub fn quad_form(x: &Expr, p: &Expr) -> Expr {
    Expr::QuadForm(Arc::new(x.clone()), Arc::new(p.clone()))
}
