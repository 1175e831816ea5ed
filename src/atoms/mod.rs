//! Atom functions for building expressions.
//!
//! - **Affine atoms**: add, mul, sum, reshape, matmul, stacking, indexing
//! - **Nonlinear atoms**: norms, absolute value, quadratic forms

pub mod affine;
pub mod nonlinear;

pub use affine::{
    diag, dot, flatten, hstack, index, matmul, reshape, slice, sum, sum_axis, trace, transpose,
    vstack,
};

pub use nonlinear::{abs, norm2, quad_form, sum_squares};
