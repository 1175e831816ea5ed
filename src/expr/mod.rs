//! Expression types and creation utilities.
//!
//! This module provides the expression trees that reductions operate on:
//! - `Expr` - The main expression enum
//! - `Shape` - Shape information for expressions
//! - Variable creation via `variable()` and `VariableBuilder`, including
//!   the declarative attributes (`nonneg`, `symmetric`, `psd`, ...)
//! - Constant creation via `constant()` and related functions
//! - Numeric evaluation via `Expr::value`

pub mod constant;
pub mod eval;
pub mod expression;
pub mod shape;
pub mod variable;

pub use constant::{
    constant, constant_array, constant_dmatrix, constant_matrix, constant_sparse, constant_vec,
    eye, ones, zeros, IntoConstant,
};
pub use eval::Assignment;
pub use expression::{Array, Attributes, ConstantData, Expr, ExprId, IndexSpec, VariableData};
pub use shape::Shape;
pub use variable::{
    named_variable, nonneg_variable, nonpos_variable, nsd_variable, psd_variable,
    symmetric_variable, variable, VariableBuilder, VariableExt,
};
