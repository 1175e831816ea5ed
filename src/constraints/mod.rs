//! Constraints attached to a problem.

pub mod constraint;

pub use constraint::{zero, Constraint, ConstraintExt, ConstraintKind};
