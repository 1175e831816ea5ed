//! Constraint types for optimization problems.
//!
//! Every constraint compares one expression against zero:
//! - Zero: expr == 0
//! - NonNeg: expr >= 0 (elementwise)
//! - NonPos: expr <= 0 (elementwise)
//! - PSD: expr >> 0 (positive semidefinite)
//! - NSD: expr << 0 (negative semidefinite)
//! - SOC: ||x||_2 <= t

use std::collections::HashMap;
use std::sync::Arc;

use nalgebra::DMatrix;

use crate::error::{CvxError, Result};
use crate::expr::expression::copy_child;
use crate::expr::{constant, Assignment, Expr, ExprId, VariableData};

/// The relation a constraint enforces.
#[derive(Debug, Clone)]
pub enum ConstraintKind {
    /// Equality constraint: expr == 0.
    Zero(Arc<Expr>),

    /// Elementwise inequality: expr >= 0.
    NonNeg(Arc<Expr>),

    /// Elementwise inequality: expr <= 0.
    NonPos(Arc<Expr>),

    /// Semidefinite constraint: expr >> 0. The argument must be square.
    PSD(Arc<Expr>),

    /// Semidefinite constraint: expr << 0. The argument must be square.
    NSD(Arc<Expr>),

    /// Second-order cone constraint: ||x||_2 <= t.
    SOC {
        /// The scalar upper bound.
        t: Arc<Expr>,
        /// The vector argument.
        x: Arc<Expr>,
    },
}

/// A constraint in an optimization problem.
///
/// The id keys dual values in a `Solution` and survives `tree_copy`.
#[derive(Debug, Clone)]
pub struct Constraint {
    pub id: ExprId,
    pub kind: ConstraintKind,
}

impl Constraint {
    /// Wrap a constraint kind with a fresh id.
    pub fn new(kind: ConstraintKind) -> Self {
        Constraint {
            id: ExprId::new(),
            kind,
        }
    }

    /// Create an equality constraint: lhs == rhs.
    pub fn eq(lhs: Expr, rhs: Expr) -> Self {
        Self::new(ConstraintKind::Zero(Arc::new(lhs - rhs)))
    }

    /// Create an inequality constraint: lhs <= rhs.
    pub fn leq(lhs: Expr, rhs: Expr) -> Self {
        Self::new(ConstraintKind::NonPos(Arc::new(lhs - rhs)))
    }

    /// Create an inequality constraint: lhs >= rhs.
    pub fn geq(lhs: Expr, rhs: Expr) -> Self {
        Self::new(ConstraintKind::NonNeg(Arc::new(lhs - rhs)))
    }

    /// Create a semidefinite constraint: lhs - rhs is PSD.
    pub fn psd(lhs: Expr, rhs: Expr) -> Self {
        Self::new(ConstraintKind::PSD(Arc::new(lhs - rhs)))
    }

    /// Create a semidefinite constraint: lhs - rhs is NSD.
    pub fn nsd(lhs: Expr, rhs: Expr) -> Self {
        Self::new(ConstraintKind::NSD(Arc::new(lhs - rhs)))
    }

    /// Create a SOC constraint: ||x||_2 <= t.
    pub fn soc(t: Expr, x: Expr) -> Self {
        Self::new(ConstraintKind::SOC {
            t: Arc::new(t),
            x: Arc::new(x),
        })
    }

    /// Get all expressions in this constraint.
    pub fn expressions(&self) -> Vec<&Expr> {
        match &self.kind {
            ConstraintKind::Zero(e)
            | ConstraintKind::NonNeg(e)
            | ConstraintKind::NonPos(e)
            | ConstraintKind::PSD(e)
            | ConstraintKind::NSD(e) => vec![e.as_ref()],
            ConstraintKind::SOC { t, x } => vec![t.as_ref(), x.as_ref()],
        }
    }

    /// Get all distinct variable IDs in this constraint.
    pub fn variables(&self) -> Vec<ExprId> {
        let mut vars: Vec<ExprId> = self
            .expressions()
            .into_iter()
            .flat_map(|e| e.variables())
            .collect();
        vars.sort();
        vars.dedup();
        vars
    }

    /// Every variable leaf in argument order, duplicates included.
    pub fn variable_leaves(&self) -> Vec<&VariableData> {
        self.expressions()
            .into_iter()
            .flat_map(|e| e.variable_leaves())
            .collect()
    }

    /// Structural copy with variable leaves substituted by id.
    ///
    /// The copy keeps this constraint's id.
    pub fn tree_copy(&self, id_objects: &HashMap<ExprId, Arc<Expr>>) -> Constraint {
        let copy = |e: &Arc<Expr>| copy_child(e, id_objects);
        let kind = match &self.kind {
            ConstraintKind::Zero(e) => ConstraintKind::Zero(copy(e)),
            ConstraintKind::NonNeg(e) => ConstraintKind::NonNeg(copy(e)),
            ConstraintKind::NonPos(e) => ConstraintKind::NonPos(copy(e)),
            ConstraintKind::PSD(e) => ConstraintKind::PSD(copy(e)),
            ConstraintKind::NSD(e) => ConstraintKind::NSD(copy(e)),
            ConstraintKind::SOC { t, x } => ConstraintKind::SOC {
                t: copy(t),
                x: copy(x),
            },
        };
        Constraint { id: self.id, kind }
    }

    /// Amount by which the constraint is violated at `values` (0 if satisfied).
    pub fn violation(&self, values: &Assignment) -> Result<f64> {
        let dense = |e: &Arc<Expr>| -> Result<DMatrix<f64>> { Ok(e.value(values)?.to_dense()) };
        match &self.kind {
            ConstraintKind::Zero(e) => Ok(dense(e)?.amax()),
            ConstraintKind::NonNeg(e) => Ok((-dense(e)?.min()).max(0.0)),
            ConstraintKind::NonPos(e) => Ok(dense(e)?.max().max(0.0)),
            ConstraintKind::PSD(e) => Ok((-min_eigenvalue(&dense(e)?)?).max(0.0)),
            ConstraintKind::NSD(e) => Ok((-min_eigenvalue(&-dense(e)?)?).max(0.0)),
            ConstraintKind::SOC { t, x } => {
                let t = dense(t)?;
                if t.len() != 1 {
                    return Err(CvxError::ShapeMismatch {
                        expected: "scalar bound".into(),
                        got: format!("({}, {})", t.nrows(), t.ncols()),
                    });
                }
                let x = dense(x)?;
                Ok((x.norm() - t[(0, 0)]).max(0.0))
            }
        }
    }

    /// Check the constraint at `values` up to `tol`.
    pub fn is_satisfied(&self, values: &Assignment, tol: f64) -> Result<bool> {
        Ok(self.violation(values)? <= tol)
    }
}

/// Smallest eigenvalue of the symmetric part of a square matrix.
fn min_eigenvalue(m: &DMatrix<f64>) -> Result<f64> {
    if m.nrows() != m.ncols() {
        return Err(CvxError::ShapeMismatch {
            expected: "square matrix".into(),
            got: format!("({}, {})", m.nrows(), m.ncols()),
        });
    }
    let sym = (m + m.transpose()) * 0.5;
    Ok(sym.symmetric_eigen().eigenvalues.min())
}

/// Extension trait for creating constraints from expressions.
pub trait ConstraintExt {
    /// Create equality constraint: self == rhs.
    fn equals(&self, rhs: &Expr) -> Constraint;

    /// Create inequality constraint: self <= rhs.
    fn leq(&self, rhs: &Expr) -> Constraint;

    /// Create inequality constraint: self >= rhs.
    fn geq(&self, rhs: &Expr) -> Constraint;

    /// Create semidefinite constraint: self >> rhs.
    fn psd_geq(&self, rhs: &Expr) -> Constraint;

    /// Create semidefinite constraint: self << rhs.
    fn nsd_leq(&self, rhs: &Expr) -> Constraint;
}

impl ConstraintExt for Expr {
    fn equals(&self, rhs: &Expr) -> Constraint {
        Constraint::eq(self.clone(), rhs.clone())
    }

    fn leq(&self, rhs: &Expr) -> Constraint {
        Constraint::leq(self.clone(), rhs.clone())
    }

    fn geq(&self, rhs: &Expr) -> Constraint {
        Constraint::geq(self.clone(), rhs.clone())
    }

    fn psd_geq(&self, rhs: &Expr) -> Constraint {
        Constraint::psd(self.clone(), rhs.clone())
    }

    fn nsd_leq(&self, rhs: &Expr) -> Constraint {
        Constraint::nsd(self.clone(), rhs.clone())
    }
}

/// Scalar zero, the usual right-hand side of a constraint.
pub fn zero() -> Expr {
    constant(0.0)
}
