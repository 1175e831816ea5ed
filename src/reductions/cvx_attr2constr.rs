//! Expand convex variable attributes into constraints.
//!
//! Every variable carrying `nonneg`, `nonpos`, `psd` or `nsd` is replaced by a
//! plain variable of the same shape plus one constraint against zero.
//! Symmetric variables are replaced by their packed upper triangle pushed
//! through a constant fill matrix, which makes symmetry structural.
//!
//! `invert` maps solved values back onto the original variable ids,
//! unpacking symmetric matrices on the way.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace};

use super::symmetric::{unpack_upper_tri, upper_tri_len, upper_tri_to_full};
use super::Reduction;
use crate::constraints::{Constraint, ConstraintKind};
use crate::error::{CvxError, Result};
use crate::expr::{constant_sparse, Array, Attributes, Expr, ExprId, Shape, VariableData};
use crate::problem::Problem;
use crate::solution::Solution;

/// Mapping tables recorded by [`CvxAttr2Constr`] for solution recovery.
///
/// All three tables are keyed by the id of a variable of the original
/// problem and hold exactly one entry per distinct variable.
#[derive(Debug, Clone, Default)]
pub struct Attr2ConstrInverse {
    /// The variable standing in for the original after rewriting: the
    /// original itself, a fresh plain variable, or a packed upper triangle.
    pub id2new_var: HashMap<ExprId, VariableData>,
    /// The expression substituted for the original in the tree.
    pub id2new_obj: HashMap<ExprId, Arc<Expr>>,
    /// The original variable.
    pub id2old_var: HashMap<ExprId, VariableData>,
}

/// Reduction that compiles away `nonneg`, `nonpos`, `symmetric`, `psd` and
/// `nsd` variable attributes.
///
/// A variable that is both `symmetric` and `psd`/`nsd` only gets the
/// symmetric packing; no semidefinite constraint is added for it.
#[derive(Debug, Clone, Copy, Default)]
pub struct CvxAttr2Constr;

impl CvxAttr2Constr {
    /// Create the reduction. It carries no configuration.
    pub fn new() -> Self {
        CvxAttr2Constr
    }
}

impl Reduction for CvxAttr2Constr {
    type InverseData = Attr2ConstrInverse;

    fn name(&self) -> &'static str {
        "CvxAttr2Constr"
    }

    fn accepts(&self, _problem: &Problem) -> bool {
        true
    }

    fn apply(&self, problem: &Problem) -> Result<(Problem, Attr2ConstrInverse)> {
        let mut inverse = Attr2ConstrInverse::default();
        let mut constraints = Vec::new();
        let mut fill_cache: HashMap<usize, Arc<Expr>> = HashMap::new();

        for var in problem.variable_leaves() {
            if inverse.id2new_var.contains_key(&var.id) {
                continue;
            }
            inverse.id2old_var.insert(var.id, var.clone());

            let (new_var, obj) = if var.is_symmetric() {
                packed_replacement(var, &mut fill_cache)?
            } else if var.attributes.has_forcing() {
                let new_var = VariableData {
                    id: ExprId::new(),
                    shape: var.shape.clone(),
                    name: var.name.clone(),
                    attributes: var.attributes.without_forcing(),
                };
                debug!(var_id = var.id.raw(), new_id = new_var.id.raw(), "replacing attributed variable");
                let obj = Arc::new(Expr::Variable(new_var.clone()));
                (new_var, obj)
            } else {
                (var.clone(), Arc::new(Expr::Variable(var.clone())))
            };

            if !var.is_symmetric() {
                if let Some(kind) = attribute_constraint(&var.attributes, &obj) {
                    constraints.push(Constraint::new(kind));
                }
            }

            inverse.id2new_var.insert(var.id, new_var);
            inverse.id2new_obj.insert(var.id, obj);
        }

        debug!(
            reduction = self.name(),
            variables = inverse.id2old_var.len(),
            constraints = constraints.len(),
            "eliminated variable attributes"
        );

        let mut new_problem = problem.tree_copy(&inverse.id2new_obj);
        new_problem.constraints.extend(constraints);
        Ok((new_problem, inverse))
    }

    fn invert(&self, solution: &Solution, inverse_data: &Attr2ConstrInverse) -> Result<Solution> {
        let mut primal_vars = HashMap::new();

        for (id, old_var) in &inverse_data.id2old_var {
            let Some(new_var) = inverse_data.id2new_var.get(id) else {
                continue;
            };
            let Some(value) = solution.primal_vars.get(&new_var.id) else {
                trace!(var_id = id.raw(), "no primal value, omitting");
                continue;
            };

            let recovered = if old_var.is_symmetric() {
                let full = unpack_upper_tri(value, old_var.shape.rows())?;
                if old_var.shape.is_scalar() {
                    Array::Scalar(full[(0, 0)])
                } else {
                    Array::Dense(full)
                }
            } else {
                value.clone()
            };
            primal_vars.insert(*id, recovered);
        }

        Ok(Solution::new(
            solution.status,
            solution.value,
            primal_vars,
            solution.dual_vars.clone(),
        ))
    }
}

/// Packed upper-triangle variable and the expression rebuilding the full
/// symmetric matrix from it.
fn packed_replacement(
    var: &VariableData,
    fill_cache: &mut HashMap<usize, Arc<Expr>>,
) -> Result<(VariableData, Arc<Expr>)> {
    if !var.shape.is_square() {
        return Err(CvxError::ShapeMismatch {
            expected: "square symmetric variable".into(),
            got: var.shape.to_string(),
        });
    }
    let n = var.shape.rows();

    let upper_tri = VariableData {
        id: ExprId::new(),
        shape: Shape::vector(upper_tri_len(n)),
        name: var.name.clone(),
        attributes: var.attributes.without_forcing(),
    };
    debug!(var_id = var.id.raw(), new_id = upper_tri.id.raw(), n, "packing symmetric variable");

    let fill = fill_cache
        .entry(n)
        .or_insert_with(|| Arc::new(constant_sparse(upper_tri_to_full(n))));
    let full_vec = Expr::MatMul(Arc::clone(fill), Arc::new(Expr::Variable(upper_tri.clone())));
    let obj = Arc::new(Expr::Reshape(Arc::new(full_vec), var.shape.clone()));

    Ok((upper_tri, obj))
}

/// The constraint enforcing a sign or semidefinite attribute on `obj`.
///
/// At most one constraint is produced; if several attributes are set the
/// first of nonneg, nonpos, psd, nsd wins.
fn attribute_constraint(attributes: &Attributes, obj: &Arc<Expr>) -> Option<ConstraintKind> {
    let obj = Arc::clone(obj);
    if attributes.nonneg {
        Some(ConstraintKind::NonNeg(obj))
    } else if attributes.nonpos {
        Some(ConstraintKind::NonPos(obj))
    } else if attributes.psd {
        Some(ConstraintKind::PSD(obj))
    } else if attributes.nsd {
        Some(ConstraintKind::NSD(obj))
    } else {
        None
    }
}
