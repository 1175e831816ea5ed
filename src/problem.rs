//! Problem definition.
//!
//! The `Problem` struct represents an optimization problem with:
//! - An objective (minimize or maximize)
//! - A set of constraints
//!
//! Use the builder pattern to construct problems:
//! ```ignore
//! let problem = Problem::minimize(objective)
//!     .subject_to([constraint1, constraint2])
//!     .build();
//! ```
//!
//! Reductions consume a `Problem` and produce a new one through
//! [`Problem::tree_copy`]; the input is never mutated.

use std::collections::HashMap;
use std::sync::Arc;

use crate::constraints::Constraint;
use crate::error::Result;
use crate::expr::expression::copy_child;
use crate::expr::{Array, Assignment, Expr, ExprId, VariableData};

/// Objective type for optimization problems.
#[derive(Debug, Clone)]
pub enum Objective {
    /// Minimize the expression.
    Minimize(Arc<Expr>),
    /// Maximize the expression.
    Maximize(Arc<Expr>),
}

impl Objective {
    /// Get the expression being optimized.
    pub fn expr(&self) -> &Expr {
        match self {
            Objective::Minimize(e) | Objective::Maximize(e) => e.as_ref(),
        }
    }

    /// The shared node holding the expression being optimized.
    pub fn root(&self) -> &Arc<Expr> {
        match self {
            Objective::Minimize(e) | Objective::Maximize(e) => e,
        }
    }

    /// Check if this is a minimization.
    pub fn is_minimize(&self) -> bool {
        matches!(self, Objective::Minimize(_))
    }

    /// Same sense, substituted expression.
    pub fn tree_copy(&self, id_objects: &HashMap<ExprId, Arc<Expr>>) -> Objective {
        match self {
            Objective::Minimize(e) => Objective::Minimize(copy_child(e, id_objects)),
            Objective::Maximize(e) => Objective::Maximize(copy_child(e, id_objects)),
        }
    }
}

/// An optimization problem.
#[derive(Debug, Clone)]
pub struct Problem {
    /// The objective to optimize.
    pub objective: Objective,
    /// The constraints.
    pub constraints: Vec<Constraint>,
}

impl Problem {
    /// Create a minimization problem.
    pub fn minimize(expr: Expr) -> ProblemBuilder {
        ProblemBuilder {
            objective: Objective::Minimize(Arc::new(expr)),
            constraints: Vec::new(),
        }
    }

    /// Create a maximization problem.
    pub fn maximize(expr: Expr) -> ProblemBuilder {
        ProblemBuilder {
            objective: Objective::Maximize(Arc::new(expr)),
            constraints: Vec::new(),
        }
    }

    /// Every variable leaf in the problem, objective first and then each
    /// constraint in order. Variables referenced several times repeat.
    pub fn variable_leaves(&self) -> Vec<&VariableData> {
        let mut leaves = self.objective.expr().variable_leaves();
        for c in &self.constraints {
            leaves.extend(c.variable_leaves());
        }
        leaves
    }

    /// Distinct variables in the problem, in order of first appearance.
    pub fn variables(&self) -> Vec<VariableData> {
        let mut seen = std::collections::HashSet::new();
        self.variable_leaves()
            .into_iter()
            .filter(|v| seen.insert(v.id))
            .cloned()
            .collect()
    }

    /// Distinct variable IDs, sorted.
    pub fn variable_ids(&self) -> Vec<ExprId> {
        let mut ids: Vec<ExprId> = self.variables().iter().map(|v| v.id).collect();
        ids.sort();
        ids
    }

    /// Structural copy of the whole problem with variable leaves substituted
    /// by id. Constraint ids are preserved.
    pub fn tree_copy(&self, id_objects: &HashMap<ExprId, Arc<Expr>>) -> Problem {
        Problem {
            objective: self.objective.tree_copy(id_objects),
            constraints: self
                .constraints
                .iter()
                .map(|c| c.tree_copy(id_objects))
                .collect(),
        }
    }

    /// Objective value at `values`.
    pub fn objective_value(&self, values: &Assignment) -> Result<Array> {
        self.objective.expr().value(values)
    }

    /// Largest constraint violation at `values` (0 when feasible or unconstrained).
    pub fn max_violation(&self, values: &Assignment) -> Result<f64> {
        self.constraints
            .iter()
            .map(|c| c.violation(values))
            .try_fold(0.0_f64, |acc, v| -> Result<f64> { Ok(acc.max(v?)) })
    }
}

/// Builder for constructing problems.
#[derive(Debug, Clone)]
pub struct ProblemBuilder {
    objective: Objective,
    constraints: Vec<Constraint>,
}

impl ProblemBuilder {
    /// Add constraints to the problem.
    pub fn subject_to(mut self, constraints: impl IntoIterator<Item = Constraint>) -> Self {
        self.constraints.extend(constraints);
        self
    }

    /// Add a single constraint.
    pub fn constraint(mut self, c: Constraint) -> Self {
        self.constraints.push(c);
        self
    }

    /// Build the problem.
    pub fn build(self) -> Problem {
        Problem {
            objective: self.objective,
            constraints: self.constraints,
        }
    }
}
