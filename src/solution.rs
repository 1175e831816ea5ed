//! Solution records exchanged with the solver layer.
//!
//! A `Solution` is keyed by variable and constraint ids. Reductions
//! re-key it on the way back from the solver, so the caller only ever sees
//! ids of the problem they built.

use std::collections::HashMap;

use nalgebra::DMatrix;

use crate::constraints::Constraint;
use crate::error::{CvxError, Result};
use crate::expr::{Array, Expr, ExprId};

/// Solution status reported by the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// Optimal solution found.
    Optimal,
    /// Optimal up to reduced accuracy.
    OptimalInaccurate,
    /// Problem is infeasible.
    Infeasible,
    /// Problem is unbounded.
    Unbounded,
    /// Maximum iterations reached.
    MaxIterations,
    /// Numerical difficulties.
    NumericalError,
    /// Unknown status.
    Unknown,
}

impl SolveStatus {
    /// True for statuses that come with primal values.
    pub fn has_solution(&self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::OptimalInaccurate)
    }
}

/// Solution of a problem.
#[derive(Debug, Clone)]
pub struct Solution {
    /// Solution status.
    pub status: SolveStatus,
    /// Optimal objective value (if solved).
    pub value: Option<f64>,
    /// Primal values keyed by variable id.
    pub primal_vars: HashMap<ExprId, Array>,
    /// Dual values keyed by constraint id.
    pub dual_vars: HashMap<ExprId, Array>,
}

impl Solution {
    /// Assemble a solution from a status, objective value and id-keyed values.
    pub fn new(
        status: SolveStatus,
        value: Option<f64>,
        primal_vars: HashMap<ExprId, Array>,
        dual_vars: HashMap<ExprId, Array>,
    ) -> Self {
        Solution {
            status,
            value,
            primal_vars,
            dual_vars,
        }
    }

    /// A solution carrying only a status, for failed solves.
    pub fn failure(status: SolveStatus) -> Self {
        Solution::new(status, None, HashMap::new(), HashMap::new())
    }

    /// Get the value of a variable by id.
    pub fn get_value(&self, var_id: ExprId) -> Option<&Array> {
        self.primal_vars.get(&var_id)
    }

    /// Get the dual value of a constraint.
    pub fn dual_value(&self, constraint: &Constraint) -> Option<&Array> {
        self.dual_vars.get(&constraint.id)
    }

    /// Check if the solution has dual values available.
    pub fn has_duals(&self) -> bool {
        !self.dual_vars.is_empty()
    }

    /// Get scalar value for a variable.
    ///
    /// # Panics
    ///
    /// Panics if the expression is not a variable, the variable is not in the
    /// solution, or the variable is not scalar. Use `try_value()` for explicit
    /// error handling, or `solution[&x]` for vectors and matrices.
    pub fn value(&self, var: &Expr) -> f64 {
        self.try_value(var).expect("failed to get scalar value")
    }

    /// Get scalar value for a variable, returning an error on failure.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The expression is not a variable
    /// - The variable is not in the solution
    /// - The variable is not scalar
    pub fn try_value(&self, var: &Expr) -> Result<f64> {
        let var_id = var
            .variable_id()
            .ok_or_else(|| CvxError::InvalidProblem("Expression is not a variable".into()))?;
        let arr = self
            .get_value(var_id)
            .ok_or_else(|| CvxError::InvalidProblem("Variable not in solution".into()))?;
        arr.as_scalar().ok_or_else(|| {
            CvxError::InvalidProblem(
                "Variable is not scalar; use index operator for vectors/matrices".into(),
            )
        })
    }
}

impl std::ops::Index<&Expr> for Solution {
    type Output = DMatrix<f64>;

    /// Get the matrix/vector value of a variable.
    ///
    /// # Panics
    ///
    /// Panics if the variable is not found or its value is not dense.
    fn index(&self, var: &Expr) -> &DMatrix<f64> {
        let var_id = var.variable_id().expect("Expression is not a variable");
        match self.get_value(var_id).expect("Variable not in solution") {
            Array::Dense(m) => m,
            Array::Scalar(_) => {
                panic!("Variable is scalar, use .value() method instead of indexing")
            }
            Array::Sparse(_) => panic!("Variable value is sparse"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::{zero, ConstraintExt};
    use crate::expr::variable;

    #[test]
    fn test_failure_has_no_values() {
        let s = Solution::failure(SolveStatus::Infeasible);
        assert!(s.value.is_none());
        assert!(s.primal_vars.is_empty());
        assert!(!s.has_duals());
        assert!(!s.status.has_solution());
    }

    #[test]
    fn test_scalar_and_matrix_access() {
        let x = variable(());
        let y = variable(2);
        let mut primal = HashMap::new();
        primal.insert(x.variable_id().unwrap(), Array::Scalar(5.0));
        primal.insert(y.variable_id().unwrap(), Array::from_vec(vec![1.0, 2.0]));
        let s = Solution::new(SolveStatus::Optimal, Some(1.0), primal, HashMap::new());

        assert_eq!(s.value(&x), 5.0);
        assert_eq!(s[&y][(1, 0)], 2.0);
        assert!(s.try_value(&y).is_err());
        assert!(s.try_value(&variable(())).is_err());
    }

    #[test]
    fn test_dual_lookup_by_constraint() {
        let x = variable(());
        let c = x.geq(&zero());
        let mut dual = HashMap::new();
        dual.insert(c.id, Array::Scalar(0.25));
        let s = Solution::new(SolveStatus::Optimal, None, HashMap::new(), dual);
        assert_eq!(s.dual_value(&c).and_then(Array::as_scalar), Some(0.25));
    }
}
