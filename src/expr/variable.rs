//! Variable creation with builder pattern.

use super::expression::{Attributes, Expr, ExprId, VariableData};
use super::shape::Shape;

/// Builder for creating variables with various attributes.
#[derive(Default)]
pub struct VariableBuilder {
    shape: Shape,
    name: Option<String>,
    attributes: Attributes,
}

impl VariableBuilder {
    /// Create a new variable builder with the given shape.
    pub fn new(shape: impl Into<Shape>) -> Self {
        Self {
            shape: shape.into(),
            ..Default::default()
        }
    }

    /// Create a scalar variable builder.
    pub fn scalar() -> Self {
        Self::new(Shape::scalar())
    }

    /// Create a vector variable builder.
    pub fn vector(n: usize) -> Self {
        Self::new(Shape::vector(n))
    }

    /// Create a matrix variable builder.
    pub fn matrix(m: usize, n: usize) -> Self {
        Self::new(Shape::matrix(m, n))
    }

    /// Set the name of the variable.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Constrain the variable to be non-negative (x >= 0).
    pub fn nonneg(mut self) -> Self {
        self.attributes.nonneg = true;
        self.attributes.nonpos = false;
        self
    }

    /// Constrain the variable to be non-positive (x <= 0).
    pub fn nonpos(mut self) -> Self {
        self.attributes.nonpos = true;
        self.attributes.nonneg = false;
        self
    }

    /// Declare the variable as a symmetric matrix (X == X').
    pub fn symmetric(mut self) -> Self {
        self.attributes.symmetric = true;
        self
    }

    /// Constrain the variable to be positive semidefinite (X >> 0).
    pub fn psd(mut self) -> Self {
        self.attributes.psd = true;
        self.attributes.nsd = false;
        self
    }

    /// Constrain the variable to be negative semidefinite (X << 0).
    pub fn nsd(mut self) -> Self {
        self.attributes.nsd = true;
        self.attributes.psd = false;
        self
    }

    /// Mark the variable as integer-valued.
    pub fn integer(mut self) -> Self {
        self.attributes.integer = true;
        self
    }

    /// Mark the variable as boolean-valued.
    pub fn boolean(mut self) -> Self {
        self.attributes.boolean = true;
        self
    }

    /// Replace the whole attribute set.
    pub fn attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Build the variable expression.
    pub fn build(self) -> Expr {
        Expr::Variable(self.build_data())
    }

    /// Build the bare variable record without wrapping it in an `Expr`.
    pub fn build_data(self) -> VariableData {
        VariableData {
            id: ExprId::new(),
            shape: self.shape,
            name: self.name,
            attributes: self.attributes,
        }
    }
}

/// Create a variable with the given shape.
///
/// # Examples
///
/// ```
/// use cvxattr::expr::variable;
///
/// // Scalar variable
/// let x = variable(());
///
/// // Vector variable
/// let y = variable(5);
///
/// // Matrix variable
/// let z = variable((3, 4));
/// ```
pub fn variable(shape: impl Into<Shape>) -> Expr {
    VariableBuilder::new(shape).build()
}

/// Extension trait for variable-like operations on Expr.
///
/// Each method is a no-op on expressions that are not variables.
pub trait VariableExt {
    /// Mark this variable non-negative.
    fn nonneg(self) -> Expr;

    /// Mark this variable non-positive.
    fn nonpos(self) -> Expr;

    /// Give a name to this expression (if it's a variable).
    fn named(self, name: impl Into<String>) -> Expr;
}

impl VariableExt for Expr {
    fn nonneg(self) -> Expr {
        match self {
            Expr::Variable(mut v) => {
                v.attributes.nonneg = true;
                v.attributes.nonpos = false;
                Expr::Variable(v)
            }
            other => other,
        }
    }

    fn nonpos(self) -> Expr {
        match self {
            Expr::Variable(mut v) => {
                v.attributes.nonpos = true;
                v.attributes.nonneg = false;
                Expr::Variable(v)
            }
            other => other,
        }
    }

    fn named(self, name: impl Into<String>) -> Expr {
        match self {
            Expr::Variable(mut v) => {
                v.name = Some(name.into());
                Expr::Variable(v)
            }
            other => other,
        }
    }
}

/// Create a named variable with the given shape.
pub fn named_variable(name: impl Into<String>, shape: impl Into<Shape>) -> Expr {
    VariableBuilder::new(shape).name(name).build()
}

/// Create a non-negative variable with the given shape.
pub fn nonneg_variable(shape: impl Into<Shape>) -> Expr {
    VariableBuilder::new(shape).nonneg().build()
}

/// Create a non-positive variable with the given shape.
pub fn nonpos_variable(shape: impl Into<Shape>) -> Expr {
    VariableBuilder::new(shape).nonpos().build()
}

/// Create an n x n symmetric matrix variable.
pub fn symmetric_variable(n: usize) -> Expr {
    VariableBuilder::matrix(n, n).symmetric().build()
}

/// Create an n x n positive semidefinite matrix variable.
pub fn psd_variable(n: usize) -> Expr {
    VariableBuilder::matrix(n, n).psd().build()
}

/// Create an n x n negative semidefinite matrix variable.
pub fn nsd_variable(n: usize) -> Expr {
    VariableBuilder::matrix(n, n).nsd().build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_builder() {
        let x = VariableBuilder::vector(5).name("x").nonneg().build();

        if let Expr::Variable(v) = &x {
            assert_eq!(v.shape, Shape::vector(5));
            assert_eq!(v.name, Some("x".to_string()));
            assert!(v.attributes.nonneg);
            assert!(!v.attributes.nonpos);
        } else {
            panic!("Expected Variable");
        }
    }

    #[test]
    fn test_sign_attributes_are_exclusive() {
        let v = VariableBuilder::scalar().nonneg().nonpos().build_data();
        assert!(v.attributes.nonpos);
        assert!(!v.attributes.nonneg);

        let v = VariableBuilder::matrix(2, 2).psd().nsd().build_data();
        assert!(v.attributes.nsd);
        assert!(!v.attributes.psd);
    }

    #[test]
    fn test_symmetric_builder() {
        let v = VariableBuilder::matrix(3, 3).symmetric().integer().build_data();
        assert!(v.is_symmetric());
        assert!(v.attributes.integer);
        assert_eq!(v.shape, Shape::matrix(3, 3));
    }

    #[test]
    fn test_variable_ext() {
        let x = variable(5).nonneg().named("x");
        if let Expr::Variable(v) = &x {
            assert!(v.attributes.nonneg);
            assert_eq!(v.name, Some("x".to_string()));
        } else {
            panic!("Expected Variable");
        }
    }

    #[test]
    fn test_convenience_functions() {
        assert_eq!(symmetric_variable(4).shape(), Shape::matrix(4, 4));
        assert!(psd_variable(2).as_variable().unwrap().attributes.psd);
        assert!(nsd_variable(2).as_variable().unwrap().attributes.nsd);
        assert!(nonpos_variable(3).as_variable().unwrap().attributes.nonpos);
    }
}
