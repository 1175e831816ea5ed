//! Constant expression creation.

use nalgebra::DMatrix;
use nalgebra_sparse::CscMatrix;

use super::expression::{Array, ConstantData, Expr, ExprId};
use super::shape::Shape;

/// Wrap an array as a constant expression with a fresh id.
pub fn constant_array(value: Array) -> Expr {
    Expr::Constant(ConstantData {
        id: ExprId::new(),
        value,
    })
}

/// Create a constant expression from a scalar.
pub fn constant(value: f64) -> Expr {
    constant_array(Array::Scalar(value))
}

/// Create a constant column vector.
pub fn constant_vec(values: Vec<f64>) -> Expr {
    constant_array(Array::from_vec(values))
}

/// Create a dense constant matrix from column-major values.
pub fn constant_matrix(values: Vec<f64>, rows: usize, cols: usize) -> Expr {
    constant_array(Array::Dense(DMatrix::from_vec(rows, cols, values)))
}

/// Create a constant expression from a nalgebra DMatrix.
pub fn constant_dmatrix(matrix: DMatrix<f64>) -> Expr {
    constant_array(Array::Dense(matrix))
}

/// Create a constant expression from a sparse CSC matrix.
pub fn constant_sparse(matrix: CscMatrix<f64>) -> Expr {
    constant_array(Array::Sparse(matrix))
}

/// Create a zero constant with the given shape.
pub fn zeros(shape: impl Into<Shape>) -> Expr {
    filled(shape.into(), 0.0)
}

/// Create a ones constant with the given shape.
pub fn ones(shape: impl Into<Shape>) -> Expr {
    filled(shape.into(), 1.0)
}

fn filled(shape: Shape, value: f64) -> Expr {
    if shape.is_scalar() {
        constant(value)
    } else {
        constant_dmatrix(DMatrix::from_element(shape.rows(), shape.cols(), value))
    }
}

/// Create an identity matrix constant.
pub fn eye(n: usize) -> Expr {
    constant_dmatrix(DMatrix::identity(n, n))
}

/// Extension trait for creating constants from various types.
pub trait IntoConstant {
    fn into_constant(self) -> Expr;
}

impl IntoConstant for f64 {
    fn into_constant(self) -> Expr {
        constant(self)
    }
}

impl IntoConstant for Vec<f64> {
    fn into_constant(self) -> Expr {
        constant_vec(self)
    }
}

impl IntoConstant for DMatrix<f64> {
    fn into_constant(self) -> Expr {
        constant_dmatrix(self)
    }
}

impl IntoConstant for CscMatrix<f64> {
    fn into_constant(self) -> Expr {
        constant_sparse(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_scalar() {
        let c = constant(5.0);
        assert_eq!(c.constant_value().and_then(Array::as_scalar), Some(5.0));
    }

    #[test]
    fn test_constant_ids_are_fresh() {
        let a = constant(1.0);
        let b = constant(1.0);
        match (a, b) {
            (Expr::Constant(a), Expr::Constant(b)) => assert_ne!(a.id, b.id),
            _ => panic!("Expected constants"),
        }
    }

    #[test]
    fn test_zeros_and_ones() {
        let z = zeros((3, 4));
        assert_eq!(z.shape(), Shape::matrix(3, 4));
        let value = z.constant_value().unwrap();
        assert!(value.is_nonneg() && value.is_nonpos());

        assert_eq!(ones(()).constant_value().and_then(Array::as_scalar), Some(1.0));
    }

    #[test]
    fn test_eye() {
        let e = eye(3);
        assert_eq!(e.shape(), Shape::matrix(3, 3));
        assert!(e.constant_value().unwrap().is_symmetric());
    }

    #[test]
    fn test_sparse_constant() {
        let m = CscMatrix::<f64>::identity(4);
        let c = m.into_constant();
        assert_eq!(c.shape(), Shape::matrix(4, 4));
    }
}
