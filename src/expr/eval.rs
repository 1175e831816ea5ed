//! Numeric evaluation of expressions.
//!
//! Given values for the variables in a tree, compute the value of the tree.
//! Reductions are checked against this: a rewritten problem evaluated at the
//! substituted point must agree with the original one.

use std::collections::HashMap;

use nalgebra::DMatrix;

use super::expression::{Array, Expr, ExprId, IndexSpec};
use crate::error::{CvxError, Result};

/// Variable assignment used for evaluation.
pub type Assignment = HashMap<ExprId, Array>;

impl Expr {
    /// Evaluate the expression under `values`.
    ///
    /// Scalars come back as `Array::Scalar`, everything else as a dense
    /// matrix (vectors are n x 1).
    pub fn value(&self, values: &Assignment) -> Result<Array> {
        let m = self.eval_dense(values)?;
        if self.shape().is_scalar() && m.len() == 1 {
            Ok(Array::Scalar(m[(0, 0)]))
        } else {
            Ok(Array::Dense(m))
        }
    }

    fn eval_dense(&self, values: &Assignment) -> Result<DMatrix<f64>> {
        match self {
            Expr::Variable(v) => {
                let value = values.get(&v.id).ok_or_else(|| {
                    CvxError::InvalidProblem(format!(
                        "no value assigned to variable {}",
                        v.name.clone().unwrap_or_else(|| v.id.raw().to_string())
                    ))
                })?;
                let dense = value.to_dense();
                if dense.len() != v.shape.size() {
                    return Err(CvxError::ShapeMismatch {
                        expected: v.shape.to_string(),
                        got: value.shape().to_string(),
                    });
                }
                Ok(reshape_col_major(&dense, v.shape.rows(), v.shape.cols()))
            }
            Expr::Constant(c) => Ok(c.value.to_dense()),

            Expr::Add(a, b) => elementwise(a.eval_dense(values)?, b.eval_dense(values)?, |x, y| x + y),
            Expr::Mul(a, b) => elementwise(a.eval_dense(values)?, b.eval_dense(values)?, |x, y| x * y),
            Expr::Neg(a) => Ok(-a.eval_dense(values)?),
            Expr::Abs(a) => Ok(a.eval_dense(values)?.map(f64::abs)),
            Expr::Sum(a, axis) => {
                let m = a.eval_dense(values)?;
                Ok(match axis {
                    Some(_) if a.shape().ndim() <= 1 => scalar(m.sum()),
                    Some(0) => column(m.row_sum().as_slice()),
                    Some(_) => column(m.column_sum().as_slice()),
                    None => scalar(m.sum()),
                })
            }
            Expr::Reshape(a, shape) => {
                let m = a.eval_dense(values)?;
                if m.len() != shape.size() {
                    return Err(CvxError::ShapeMismatch {
                        expected: shape.to_string(),
                        got: format!("({}, {})", m.nrows(), m.ncols()),
                    });
                }
                Ok(reshape_col_major(&m, shape.rows(), shape.cols()))
            }
            Expr::Index(a, spec) => index(&a.eval_dense(values)?, spec),
            Expr::VStack(exprs) => {
                let parts = exprs
                    .iter()
                    .map(|e| e.eval_dense(values))
                    .collect::<Result<Vec<_>>>()?;
                stack(&parts, true)
            }
            Expr::HStack(exprs) => {
                let parts = exprs
                    .iter()
                    .map(|e| e.eval_dense(values))
                    .collect::<Result<Vec<_>>>()?;
                stack(&parts, false)
            }
            Expr::Transpose(a) => Ok(a.eval_dense(values)?.transpose()),
            Expr::Trace(a) => {
                let m = a.eval_dense(values)?;
                if m.nrows() != m.ncols() {
                    return Err(shape_error("square matrix", &m));
                }
                Ok(scalar(m.trace()))
            }
            Expr::MatMul(a, b) => {
                let (sa, sb) = (a.shape(), b.shape());
                let ma = a.eval_dense(values)?;
                let mb = b.eval_dense(values)?;
                // A leading vector acts as a row vector.
                let lhs = if sa.is_vector() { ma.transpose() } else { ma };
                if lhs.ncols() != mb.nrows() {
                    return Err(CvxError::ShapeMismatch {
                        expected: format!("{} columns on the left operand", mb.nrows()),
                        got: format!("({}, {}) @ {}", lhs.nrows(), lhs.ncols(), sb),
                    });
                }
                let product = lhs * mb;
                Ok(if sa.is_vector() && sb.is_matrix() {
                    product.transpose()
                } else {
                    product
                })
            }
            Expr::Diag(a) => {
                let m = a.eval_dense(values)?;
                if a.shape().is_vector() {
                    Ok(DMatrix::from_diagonal(&m.column(0).into_owned()))
                } else {
                    let n = m.nrows().min(m.ncols());
                    Ok(DMatrix::from_fn(n, 1, |i, _| m[(i, i)]))
                }
            }
            Expr::Norm2(a) => Ok(scalar(a.eval_dense(values)?.norm())),
            Expr::SumSquares(a) => Ok(scalar(a.eval_dense(values)?.norm_squared())),
            Expr::QuadForm(x, p) => {
                let xv = x.eval_dense(values)?;
                let pm = p.eval_dense(values)?;
                if pm.nrows() != xv.len() || pm.ncols() != xv.len() {
                    return Err(shape_error("square matrix matching x", &pm));
                }
                let col = reshape_col_major(&xv, xv.len(), 1);
                Ok(scalar((col.transpose() * pm * &col)[(0, 0)]))
            }
        }
    }
}

fn scalar(v: f64) -> DMatrix<f64> {
    DMatrix::from_element(1, 1, v)
}

fn column(values: &[f64]) -> DMatrix<f64> {
    DMatrix::from_column_slice(values.len(), 1, values)
}

fn shape_error(expected: &str, got: &DMatrix<f64>) -> CvxError {
    CvxError::ShapeMismatch {
        expected: expected.to_string(),
        got: format!("({}, {})", got.nrows(), got.ncols()),
    }
}

/// Reinterpret the column-major storage of `m` as a `rows x cols` matrix.
fn reshape_col_major(m: &DMatrix<f64>, rows: usize, cols: usize) -> DMatrix<f64> {
    DMatrix::from_column_slice(rows, cols, m.as_slice())
}

/// Elementwise binary op with scalar broadcasting.
fn elementwise(
    a: DMatrix<f64>,
    b: DMatrix<f64>,
    op: impl Fn(f64, f64) -> f64,
) -> Result<DMatrix<f64>> {
    if a.shape() == b.shape() {
        Ok(a.zip_map(&b, op))
    } else if b.len() == 1 {
        let s = b[(0, 0)];
        Ok(a.map(|x| op(x, s)))
    } else if a.len() == 1 {
        let s = a[(0, 0)];
        Ok(b.map(|y| op(s, y)))
    } else {
        Err(CvxError::ShapeMismatch {
            expected: format!("({}, {})", a.nrows(), a.ncols()),
            got: format!("({}, {})", b.nrows(), b.ncols()),
        })
    }
}

fn index(m: &DMatrix<f64>, spec: &IndexSpec) -> Result<DMatrix<f64>> {
    let select = |range: Option<&Option<(usize, usize, usize)>>, len: usize| -> Result<Vec<usize>> {
        match range {
            None | Some(None) => Ok((0..len).collect()),
            Some(Some((start, stop, step))) => {
                if *start > *stop || *stop > len || *step == 0 {
                    return Err(CvxError::InvalidProblem(format!(
                        "invalid index range {}..{} for dimension {}",
                        start, stop, len
                    )));
                }
                Ok((*start..*stop).step_by(*step).collect())
            }
        }
    };
    let rows = select(spec.ranges.first(), m.nrows())?;
    let cols = select(spec.ranges.get(1), m.ncols())?;
    Ok(DMatrix::from_fn(rows.len(), cols.len(), |i, j| m[(rows[i], cols[j])]))
}

fn stack(parts: &[DMatrix<f64>], vertical: bool) -> Result<DMatrix<f64>> {
    let Some(first) = parts.first() else {
        return Ok(scalar(0.0));
    };
    let (mut nrows, mut ncols) = (0, 0);
    for p in parts {
        if vertical {
            if p.ncols() != first.ncols() {
                return Err(shape_error(&format!("{} columns", first.ncols()), p));
            }
            nrows += p.nrows();
            ncols = p.ncols();
        } else {
            if p.nrows() != first.nrows() {
                return Err(shape_error(&format!("{} rows", first.nrows()), p));
            }
            ncols += p.ncols();
            nrows = p.nrows();
        }
    }
    let mut out = DMatrix::zeros(nrows, ncols);
    let mut offset = 0;
    for p in parts {
        if vertical {
            out.view_mut((offset, 0), (p.nrows(), p.ncols())).copy_from(p);
            offset += p.nrows();
        } else {
            out.view_mut((0, offset), (p.nrows(), p.ncols())).copy_from(p);
            offset += p.ncols();
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::{hstack, matmul, reshape, slice, sum, sum_axis, trace, transpose, vstack};
    use crate::expr::{constant, constant_dmatrix, constant_vec, variable, Shape};

    fn assign(pairs: Vec<(&Expr, Array)>) -> Assignment {
        pairs
            .into_iter()
            .map(|(e, v)| (e.variable_id().unwrap(), v))
            .collect()
    }

    #[test]
    fn test_eval_affine() {
        let x = variable(3);
        let values = assign(vec![(&x, Array::from_vec(vec![1.0, 2.0, 3.0]))]);

        let e = &(2.0 * &x) + &constant(1.0);
        let v = e.value(&values).unwrap().to_dense();
        assert_eq!(v.as_slice(), &[3.0, 5.0, 7.0]);

        assert_eq!(sum(&x).value(&values).unwrap().as_scalar(), Some(6.0));
    }

    #[test]
    fn test_eval_missing_variable() {
        let x = variable(2);
        assert!(matches!(
            x.value(&Assignment::new()),
            Err(CvxError::InvalidProblem(_))
        ));
    }

    #[test]
    fn test_eval_wrong_size() {
        let x = variable(2);
        let values = assign(vec![(&x, Array::from_vec(vec![1.0, 2.0, 3.0]))]);
        assert!(matches!(
            x.value(&values),
            Err(CvxError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_eval_reshape_is_column_major() {
        let x = variable(4);
        let values = assign(vec![(&x, Array::from_vec(vec![1.0, 2.0, 3.0, 4.0]))]);
        let m = reshape(&x, (2, 2)).value(&values).unwrap().to_dense();
        assert_eq!(m, DMatrix::from_row_slice(2, 2, &[1.0, 3.0, 2.0, 4.0]));
    }

    #[test]
    fn test_eval_matmul_trace_transpose() {
        let a = constant_dmatrix(DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]));
        let x = variable(2);
        let values = assign(vec![(&x, Array::from_vec(vec![1.0, 1.0]))]);

        let ax = matmul(&a, &x).value(&values).unwrap().to_dense();
        assert_eq!(ax.as_slice(), &[3.0, 7.0]);

        assert_eq!(trace(&a).value(&values).unwrap().as_scalar(), Some(5.0));
        let at = transpose(&a).value(&values).unwrap().to_dense();
        assert_eq!(at[(0, 1)], 3.0);
    }

    #[test]
    fn test_eval_sum_axis_and_stack() {
        let m = constant_dmatrix(DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]));
        let empty = Assignment::new();
        let cols = sum_axis(&m, 0).value(&empty).unwrap().to_dense();
        assert_eq!(cols.as_slice(), &[5.0, 7.0, 9.0]);
        let rows = sum_axis(&m, 1).value(&empty).unwrap().to_dense();
        assert_eq!(rows.as_slice(), &[6.0, 15.0]);

        let v = vstack(vec![constant_vec(vec![1.0]), constant_vec(vec![2.0, 3.0])]);
        assert_eq!(v.value(&empty).unwrap().to_dense().as_slice(), &[1.0, 2.0, 3.0]);
        let h = hstack(vec![constant_vec(vec![1.0, 2.0]), constant_vec(vec![3.0, 4.0])]);
        assert_eq!(h.value(&empty).unwrap().shape(), Shape::matrix(2, 2));
    }

    #[test]
    fn test_eval_quad_form() {
        let x = variable(2);
        let p = constant_dmatrix(DMatrix::from_row_slice(2, 2, &[2.0, 0.0, 0.0, 3.0]));
        let values = assign(vec![(&x, Array::from_vec(vec![1.0, 2.0]))]);
        let q = crate::atoms::quad_form(&x, &p).value(&values).unwrap();
        assert_eq!(q.as_scalar(), Some(14.0));
    }

    #[test]
    fn test_eval_slice() {
        let x = variable(5);
        let values = assign(vec![(&x, Array::from_vec(vec![0.0, 1.0, 2.0, 3.0, 4.0]))]);
        let s = slice(&x, 1, 4).value(&values).unwrap().to_dense();
        assert_eq!(s.as_slice(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_eval_bad_ranges_are_errors() {
        let x = variable(5);
        let values = assign(vec![(&x, Array::from_vec(vec![0.0; 5]))]);

        let reversed = slice(&x, 3, 1);
        assert_eq!(reversed.shape(), Shape::scalar());
        assert!(matches!(reversed.value(&values), Err(CvxError::InvalidProblem(_))));

        let zero_step = Expr::Index(
            std::sync::Arc::new(x.clone()),
            IndexSpec { ranges: vec![Some((0, 4, 0))] },
        );
        assert!(matches!(zero_step.value(&values), Err(CvxError::InvalidProblem(_))));

        assert!(matches!(slice(&x, 2, 9).value(&values), Err(CvxError::InvalidProblem(_))));
    }
}
