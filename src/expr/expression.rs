//! Core expression types for cvxattr.
//!
//! The `Expr` enum represents the expression trees that reductions rewrite.
//! Expressions form an immutable DAG using `Arc` for sharing, so a rewritten
//! tree can reuse every subtree a reduction leaves alone.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use nalgebra::DMatrix;
use nalgebra_sparse::CscMatrix;

use super::shape::Shape;
use crate::sparse::csc_to_dense;

/// Unique identifier for variables, constants and constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(u64);

impl ExprId {
    /// Generate a new unique ID.
    pub fn new() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);
        ExprId(NEXT_ID.fetch_add(1, Ordering::SeqCst))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for ExprId {
    fn default() -> Self {
        Self::new()
    }
}

/// Numeric value storage (dense, sparse or scalar).
#[derive(Debug, Clone)]
pub enum Array {
    /// Dense matrix storage.
    Dense(DMatrix<f64>),
    /// Sparse CSC matrix storage.
    Sparse(CscMatrix<f64>),
    /// Scalar value.
    Scalar(f64),
}

impl Array {
    /// Get the shape of the array.
    pub fn shape(&self) -> Shape {
        match self {
            Array::Dense(m) => Shape::matrix(m.nrows(), m.ncols()),
            Array::Sparse(m) => Shape::matrix(m.nrows(), m.ncols()),
            Array::Scalar(_) => Shape::scalar(),
        }
    }

    /// Get the total number of elements.
    pub fn size(&self) -> usize {
        match self {
            Array::Dense(m) => m.nrows() * m.ncols(),
            Array::Sparse(m) => m.nrows() * m.ncols(),
            Array::Scalar(_) => 1,
        }
    }

    /// Try to get as a scalar value.
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Array::Scalar(v) => Some(*v),
            Array::Dense(m) if m.nrows() == 1 && m.ncols() == 1 => Some(m[(0, 0)]),
            _ => None,
        }
    }

    /// Materialize as a dense matrix. Scalars become 1x1.
    pub fn to_dense(&self) -> DMatrix<f64> {
        match self {
            Array::Dense(m) => m.clone(),
            Array::Sparse(m) => csc_to_dense(m),
            Array::Scalar(v) => DMatrix::from_element(1, 1, *v),
        }
    }

    /// Check if all elements are non-negative.
    pub fn is_nonneg(&self) -> bool {
        match self {
            Array::Scalar(v) => *v >= 0.0,
            Array::Dense(m) => m.iter().all(|&v| v >= 0.0),
            Array::Sparse(m) => m.values().iter().all(|&v| v >= 0.0),
        }
    }

    /// Check if all elements are non-positive.
    pub fn is_nonpos(&self) -> bool {
        match self {
            Array::Scalar(v) => *v <= 0.0,
            Array::Dense(m) => m.iter().all(|&v| v <= 0.0),
            Array::Sparse(m) => m.values().iter().all(|&v| v <= 0.0),
        }
    }

    /// Check exact symmetry. Scalars are symmetric, non-square arrays are not.
    pub fn is_symmetric(&self) -> bool {
        let m = self.to_dense();
        m.nrows() == m.ncols() && m == m.transpose()
    }

    /// Create from a vector.
    pub fn from_vec(v: Vec<f64>) -> Self {
        let n = v.len();
        Array::Dense(DMatrix::from_vec(n, 1, v))
    }

    /// Create from a dense matrix.
    pub fn from_matrix(m: DMatrix<f64>) -> Self {
        Array::Dense(m)
    }
}

impl From<f64> for Array {
    fn from(v: f64) -> Self {
        Array::Scalar(v)
    }
}

impl From<Vec<f64>> for Array {
    fn from(v: Vec<f64>) -> Self {
        Array::from_vec(v)
    }
}

impl From<DMatrix<f64>> for Array {
    fn from(m: DMatrix<f64>) -> Self {
        Array::Dense(m)
    }
}

/// Declarative attributes attached to a variable.
///
/// `nonneg`, `nonpos`, `symmetric`, `psd` and `nsd` restrict the feasible
/// set and are compiled away before solving. `integer` and `boolean` are
/// carried through untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Attributes {
    pub nonneg: bool,
    pub nonpos: bool,
    pub symmetric: bool,
    pub psd: bool,
    pub nsd: bool,
    pub integer: bool,
    pub boolean: bool,
}

impl Attributes {
    /// True if any attribute that must be turned into a constraint is set.
    pub fn has_forcing(&self) -> bool {
        self.nonneg || self.nonpos || self.symmetric || self.psd || self.nsd
    }

    /// Copy with every forcing attribute cleared.
    pub fn without_forcing(&self) -> Self {
        Attributes {
            nonneg: false,
            nonpos: false,
            symmetric: false,
            psd: false,
            nsd: false,
            ..*self
        }
    }
}

/// Data for a variable expression.
#[derive(Debug, Clone)]
pub struct VariableData {
    /// Unique identifier.
    pub id: ExprId,
    /// Shape of the variable.
    pub shape: Shape,
    /// Optional name for display.
    pub name: Option<String>,
    /// Declared attributes.
    pub attributes: Attributes,
}

impl VariableData {
    /// True if the variable is declared symmetric.
    pub fn is_symmetric(&self) -> bool {
        self.attributes.symmetric
    }
}

/// Data for a constant expression.
#[derive(Debug, Clone)]
pub struct ConstantData {
    /// Unique identifier.
    pub id: ExprId,
    /// The constant value.
    pub value: Array,
}

impl ConstantData {
    /// Get the shape of the constant.
    pub fn shape(&self) -> Shape {
        self.value.shape()
    }
}

/// Specification for indexing operations.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSpec {
    /// Ranges for each dimension: (start, stop, step).
    /// None means take the whole dimension.
    pub ranges: Vec<Option<(usize, usize, usize)>>,
}

impl IndexSpec {
    /// Create an index spec for a single element.
    pub fn element(indices: Vec<usize>) -> Self {
        IndexSpec {
            ranges: indices.into_iter().map(|i| Some((i, i + 1, 1))).collect(),
        }
    }

    /// Create an index spec for a range.
    pub fn range(start: usize, stop: usize) -> Self {
        IndexSpec {
            ranges: vec![Some((start, stop, 1))],
        }
    }

    /// Create an index spec that takes everything.
    pub fn all() -> Self {
        IndexSpec { ranges: vec![None] }
    }
}

/// The core expression type.
///
/// All expressions are immutable and use `Arc` for efficient sharing.
#[derive(Debug, Clone)]
pub enum Expr {
    // ========== Leaf nodes ==========
    /// A decision variable.
    Variable(VariableData),
    /// A constant value.
    Constant(ConstantData),

    // ========== Affine atoms ==========
    /// Addition: a + b
    Add(Arc<Expr>, Arc<Expr>),
    /// Negation: -a
    Neg(Arc<Expr>),
    /// Elementwise multiplication: a * b (either side may be scalar)
    Mul(Arc<Expr>, Arc<Expr>),
    /// Summation with optional axis.
    Sum(Arc<Expr>, Option<usize>),
    /// Reshape to new shape (column-major).
    Reshape(Arc<Expr>, Shape),
    /// Indexing/slicing.
    Index(Arc<Expr>, IndexSpec),
    /// Vertical stack: [a; b; ...]
    VStack(Vec<Arc<Expr>>),
    /// Horizontal stack: [a, b, ...]
    HStack(Vec<Arc<Expr>>),
    /// Transpose.
    Transpose(Arc<Expr>),
    /// Matrix trace.
    Trace(Arc<Expr>),
    /// Matrix-vector or matrix-matrix multiplication.
    MatMul(Arc<Expr>, Arc<Expr>),
    /// Diagonal matrix from vector (or diagonal of matrix).
    Diag(Arc<Expr>),

    // ========== Nonlinear atoms ==========
    /// L2 norm of the flattened argument.
    Norm2(Arc<Expr>),
    /// Absolute value (elementwise).
    Abs(Arc<Expr>),
    /// Sum of squares: ||x||_2^2
    SumSquares(Arc<Expr>),
    /// Quadratic form: x' P x
    QuadForm(Arc<Expr>, Arc<Expr>),
}

impl Expr {
    /// Get the shape of the expression.
    pub fn shape(&self) -> Shape {
        match self {
            Expr::Variable(v) => v.shape.clone(),
            Expr::Constant(c) => c.shape(),

            Expr::Add(a, b) | Expr::Mul(a, b) => a
                .shape()
                .broadcast(&b.shape())
                .unwrap_or_else(Shape::scalar),
            Expr::Neg(a) | Expr::Abs(a) => a.shape(),
            Expr::Sum(a, axis) => match axis {
                None => Shape::scalar(),
                Some(_) if a.shape().ndim() <= 1 => Shape::scalar(),
                Some(0) => Shape::vector(a.shape().cols()),
                Some(_) => Shape::vector(a.shape().rows()),
            },
            Expr::Reshape(_, shape) => shape.clone(),
            Expr::Index(a, spec) => {
                let base = a.shape();
                let mut new_dims = Vec::new();
                for (i, r) in spec.ranges.iter().enumerate() {
                    match r {
                        Some((start, stop, step)) => {
                            let size = stop.saturating_sub(*start).div_ceil((*step).max(1));
                            if size > 1 {
                                new_dims.push(size);
                            }
                        }
                        None => {
                            if i < base.ndim() {
                                new_dims.push(base.dims()[i]);
                            }
                        }
                    }
                }
                if new_dims.is_empty() {
                    Shape::scalar()
                } else {
                    Shape::from_dims(new_dims)
                }
            }
            Expr::VStack(exprs) => match exprs.first() {
                None => Shape::scalar(),
                Some(first) => {
                    let total_rows: usize = exprs.iter().map(|e| e.shape().rows()).sum();
                    Shape::matrix(total_rows, first.shape().cols())
                }
            },
            Expr::HStack(exprs) => match exprs.first() {
                None => Shape::scalar(),
                Some(first) => {
                    let total_cols: usize = exprs.iter().map(|e| e.shape().cols()).sum();
                    Shape::matrix(first.shape().rows(), total_cols)
                }
            },
            Expr::Transpose(a) => a.shape().transpose(),
            Expr::MatMul(a, b) => a.shape().matmul(&b.shape()).unwrap_or_else(Shape::scalar),
            Expr::Diag(a) => {
                let s = a.shape();
                if s.is_vector() {
                    let n = s.size();
                    Shape::matrix(n, n)
                } else {
                    Shape::vector(s.rows().min(s.cols()))
                }
            }
            Expr::Trace(_)
            | Expr::Norm2(_)
            | Expr::SumSquares(_)
            | Expr::QuadForm(_, _) => Shape::scalar(),
        }
    }

    /// Direct children of this node, in argument order.
    pub fn children(&self) -> Vec<&Arc<Expr>> {
        match self {
            Expr::Variable(_) | Expr::Constant(_) => Vec::new(),
            Expr::Add(a, b) | Expr::Mul(a, b) | Expr::MatMul(a, b) | Expr::QuadForm(a, b) => {
                vec![a, b]
            }
            Expr::Neg(a)
            | Expr::Sum(a, _)
            | Expr::Reshape(a, _)
            | Expr::Index(a, _)
            | Expr::Transpose(a)
            | Expr::Trace(a)
            | Expr::Diag(a)
            | Expr::Norm2(a)
            | Expr::Abs(a)
            | Expr::SumSquares(a) => vec![a],
            Expr::VStack(exprs) | Expr::HStack(exprs) => exprs.iter().collect(),
        }
    }

    /// Get the unique ID if this is a variable.
    pub fn variable_id(&self) -> Option<ExprId> {
        match self {
            Expr::Variable(v) => Some(v.id),
            _ => None,
        }
    }

    /// Get the variable data if this is a variable.
    pub fn as_variable(&self) -> Option<&VariableData> {
        match self {
            Expr::Variable(v) => Some(v),
            _ => None,
        }
    }

    /// Check if this expression is a constant.
    pub fn is_constant(&self) -> bool {
        matches!(self, Expr::Constant(_))
    }

    /// Check if this expression is a variable.
    pub fn is_variable(&self) -> bool {
        matches!(self, Expr::Variable(_))
    }

    /// Get the constant value if this is a constant expression.
    pub fn constant_value(&self) -> Option<&Array> {
        match self {
            Expr::Constant(c) => Some(&c.value),
            _ => None,
        }
    }

    /// Collect the distinct variable IDs in this expression.
    pub fn variables(&self) -> Vec<ExprId> {
        let mut vars: Vec<ExprId> = self.variable_leaves().iter().map(|v| v.id).collect();
        vars.sort();
        vars.dedup();
        vars
    }

    /// Every variable leaf in depth-first, left-to-right order.
    ///
    /// A variable referenced several times appears once per reference.
    pub fn variable_leaves(&self) -> Vec<&VariableData> {
        let mut leaves = Vec::new();
        self.collect_variable_leaves(&mut leaves);
        leaves
    }

    fn collect_variable_leaves<'a>(&'a self, leaves: &mut Vec<&'a VariableData>) {
        match self {
            Expr::Variable(v) => leaves.push(v),
            other => {
                for child in other.children() {
                    child.collect_variable_leaves(leaves);
                }
            }
        }
    }

    /// Structural copy with variable leaves substituted by id.
    ///
    /// Every variable whose id is a key of `id_objects` is replaced by the
    /// mapped expression; all occurrences share that one `Arc`. Constants and
    /// unmapped variables are shared with the original tree, every other node
    /// is rebuilt with the same operator and payload.
    pub fn tree_copy(&self, id_objects: &HashMap<ExprId, Arc<Expr>>) -> Expr {
        let copy = |child: &Arc<Expr>| copy_child(child, id_objects);
        match self {
            Expr::Variable(v) => match id_objects.get(&v.id) {
                Some(replacement) => replacement.as_ref().clone(),
                None => self.clone(),
            },
            Expr::Constant(_) => self.clone(),
            Expr::Add(a, b) => Expr::Add(copy(a), copy(b)),
            Expr::Neg(a) => Expr::Neg(copy(a)),
            Expr::Mul(a, b) => Expr::Mul(copy(a), copy(b)),
            Expr::Sum(a, axis) => Expr::Sum(copy(a), *axis),
            Expr::Reshape(a, shape) => Expr::Reshape(copy(a), shape.clone()),
            Expr::Index(a, spec) => Expr::Index(copy(a), spec.clone()),
            Expr::VStack(exprs) => Expr::VStack(exprs.iter().map(copy).collect()),
            Expr::HStack(exprs) => Expr::HStack(exprs.iter().map(copy).collect()),
            Expr::Transpose(a) => Expr::Transpose(copy(a)),
            Expr::Trace(a) => Expr::Trace(copy(a)),
            Expr::MatMul(a, b) => Expr::MatMul(copy(a), copy(b)),
            Expr::Diag(a) => Expr::Diag(copy(a)),
            Expr::Norm2(a) => Expr::Norm2(copy(a)),
            Expr::Abs(a) => Expr::Abs(copy(a)),
            Expr::SumSquares(a) => Expr::SumSquares(copy(a)),
            Expr::QuadForm(x, p) => Expr::QuadForm(copy(x), copy(p)),
        }
    }
}

/// Copy of a child node under `tree_copy` rules. A mapped variable leaf
/// returns the replacement `Arc` itself.
pub(crate) fn copy_child(child: &Arc<Expr>, id_objects: &HashMap<ExprId, Arc<Expr>>) -> Arc<Expr> {
    match child.as_ref() {
        Expr::Variable(v) => match id_objects.get(&v.id) {
            Some(replacement) => Arc::clone(replacement),
            None => Arc::clone(child),
        },
        Expr::Constant(_) => Arc::clone(child),
        other => Arc::new(other.tree_copy(id_objects)),
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        crate::expr::constant(value)
    }
}

impl From<i32> for Expr {
    fn from(value: i32) -> Self {
        crate::expr::constant(value as f64)
    }
}

impl From<&Expr> for Expr {
    fn from(expr: &Expr) -> Self {
        expr.clone()
    }
}

impl From<VariableData> for Expr {
    fn from(data: VariableData) -> Self {
        Expr::Variable(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{constant, variable, VariableBuilder};

    #[test]
    fn test_expr_id() {
        let id1 = ExprId::new();
        let id2 = ExprId::new();
        assert_ne!(id1, id2);
        assert!(id1 < id2);
    }

    #[test]
    fn test_array_to_dense() {
        assert_eq!(Array::Scalar(2.0).to_dense(), DMatrix::from_element(1, 1, 2.0));
        let arr = Array::from_vec(vec![1.0, 2.0, 3.0]);
        assert_eq!(arr.shape(), Shape::matrix(3, 1));
        assert_eq!(arr.to_dense()[(2, 0)], 3.0);
    }

    #[test]
    fn test_array_is_symmetric() {
        let s = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 3.0]);
        assert!(Array::Dense(s).is_symmetric());
        let ns = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 0.0, 3.0]);
        assert!(!Array::Dense(ns).is_symmetric());
        assert!(!Array::from_vec(vec![1.0, 2.0]).is_symmetric());
    }

    #[test]
    fn test_attributes_without_forcing() {
        let attrs = Attributes {
            nonneg: true,
            symmetric: true,
            integer: true,
            ..Default::default()
        };
        assert!(attrs.has_forcing());
        let cleared = attrs.without_forcing();
        assert!(!cleared.has_forcing());
        assert!(cleared.integer);
    }

    #[test]
    fn test_variable_leaves_keep_duplicates() {
        let x = variable(3);
        let y = variable(3);
        let e = &(&x + &y) + &x;
        assert_eq!(e.variable_leaves().len(), 3);
        assert_eq!(e.variables().len(), 2);
    }

    #[test]
    fn test_tree_copy_substitutes_leaves() {
        let x = variable(3);
        let x_id = x.variable_id().unwrap();
        let c = constant(1.0);
        let e = &(&x + &c) + &x;

        let replacement = Arc::new(VariableBuilder::vector(3).build());
        let mut table = HashMap::new();
        table.insert(x_id, Arc::clone(&replacement));

        let copied = e.tree_copy(&table);
        let leaves = copied.variable_leaves();
        assert_eq!(leaves.len(), 2);
        assert!(leaves.iter().all(|v| Some(v.id) == replacement.variable_id()));
        // Original tree untouched.
        assert!(e.variable_leaves().iter().all(|v| v.id == x_id));
    }

    #[test]
    fn test_tree_copy_shares_constants() {
        let x = variable(());
        let c = Arc::new(constant(2.0));
        let e = Expr::Mul(Arc::clone(&c), Arc::new(x));
        let copied = e.tree_copy(&HashMap::new());
        match copied {
            Expr::Mul(a, _) => assert!(Arc::ptr_eq(&a, &c)),
            other => panic!("Expected Mul, got {:?}", other),
        }
    }

    #[test]
    fn test_sum_axis_shape() {
        let x = variable((3, 4));
        assert_eq!(Expr::Sum(Arc::new(x.clone()), Some(0)).shape(), Shape::vector(4));
        assert_eq!(Expr::Sum(Arc::new(x), Some(1)).shape(), Shape::vector(3));
    }
}
