//! Packing between symmetric matrices and their upper triangle.
//!
//! An n x n symmetric matrix has n(n+1)/2 independent entries. The compact
//! form lists them in row-major upper-triangular order:
//! (0,0), (0,1), ..., (0,n-1), (1,1), ..., (n-1,n-1).
//!
//! `upper_tri_to_full` is the expression-level direction (a constant fill
//! matrix), `unpack_upper_tri` the numeric inverse used on solved values.

use nalgebra::DMatrix;
use nalgebra_sparse::CscMatrix;

use crate::error::{CvxError, Result};
use crate::expr::Array;
use crate::sparse::csc_from_triplets;

/// Length of the compact representation of an n x n symmetric matrix.
pub fn upper_tri_len(n: usize) -> usize {
    n * (n + 1) / 2
}

/// Upper-triangular (i, j) positions in compact order.
pub fn upper_tri_indices(n: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..n).flat_map(move |i| (i..n).map(move |j| (i, j)))
}

/// Fill matrix mapping a compact vector to the column-major vectorization
/// of the symmetric matrix it encodes.
///
/// The result is n^2 x n(n+1)/2 with one nonzero per column on the diagonal
/// and two per column off it.
pub fn upper_tri_to_full(n: usize) -> CscMatrix<f64> {
    let triplets = upper_tri_indices(n)
        .enumerate()
        .flat_map(|(k, (i, j))| {
            let upper = (i + j * n, k, 1.0);
            let lower = (j + i * n, k, 1.0);
            if i == j {
                vec![upper]
            } else {
                vec![upper, lower]
            }
        })
        .collect::<Vec<_>>();
    csc_from_triplets(n * n, upper_tri_len(n), triplets)
}

/// Extract the compact vector of a square matrix.
///
/// Only the upper triangle is read; the result is an n(n+1)/2 x 1 column.
pub fn pack_upper_tri(matrix: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    let n = matrix.nrows();
    if matrix.ncols() != n {
        return Err(CvxError::ShapeMismatch {
            expected: "square matrix".into(),
            got: format!("({}, {})", matrix.nrows(), matrix.ncols()),
        });
    }
    let values: Vec<f64> = upper_tri_indices(n).map(|(i, j)| matrix[(i, j)]).collect();
    Ok(DMatrix::from_vec(values.len(), 1, values))
}

/// Rebuild the n x n symmetric matrix from a solved compact vector.
///
/// Off-diagonal entries go to the strict upper triangle, which is mirrored
/// by adding its transpose; diagonal entries are written once.
pub fn unpack_upper_tri(compact: &Array, n: usize) -> Result<DMatrix<f64>> {
    let values = compact.to_dense();
    if values.len() != upper_tri_len(n) {
        return Err(CvxError::ShapeMismatch {
            expected: format!("({},)", upper_tri_len(n)),
            got: compact.shape().to_string(),
        });
    }

    let mut filled = DMatrix::zeros(n, n);
    let mut diagonal = Vec::with_capacity(n);
    for ((i, j), &v) in upper_tri_indices(n).zip(values.iter()) {
        if i == j {
            diagonal.push(v);
        } else {
            filled[(i, j)] = v;
        }
    }

    let mut full = &filled + filled.transpose();
    for (i, d) in diagonal.into_iter().enumerate() {
        full[(i, i)] = d;
    }
    Ok(full)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparse::csc_to_dense;

    #[test]
    fn test_upper_tri_len() {
        assert_eq!(upper_tri_len(0), 0);
        assert_eq!(upper_tri_len(1), 1);
        assert_eq!(upper_tri_len(2), 3);
        assert_eq!(upper_tri_len(4), 10);
    }

    #[test]
    fn test_indices_are_row_major() {
        let idx: Vec<_> = upper_tri_indices(3).collect();
        assert_eq!(idx, vec![(0, 0), (0, 1), (0, 2), (1, 1), (1, 2), (2, 2)]);
    }

    #[test]
    fn test_fill_matrix_2x2() {
        let fill = csc_to_dense(&upper_tri_to_full(2));
        // vec([[a, b], [b, c]]) column-major is [a, b, b, c].
        let expected = DMatrix::from_row_slice(
            4,
            3,
            &[
                1.0, 0.0, 0.0, //
                0.0, 1.0, 0.0, //
                0.0, 1.0, 0.0, //
                0.0, 0.0, 1.0,
            ],
        );
        assert_eq!(fill, expected);
    }

    #[test]
    fn test_fill_matrix_nnz() {
        let n = 5;
        let fill = upper_tri_to_full(n);
        assert_eq!((fill.nrows(), fill.ncols()), (25, 15));
        assert_eq!(fill.nnz(), n * n);
    }

    #[test]
    fn test_unpack_2x2() {
        let compact = Array::from_vec(vec![1.0, 2.0, 3.0]);
        let full = unpack_upper_tri(&compact, 2).unwrap();
        assert_eq!(full, DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 3.0]));
    }

    #[test]
    fn test_unpack_scalar() {
        let full = unpack_upper_tri(&Array::Scalar(7.0), 1).unwrap();
        assert_eq!(full, DMatrix::from_element(1, 1, 7.0));
    }

    #[test]
    fn test_unpack_wrong_length() {
        let compact = Array::from_vec(vec![1.0, 2.0]);
        assert!(matches!(
            unpack_upper_tri(&compact, 2),
            Err(CvxError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_pack_then_unpack() {
        let s = DMatrix::from_row_slice(3, 3, &[4.0, -1.0, 2.5, -1.0, 0.0, 3.0, 2.5, 3.0, 9.0]);
        let packed = pack_upper_tri(&s).unwrap();
        assert_eq!(packed.as_slice(), &[4.0, -1.0, 2.5, 0.0, 3.0, 9.0]);
        let full = unpack_upper_tri(&Array::Dense(packed), 3).unwrap();
        assert_eq!(full, s);
    }

    #[test]
    fn test_fill_agrees_with_unpack() {
        let n = 4;
        let compact: Vec<f64> = (0..upper_tri_len(n)).map(|k| k as f64 * 1.5 - 3.0).collect();
        let fill = csc_to_dense(&upper_tri_to_full(n));
        let vec_full = &fill * DMatrix::from_column_slice(compact.len(), 1, &compact);
        let via_fill = DMatrix::from_column_slice(n, n, vec_full.as_slice());
        let via_unpack = unpack_upper_tri(&Array::from_vec(compact), n).unwrap();
        assert_eq!(via_fill, via_unpack);
    }

    #[test]
    fn test_pack_rejects_non_square() {
        assert!(pack_upper_tri(&DMatrix::zeros(2, 3)).is_err());
    }
}
