//! Property tests for symmetric packing.

use cvxattr::prelude::*;
use cvxattr::sparse::csc_to_dense;
use nalgebra::DMatrix;
use proptest::prelude::*;

/// A matrix size together with a compact vector of matching length.
fn packed_symmetric() -> impl Strategy<Value = (usize, Vec<f64>)> {
    (1usize..7).prop_flat_map(|n| {
        (
            Just(n),
            proptest::collection::vec(-1.0e3..1.0e3f64, upper_tri_len(n)),
        )
    })
}

/// An arbitrary square matrix, symmetrized.
fn symmetric_matrix() -> impl Strategy<Value = DMatrix<f64>> {
    (1usize..7).prop_flat_map(|n| {
        proptest::collection::vec(-1.0e3..1.0e3f64, n * n).prop_map(move |v| {
            let m = DMatrix::from_vec(n, n, v);
            let upper = m.upper_triangle();
            let strict = &upper - DMatrix::from_diagonal(&upper.diagonal());
            upper + strict.transpose()
        })
    })
}

proptest! {
    /// Unpacking always yields a symmetric matrix.
    #[test]
    fn unpacked_is_symmetric((n, compact) in packed_symmetric()) {
        let full = unpack_upper_tri(&Array::from_vec(compact), n).unwrap();
        prop_assert_eq!(full.shape(), (n, n));
        prop_assert_eq!(&full, &full.transpose());
    }

    /// Packing a symmetric matrix and unpacking it gives it back exactly.
    #[test]
    fn pack_unpack_round_trip(s in symmetric_matrix()) {
        let n = s.nrows();
        let packed = pack_upper_tri(&s).unwrap();
        prop_assert_eq!(packed.len(), upper_tri_len(n));
        let full = unpack_upper_tri(&Array::Dense(packed), n).unwrap();
        prop_assert_eq!(full, s);
    }

    /// The fill matrix and the numeric unpack agree entry for entry.
    #[test]
    fn fill_matrix_matches_unpack((n, compact) in packed_symmetric()) {
        let fill = csc_to_dense(&upper_tri_to_full(n));
        let column = DMatrix::from_column_slice(compact.len(), 1, &compact);
        let vectorized = fill * column;
        let via_fill = DMatrix::from_column_slice(n, n, vectorized.as_slice());
        let via_unpack = unpack_upper_tri(&Array::from_vec(compact), n).unwrap();
        prop_assert_eq!(via_fill, via_unpack);
    }

    /// The rewritten symmetric variable evaluates to a symmetric matrix and
    /// inverts back to the same matrix.
    #[test]
    fn reduction_recovers_evaluated_matrix((n, compact) in packed_symmetric()) {
        let x = symmetric_variable(n);
        let id = x.variable_id().unwrap();
        let (_, inverse) = CvxAttr2Constr.apply(&Problem::minimize(trace(&x)).build()).unwrap();

        let packed_id = inverse.id2new_var[&id].id;
        let mut values = Assignment::new();
        values.insert(packed_id, Array::from_vec(compact.clone()));
        let evaluated = inverse.id2new_obj[&id].value(&values).unwrap().to_dense();
        prop_assert_eq!(&evaluated, &evaluated.transpose());

        let solution = Solution::new(SolveStatus::Optimal, None, values, Default::default());
        let recovered = CvxAttr2Constr.invert(&solution, &inverse).unwrap();
        prop_assert_eq!(recovered.get_value(id).unwrap().to_dense(), evaluated);
    }
}
