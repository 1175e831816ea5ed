//! Problem reductions.
//!
//! A reduction rewrites a problem into an equivalent one that a later stage
//! can handle, and maps solutions of the rewritten problem back. `apply`
//! returns the new problem with the data `invert` needs; the two are always
//! used as a pair.

pub mod cvx_attr2constr;
pub mod symmetric;

pub use cvx_attr2constr::{Attr2ConstrInverse, CvxAttr2Constr};
pub use symmetric::{pack_upper_tri, unpack_upper_tri, upper_tri_len, upper_tri_to_full};

use crate::error::Result;
use crate::problem::Problem;
use crate::solution::Solution;

/// A problem-to-problem rewrite with a matching solution inverse.
pub trait Reduction {
    /// Data recorded by `apply` and consumed by `invert`.
    type InverseData;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether this reduction can be applied to `problem`.
    fn accepts(&self, problem: &Problem) -> bool;

    /// Rewrite `problem`. The input is left untouched.
    fn apply(&self, problem: &Problem) -> Result<(Problem, Self::InverseData)>;

    /// Map a solution of the rewritten problem back to the original one.
    fn invert(&self, solution: &Solution, inverse_data: &Self::InverseData) -> Result<Solution>;
}
