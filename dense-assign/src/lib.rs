//! Assignment-evaluation engine for dense matrix expressions.
//!
//! Materializes an expression into a destination with an element-wise
//! functor (copy, add-into, ...). The traversal order and unrolling depth are
//! chosen at compile time from the static properties of both sides:
//!
//! - [`selector`]: the decision table, exposed per type pair as [`AssignmentTraits`]
//! - [`Kernel`]: the per-position primitive binding both evaluators and the functor
//! - [`executor`]: one loop per reachable (traversal, unrolling) pair
//! - [`dispatch`]: the entry points, shape-keyed [`Assignment`] dispatch and
//!   aliasing temporaries
//!
//! # Example
//!
//! ```
//! use dense_assign::{add_assign, assign};
//! use dense_view::{sum, Matrix4};
//!
//! let a = Matrix4::<f64>::from_fn(4, 4, |r, c| (r * 4 + c) as f64).unwrap();
//! let b = Matrix4::<f64>::from_fn(4, 4, |_, _| 1.0).unwrap();
//! let mut dst = Matrix4::<f64>::zeros(4, 4).unwrap();
//!
//! assign(&mut dst, &sum(&a, &b).unwrap()).unwrap();
//! add_assign(&mut dst, &b).unwrap();
//! assert_eq!(dst[(3, 2)], 16.0);
//! ```
//!
//! # Features
//!
//! - `simd`: run large dynamic loops inside `pulp`'s runtime target-feature dispatch.
//!
//! The unrolling budget defaults to 100 and can be changed at build time with
//! the `DENSE_ASSIGN_UNROLLING_LIMIT` environment variable.

pub mod dispatch;
pub mod executor;
pub mod kernel;
pub mod selector;
mod simd;
mod unroll;

pub use dispatch::{
    add_assign, assign, call_assignment, call_assignment_no_alias, call_dense_assignment_loop,
    mul_assign, run, sub_assign, Assignment, Kind, Temporary,
};
pub use executor::linear_vectorized_split;
pub use kernel::Kernel;
pub use selector::{
    select, AssignmentTraits, StaticInfo, Strategy, Traversal, Unrolling, UNROLLING_LIMIT,
};

pub use dense_view::{DenseError, Result};
