//! Shared contracts for the dense assignment engine.
//!
//! This crate provides the trait definitions consumed by `dense-assign`
//! and implemented by `dense-view` (and by external expression crates):
//!
//! - [`Scalar`] / [`PacketTraits`]: the numeric primitive layer, keyed by scalar type
//! - [`Flags`], [`StorageOrder`], shape tags: the static properties of an expression
//! - [`Expr`], [`Evaluate`], [`EvaluateMut`]: expression descriptors and their evaluators
//! - [`AssignFunctor`] and implementations ([`AssignOp`], [`AddAssignOp`],
//!   [`SubAssignOp`], [`MulAssignOp`]): element-wise assignment operations
//!
//! External crates can depend on `dense-traits` to make their own expression
//! types assignable without orphan rule violations.

pub mod evaluator;
pub mod expr;
pub mod flags;
pub mod functor;
pub mod order;
pub mod packet;
pub mod scalar;
pub mod shape;

pub use evaluator::{Evaluate, EvaluateMut, Evaluator, EvaluatorMut, Geometry};
pub use expr::{is_dynamic, static_add, static_mul, Expr, SameScalarAs, DYNAMIC};
pub use flags::Flags;
pub use functor::{AddAssignOp, AssignFunctor, AssignOp, MulAssignOp, SubAssignOp};
pub use order::{ColMajor, RowMajor, StorageOrder};
pub use packet::{first_aligned, Aligned, Alignment, Packet, PacketTraits, Unaligned, PACKET_BYTES};
pub use scalar::Scalar;
pub use shape::{
    AssignmentKind, Band, Dense, Dense2Dense, Diagonal, SelfAdjoint, ShapeTag, Sparse,
    Sparse2Dense, Sparse2Sparse, Triangular, Triangular2Triangular,
};
