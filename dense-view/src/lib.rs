//! Evaluable dense containers, views and expression nodes.
//!
//! # Core Types
//!
//! - [`Matrix`]: owned, 32-byte aligned contiguous storage with static or dynamic extents
//! - [`Map`] / [`MapMut`]: contiguous views over borrowed slices
//! - [`Block`] / [`BlockMut`]: rectangular sub-views with an outer stride
//!
//! # Expression nodes
//!
//! Lazily evaluated and never allocated until assigned:
//! [`sum`], [`difference`], [`cwise_product`], [`scaled`], [`map`], [`cast`],
//! [`transpose`], and [`product`] (which is evaluated in bulk before assignment).

mod block;
mod evaluator;
mod map;
mod matrix;
mod ops;
mod product;
mod storage;

// ============================================================================
// Containers and views
// ============================================================================
pub use block::{Block, BlockMut};
pub use map::{Map, MapMut, VectorMap, VectorMapMut};
pub use matrix::{DMatrix, DVector, Matrix, Matrix2, Matrix3, Matrix4, Vector4};

// ============================================================================
// Evaluators
// ============================================================================
pub use evaluator::{DenseEvaluator, DenseEvaluatorMut};

// ============================================================================
// Expression nodes
// ============================================================================
pub use ops::{
    cast, cwise_product, difference, map, scaled, sum, transpose, BinaryOp, Cast, CwiseBinary,
    DifferenceOp, ProductOp, Scaled, SumOp, Transpose, UnaryExpr,
};
pub use product::{product, MatrixProduct};

// ============================================================================
// Error types
// ============================================================================

/// Errors that can occur while building views or assigning expressions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DenseError {
    /// Destination and source report different extents.
    #[error("shape mismatch: destination is {dst:?}, source is {src:?}")]
    ShapeMismatch {
        dst: (usize, usize),
        src: (usize, usize),
    },

    /// A runtime extent disagrees with the statically declared one.
    #[error("static {axis} mismatch: declared {declared}, got {actual}")]
    StaticDimMismatch {
        axis: &'static str,
        declared: usize,
        actual: usize,
    },

    /// Inner dimensions of a matrix product disagree.
    #[error("product mismatch: lhs has {lhs_cols} columns, rhs has {rhs_rows} rows")]
    ProductMismatch { lhs_cols: usize, rhs_rows: usize },

    /// A view or index would reach outside its backing storage.
    #[error("out of bounds: need {required} elements, have {len}")]
    OutOfBounds { required: usize, len: usize },

    /// The selected traversal cannot honour the requested element-wise operation.
    #[error("{op} is not supported by the {traversal} traversal")]
    UnsupportedOperation {
        traversal: &'static str,
        op: &'static str,
    },
}

/// Result type for dense operations.
pub type Result<T> = std::result::Result<T, DenseError>;

/// Check runtime extents against the statically declared ones.
pub(crate) fn check_static_dims(
    static_rows: usize,
    static_cols: usize,
    rows: usize,
    cols: usize,
) -> Result<()> {
    use dense_traits::is_dynamic;

    if !is_dynamic(static_rows) && static_rows != rows {
        return Err(DenseError::StaticDimMismatch {
            axis: "rows",
            declared: static_rows,
            actual: rows,
        });
    }
    if !is_dynamic(static_cols) && static_cols != cols {
        return Err(DenseError::StaticDimMismatch {
            axis: "cols",
            declared: static_cols,
            actual: cols,
        });
    }
    Ok(())
}

/// Number of elements spanned by a strided `rows x cols` view.
pub(crate) fn strided_extent(inner: usize, outer: usize, outer_stride: usize) -> Result<usize> {
    if inner == 0 || outer == 0 {
        return Ok(0);
    }
    let overflow = DenseError::OutOfBounds {
        required: usize::MAX,
        len: 0,
    };
    (outer - 1)
        .checked_mul(outer_stride)
        .and_then(|n| n.checked_add(inner))
        .ok_or(overflow)
}
