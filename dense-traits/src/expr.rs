//! Static description of an expression.
//!
//! Every property the strategy selector reads is an associated constant, so
//! a (destination, source) type pair determines its traversal entirely at
//! compile time. Unknown extents use the [`DYNAMIC`] sentinel.

use crate::flags::Flags;
use crate::order::StorageOrder;
use crate::packet::PacketTraits;
use crate::shape::ShapeTag;

/// Sentinel for an extent or cost only known at runtime.
pub const DYNAMIC: usize = usize::MAX;

#[inline]
pub const fn is_dynamic(n: usize) -> bool {
    n == DYNAMIC
}

/// Product of two static quantities; dynamic if either side is (or on overflow).
pub const fn static_mul(a: usize, b: usize) -> usize {
    if is_dynamic(a) || is_dynamic(b) {
        return DYNAMIC;
    }
    match a.checked_mul(b) {
        Some(n) if n != DYNAMIC => n,
        _ => DYNAMIC,
    }
}

/// Sum of two static quantities; dynamic if either side is (or on overflow).
pub const fn static_add(a: usize, b: usize) -> usize {
    if is_dynamic(a) || is_dynamic(b) {
        return DYNAMIC;
    }
    match a.checked_add(b) {
        Some(n) if n != DYNAMIC => n,
        _ => DYNAMIC,
    }
}

/// Static and runtime shape information of a matrix expression.
pub trait Expr {
    type Scalar: PacketTraits;
    type Order: StorageOrder;
    type Shape: ShapeTag;

    /// Row count, or [`DYNAMIC`].
    const ROWS: usize;
    /// Column count, or [`DYNAMIC`].
    const COLS: usize;
    /// Upper bound on the row count, or [`DYNAMIC`].
    const MAX_ROWS: usize = Self::ROWS;
    /// Upper bound on the column count, or [`DYNAMIC`].
    const MAX_COLS: usize = Self::COLS;

    const FLAGS: Flags;

    /// Estimated cost of reading one coefficient, or [`DYNAMIC`] if unknown.
    const COEFF_READ_COST: usize;

    /// The expression must be evaluated in bulk through
    /// [`Evaluator::eval_to`](crate::Evaluator::eval_to).
    const EVAL_BEFORE_ASSIGN: bool = false;

    /// Assignment must go through a temporary, since the expression may read
    /// the destination after it has been partially written.
    const ASSUME_ALIASING: bool = false;

    // Derived

    /// Storage order as seen by the traversal.
    ///
    /// A static row vector is row-major and a static column vector
    /// column-major whatever `Order` says, so two vectors only agree when
    /// they run along the same axis.
    const ROW_MAJOR: bool = if Self::ROWS == 1 && Self::COLS != 1 {
        true
    } else if Self::COLS == 1 && Self::ROWS != 1 {
        false
    } else {
        <Self::Order as StorageOrder>::ROW_MAJOR
    };
    const SIZE: usize = static_mul(Self::ROWS, Self::COLS);
    const MAX_SIZE: usize = static_mul(Self::MAX_ROWS, Self::MAX_COLS);
    const IS_VECTOR: bool = Self::ROWS == 1 || Self::COLS == 1;

    const INNER_SIZE: usize = if Self::IS_VECTOR {
        Self::SIZE
    } else if Self::ROW_MAJOR {
        Self::COLS
    } else {
        Self::ROWS
    };

    const MAX_INNER_SIZE: usize = if Self::IS_VECTOR {
        Self::MAX_SIZE
    } else if Self::ROW_MAJOR {
        Self::MAX_COLS
    } else {
        Self::MAX_ROWS
    };

    fn rows(&self) -> usize;

    fn cols(&self) -> usize;

    #[inline]
    fn size(&self) -> usize {
        self.rows() * self.cols()
    }

    /// Extent of the axis adjacent in memory (the whole size for vectors).
    #[inline]
    fn inner_size(&self) -> usize {
        if Self::IS_VECTOR {
            self.size()
        } else if Self::ROW_MAJOR {
            self.cols()
        } else {
            self.rows()
        }
    }

    #[inline]
    fn outer_size(&self) -> usize {
        if Self::IS_VECTOR {
            1
        } else if Self::ROW_MAJOR {
            self.rows()
        } else {
            self.cols()
        }
    }
}

/// Scalar identity between two expressions.
///
/// Assignments bound their source by `SameScalarAs<Dst>`, so a mixed-type
/// assignment is rejected at compile time with a message pointing at the
/// explicit conversion.
#[diagnostic::on_unimplemented(
    message = "cannot assign an expression of `{Self}` to a destination with a different scalar type",
    label = "scalar type differs from the destination `{D}`",
    note = "convert the source explicitly, e.g. with `dense_view::cast`"
)]
pub trait SameScalarAs<D: Expr>: Expr<Scalar = D::Scalar> {}

impl<D: Expr, S: Expr<Scalar = D::Scalar>> SameScalarAs<D> for S {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{ColMajor, RowMajor};
    use crate::shape::Dense;

    struct Fixed<const R: usize, const C: usize, O>(std::marker::PhantomData<O>);

    impl<const R: usize, const C: usize, O: StorageOrder> Expr for Fixed<R, C, O> {
        type Scalar = f64;
        type Order = O;
        type Shape = Dense;
        const ROWS: usize = R;
        const COLS: usize = C;
        const FLAGS: Flags = Flags::NONE;
        const COEFF_READ_COST: usize = 1;

        fn rows(&self) -> usize {
            R
        }

        fn cols(&self) -> usize {
            C
        }
    }

    fn fixed<const R: usize, const C: usize, O>() -> Fixed<R, C, O> {
        Fixed(std::marker::PhantomData)
    }

    #[test]
    fn test_static_arithmetic() {
        assert_eq!(static_mul(3, 4), 12);
        assert_eq!(static_mul(DYNAMIC, 4), DYNAMIC);
        assert_eq!(static_mul(usize::MAX / 2, 3), DYNAMIC);
        assert_eq!(static_add(3, DYNAMIC), DYNAMIC);
        assert_eq!(static_add(3, 4), 7);
        assert!(is_dynamic(DYNAMIC));
        assert!(!is_dynamic(0));
    }

    #[test]
    fn test_inner_outer_by_order() {
        type R = Fixed<3, 5, RowMajor>;
        type C = Fixed<3, 5, ColMajor>;
        assert_eq!(R::INNER_SIZE, 5);
        assert_eq!(C::INNER_SIZE, 3);
        assert_eq!(R::SIZE, 15);
        assert!(!R::IS_VECTOR);

        let r = fixed::<3, 5, RowMajor>();
        assert_eq!((r.inner_size(), r.outer_size()), (5, 3));
        let c = fixed::<3, 5, ColMajor>();
        assert_eq!((c.inner_size(), c.outer_size()), (3, 5));
    }

    #[test]
    fn test_vectors_have_single_outer() {
        type Row = Fixed<1, 7, ColMajor>;
        assert!(Row::IS_VECTOR);
        assert_eq!(Row::INNER_SIZE, 7);
        let v = fixed::<1, 7, ColMajor>();
        assert_eq!((v.inner_size(), v.outer_size()), (7, 1));
    }

    #[test]
    fn test_vector_order_follows_its_axis() {
        assert!(<Fixed<1, 7, ColMajor>>::ROW_MAJOR);
        assert!(!<Fixed<7, 1, RowMajor>>::ROW_MAJOR);
        assert!(!<Fixed<DYNAMIC, 1, RowMajor>>::ROW_MAJOR);
        assert!(<Fixed<1, DYNAMIC, ColMajor>>::ROW_MAJOR);
        // 1 x 1 and matrices keep their declared order
        assert!(<Fixed<1, 1, RowMajor>>::ROW_MAJOR);
        assert!(!<Fixed<1, 1, ColMajor>>::ROW_MAJOR);
        assert!(!<Fixed<3, 5, ColMajor>>::ROW_MAJOR);
    }

    #[test]
    fn test_dynamic_propagates() {
        type D = Fixed<DYNAMIC, 4, ColMajor>;
        assert_eq!(D::SIZE, DYNAMIC);
        assert_eq!(D::INNER_SIZE, DYNAMIC);
        assert_eq!(D::MAX_INNER_SIZE, DYNAMIC);
    }
}
