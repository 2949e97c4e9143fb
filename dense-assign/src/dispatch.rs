//! Assignment entry points.
//!
//! ```text
//! call_assignment ──(aliasing temporary)──> call_assignment_no_alias
//!     ──> Assignment (keyed by destination/source shape)
//!         ──> Dense2Dense ──> call_dense_assignment_loop ──> executor
//! ```

use tracing::{debug, trace};

use dense_traits::{
    AddAssignOp, AssignFunctor, AssignOp, AssignmentKind, Dense, Dense2Dense, Evaluate,
    EvaluateMut, Expr, Geometry, MulAssignOp, SameScalarAs, SubAssignOp, DYNAMIC,
};
use dense_view::{DenseError, Matrix, Result};

use crate::executor;
use crate::kernel::Kernel;
use crate::selector::{AssignmentTraits, Traversal};

fn ensure_same_shape<D: Expr, S: Expr>(dst: &D, src: &S) -> Result<()> {
    if dst.rows() != src.rows() || dst.cols() != src.cols() {
        return Err(DenseError::ShapeMismatch {
            dst: (dst.rows(), dst.cols()),
            src: (src.rows(), src.cols()),
        });
    }
    Ok(())
}

/// Assign `src` into `dst` through `functor` with the statically selected executor.
///
/// Fails before touching the destination when the shapes differ, or when
/// the source must be evaluated in bulk and `functor` is not a plain copy.
pub fn call_dense_assignment_loop<D, S, F>(dst: &mut D, src: &S, functor: F) -> Result<()>
where
    D: EvaluateMut,
    S: Evaluate + SameScalarAs<D>,
    F: AssignFunctor<D::Scalar>,
{
    ensure_same_shape(dst, src)?;

    let strategy = AssignmentTraits::<D, S>::STRATEGY;
    if strategy.traversal == Traversal::AllAtOnce && !F::IS_PLAIN_COPY {
        debug!(
            traversal = %strategy.traversal,
            functor = F::NAME,
            "rejected bulk evaluation with a compound functor"
        );
        return Err(DenseError::UnsupportedOperation {
            traversal: strategy.traversal.name(),
            op: F::NAME,
        });
    }

    let geometry = Geometry::of(dst);
    trace!(
        traversal = %strategy.traversal,
        unrolling = ?strategy.unrolling,
        rows = geometry.rows,
        cols = geometry.cols,
        functor = F::NAME,
        "dense assignment"
    );
    if geometry.size() == 0 {
        return Ok(());
    }
    debug_assert_eq!((src.rows(), src.cols()), (geometry.rows, geometry.cols));

    // SAFETY: both sides were checked to have the extents of `geometry`.
    let mut kernel = unsafe {
        Kernel::<D, S, F>::new(dst.evaluator_mut(), src.evaluator(), functor, geometry)
    };
    executor::run(&mut kernel);
    Ok(())
}

/// Assignment mechanism for one (destination shape, source shape) pair.
///
/// Implemented on the kind markers of [`AssignmentKind`]; only
/// [`Dense2Dense`] ships here.
pub trait Assignment<D, S, F> {
    fn run(dst: &mut D, src: &S, functor: F) -> Result<()>;
}

impl<D, S, F> Assignment<D, S, F> for Dense2Dense
where
    D: EvaluateMut,
    S: Evaluate + SameScalarAs<D>,
    F: AssignFunctor<D::Scalar>,
{
    fn run(dst: &mut D, src: &S, functor: F) -> Result<()> {
        call_dense_assignment_loop(dst, src, functor)
    }
}

/// The assignment kind selected for destination `D` and source `S`.
pub type Kind<D, S> = <<D as Expr>::Shape as AssignmentKind<<S as Expr>::Shape>>::Kind;

/// The owned temporary an aliasing source is materialized into.
pub type Temporary<D, S> = Matrix<<D as Expr>::Scalar, DYNAMIC, DYNAMIC, <S as Expr>::Order>;

/// Assign without any aliasing precaution.
///
/// The caller guarantees that `src` does not read coefficients of `dst`
/// after they have been written.
pub fn call_assignment_no_alias<D, S, F>(dst: &mut D, src: &S, functor: F) -> Result<()>
where
    D: EvaluateMut,
    S: Evaluate + SameScalarAs<D>,
    F: AssignFunctor<D::Scalar>,
    D::Shape: AssignmentKind<S::Shape>,
    Kind<D, S>: Assignment<D, S, F>,
{
    ensure_same_shape(dst, src)?;
    <Kind<D, S> as Assignment<D, S, F>>::run(dst, src, functor)
}

/// Assign, first evaluating `src` into a temporary when its type declares
/// that it may alias the destination.
pub fn call_assignment<D, S, F>(dst: &mut D, src: &S, functor: F) -> Result<()>
where
    D: EvaluateMut,
    S: Evaluate + SameScalarAs<D>,
    F: AssignFunctor<D::Scalar>,
    D::Shape: AssignmentKind<S::Shape> + AssignmentKind<Dense>,
    Kind<D, S>: Assignment<D, S, F>,
    Kind<D, Temporary<D, S>>: Assignment<D, Temporary<D, S>, F>,
{
    if !S::ASSUME_ALIASING {
        return call_assignment_no_alias(dst, src, functor);
    }
    ensure_same_shape(dst, src)?;
    let mut tmp = Temporary::<D, S>::zeros(src.rows(), src.cols())?;
    call_dense_assignment_loop(&mut tmp, src, AssignOp)?;
    debug!(
        rows = tmp.rows(),
        cols = tmp.cols(),
        "materialized aliasing source into a temporary"
    );
    call_assignment_no_alias(dst, &tmp, functor)
}

/// `dst op= src` for an arbitrary functor. The single entry external callers need.
pub fn run<D, S, F>(dst: &mut D, src: &S, functor: F) -> Result<()>
where
    D: EvaluateMut,
    S: Evaluate + SameScalarAs<D>,
    F: AssignFunctor<D::Scalar>,
    D::Shape: AssignmentKind<S::Shape> + AssignmentKind<Dense>,
    Kind<D, S>: Assignment<D, S, F>,
    Kind<D, Temporary<D, S>>: Assignment<D, Temporary<D, S>, F>,
{
    call_assignment(dst, src, functor)
}

macro_rules! entry_point {
    ($(#[$doc:meta])* $name:ident => $op:ident) => {
        $(#[$doc])*
        pub fn $name<D, S>(dst: &mut D, src: &S) -> Result<()>
        where
            D: EvaluateMut,
            S: Evaluate + SameScalarAs<D>,
            D::Shape: AssignmentKind<S::Shape> + AssignmentKind<Dense>,
            Kind<D, S>: Assignment<D, S, $op>,
            Kind<D, Temporary<D, S>>: Assignment<D, Temporary<D, S>, $op>,
        {
            call_assignment(dst, src, $op)
        }
    };
}

entry_point!(
    /// `dst = src`
    assign => AssignOp
);
entry_point!(
    /// `dst += src`
    add_assign => AddAssignOp
);
entry_point!(
    /// `dst -= src`
    sub_assign => SubAssignOp
);
entry_point!(
    /// `dst *= src`, coefficient-wise
    mul_assign => MulAssignOp
);

#[cfg(test)]
mod tests {
    use super::*;
    use dense_view::{product, DMatrix, Matrix4};

    #[test]
    fn test_shape_mismatch_leaves_destination_untouched() {
        let mut dst = DMatrix::<f64>::from_fn(2, 3, |_, _| 1.0).unwrap();
        let src = DMatrix::<f64>::zeros(3, 2).unwrap();
        assert_eq!(
            assign(&mut dst, &src),
            Err(DenseError::ShapeMismatch {
                dst: (2, 3),
                src: (3, 2)
            })
        );
        assert!(dst.as_slice().iter().all(|&x| x == 1.0));
    }

    #[test]
    fn test_bulk_evaluation_rejects_compound_functor() {
        let a = Matrix4::<f64>::from_fn(4, 4, |r, c| (r + c) as f64).unwrap();
        let p = product(&a, &a).unwrap();
        let mut dst = Matrix4::<f64>::from_fn(4, 4, |_, _| 2.0).unwrap();
        assert_eq!(
            call_assignment_no_alias(&mut dst, &p, AddAssignOp),
            Err(DenseError::UnsupportedOperation {
                traversal: "all-at-once",
                op: "add_assign"
            })
        );
        assert!(dst.as_slice().iter().all(|&x| x == 2.0));
    }

    #[test]
    fn test_temporary_type_follows_source_order() {
        use dense_traits::RowMajor;
        type T = Temporary<DMatrix<f32>, DMatrix<f32, RowMajor>>;
        assert!(<T as Expr>::ROW_MAJOR);
    }
}
