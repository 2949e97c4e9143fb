//! Per-side access adapters used by the assignment loops.
//!
//! An evaluator is a lightweight handle built for the duration of one
//! assignment. It performs no bounds checks: all accessors are `unsafe` and
//! require in-range indices, which the assignment kernel guarantees by
//! construction from the destination [`Geometry`].

use crate::expr::Expr;
use crate::packet::{Alignment, PacketTraits};

/// Read access to the coefficients of an expression.
pub trait Evaluator {
    type Scalar: PacketTraits;

    /// # Safety
    /// `row` and `col` must be in range.
    unsafe fn coeff(&self, row: usize, col: usize) -> Self::Scalar;

    /// # Safety
    /// `index` must be in range; only called when the expression has linear access.
    unsafe fn coeff_linear(&self, index: usize) -> Self::Scalar;

    /// Packet of `SIZE` coefficients starting at `(row, col)` along the inner axis.
    ///
    /// # Safety
    /// The whole packet must be in range, and aligned when `A` is `Aligned`.
    unsafe fn packet<A: Alignment>(
        &self,
        row: usize,
        col: usize,
    ) -> <Self::Scalar as PacketTraits>::Packet;

    /// # Safety
    /// The whole packet must be in range, and aligned when `A` is `Aligned`.
    unsafe fn packet_linear<A: Alignment>(
        &self,
        index: usize,
    ) -> <Self::Scalar as PacketTraits>::Packet;

    /// Write the whole expression into `dst`.
    ///
    /// The default copies coefficient by coefficient. Expressions that set
    /// `EVAL_BEFORE_ASSIGN` override this with their own bulk algorithm.
    ///
    /// # Safety
    /// `dst` must cover `geometry.rows x geometry.cols` coefficients and the
    /// expression must have the same shape.
    unsafe fn eval_to<E>(&self, dst: &mut E, geometry: &Geometry)
    where
        E: EvaluatorMut<Scalar = Self::Scalar>,
    {
        for col in 0..geometry.cols {
            for row in 0..geometry.rows {
                *dst.coeff_ref(row, col) = self.coeff(row, col);
            }
        }
    }
}

/// Write access to the coefficients of a destination.
pub trait EvaluatorMut: Evaluator {
    /// # Safety
    /// `row` and `col` must be in range.
    unsafe fn coeff_ptr(&mut self, row: usize, col: usize) -> *mut Self::Scalar;

    /// # Safety
    /// `index` must be in range; only called when the destination has linear access.
    unsafe fn coeff_ptr_linear(&mut self, index: usize) -> *mut Self::Scalar;

    /// # Safety
    /// Same as [`coeff_ptr`](Self::coeff_ptr).
    #[inline(always)]
    unsafe fn coeff_ref(&mut self, row: usize, col: usize) -> &mut Self::Scalar {
        &mut *self.coeff_ptr(row, col)
    }

    /// # Safety
    /// Same as [`coeff_ptr_linear`](Self::coeff_ptr_linear).
    #[inline(always)]
    unsafe fn coeff_ref_linear(&mut self, index: usize) -> &mut Self::Scalar {
        &mut *self.coeff_ptr_linear(index)
    }
}

/// An expression that can produce a read evaluator.
pub trait Evaluate: Expr {
    type Evaluator<'a>: Evaluator<Scalar = Self::Scalar>
    where
        Self: 'a;

    fn evaluator(&self) -> Self::Evaluator<'_>;
}

/// A destination that can produce a write evaluator.
pub trait EvaluateMut: Expr {
    type EvaluatorMut<'a>: EvaluatorMut<Scalar = Self::Scalar>
    where
        Self: 'a;

    fn evaluator_mut(&mut self) -> Self::EvaluatorMut<'_>;

    /// Elements between the starts of two consecutive outer slices.
    fn outer_stride(&self) -> usize;
}

/// Runtime extents of an assignment destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub rows: usize,
    pub cols: usize,
    pub inner_size: usize,
    pub outer_size: usize,
    pub outer_stride: usize,
}

impl Geometry {
    pub fn of<D: EvaluateMut + ?Sized>(dst: &D) -> Self {
        Self {
            rows: dst.rows(),
            cols: dst.cols(),
            inner_size: dst.inner_size(),
            outer_size: dst.outer_size(),
            outer_stride: dst.outer_stride(),
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.rows * self.cols
    }
}
