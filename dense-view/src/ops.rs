//! Lazy coefficient-wise expression nodes.
//!
//! Nodes borrow their operands and compute coefficients on demand; nothing
//! is allocated until the expression is assigned.

use std::marker::PhantomData;

use num_traits::AsPrimitive;

use dense_traits::{
    static_add, Alignment, Dense, Evaluate, Evaluator, Expr, Flags, PacketTraits, SameScalarAs,
    StorageOrder, DYNAMIC,
};

use crate::evaluator::advance_inner;
use crate::{DenseError, Result};

/// Capabilities a coefficient-wise node keeps from its operands.
const CWISE_KEPT: Flags = Flags::LINEAR_ACCESS
    .union(Flags::PACKET_ACCESS)
    .union(Flags::ALIGNED);

fn ensure_same_shape<L: Expr, R: Expr>(lhs: &L, rhs: &R) -> Result<()> {
    if lhs.rows() != rhs.rows() || lhs.cols() != rhs.cols() {
        return Err(DenseError::ShapeMismatch {
            dst: (lhs.rows(), lhs.cols()),
            src: (rhs.rows(), rhs.cols()),
        });
    }
    Ok(())
}

const fn pick_static(a: usize, b: usize) -> usize {
    if a == DYNAMIC {
        b
    } else {
        a
    }
}

// ---------------------------------------------------------------------------
// Binary
// ---------------------------------------------------------------------------

/// A binary coefficient rule with a packet form.
pub trait BinaryOp<T: PacketTraits>: Copy {
    const COST: usize;

    fn apply(a: T, b: T) -> T;

    fn apply_packet(a: T::Packet, b: T::Packet) -> T::Packet;
}

/// `a + b`
#[derive(Debug, Clone, Copy, Default)]
pub struct SumOp;

/// `a - b`
#[derive(Debug, Clone, Copy, Default)]
pub struct DifferenceOp;

/// `a * b`, coefficient-wise
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductOp;

impl<T: PacketTraits> BinaryOp<T> for SumOp {
    const COST: usize = 1;

    #[inline(always)]
    fn apply(a: T, b: T) -> T {
        a + b
    }

    #[inline(always)]
    fn apply_packet(a: T::Packet, b: T::Packet) -> T::Packet {
        T::padd(a, b)
    }
}

impl<T: PacketTraits> BinaryOp<T> for DifferenceOp {
    const COST: usize = 1;

    #[inline(always)]
    fn apply(a: T, b: T) -> T {
        a - b
    }

    #[inline(always)]
    fn apply_packet(a: T::Packet, b: T::Packet) -> T::Packet {
        T::psub(a, b)
    }
}

impl<T: PacketTraits> BinaryOp<T> for ProductOp {
    const COST: usize = 1;

    #[inline(always)]
    fn apply(a: T, b: T) -> T {
        a * b
    }

    #[inline(always)]
    fn apply_packet(a: T::Packet, b: T::Packet) -> T::Packet {
        T::pmul(a, b)
    }
}

/// Coefficient-wise combination of two same-shaped expressions.
#[derive(Debug, Clone, Copy)]
pub struct CwiseBinary<'a, L, R, Op> {
    lhs: &'a L,
    rhs: &'a R,
    _op: PhantomData<Op>,
}

pub fn sum<'a, L, R>(lhs: &'a L, rhs: &'a R) -> Result<CwiseBinary<'a, L, R, SumOp>>
where
    L: Evaluate,
    R: Evaluate + SameScalarAs<L>,
{
    ensure_same_shape(lhs, rhs)?;
    Ok(CwiseBinary {
        lhs,
        rhs,
        _op: PhantomData,
    })
}

pub fn difference<'a, L, R>(lhs: &'a L, rhs: &'a R) -> Result<CwiseBinary<'a, L, R, DifferenceOp>>
where
    L: Evaluate,
    R: Evaluate + SameScalarAs<L>,
{
    ensure_same_shape(lhs, rhs)?;
    Ok(CwiseBinary {
        lhs,
        rhs,
        _op: PhantomData,
    })
}

pub fn cwise_product<'a, L, R>(lhs: &'a L, rhs: &'a R) -> Result<CwiseBinary<'a, L, R, ProductOp>>
where
    L: Evaluate,
    R: Evaluate + SameScalarAs<L>,
{
    ensure_same_shape(lhs, rhs)?;
    Ok(CwiseBinary {
        lhs,
        rhs,
        _op: PhantomData,
    })
}

impl<'a, L, R, Op> Expr for CwiseBinary<'a, L, R, Op>
where
    L: Evaluate,
    R: Evaluate + SameScalarAs<L>,
    Op: BinaryOp<L::Scalar>,
{
    type Scalar = L::Scalar;
    type Order = L::Order;
    type Shape = Dense;

    const ROWS: usize = pick_static(L::ROWS, R::ROWS);
    const COLS: usize = pick_static(L::COLS, R::COLS);
    const MAX_ROWS: usize = pick_static(L::MAX_ROWS, R::MAX_ROWS);
    const MAX_COLS: usize = pick_static(L::MAX_COLS, R::MAX_COLS);
    const FLAGS: Flags = if L::ROW_MAJOR == R::ROW_MAJOR {
        L::FLAGS.intersection(R::FLAGS).intersection(CWISE_KEPT)
    } else {
        Flags::NONE
    };
    const COEFF_READ_COST: usize = static_add(
        static_add(L::COEFF_READ_COST, R::COEFF_READ_COST),
        Op::COST,
    );

    fn rows(&self) -> usize {
        self.lhs.rows()
    }

    fn cols(&self) -> usize {
        self.lhs.cols()
    }
}

pub struct CwiseBinaryEvaluator<LE, RE, Op> {
    lhs: LE,
    rhs: RE,
    _op: PhantomData<Op>,
}

impl<T, LE, RE, Op> Evaluator for CwiseBinaryEvaluator<LE, RE, Op>
where
    T: PacketTraits,
    LE: Evaluator<Scalar = T>,
    RE: Evaluator<Scalar = T>,
    Op: BinaryOp<T>,
{
    type Scalar = T;

    #[inline(always)]
    unsafe fn coeff(&self, row: usize, col: usize) -> T {
        Op::apply(self.lhs.coeff(row, col), self.rhs.coeff(row, col))
    }

    #[inline(always)]
    unsafe fn coeff_linear(&self, index: usize) -> T {
        Op::apply(self.lhs.coeff_linear(index), self.rhs.coeff_linear(index))
    }

    #[inline(always)]
    unsafe fn packet<A: Alignment>(&self, row: usize, col: usize) -> T::Packet {
        Op::apply_packet(self.lhs.packet::<A>(row, col), self.rhs.packet::<A>(row, col))
    }

    #[inline(always)]
    unsafe fn packet_linear<A: Alignment>(&self, index: usize) -> T::Packet {
        Op::apply_packet(
            self.lhs.packet_linear::<A>(index),
            self.rhs.packet_linear::<A>(index),
        )
    }
}

impl<'a, L, R, Op> Evaluate for CwiseBinary<'a, L, R, Op>
where
    L: Evaluate,
    R: Evaluate + SameScalarAs<L>,
    Op: BinaryOp<L::Scalar>,
{
    type Evaluator<'b> = CwiseBinaryEvaluator<L::Evaluator<'a>, R::Evaluator<'a>, Op> where Self: 'b;

    fn evaluator(&self) -> Self::Evaluator<'_> {
        CwiseBinaryEvaluator {
            lhs: self.lhs.evaluator(),
            rhs: self.rhs.evaluator(),
            _op: PhantomData,
        }
    }
}

// ---------------------------------------------------------------------------
// Scaled
// ---------------------------------------------------------------------------

/// `factor * expr`, coefficient-wise.
#[derive(Debug, Clone, Copy)]
pub struct Scaled<'a, E: Expr> {
    expr: &'a E,
    factor: E::Scalar,
}

pub fn scaled<E: Evaluate>(expr: &E, factor: E::Scalar) -> Scaled<'_, E> {
    Scaled { expr, factor }
}

impl<'a, E: Evaluate> Expr for Scaled<'a, E> {
    type Scalar = E::Scalar;
    type Order = E::Order;
    type Shape = E::Shape;

    const ROWS: usize = E::ROWS;
    const COLS: usize = E::COLS;
    const MAX_ROWS: usize = E::MAX_ROWS;
    const MAX_COLS: usize = E::MAX_COLS;
    const FLAGS: Flags = E::FLAGS.intersection(CWISE_KEPT);
    const COEFF_READ_COST: usize = static_add(E::COEFF_READ_COST, 1);

    fn rows(&self) -> usize {
        self.expr.rows()
    }

    fn cols(&self) -> usize {
        self.expr.cols()
    }
}

pub struct ScaledEvaluator<EE: Evaluator> {
    inner: EE,
    factor: EE::Scalar,
    factor_packet: <EE::Scalar as PacketTraits>::Packet,
}

impl<EE: Evaluator> Evaluator for ScaledEvaluator<EE> {
    type Scalar = EE::Scalar;

    #[inline(always)]
    unsafe fn coeff(&self, row: usize, col: usize) -> Self::Scalar {
        self.factor * self.inner.coeff(row, col)
    }

    #[inline(always)]
    unsafe fn coeff_linear(&self, index: usize) -> Self::Scalar {
        self.factor * self.inner.coeff_linear(index)
    }

    #[inline(always)]
    unsafe fn packet<A: Alignment>(
        &self,
        row: usize,
        col: usize,
    ) -> <Self::Scalar as PacketTraits>::Packet {
        <Self::Scalar as PacketTraits>::pmul(self.factor_packet, self.inner.packet::<A>(row, col))
    }

    #[inline(always)]
    unsafe fn packet_linear<A: Alignment>(
        &self,
        index: usize,
    ) -> <Self::Scalar as PacketTraits>::Packet {
        <Self::Scalar as PacketTraits>::pmul(self.factor_packet, self.inner.packet_linear::<A>(index))
    }
}

impl<'a, E: Evaluate> Evaluate for Scaled<'a, E> {
    type Evaluator<'b> = ScaledEvaluator<E::Evaluator<'a>> where Self: 'b;

    fn evaluator(&self) -> Self::Evaluator<'_> {
        ScaledEvaluator {
            inner: self.expr.evaluator(),
            factor: self.factor,
            factor_packet: <E::Scalar as PacketTraits>::splat(self.factor),
        }
    }
}

// ---------------------------------------------------------------------------
// Unary (closure)
// ---------------------------------------------------------------------------

/// `f(expr)` coefficient-wise, for an arbitrary closure.
///
/// The closure has no packet form and an unknown cost, so assignments from
/// this node are never vectorized or unrolled. It is copied into the
/// evaluator, hence the `Copy` bound.
#[derive(Clone, Copy)]
pub struct UnaryExpr<'a, E, F> {
    expr: &'a E,
    f: F,
}

pub fn map<E, F>(expr: &E, f: F) -> UnaryExpr<'_, E, F>
where
    E: Evaluate,
    F: Fn(E::Scalar) -> E::Scalar + Copy,
{
    UnaryExpr { expr, f }
}

impl<'a, E, F> Expr for UnaryExpr<'a, E, F>
where
    E: Evaluate,
    F: Fn(E::Scalar) -> E::Scalar + Copy,
{
    type Scalar = E::Scalar;
    type Order = E::Order;
    type Shape = E::Shape;

    const ROWS: usize = E::ROWS;
    const COLS: usize = E::COLS;
    const MAX_ROWS: usize = E::MAX_ROWS;
    const MAX_COLS: usize = E::MAX_COLS;
    const FLAGS: Flags = E::FLAGS.intersection(Flags::LINEAR_ACCESS);
    const COEFF_READ_COST: usize = DYNAMIC;

    fn rows(&self) -> usize {
        self.expr.rows()
    }

    fn cols(&self) -> usize {
        self.expr.cols()
    }
}

pub struct UnaryEvaluator<EE, F, X: ?Sized> {
    inner: EE,
    f: F,
    _expr: PhantomData<fn(&X)>,
}

impl<EE, F, X> Evaluator for UnaryEvaluator<EE, F, X>
where
    EE: Evaluator,
    F: Fn(EE::Scalar) -> EE::Scalar,
    X: Expr + ?Sized,
{
    type Scalar = EE::Scalar;

    #[inline(always)]
    unsafe fn coeff(&self, row: usize, col: usize) -> Self::Scalar {
        (self.f)(self.inner.coeff(row, col))
    }

    #[inline(always)]
    unsafe fn coeff_linear(&self, index: usize) -> Self::Scalar {
        (self.f)(self.inner.coeff_linear(index))
    }

    unsafe fn packet<A: Alignment>(
        &self,
        row: usize,
        col: usize,
    ) -> <Self::Scalar as PacketTraits>::Packet {
        <Self::Scalar as PacketTraits>::gather(|i| {
            let (r, c) = advance_inner::<X>(row, col, i);
            // SAFETY: the caller guarantees the whole packet is in range.
            unsafe { self.coeff(r, c) }
        })
    }

    unsafe fn packet_linear<A: Alignment>(
        &self,
        index: usize,
    ) -> <Self::Scalar as PacketTraits>::Packet {
        // SAFETY: as above.
        <Self::Scalar as PacketTraits>::gather(|i| unsafe { self.coeff_linear(index + i) })
    }
}

impl<'a, E, F> Evaluate for UnaryExpr<'a, E, F>
where
    E: Evaluate,
    F: Fn(E::Scalar) -> E::Scalar + Copy,
{
    type Evaluator<'b> = UnaryEvaluator<E::Evaluator<'a>, F, E> where Self: 'b;

    fn evaluator(&self) -> Self::Evaluator<'_> {
        UnaryEvaluator {
            inner: self.expr.evaluator(),
            f: self.f,
            _expr: PhantomData,
        }
    }
}

// ---------------------------------------------------------------------------
// Cast
// ---------------------------------------------------------------------------

/// Explicit scalar conversion of an expression to `U`.
#[derive(Debug, Clone, Copy)]
pub struct Cast<'a, E, U> {
    expr: &'a E,
    _to: PhantomData<U>,
}

pub fn cast<U, E>(expr: &E) -> Cast<'_, E, U>
where
    E: Evaluate,
    E::Scalar: AsPrimitive<U>,
    U: PacketTraits,
{
    Cast {
        expr,
        _to: PhantomData,
    }
}

impl<'a, E, U> Expr for Cast<'a, E, U>
where
    E: Evaluate,
    E::Scalar: AsPrimitive<U>,
    U: PacketTraits,
{
    type Scalar = U;
    type Order = E::Order;
    type Shape = E::Shape;

    const ROWS: usize = E::ROWS;
    const COLS: usize = E::COLS;
    const MAX_ROWS: usize = E::MAX_ROWS;
    const MAX_COLS: usize = E::MAX_COLS;
    const FLAGS: Flags = E::FLAGS.intersection(Flags::LINEAR_ACCESS);
    const COEFF_READ_COST: usize = static_add(E::COEFF_READ_COST, 1);

    fn rows(&self) -> usize {
        self.expr.rows()
    }

    fn cols(&self) -> usize {
        self.expr.cols()
    }
}

pub struct CastEvaluator<EE, U, X: ?Sized> {
    inner: EE,
    _marker: PhantomData<(U, fn(&X))>,
}

impl<EE, U, X> Evaluator for CastEvaluator<EE, U, X>
where
    EE: Evaluator,
    EE::Scalar: AsPrimitive<U>,
    U: PacketTraits,
    X: Expr + ?Sized,
{
    type Scalar = U;

    #[inline(always)]
    unsafe fn coeff(&self, row: usize, col: usize) -> U {
        self.inner.coeff(row, col).as_()
    }

    #[inline(always)]
    unsafe fn coeff_linear(&self, index: usize) -> U {
        self.inner.coeff_linear(index).as_()
    }

    unsafe fn packet<A: Alignment>(&self, row: usize, col: usize) -> U::Packet {
        U::gather(|i| {
            let (r, c) = advance_inner::<X>(row, col, i);
            // SAFETY: the caller guarantees the whole packet is in range.
            unsafe { self.coeff(r, c) }
        })
    }

    unsafe fn packet_linear<A: Alignment>(&self, index: usize) -> U::Packet {
        // SAFETY: as above.
        U::gather(|i| unsafe { self.coeff_linear(index + i) })
    }
}

impl<'a, E, U> Evaluate for Cast<'a, E, U>
where
    E: Evaluate,
    E::Scalar: AsPrimitive<U>,
    U: PacketTraits,
{
    type Evaluator<'b> = CastEvaluator<E::Evaluator<'a>, U, E> where Self: 'b;

    fn evaluator(&self) -> Self::Evaluator<'_> {
        CastEvaluator {
            inner: self.expr.evaluator(),
            _marker: PhantomData,
        }
    }
}

// ---------------------------------------------------------------------------
// Transpose
// ---------------------------------------------------------------------------

/// Rows and columns swapped; the memory layout is reinterpreted, not moved.
#[derive(Debug, Clone, Copy)]
pub struct Transpose<'a, E> {
    expr: &'a E,
}

pub fn transpose<E: Evaluate>(expr: &E) -> Transpose<'_, E> {
    Transpose { expr }
}

impl<'a, E: Evaluate> Expr for Transpose<'a, E> {
    type Scalar = E::Scalar;
    type Order = <E::Order as StorageOrder>::Transposed;
    type Shape = E::Shape;

    const ROWS: usize = E::COLS;
    const COLS: usize = E::ROWS;
    const MAX_ROWS: usize = E::MAX_COLS;
    const MAX_COLS: usize = E::MAX_ROWS;
    const FLAGS: Flags = E::FLAGS;
    const COEFF_READ_COST: usize = E::COEFF_READ_COST;
    const EVAL_BEFORE_ASSIGN: bool = E::EVAL_BEFORE_ASSIGN;
    const ASSUME_ALIASING: bool = E::ASSUME_ALIASING;

    fn rows(&self) -> usize {
        self.expr.cols()
    }

    fn cols(&self) -> usize {
        self.expr.rows()
    }
}

pub struct TransposeEvaluator<EE> {
    inner: EE,
}

impl<EE: Evaluator> Evaluator for TransposeEvaluator<EE> {
    type Scalar = EE::Scalar;

    #[inline(always)]
    unsafe fn coeff(&self, row: usize, col: usize) -> Self::Scalar {
        self.inner.coeff(col, row)
    }

    #[inline(always)]
    unsafe fn coeff_linear(&self, index: usize) -> Self::Scalar {
        self.inner.coeff_linear(index)
    }

    #[inline(always)]
    unsafe fn packet<A: Alignment>(
        &self,
        row: usize,
        col: usize,
    ) -> <Self::Scalar as PacketTraits>::Packet {
        self.inner.packet::<A>(col, row)
    }

    #[inline(always)]
    unsafe fn packet_linear<A: Alignment>(
        &self,
        index: usize,
    ) -> <Self::Scalar as PacketTraits>::Packet {
        self.inner.packet_linear::<A>(index)
    }
}

impl<'a, E: Evaluate> Evaluate for Transpose<'a, E> {
    type Evaluator<'b> = TransposeEvaluator<E::Evaluator<'a>> where Self: 'b;

    fn evaluator(&self) -> Self::Evaluator<'_> {
        TransposeEvaluator {
            inner: self.expr.evaluator(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{DMatrix, Matrix4};
    use crate::map::Map;
    use approx::assert_relative_eq;
    use dense_traits::{ColMajor, RowMajor, Unaligned};

    #[test]
    fn test_sum_requires_same_shape() {
        let a = DMatrix::<f64>::zeros(2, 3).unwrap();
        let b = DMatrix::<f64>::zeros(3, 2).unwrap();
        assert!(matches!(sum(&a, &b), Err(DenseError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_binary_flags() {
        type M = Matrix4<f32>;
        type MR = Matrix4<f32, RowMajor>;
        type S<'a> = CwiseBinary<'a, M, M, SumOp>;
        type Mixed<'a> = CwiseBinary<'a, M, MR, SumOp>;
        assert!(S::FLAGS.contains(Flags::PACKET_ACCESS | Flags::ALIGNED | Flags::LINEAR_ACCESS));
        assert!(!S::FLAGS.contains(Flags::DIRECT_ACCESS));
        assert_eq!(S::COEFF_READ_COST, 3);
        assert_eq!(Mixed::FLAGS, Flags::NONE);
    }

    #[test]
    fn test_binary_coefficients() {
        let a = DMatrix::<f64>::from_fn(2, 2, |r, c| (r + 2 * c) as f64).unwrap();
        let b = DMatrix::<f64>::from_fn(2, 2, |_, _| 0.5).unwrap();
        let d = difference(&a, &b).unwrap();
        let p = cwise_product(&a, &b).unwrap();
        unsafe {
            assert_relative_eq!(d.evaluator().coeff(1, 1), 2.5);
            assert_relative_eq!(p.evaluator().coeff_linear(3), 1.5);
            let packet = sum(&a, &b).unwrap().evaluator().packet_linear::<Unaligned>(0);
            assert_eq!(packet.0, [0.5, 1.5]);
        }
    }

    #[test]
    fn test_scaled_packet_matches_coeff() {
        let data = [1.0f32, 2.0, 3.0, 4.0];
        let m = Map::<f32, 4, 1, ColMajor>::from_slice(&data, 4, 1).unwrap();
        let s = scaled(&m, 3.0);
        let e = s.evaluator();
        unsafe {
            let p = e.packet::<Unaligned>(0, 0);
            for i in 0..4 {
                assert_eq!(p.0[i], e.coeff(i, 0));
            }
        }
    }

    #[test]
    fn test_unary_has_no_packet_access() {
        let a = DMatrix::<f64>::from_fn(3, 1, |r, _| r as f64).unwrap();
        let u = map(&a, |x| x * x + 1.0);
        assert!(!<UnaryExpr<'_, DMatrix<f64>, fn(f64) -> f64> as Expr>::FLAGS
            .contains(Flags::PACKET_ACCESS));
        unsafe {
            assert_eq!(u.evaluator().coeff(2, 0), 5.0);
            // gathered packets still agree with coefficients
            assert_eq!(u.evaluator().packet::<Unaligned>(1, 0).0, [2.0, 5.0]);
        }
    }

    #[test]
    fn test_cast() {
        let a = DMatrix::<i32>::from_fn(2, 2, |r, c| (r * 2 + c) as i32).unwrap();
        let f = cast::<f64, _>(&a);
        assert_eq!(<Cast<'_, DMatrix<i32>, f64> as Expr>::COEFF_READ_COST, 2);
        unsafe {
            assert_eq!(f.evaluator().coeff(1, 1), 3.0f64);
        }
    }

    #[test]
    fn test_transpose() {
        let a = DMatrix::<f64, RowMajor>::from_fn(2, 3, |r, c| (10 * r + c) as f64).unwrap();
        let t = transpose(&a);
        assert_eq!((t.rows(), t.cols()), (3, 2));
        assert!(!<Transpose<'_, DMatrix<f64, RowMajor>> as Expr>::ROW_MAJOR);
        let e = t.evaluator();
        unsafe {
            assert_eq!(e.coeff(2, 1), 12.0);
            // column 1 of the transpose is row 1 of `a`, contiguous in memory
            assert_eq!(e.packet::<Unaligned>(0, 1).0, [10.0, 11.0]);
        }
    }
}
