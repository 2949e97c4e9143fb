//! Matrix product, evaluated in bulk before assignment.

use dense_traits::{
    Alignment, Dense, Evaluate, Evaluator, EvaluatorMut, Expr, Flags, Geometry, PacketTraits,
    SameScalarAs, DYNAMIC,
};

use crate::{DenseError, Result};

/// `lhs * rhs` in the linear-algebra sense.
///
/// A product reads every coefficient of its operands many times, so it may
/// not be interleaved with writes to either of them. It is therefore flagged
/// for evaluation before assignment and as aliasing its destination.
#[derive(Debug, Clone, Copy)]
pub struct MatrixProduct<'a, L, R> {
    lhs: &'a L,
    rhs: &'a R,
}

pub fn product<'a, L, R>(lhs: &'a L, rhs: &'a R) -> Result<MatrixProduct<'a, L, R>>
where
    L: Evaluate,
    R: Evaluate + SameScalarAs<L>,
{
    if lhs.cols() != rhs.rows() {
        return Err(DenseError::ProductMismatch {
            lhs_cols: lhs.cols(),
            rhs_rows: rhs.rows(),
        });
    }
    Ok(MatrixProduct { lhs, rhs })
}

impl<'a, L, R> Expr for MatrixProduct<'a, L, R>
where
    L: Evaluate,
    R: Evaluate + SameScalarAs<L>,
{
    type Scalar = L::Scalar;
    type Order = L::Order;
    type Shape = Dense;

    const ROWS: usize = L::ROWS;
    const COLS: usize = R::COLS;
    const MAX_ROWS: usize = L::MAX_ROWS;
    const MAX_COLS: usize = R::MAX_COLS;
    const FLAGS: Flags = Flags::NONE;
    const COEFF_READ_COST: usize = DYNAMIC;
    const EVAL_BEFORE_ASSIGN: bool = true;
    const ASSUME_ALIASING: bool = true;

    fn rows(&self) -> usize {
        self.lhs.rows()
    }

    fn cols(&self) -> usize {
        self.rhs.cols()
    }
}

pub struct ProductEvaluator<LE, RE> {
    lhs: LE,
    rhs: RE,
    rows: usize,
    cols: usize,
    depth: usize,
    row_major: bool,
}

impl<T, LE, RE> ProductEvaluator<LE, RE>
where
    T: PacketTraits,
    LE: Evaluator<Scalar = T>,
    RE: Evaluator<Scalar = T>,
{
    fn row_col(&self, index: usize) -> (usize, usize) {
        if self.row_major {
            (index / self.cols, index % self.cols)
        } else {
            (index % self.rows, index / self.rows)
        }
    }

    unsafe fn dot(&self, row: usize, col: usize) -> T {
        let mut acc = T::zero();
        for k in 0..self.depth {
            acc = acc + self.lhs.coeff(row, k) * self.rhs.coeff(k, col);
        }
        acc
    }
}

impl<T, LE, RE> Evaluator for ProductEvaluator<LE, RE>
where
    T: PacketTraits,
    LE: Evaluator<Scalar = T>,
    RE: Evaluator<Scalar = T>,
{
    type Scalar = T;

    unsafe fn coeff(&self, row: usize, col: usize) -> T {
        self.dot(row, col)
    }

    unsafe fn coeff_linear(&self, index: usize) -> T {
        let (row, col) = self.row_col(index);
        self.dot(row, col)
    }

    unsafe fn packet<A: Alignment>(&self, row: usize, col: usize) -> T::Packet {
        // SAFETY: the caller guarantees the whole packet is in range.
        T::gather(|i| unsafe {
            if self.row_major {
                self.dot(row, col + i)
            } else {
                self.dot(row + i, col)
            }
        })
    }

    unsafe fn packet_linear<A: Alignment>(&self, index: usize) -> T::Packet {
        // SAFETY: as above.
        T::gather(|i| unsafe { self.coeff_linear(index + i) })
    }

    /// Accumulates into a column-major temporary, then copies it out, so the
    /// destination may overlap either operand.
    unsafe fn eval_to<E>(&self, dst: &mut E, geometry: &Geometry)
    where
        E: EvaluatorMut<Scalar = T>,
    {
        let (rows, cols) = (geometry.rows, geometry.cols);
        let mut tmp = vec![T::zero(); rows * cols];
        for col in 0..cols {
            let out = &mut tmp[col * rows..(col + 1) * rows];
            for k in 0..self.depth {
                let b = self.rhs.coeff(k, col);
                for (row, slot) in out.iter_mut().enumerate() {
                    *slot = *slot + self.lhs.coeff(row, k) * b;
                }
            }
        }
        for col in 0..cols {
            for row in 0..rows {
                *dst.coeff_ref(row, col) = tmp[col * rows + row];
            }
        }
    }
}

impl<'a, L, R> Evaluate for MatrixProduct<'a, L, R>
where
    L: Evaluate,
    R: Evaluate + SameScalarAs<L>,
{
    type Evaluator<'b> = ProductEvaluator<L::Evaluator<'a>, R::Evaluator<'a>> where Self: 'b;

    fn evaluator(&self) -> Self::Evaluator<'_> {
        ProductEvaluator {
            lhs: self.lhs.evaluator(),
            rhs: self.rhs.evaluator(),
            rows: self.lhs.rows(),
            cols: self.rhs.cols(),
            depth: self.lhs.cols(),
            row_major: Self::ROW_MAJOR,
        }
    }
}
