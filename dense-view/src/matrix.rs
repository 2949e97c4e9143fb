use std::fmt;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

use dense_traits::{
    ColMajor, Dense, Evaluate, EvaluateMut, Expr, Flags, PacketTraits, StorageOrder, DYNAMIC,
};

use crate::block::{Block, BlockMut};
use crate::evaluator::{DenseEvaluator, DenseEvaluatorMut};
use crate::map::{Map, MapMut};
use crate::storage::AlignedBuf;
use crate::{check_static_dims, DenseError, Result};

/// Owned dense matrix with static (`R`, `C`) or [`DYNAMIC`] extents.
///
/// Storage is contiguous in order `O` and its first coefficient is always
/// packet aligned.
#[derive(Clone)]
pub struct Matrix<T: PacketTraits, const R: usize, const C: usize, O: StorageOrder = ColMajor> {
    buf: AlignedBuf<T>,
    rows: usize,
    cols: usize,
    _order: PhantomData<O>,
}

/// Dynamically sized matrix.
pub type DMatrix<T, O = ColMajor> = Matrix<T, DYNAMIC, DYNAMIC, O>;
/// Dynamically sized column vector.
pub type DVector<T> = Matrix<T, DYNAMIC, 1, ColMajor>;
pub type Matrix2<T, O = ColMajor> = Matrix<T, 2, 2, O>;
pub type Matrix3<T, O = ColMajor> = Matrix<T, 3, 3, O>;
pub type Matrix4<T, O = ColMajor> = Matrix<T, 4, 4, O>;
pub type Vector4<T> = Matrix<T, 4, 1, ColMajor>;

impl<T: PacketTraits, const R: usize, const C: usize, O: StorageOrder> Matrix<T, R, C, O> {
    /// A zero-filled `rows x cols` matrix.
    pub fn zeros(rows: usize, cols: usize) -> Result<Self> {
        check_static_dims(R, C, rows, cols)?;
        let len = rows.checked_mul(cols).ok_or(DenseError::OutOfBounds {
            required: usize::MAX,
            len: 0,
        })?;
        Ok(Self {
            buf: AlignedBuf::zeroed(len)?,
            rows,
            cols,
            _order: PhantomData,
        })
    }

    /// A matrix whose `(row, col)` coefficient is `f(row, col)`.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> T) -> Result<Self> {
        let mut m = Self::zeros(rows, cols)?;
        let stride = O::contiguous_outer_stride(rows, cols);
        let data = m.buf.as_mut_slice();
        for col in 0..cols {
            for row in 0..rows {
                data[O::offset(row, col, stride)] = f(row, col);
            }
        }
        Ok(m)
    }

    /// A matrix filled from `data` laid out in storage order `O`.
    pub fn from_storage(rows: usize, cols: usize, data: &[T]) -> Result<Self> {
        let mut m = Self::zeros(rows, cols)?;
        if data.len() != m.buf.len() {
            return Err(DenseError::OutOfBounds {
                required: m.buf.len(),
                len: data.len(),
            });
        }
        m.buf.as_mut_slice().copy_from_slice(data);
        Ok(m)
    }

    /// Coefficients in storage order.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.buf.as_slice()
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.buf.as_mut_slice()
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.as_slice().as_ptr()
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.as_mut_slice().as_mut_ptr()
    }

    #[inline]
    fn stride(&self) -> usize {
        O::contiguous_outer_stride(self.rows, self.cols)
    }

    fn index_of(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.rows || col >= self.cols {
            return Err(DenseError::OutOfBounds {
                required: O::offset(row, col, self.stride()) + 1,
                len: self.buf.len(),
            });
        }
        Ok(O::offset(row, col, self.stride()))
    }

    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        let i = self.index_of(row, col)?;
        Ok(self.as_slice()[i])
    }

    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        let i = self.index_of(row, col)?;
        self.as_mut_slice()[i] = value;
        Ok(())
    }

    /// Borrow as a contiguous view with the same static extents.
    pub fn view(&self) -> Map<'_, T, R, C, O> {
        // SAFETY: the buffer holds exactly rows * cols coefficients.
        unsafe { Map::from_raw_parts(self.as_ptr(), self.rows, self.cols) }
    }

    pub fn view_mut(&mut self) -> MapMut<'_, T, R, C, O> {
        let (rows, cols) = (self.rows, self.cols);
        // SAFETY: as in `view`, with exclusive access.
        unsafe { MapMut::from_raw_parts(self.as_mut_ptr(), rows, cols) }
    }

    /// Storage offset of the `rows x cols` sub-matrix at `(row, col)`.
    fn block_start(&self, row: usize, col: usize, rows: usize, cols: usize) -> Result<usize> {
        let fits = row.checked_add(rows).is_some_and(|end| end <= self.rows)
            && col.checked_add(cols).is_some_and(|end| end <= self.cols);
        if !fits {
            return Err(DenseError::OutOfBounds {
                required: row.saturating_add(rows).saturating_mul(col.saturating_add(cols)),
                len: self.buf.len(),
            });
        }
        if rows == 0 || cols == 0 {
            return Ok(self.buf.len());
        }
        Ok(O::offset(row, col, self.stride()))
    }

    /// The `rows x cols` sub-matrix starting at `(row, col)`.
    pub fn block(&self, row: usize, col: usize, rows: usize, cols: usize) -> Result<Block<'_, T, O>> {
        let start = self.block_start(row, col, rows, cols)?;
        Block::from_slice(&self.as_slice()[start..], rows, cols, self.stride())
    }

    pub fn block_mut(
        &mut self,
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    ) -> Result<BlockMut<'_, T, O>> {
        let start = self.block_start(row, col, rows, cols)?;
        let stride = self.stride();
        BlockMut::from_slice(&mut self.as_mut_slice()[start..], rows, cols, stride)
    }
}

impl<T: PacketTraits, const R: usize, const C: usize, O: StorageOrder> Expr for Matrix<T, R, C, O> {
    type Scalar = T;
    type Order = O;
    type Shape = Dense;

    const ROWS: usize = R;
    const COLS: usize = C;
    const FLAGS: Flags = Flags::LINEAR_ACCESS
        .union(Flags::DIRECT_ACCESS)
        .union(Flags::ALIGNED)
        .union(Flags::packet_if(T::VECTORIZABLE));
    const COEFF_READ_COST: usize = 1;

    #[inline]
    fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    fn cols(&self) -> usize {
        self.cols
    }
}

impl<T: PacketTraits, const R: usize, const C: usize, O: StorageOrder> Evaluate
    for Matrix<T, R, C, O>
{
    type Evaluator<'a> = DenseEvaluator<'a, T, O> where Self: 'a;

    fn evaluator(&self) -> Self::Evaluator<'_> {
        // SAFETY: the evaluator borrows `self` and only addresses in-range coefficients.
        unsafe { DenseEvaluator::new(self.as_ptr(), self.stride()) }
    }
}

impl<T: PacketTraits, const R: usize, const C: usize, O: StorageOrder> EvaluateMut
    for Matrix<T, R, C, O>
{
    type EvaluatorMut<'a> = DenseEvaluatorMut<'a, T, O> where Self: 'a;

    fn evaluator_mut(&mut self) -> Self::EvaluatorMut<'_> {
        let stride = self.stride();
        // SAFETY: as in `evaluator`, with exclusive access.
        unsafe { DenseEvaluatorMut::new(self.as_mut_ptr(), stride) }
    }

    #[inline]
    fn outer_stride(&self) -> usize {
        self.stride()
    }
}

impl<T: PacketTraits, const R: usize, const C: usize, O: StorageOrder> Index<(usize, usize)>
    for Matrix<T, R, C, O>
{
    type Output = T;

    fn index(&self, (row, col): (usize, usize)) -> &T {
        assert!(row < self.rows && col < self.cols, "index ({row}, {col}) out of range");
        &self.as_slice()[O::offset(row, col, self.stride())]
    }
}

impl<T: PacketTraits, const R: usize, const C: usize, O: StorageOrder> IndexMut<(usize, usize)>
    for Matrix<T, R, C, O>
{
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
        assert!(row < self.rows && col < self.cols, "index ({row}, {col}) out of range");
        let i = O::offset(row, col, self.stride());
        &mut self.as_mut_slice()[i]
    }
}

impl<T: PacketTraits, const R: usize, const C: usize, O: StorageOrder> fmt::Debug
    for Matrix<T, R, C, O>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for row in 0..self.rows {
            let coeffs: Vec<T> = (0..self.cols).map(|col| self[(row, col)]).collect();
            list.entry(&coeffs);
        }
        list.finish()
    }
}

impl<T: PacketTraits, const R: usize, const C: usize, O: StorageOrder> PartialEq
    for Matrix<T, R, C, O>
{
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows && self.cols == other.cols && self.as_slice() == other.as_slice()
    }
}
