//! Rectangular strided sub-views.

use std::marker::PhantomData;

use dense_traits::{
    ColMajor, Dense, Evaluate, EvaluateMut, Expr, Flags, PacketTraits, StorageOrder, DYNAMIC,
};

use crate::evaluator::{DenseEvaluator, DenseEvaluatorMut};
use crate::{strided_extent, DenseError, Result};

/// Validate a strided `rows x cols` window at the start of a `len`-element slice.
fn validate_window<O: StorageOrder>(
    len: usize,
    rows: usize,
    cols: usize,
    outer_stride: usize,
) -> Result<()> {
    let (inner, outer) = if O::ROW_MAJOR { (cols, rows) } else { (rows, cols) };
    if outer > 1 && inner > outer_stride {
        return Err(DenseError::OutOfBounds {
            required: inner,
            len: outer_stride,
        });
    }
    let required = strided_extent(inner, outer, outer_stride)?;
    if required > len {
        return Err(DenseError::OutOfBounds { required, len });
    }
    Ok(())
}

// Consecutive outer slices are not adjacent, so no linear access.
const BLOCK_FLAGS: Flags = Flags::DIRECT_ACCESS;

/// Read-only strided sub-view with unit inner stride.
#[derive(Debug, Clone, Copy)]
pub struct Block<'a, T, O = ColMajor> {
    ptr: *const T,
    rows: usize,
    cols: usize,
    outer_stride: usize,
    _marker: PhantomData<(&'a [T], O)>,
}

/// Mutable strided sub-view with unit inner stride.
#[derive(Debug)]
pub struct BlockMut<'a, T, O = ColMajor> {
    ptr: *mut T,
    rows: usize,
    cols: usize,
    outer_stride: usize,
    _marker: PhantomData<(&'a mut [T], O)>,
}

impl<'a, T: PacketTraits, O: StorageOrder> Block<'a, T, O> {
    /// View `data` as `rows x cols`, consecutive outer slices `outer_stride` apart.
    pub fn from_slice(data: &'a [T], rows: usize, cols: usize, outer_stride: usize) -> Result<Self> {
        validate_window::<O>(data.len(), rows, cols, outer_stride)?;
        Ok(Self {
            ptr: data.as_ptr(),
            rows,
            cols,
            outer_stride,
            _marker: PhantomData,
        })
    }

    #[inline]
    pub fn outer_stride(&self) -> usize {
        self.outer_stride
    }
}

impl<'a, T: PacketTraits, O: StorageOrder> BlockMut<'a, T, O> {
    pub fn from_slice(
        data: &'a mut [T],
        rows: usize,
        cols: usize,
        outer_stride: usize,
    ) -> Result<Self> {
        validate_window::<O>(data.len(), rows, cols, outer_stride)?;
        Ok(Self {
            ptr: data.as_mut_ptr(),
            rows,
            cols,
            outer_stride,
            _marker: PhantomData,
        })
    }

    /// Reborrow as a read-only block.
    pub fn as_block(&self) -> Block<'_, T, O> {
        Block {
            ptr: self.ptr,
            rows: self.rows,
            cols: self.cols,
            outer_stride: self.outer_stride,
            _marker: PhantomData,
        }
    }
}

macro_rules! impl_block_expr {
    ($name:ident) => {
        impl<'a, T: PacketTraits, O: StorageOrder> Expr for $name<'a, T, O> {
            type Scalar = T;
            type Order = O;
            type Shape = Dense;

            const ROWS: usize = DYNAMIC;
            const COLS: usize = DYNAMIC;
            const FLAGS: Flags = BLOCK_FLAGS.union(Flags::packet_if(T::VECTORIZABLE));
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

        impl<'a, T: PacketTraits, O: StorageOrder> Evaluate for $name<'a, T, O> {
            type Evaluator<'b> = DenseEvaluator<'b, T, O> where Self: 'b;

            fn evaluator(&self) -> Self::Evaluator<'_> {
                // SAFETY: the window was validated against its backing slice.
                unsafe { DenseEvaluator::new(self.ptr, self.outer_stride) }
            }
        }
    };
}

impl_block_expr!(Block);
impl_block_expr!(BlockMut);

impl<'a, T: PacketTraits, O: StorageOrder> EvaluateMut for BlockMut<'a, T, O> {
    type EvaluatorMut<'b> = DenseEvaluatorMut<'b, T, O> where Self: 'b;

    fn evaluator_mut(&mut self) -> Self::EvaluatorMut<'_> {
        // SAFETY: the window was validated against its backing slice.
        unsafe { DenseEvaluatorMut::new(self.ptr, self.outer_stride) }
    }

    #[inline]
    fn outer_stride(&self) -> usize {
        self.outer_stride
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::DMatrix;
    use dense_traits::{Evaluator, EvaluatorMut, RowMajor};

    #[test]
    fn test_window_validation() {
        let data = [0.0f64; 20];
        // 3 x 4 column-major window with stride 5 spans 3 * 5 + 3 = 18
        assert!(Block::<f64>::from_slice(&data, 3, 4, 5).is_ok());
        assert_eq!(
            Block::<f64>::from_slice(&data, 3, 5, 5).unwrap_err(),
            DenseError::OutOfBounds {
                required: 23,
                len: 20
            }
        );
        // inner extent larger than the stride would overlap outer slices
        assert!(Block::<f64>::from_slice(&data, 6, 2, 5).is_err());
        assert!(Block::<f64, RowMajor>::from_slice(&data, 0, 100, 1).is_ok());
    }

    #[test]
    fn test_matrix_block_reads() {
        let m = DMatrix::<i32>::from_fn(4, 5, |r, c| (10 * r + c) as i32).unwrap();
        let b = m.block(1, 2, 2, 3).unwrap();
        assert_eq!((b.rows(), b.cols(), b.outer_stride()), (2, 3, 4));
        let e = b.evaluator();
        unsafe {
            assert_eq!(e.coeff(0, 0), 12);
            assert_eq!(e.coeff(1, 2), 24);
        }
        assert!(m.block(3, 0, 2, 1).is_err());
        assert!(m.block(4, 5, 0, 0).is_ok());
    }

    #[test]
    fn test_block_mut_writes_through() {
        let mut m = DMatrix::<f64, RowMajor>::zeros(3, 3).unwrap();
        {
            let mut b = m.block_mut(1, 1, 2, 2).unwrap();
            assert_eq!(b.outer_stride(), 3);
            let mut e = b.evaluator_mut();
            unsafe { *e.coeff_ref(1, 0) = 8.0 };
        }
        assert_eq!(m[(2, 1)], 8.0);
        assert!(!<Block<'_, f64> as Expr>::FLAGS.contains(Flags::LINEAR_ACCESS));
    }
}
