//! Pointer-based evaluators shared by every directly addressable container.

use std::marker::PhantomData;

use dense_traits::{Alignment, Evaluator, EvaluatorMut, Expr, PacketTraits, StorageOrder};

/// Read evaluator over memory with unit inner stride.
#[derive(Debug)]
pub struct DenseEvaluator<'a, T, O> {
    ptr: *const T,
    outer_stride: usize,
    _marker: PhantomData<(&'a [T], O)>,
}

impl<'a, T, O> Clone for DenseEvaluator<'a, T, O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T, O> Copy for DenseEvaluator<'a, T, O> {}

impl<'a, T: PacketTraits, O: StorageOrder> DenseEvaluator<'a, T, O> {
    /// # Safety
    /// Every coefficient addressed through the evaluator must be readable for `'a`.
    pub unsafe fn new(ptr: *const T, outer_stride: usize) -> Self {
        Self {
            ptr,
            outer_stride,
            _marker: PhantomData,
        }
    }

    #[inline(always)]
    unsafe fn at(&self, row: usize, col: usize) -> *const T {
        self.ptr.add(O::offset(row, col, self.outer_stride))
    }
}

impl<'a, T: PacketTraits, O: StorageOrder> Evaluator for DenseEvaluator<'a, T, O> {
    type Scalar = T;

    #[inline(always)]
    unsafe fn coeff(&self, row: usize, col: usize) -> T {
        *self.at(row, col)
    }

    #[inline(always)]
    unsafe fn coeff_linear(&self, index: usize) -> T {
        *self.ptr.add(index)
    }

    #[inline(always)]
    unsafe fn packet<A: Alignment>(&self, row: usize, col: usize) -> T::Packet {
        T::load::<A>(self.at(row, col))
    }

    #[inline(always)]
    unsafe fn packet_linear<A: Alignment>(&self, index: usize) -> T::Packet {
        T::load::<A>(self.ptr.add(index))
    }
}

/// Write evaluator over memory with unit inner stride.
#[derive(Debug)]
pub struct DenseEvaluatorMut<'a, T, O> {
    ptr: *mut T,
    outer_stride: usize,
    _marker: PhantomData<(&'a mut [T], O)>,
}

impl<'a, T: PacketTraits, O: StorageOrder> DenseEvaluatorMut<'a, T, O> {
    /// # Safety
    /// Every coefficient addressed through the evaluator must be writable for `'a`.
    pub unsafe fn new(ptr: *mut T, outer_stride: usize) -> Self {
        Self {
            ptr,
            outer_stride,
            _marker: PhantomData,
        }
    }
}

impl<'a, T: PacketTraits, O: StorageOrder> Evaluator for DenseEvaluatorMut<'a, T, O> {
    type Scalar = T;

    #[inline(always)]
    unsafe fn coeff(&self, row: usize, col: usize) -> T {
        *self.ptr.add(O::offset(row, col, self.outer_stride))
    }

    #[inline(always)]
    unsafe fn coeff_linear(&self, index: usize) -> T {
        *self.ptr.add(index)
    }

    #[inline(always)]
    unsafe fn packet<A: Alignment>(&self, row: usize, col: usize) -> T::Packet {
        T::load::<A>(self.ptr.add(O::offset(row, col, self.outer_stride)))
    }

    #[inline(always)]
    unsafe fn packet_linear<A: Alignment>(&self, index: usize) -> T::Packet {
        T::load::<A>(self.ptr.add(index))
    }
}

impl<'a, T: PacketTraits, O: StorageOrder> EvaluatorMut for DenseEvaluatorMut<'a, T, O> {
    #[inline(always)]
    unsafe fn coeff_ptr(&mut self, row: usize, col: usize) -> *mut T {
        self.ptr.add(O::offset(row, col, self.outer_stride))
    }

    #[inline(always)]
    unsafe fn coeff_ptr_linear(&mut self, index: usize) -> *mut T {
        self.ptr.add(index)
    }
}

/// Position `step` coefficients further along the inner axis of `E`.
///
/// Vectors advance along their only non-unit axis regardless of storage order.
#[inline(always)]
pub(crate) fn advance_inner<E: Expr + ?Sized>(row: usize, col: usize, step: usize) -> (usize, usize) {
    if E::ROWS == 1 {
        (row, col + step)
    } else if E::COLS == 1 || !E::ROW_MAJOR {
        (row + step, col)
    } else {
        (row, col + step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dense_traits::{ColMajor, RowMajor, Unaligned};

    #[test]
    fn test_row_major_access() {
        // 2 x 3 row-major
        let data = [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0];
        let eval = unsafe { DenseEvaluator::<f64, RowMajor>::new(data.as_ptr(), 3) };
        unsafe {
            assert_eq!(eval.coeff(1, 0), 4.0);
            assert_eq!(eval.coeff_linear(5), 6.0);
            let p = eval.packet::<Unaligned>(1, 1);
            assert_eq!(p.0, [5.0, 6.0]);
        }
    }

    #[test]
    fn test_strided_col_major_write() {
        // 2 x 2 block of a 3-row column-major buffer
        let mut data = [0i32; 9];
        let mut eval = unsafe { DenseEvaluatorMut::<i32, ColMajor>::new(data.as_mut_ptr(), 3) };
        unsafe {
            *eval.coeff_ref(1, 1) = 7;
            *eval.coeff_ref(0, 2) = 9;
            assert_eq!(eval.coeff(1, 1), 7);
        }
        assert_eq!(data, [0, 0, 0, 0, 7, 0, 9, 0, 0]);
    }
}
