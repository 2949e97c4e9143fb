//! Contiguous views over borrowed storage.

use std::marker::PhantomData;

use dense_traits::{
    ColMajor, Dense, Evaluate, EvaluateMut, Expr, Flags, PacketTraits, StorageOrder, DYNAMIC,
};

use crate::evaluator::{DenseEvaluator, DenseEvaluatorMut};
use crate::{check_static_dims, DenseError, Result};

fn required_len(rows: usize, cols: usize, len: usize) -> Result<()> {
    let required = rows.checked_mul(cols).ok_or(DenseError::OutOfBounds {
        required: usize::MAX,
        len,
    })?;
    if required > len {
        return Err(DenseError::OutOfBounds { required, len });
    }
    Ok(())
}

const MAP_FLAGS: Flags = Flags::LINEAR_ACCESS.union(Flags::DIRECT_ACCESS);

/// Read-only `rows x cols` view of contiguous memory in order `O`.
///
/// No alignment is promised: the base address is whatever the caller passed.
#[derive(Debug, Clone, Copy)]
pub struct Map<'a, T, const R: usize, const C: usize, O = ColMajor> {
    ptr: *const T,
    rows: usize,
    cols: usize,
    _marker: PhantomData<(&'a [T], O)>,
}

/// Mutable `rows x cols` view of contiguous memory in order `O`.
#[derive(Debug)]
pub struct MapMut<'a, T, const R: usize, const C: usize, O = ColMajor> {
    ptr: *mut T,
    rows: usize,
    cols: usize,
    _marker: PhantomData<(&'a mut [T], O)>,
}

/// Column vector view of a slice.
pub type VectorMap<'a, T> = Map<'a, T, DYNAMIC, 1, ColMajor>;
pub type VectorMapMut<'a, T> = MapMut<'a, T, DYNAMIC, 1, ColMajor>;

impl<'a, T: PacketTraits, const R: usize, const C: usize, O: StorageOrder> Map<'a, T, R, C, O> {
    pub fn from_slice(data: &'a [T], rows: usize, cols: usize) -> Result<Self> {
        check_static_dims(R, C, rows, cols)?;
        required_len(rows, cols, data.len())?;
        Ok(Self {
            ptr: data.as_ptr(),
            rows,
            cols,
            _marker: PhantomData,
        })
    }

    /// # Safety
    /// `ptr` must be valid for reads of `rows * cols` coefficients for `'a`,
    /// and the extents must agree with `R` and `C`.
    pub unsafe fn from_raw_parts(ptr: *const T, rows: usize, cols: usize) -> Self {
        debug_assert!(check_static_dims(R, C, rows, cols).is_ok());
        Self {
            ptr,
            rows,
            cols,
            _marker: PhantomData,
        }
    }

    pub fn as_ptr(&self) -> *const T {
        self.ptr
    }
}

impl<'a, T: PacketTraits> VectorMap<'a, T> {
    /// View a whole slice as a column vector.
    pub fn from_vector(data: &'a [T]) -> Self {
        Self {
            ptr: data.as_ptr(),
            rows: data.len(),
            cols: 1,
            _marker: PhantomData,
        }
    }
}

impl<'a, T: PacketTraits, const R: usize, const C: usize, O: StorageOrder> MapMut<'a, T, R, C, O> {
    pub fn from_slice(data: &'a mut [T], rows: usize, cols: usize) -> Result<Self> {
        check_static_dims(R, C, rows, cols)?;
        required_len(rows, cols, data.len())?;
        Ok(Self {
            ptr: data.as_mut_ptr(),
            rows,
            cols,
            _marker: PhantomData,
        })
    }

    /// # Safety
    /// `ptr` must be valid for reads and writes of `rows * cols` coefficients
    /// for `'a`, and the extents must agree with `R` and `C`. Other views of
    /// the same memory may exist only if every assignment through them goes
    /// through an aliasing-safe entry point.
    pub unsafe fn from_raw_parts(ptr: *mut T, rows: usize, cols: usize) -> Self {
        debug_assert!(check_static_dims(R, C, rows, cols).is_ok());
        Self {
            ptr,
            rows,
            cols,
            _marker: PhantomData,
        }
    }

    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr
    }
}

impl<'a, T: PacketTraits> VectorMapMut<'a, T> {
    pub fn from_vector(data: &'a mut [T]) -> Self {
        Self {
            ptr: data.as_mut_ptr(),
            rows: data.len(),
            cols: 1,
            _marker: PhantomData,
        }
    }
}

macro_rules! impl_map_expr {
    ($name:ident) => {
        impl<'a, T: PacketTraits, const R: usize, const C: usize, O: StorageOrder> Expr
            for $name<'a, T, R, C, O>
        {
            type Scalar = T;
            type Order = O;
            type Shape = Dense;

            const ROWS: usize = R;
            const COLS: usize = C;
            const FLAGS: Flags = MAP_FLAGS.union(Flags::packet_if(T::VECTORIZABLE));
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

        impl<'a, T: PacketTraits, const R: usize, const C: usize, O: StorageOrder> Evaluate
            for $name<'a, T, R, C, O>
        {
            type Evaluator<'b> = DenseEvaluator<'b, T, O> where Self: 'b;

            fn evaluator(&self) -> Self::Evaluator<'_> {
                // SAFETY: construction guarantees rows * cols readable coefficients.
                unsafe {
                    DenseEvaluator::new(self.ptr, O::contiguous_outer_stride(self.rows, self.cols))
                }
            }
        }
    };
}

impl_map_expr!(Map);
impl_map_expr!(MapMut);

impl<'a, T: PacketTraits, const R: usize, const C: usize, O: StorageOrder> EvaluateMut
    for MapMut<'a, T, R, C, O>
{
    type EvaluatorMut<'b> = DenseEvaluatorMut<'b, T, O> where Self: 'b;

    fn evaluator_mut(&mut self) -> Self::EvaluatorMut<'_> {
        // SAFETY: construction guarantees rows * cols writable coefficients.
        unsafe { DenseEvaluatorMut::new(self.ptr, self.outer_stride()) }
    }

    #[inline]
    fn outer_stride(&self) -> usize {
        O::contiguous_outer_stride(self.rows, self.cols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dense_traits::{Evaluator, RowMajor};

    #[test]
    fn test_from_slice_validates() {
        let data = [0.0f64; 6];
        assert!(Map::<f64, 2, 3>::from_slice(&data, 2, 3).is_ok());
        assert_eq!(
            Map::<f64, DYNAMIC, DYNAMIC>::from_slice(&data, 3, 3).unwrap_err(),
            DenseError::OutOfBounds {
                required: 9,
                len: 6
            }
        );
        assert!(Map::<f64, 2, 2>::from_slice(&data, 3, 2).is_err());
    }

    #[test]
    fn test_map_reads_in_order() {
        let data = [1, 2, 3, 4, 5, 6];
        let m = Map::<i32, 2, 3, RowMajor>::from_slice(&data, 2, 3).unwrap();
        let e = m.evaluator();
        unsafe {
            assert_eq!(e.coeff(1, 0), 4);
            assert_eq!(e.coeff(0, 2), 3);
        }
        assert!(!<Map<'_, i32, 2, 3, RowMajor> as Expr>::FLAGS.contains(Flags::ALIGNED));
    }

    #[test]
    fn test_vector_map() {
        let mut data = vec![1.0f32; 17];
        let v = VectorMapMut::from_vector(&mut data);
        assert_eq!((v.rows(), v.cols()), (17, 1));
        assert_eq!((v.inner_size(), v.outer_size()), (17, 1));
        assert_eq!(v.outer_stride(), 17);
    }
}
