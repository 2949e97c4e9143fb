//! The per-position assignment primitive shared by every executor.

use dense_traits::{
    Alignment, AssignFunctor, Evaluate, EvaluateMut, Evaluator, EvaluatorMut, Geometry,
};

/// Binds a destination evaluator, a source evaluator and a functor for the
/// duration of one assignment.
///
/// All positional primitives are `unsafe`: positions must lie inside the
/// destination geometry, and packet alignment tags must match what the
/// strategy selector proved about both sides.
pub struct Kernel<'a, D, S, F>
where
    D: EvaluateMut + 'a,
    S: Evaluate + 'a,
{
    dst: D::EvaluatorMut<'a>,
    src: S::Evaluator<'a>,
    functor: F,
    geometry: Geometry,
}

impl<'a, D, S, F> Kernel<'a, D, S, F>
where
    D: EvaluateMut + 'a,
    S: Evaluate<Scalar = D::Scalar> + 'a,
    F: AssignFunctor<D::Scalar>,
{
    /// # Safety
    /// `src` must have the extents of `geometry`, and `dst` must address
    /// exactly the destination `geometry` was taken from.
    pub unsafe fn new(
        dst: D::EvaluatorMut<'a>,
        src: S::Evaluator<'a>,
        functor: F,
        geometry: Geometry,
    ) -> Self {
        Self {
            dst,
            src,
            functor,
            geometry,
        }
    }

    #[inline(always)]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    #[inline(always)]
    pub fn size(&self) -> usize {
        self.geometry.size()
    }

    #[inline(always)]
    pub fn inner_size(&self) -> usize {
        self.geometry.inner_size
    }

    #[inline(always)]
    pub fn outer_size(&self) -> usize {
        self.geometry.outer_size
    }

    #[inline(always)]
    pub fn outer_stride(&self) -> usize {
        self.geometry.outer_stride
    }

    /// Row of the destination position `(outer, inner)`.
    #[inline(always)]
    pub fn row_index(outer: usize, inner: usize) -> usize {
        if D::ROWS == 1 {
            0
        } else if D::COLS == 1 || !D::ROW_MAJOR {
            inner
        } else {
            outer
        }
    }

    /// Column of the destination position `(outer, inner)`.
    #[inline(always)]
    pub fn col_index(outer: usize, inner: usize) -> usize {
        if D::COLS == 1 {
            0
        } else if D::ROWS == 1 || D::ROW_MAJOR {
            inner
        } else {
            outer
        }
    }

    /// Address of the first destination coefficient.
    ///
    /// # Safety
    /// The destination must not be empty.
    #[inline(always)]
    pub unsafe fn dst_data_ptr(&mut self) -> *const D::Scalar {
        self.dst.coeff_ptr(0, 0)
    }

    /// # Safety
    /// `(row, col)` must be inside the destination.
    #[inline(always)]
    pub unsafe fn assign_coeff(&mut self, row: usize, col: usize) {
        let value = self.src.coeff(row, col);
        self.functor.assign_coeff(self.dst.coeff_ref(row, col), value);
    }

    /// # Safety
    /// `index` must be inside the destination, and both sides must have linear access.
    #[inline(always)]
    pub unsafe fn assign_coeff_linear(&mut self, index: usize) {
        let value = self.src.coeff_linear(index);
        self.functor.assign_coeff(self.dst.coeff_ref_linear(index), value);
    }

    /// # Safety
    /// Same as [`assign_coeff`](Self::assign_coeff).
    #[inline(always)]
    pub unsafe fn assign_coeff_by_outer_inner(&mut self, outer: usize, inner: usize) {
        self.assign_coeff(Self::row_index(outer, inner), Self::col_index(outer, inner));
    }

    /// Assign one packet along the inner axis, storing with `St` and loading with `Ld`.
    ///
    /// # Safety
    /// The packet must be inside the destination, both sides must have
    /// packet access, and the addresses must satisfy `St` and `Ld`.
    #[inline(always)]
    pub unsafe fn assign_packet<St: Alignment, Ld: Alignment>(&mut self, row: usize, col: usize) {
        let packet = self.src.packet::<Ld>(row, col);
        self.functor
            .assign_packet::<St>(self.dst.coeff_ptr(row, col), packet);
    }

    /// # Safety
    /// Same as [`assign_packet`](Self::assign_packet), plus linear access on both sides.
    #[inline(always)]
    pub unsafe fn assign_packet_linear<St: Alignment, Ld: Alignment>(&mut self, index: usize) {
        let packet = self.src.packet_linear::<Ld>(index);
        self.functor
            .assign_packet::<St>(self.dst.coeff_ptr_linear(index), packet);
    }

    /// # Safety
    /// Same as [`assign_packet`](Self::assign_packet).
    #[inline(always)]
    pub unsafe fn assign_packet_by_outer_inner<St: Alignment, Ld: Alignment>(
        &mut self,
        outer: usize,
        inner: usize,
    ) {
        self.assign_packet::<St, Ld>(Self::row_index(outer, inner), Self::col_index(outer, inner));
    }

    /// Let the source write itself into the destination, bypassing the functor.
    pub fn eval_to_dst(&mut self) {
        // SAFETY: `new` guarantees the source covers the destination geometry.
        unsafe { self.src.eval_to(&mut self.dst, &self.geometry) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dense_traits::{AddAssignOp, AssignOp, ColMajor, RowMajor, Unaligned};
    use dense_view::{DMatrix, Matrix, Matrix2};

    type RowVec = Matrix<f64, 1, 5, ColMajor>;
    type ColVec = Matrix<f64, 5, 1, RowMajor>;
    type K<'a, D> = Kernel<'a, D, D, AssignOp>;

    #[test]
    fn test_outer_inner_mapping() {
        // plain matrices follow the storage order
        assert_eq!(K::<DMatrix<f64>>::row_index(3, 1), 1);
        assert_eq!(K::<DMatrix<f64>>::col_index(3, 1), 3);
        assert_eq!(K::<DMatrix<f64, RowMajor>>::row_index(3, 1), 3);
        assert_eq!(K::<DMatrix<f64, RowMajor>>::col_index(3, 1), 1);

        // vectors ignore the storage order
        assert_eq!(K::<RowVec>::row_index(0, 4), 0);
        assert_eq!(K::<RowVec>::col_index(0, 4), 4);
        assert_eq!(K::<ColVec>::row_index(0, 4), 4);
        assert_eq!(K::<ColVec>::col_index(0, 4), 0);
    }

    #[test]
    fn test_coefficient_and_packet_primitives() {
        let src = Matrix2::<f64>::from_fn(2, 2, |r, c| (1 + r + 2 * c) as f64).unwrap();
        let mut dst = Matrix2::<f64>::from_fn(2, 2, |_, _| 10.0).unwrap();
        let geometry = Geometry::of(&dst);
        {
            let mut kernel = unsafe {
                Kernel::<Matrix2<f64>, Matrix2<f64>, AddAssignOp>::new(
                    dst.evaluator_mut(),
                    src.evaluator(),
                    AddAssignOp,
                    geometry,
                )
            };
            assert_eq!((kernel.inner_size(), kernel.outer_size()), (2, 2));
            unsafe {
                kernel.assign_coeff(1, 0);
                kernel.assign_coeff_linear(2);
                kernel.assign_packet_by_outer_inner::<Unaligned, Unaligned>(1, 0);
            }
        }
        // (1,0) += 2, linear 2 = (0,1) += 3, then column 1 += [3, 4]
        assert_eq!(dst.as_slice(), &[10.0, 12.0, 16.0, 14.0]);
    }
}
