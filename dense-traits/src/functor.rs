//! Element-wise assignment operations.
//!
//! A functor decides what "assign" means for one coefficient or one packet:
//! plain copy, add-into, subtract-into, multiply-into. Functors are `Copy`
//! and are invoked exactly once per destination position.

use crate::packet::{Alignment, PacketTraits};

/// An element-wise assignment rule for scalar type `T`.
pub trait AssignFunctor<T: PacketTraits>: Copy {
    /// The destination ends up equal to the source, independently of its
    /// previous contents. Bulk evaluation is only allowed for such functors.
    const IS_PLAIN_COPY: bool = false;

    const NAME: &'static str;

    fn assign_coeff(&self, dst: &mut T, src: T);

    /// # Safety
    /// `dst..dst + T::SIZE` must be valid for reads and writes, and aligned
    /// when `A` is `Aligned`.
    unsafe fn assign_packet<A: Alignment>(&self, dst: *mut T, src: T::Packet);
}

/// `dst = src`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssignOp;

/// `dst += src`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddAssignOp;

/// `dst -= src`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubAssignOp;

/// `dst *= src`, coefficient-wise
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MulAssignOp;

impl<T: PacketTraits> AssignFunctor<T> for AssignOp {
    const IS_PLAIN_COPY: bool = true;
    const NAME: &'static str = "assign";

    #[inline(always)]
    fn assign_coeff(&self, dst: &mut T, src: T) {
        *dst = src;
    }

    #[inline(always)]
    unsafe fn assign_packet<A: Alignment>(&self, dst: *mut T, src: T::Packet) {
        T::store::<A>(dst, src);
    }
}

macro_rules! impl_compound_assign {
    ($op:ident, $name:literal, $pop:ident, |$d:ident, $s:ident| $scalar:expr) => {
        impl<T: PacketTraits> AssignFunctor<T> for $op {
            const NAME: &'static str = $name;

            #[inline(always)]
            fn assign_coeff(&self, dst: &mut T, src: T) {
                let ($d, $s) = (*dst, src);
                *dst = $scalar;
            }

            #[inline(always)]
            unsafe fn assign_packet<A: Alignment>(&self, dst: *mut T, src: T::Packet) {
                let current = T::load::<A>(dst);
                T::store::<A>(dst, T::$pop(current, src));
            }
        }
    };
}

impl_compound_assign!(AddAssignOp, "add_assign", padd, |d, s| d + s);
impl_compound_assign!(SubAssignOp, "sub_assign", psub, |d, s| d - s);
impl_compound_assign!(MulAssignOp, "mul_assign", pmul, |d, s| d * s);
