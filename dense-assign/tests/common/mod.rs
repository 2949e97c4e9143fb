#![allow(dead_code)]

use std::cell::Cell;

use dense_traits::{Alignment, AssignFunctor, Evaluate, Evaluator, PacketTraits};

/// All coefficients of `expr`, row by row, read through its evaluator.
pub fn coefficients<E: Evaluate>(expr: &E) -> Vec<Vec<E::Scalar>> {
    let eval = expr.evaluator();
    (0..expr.rows())
        .map(|r| (0..expr.cols()).map(|c| unsafe { eval.coeff(r, c) }).collect())
        .collect()
}

pub fn table<T>(rows: usize, cols: usize, f: impl Fn(usize, usize) -> T) -> Vec<Vec<T>> {
    (0..rows).map(|r| (0..cols).map(|c| f(r, c)).collect()).collect()
}

pub fn value(r: usize, c: usize) -> f64 {
    (r * 100 + c) as f64 + 0.5
}

/// Plain copy that counts how often each primitive is used.
#[derive(Clone, Copy)]
pub struct Counting<'c> {
    pub coeffs: &'c Cell<usize>,
    pub packets: &'c Cell<usize>,
}

impl<'c, T: PacketTraits> AssignFunctor<T> for Counting<'c> {
    const IS_PLAIN_COPY: bool = true;
    const NAME: &'static str = "counting";

    fn assign_coeff(&self, dst: &mut T, src: T) {
        self.coeffs.set(self.coeffs.get() + 1);
        *dst = src;
    }

    unsafe fn assign_packet<A: Alignment>(&self, dst: *mut T, src: T::Packet) {
        self.packets.set(self.packets.get() + 1);
        T::store::<A>(dst, src);
    }
}

/// Counters for a [`Counting`] functor.
#[derive(Default)]
pub struct Counts {
    pub coeffs: Cell<usize>,
    pub packets: Cell<usize>,
}

impl Counts {
    pub fn functor(&self) -> Counting<'_> {
        Counting {
            coeffs: &self.coeffs,
            packets: &self.packets,
        }
    }

    pub fn get(&self) -> (usize, usize) {
        (self.coeffs.get(), self.packets.get())
    }
}

/// 16-byte aligned scratch buffer, for placing views at known misalignments.
#[repr(C, align(16))]
pub struct AlignedF32(pub [f32; 32]);
