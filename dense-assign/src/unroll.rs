//! Emission over statically known trip counts.
//!
//! Every generator takes its bounds from associated constants of the
//! destination type. [`emit`] itself is an ordinary `while` loop unrolled by
//! hand four bodies at a time with a scalar tail; once it is inlined its
//! bounds are literals, and removing the remaining loop is left to the
//! optimizer's constant folding. Nothing here forces it. The `unrolling_4x4`
//! group of `benches/assign_bench.rs` compares the unrolled executors against
//! the looping ones and a hand-written loop at 4x4.

use dense_traits::{Alignment, AssignFunctor, Evaluate, EvaluateMut, Expr};

use crate::kernel::Kernel;

/// Call `f(i)` for `i = start, start + step, ..` below `stop`.
#[inline(always)]
pub(crate) fn emit(start: usize, stop: usize, step: usize, mut f: impl FnMut(usize)) {
    debug_assert!(step > 0);
    let mut i = start;
    while i + 4 * step <= stop {
        f(i);
        f(i + step);
        f(i + 2 * step);
        f(i + 3 * step);
        i += 4 * step;
    }
    while i < stop {
        f(i);
        i += step;
    }
}

/// One coefficient per linear position in `start..stop`, split into
/// `(outer, inner)` by the static inner size.
///
/// # Safety
/// `D::SIZE` and `D::INNER_SIZE` must be static and match the kernel's geometry.
#[inline(always)]
pub(crate) unsafe fn coeffs_by_outer_inner<D, S, F>(
    kernel: &mut Kernel<'_, D, S, F>,
    start: usize,
    stop: usize,
) where
    D: EvaluateMut,
    S: Evaluate<Scalar = D::Scalar>,
    F: AssignFunctor<D::Scalar>,
{
    let inner_size = <D as Expr>::INNER_SIZE;
    emit(start, stop, 1, |index| {
        kernel.assign_coeff_by_outer_inner(index / inner_size, index % inner_size)
    });
}

/// One coefficient per inner position of a single outer slice.
///
/// # Safety
/// `D::INNER_SIZE` must be static and `outer` inside the destination.
#[inline(always)]
pub(crate) unsafe fn coeffs_inner<D, S, F>(kernel: &mut Kernel<'_, D, S, F>, outer: usize)
where
    D: EvaluateMut,
    S: Evaluate<Scalar = D::Scalar>,
    F: AssignFunctor<D::Scalar>,
{
    emit(0, D::INNER_SIZE, 1, |inner| {
        kernel.assign_coeff_by_outer_inner(outer, inner)
    });
}

/// One coefficient per linear index in `0..D::SIZE`.
///
/// # Safety
/// `D::SIZE` must be static, and both sides must have linear access.
#[inline(always)]
pub(crate) unsafe fn coeffs_linear<D, S, F>(kernel: &mut Kernel<'_, D, S, F>)
where
    D: EvaluateMut,
    S: Evaluate<Scalar = D::Scalar>,
    F: AssignFunctor<D::Scalar>,
{
    emit(0, D::SIZE, 1, |index| kernel.assign_coeff_linear(index));
}

/// One packet per `SIZE` linear positions in `start..stop`, split into
/// `(outer, inner)` by the static inner size.
///
/// # Safety
/// As [`coeffs_by_outer_inner`], plus packet access and the alignments `St`/`Ld`
/// at every emitted position.
#[inline(always)]
pub(crate) unsafe fn packets_by_outer_inner<St, Ld, D, S, F>(
    kernel: &mut Kernel<'_, D, S, F>,
    start: usize,
    stop: usize,
) where
    St: Alignment,
    Ld: Alignment,
    D: EvaluateMut,
    S: Evaluate<Scalar = D::Scalar>,
    F: AssignFunctor<D::Scalar>,
{
    let inner_size = <D as Expr>::INNER_SIZE;
    emit(start, stop, packet_size::<D>(), |index| {
        kernel.assign_packet_by_outer_inner::<St, Ld>(index / inner_size, index % inner_size)
    });
}

/// One packet per `SIZE` inner positions of a single outer slice.
///
/// # Safety
/// As [`coeffs_inner`], plus packet access and the alignments `St`/`Ld`.
#[inline(always)]
pub(crate) unsafe fn packets_inner<St, Ld, D, S, F>(kernel: &mut Kernel<'_, D, S, F>, outer: usize)
where
    St: Alignment,
    Ld: Alignment,
    D: EvaluateMut,
    S: Evaluate<Scalar = D::Scalar>,
    F: AssignFunctor<D::Scalar>,
{
    emit(0, D::INNER_SIZE, packet_size::<D>(), |inner| {
        kernel.assign_packet_by_outer_inner::<St, Ld>(outer, inner)
    });
}

/// One packet per `SIZE` linear positions in `start..stop`.
///
/// # Safety
/// Both sides must have linear packet access, with alignments `St`/`Ld` at
/// every emitted position.
#[inline(always)]
pub(crate) unsafe fn packets_linear<St, Ld, D, S, F>(
    kernel: &mut Kernel<'_, D, S, F>,
    start: usize,
    stop: usize,
) where
    St: Alignment,
    Ld: Alignment,
    D: EvaluateMut,
    S: Evaluate<Scalar = D::Scalar>,
    F: AssignFunctor<D::Scalar>,
{
    emit(start, stop, packet_size::<D>(), |index| {
        kernel.assign_packet_linear::<St, Ld>(index)
    });
}

#[inline(always)]
fn packet_size<D: Expr>() -> usize {
    <D::Scalar as dense_traits::PacketTraits>::SIZE
}
