//! Traversal executors, one per reachable (traversal, unrolling) pair.

use dense_traits::{
    first_aligned, Aligned, AssignFunctor, Evaluate, EvaluateMut, Expr, PacketTraits, Unaligned,
};

use crate::kernel::Kernel;
use crate::selector::{AssignmentTraits, Strategy, Traversal, Unrolling};
use crate::simd::dispatch_if_large;
use crate::unroll::{
    coeffs_by_outer_inner, coeffs_inner, coeffs_linear, packets_by_outer_inner, packets_inner,
    packets_linear,
};

/// Call a generator with store/load alignment tags chosen by two booleans.
macro_rules! with_alignments {
    ($store:expr, $load:expr, $f:ident($($arg:expr),* $(,)?)) => {
        match ($store, $load) {
            (true, true) => $f::<Aligned, Aligned, _, _, _>($($arg),*),
            (true, false) => $f::<Aligned, Unaligned, _, _, _>($($arg),*),
            (false, true) => $f::<Unaligned, Aligned, _, _, _>($($arg),*),
            (false, false) => $f::<Unaligned, Unaligned, _, _, _>($($arg),*),
        }
    };
}

/// Run the executor selected for the kernel's (destination, source) pair.
pub fn run<D, S, F>(kernel: &mut Kernel<'_, D, S, F>)
where
    D: EvaluateMut,
    S: Evaluate<Scalar = D::Scalar>,
    F: AssignFunctor<D::Scalar>,
{
    // SAFETY: the strategy was selected for exactly this type pair.
    unsafe { run_with(kernel, AssignmentTraits::<D, S>::STRATEGY) }
}

/// Run the executor for `strategy`, regardless of what the selector picked.
///
/// # Safety
/// Every condition the selector checks for `strategy` must hold for the
/// pair: packet access and alignment for vectorized traversals, linear
/// access for linear ones, static sizes within the unrolled bounds, and a
/// plain-copy functor for `AllAtOnce`. `Default` with no unrolling is
/// always admissible.
pub unsafe fn run_with<D, S, F>(kernel: &mut Kernel<'_, D, S, F>, strategy: Strategy)
where
    D: EvaluateMut,
    S: Evaluate<Scalar = D::Scalar>,
    F: AssignFunctor<D::Scalar>,
{
    match (strategy.traversal, strategy.unrolling) {
        (Traversal::Default, Unrolling::None) => default_no_unrolling(kernel),
        (Traversal::Default, Unrolling::Complete) => default_complete_unrolling(kernel),
        (Traversal::Default, Unrolling::Inner) => default_inner_unrolling(kernel),
        (Traversal::InnerVectorized, Unrolling::None) => inner_vectorized_no_unrolling(kernel),
        (Traversal::InnerVectorized, Unrolling::Complete) => {
            inner_vectorized_complete_unrolling(kernel)
        }
        (Traversal::InnerVectorized, Unrolling::Inner) => inner_vectorized_inner_unrolling(kernel),
        (Traversal::LinearVectorized, Unrolling::Complete) => {
            linear_vectorized_complete_unrolling(kernel)
        }
        (Traversal::LinearVectorized, _) => linear_vectorized_no_unrolling(kernel),
        (Traversal::Linear, Unrolling::Complete) => linear_complete_unrolling(kernel),
        (Traversal::Linear, _) => linear_no_unrolling(kernel),
        (Traversal::SliceVectorized, _) => slice_vectorized(kernel),
        (Traversal::AllAtOnce, _) => kernel.eval_to_dst(),
    }
}

/// Boundaries `(aligned_start, aligned_end)` of the packet body of a flat
/// traversal over `size` coefficients starting at `dst`.
///
/// `0..aligned_start` is the scalar prefix (empty when the destination is
/// statically aligned), `aligned_start..aligned_end` a whole number of packets
/// starting on a packet boundary, and `aligned_end..size` the scalar suffix.
pub fn linear_vectorized_split<T: PacketTraits>(
    dst: *const T,
    size: usize,
    dst_is_aligned: bool,
) -> (usize, usize) {
    let aligned_start = if dst_is_aligned {
        0
    } else {
        first_aligned(dst, size)
    };
    let aligned_end = aligned_start + (size - aligned_start) / T::SIZE * T::SIZE;
    (aligned_start, aligned_end)
}

#[inline(always)]
fn packet_size<D: Expr>() -> usize {
    <D::Scalar as PacketTraits>::SIZE
}

// ---------------------------------------------------------------------------
// Default
// ---------------------------------------------------------------------------

unsafe fn default_no_unrolling<D, S, F>(kernel: &mut Kernel<'_, D, S, F>)
where
    D: EvaluateMut,
    S: Evaluate<Scalar = D::Scalar>,
    F: AssignFunctor<D::Scalar>,
{
    let (outer_size, inner_size) = (kernel.outer_size(), kernel.inner_size());
    dispatch_if_large(kernel.size(), || {
        for outer in 0..outer_size {
            for inner in 0..inner_size {
                kernel.assign_coeff_by_outer_inner(outer, inner);
            }
        }
    });
}

unsafe fn default_complete_unrolling<D, S, F>(kernel: &mut Kernel<'_, D, S, F>)
where
    D: EvaluateMut,
    S: Evaluate<Scalar = D::Scalar>,
    F: AssignFunctor<D::Scalar>,
{
    coeffs_by_outer_inner(kernel, 0, D::SIZE);
}

unsafe fn default_inner_unrolling<D, S, F>(kernel: &mut Kernel<'_, D, S, F>)
where
    D: EvaluateMut,
    S: Evaluate<Scalar = D::Scalar>,
    F: AssignFunctor<D::Scalar>,
{
    for outer in 0..kernel.outer_size() {
        coeffs_inner(kernel, outer);
    }
}

// ---------------------------------------------------------------------------
// InnerVectorized
// ---------------------------------------------------------------------------

unsafe fn inner_vectorized_no_unrolling<D, S, F>(kernel: &mut Kernel<'_, D, S, F>)
where
    D: EvaluateMut,
    S: Evaluate<Scalar = D::Scalar>,
    F: AssignFunctor<D::Scalar>,
{
    let (outer_size, inner_size) = (kernel.outer_size(), kernel.inner_size());
    let step = packet_size::<D>();
    dispatch_if_large(kernel.size(), || {
        for outer in 0..outer_size {
            let mut inner = 0;
            while inner < inner_size {
                kernel.assign_packet_by_outer_inner::<Aligned, Aligned>(outer, inner);
                inner += step;
            }
        }
    });
}

unsafe fn inner_vectorized_complete_unrolling<D, S, F>(kernel: &mut Kernel<'_, D, S, F>)
where
    D: EvaluateMut,
    S: Evaluate<Scalar = D::Scalar>,
    F: AssignFunctor<D::Scalar>,
{
    if AssignmentTraits::<D, S>::JOINT_ALIGNED {
        packets_by_outer_inner::<Aligned, Aligned, _, _, _>(kernel, 0, D::SIZE);
    } else {
        packets_by_outer_inner::<Aligned, Unaligned, _, _, _>(kernel, 0, D::SIZE);
    }
}

unsafe fn inner_vectorized_inner_unrolling<D, S, F>(kernel: &mut Kernel<'_, D, S, F>)
where
    D: EvaluateMut,
    S: Evaluate<Scalar = D::Scalar>,
    F: AssignFunctor<D::Scalar>,
{
    for outer in 0..kernel.outer_size() {
        packets_inner::<Aligned, Aligned, _, _, _>(kernel, outer);
    }
}

// ---------------------------------------------------------------------------
// LinearVectorized
// ---------------------------------------------------------------------------

unsafe fn linear_vectorized_no_unrolling<D, S, F>(kernel: &mut Kernel<'_, D, S, F>)
where
    D: EvaluateMut,
    S: Evaluate<Scalar = D::Scalar>,
    F: AssignFunctor<D::Scalar>,
{
    let size = kernel.size();
    if size == 0 {
        return;
    }
    let dst_is_aligned = AssignmentTraits::<D, S>::DST_IS_ALIGNED;
    let (aligned_start, aligned_end) =
        linear_vectorized_split(kernel.dst_data_ptr(), size, dst_is_aligned);
    let store_aligned = <D::Scalar as PacketTraits>::ALIGNED_ON_SCALAR || dst_is_aligned;
    let load_aligned = AssignmentTraits::<D, S>::JOINT_ALIGNED;

    dispatch_if_large(size, || {
        for index in 0..aligned_start {
            kernel.assign_coeff_linear(index);
        }
        with_alignments!(
            store_aligned,
            load_aligned,
            packets_linear(kernel, aligned_start, aligned_end)
        );
        for index in aligned_end..size {
            kernel.assign_coeff_linear(index);
        }
    });
}

unsafe fn linear_vectorized_complete_unrolling<D, S, F>(kernel: &mut Kernel<'_, D, S, F>)
where
    D: EvaluateMut,
    S: Evaluate<Scalar = D::Scalar>,
    F: AssignFunctor<D::Scalar>,
{
    // Only selected for statically aligned destinations.
    let aligned_size = D::SIZE / packet_size::<D>() * packet_size::<D>();
    if AssignmentTraits::<D, S>::JOINT_ALIGNED {
        packets_linear::<Aligned, Aligned, _, _, _>(kernel, 0, aligned_size);
    } else {
        packets_linear::<Aligned, Unaligned, _, _, _>(kernel, 0, aligned_size);
    }
    coeffs_by_outer_inner(kernel, aligned_size, D::SIZE);
}

// ---------------------------------------------------------------------------
// Linear
// ---------------------------------------------------------------------------

unsafe fn linear_no_unrolling<D, S, F>(kernel: &mut Kernel<'_, D, S, F>)
where
    D: EvaluateMut,
    S: Evaluate<Scalar = D::Scalar>,
    F: AssignFunctor<D::Scalar>,
{
    let size = kernel.size();
    dispatch_if_large(size, || {
        for index in 0..size {
            kernel.assign_coeff_linear(index);
        }
    });
}

unsafe fn linear_complete_unrolling<D, S, F>(kernel: &mut Kernel<'_, D, S, F>)
where
    D: EvaluateMut,
    S: Evaluate<Scalar = D::Scalar>,
    F: AssignFunctor<D::Scalar>,
{
    coeffs_linear(kernel);
}

// ---------------------------------------------------------------------------
// SliceVectorized
// ---------------------------------------------------------------------------

unsafe fn slice_vectorized<D, S, F>(kernel: &mut Kernel<'_, D, S, F>)
where
    D: EvaluateMut,
    S: Evaluate<Scalar = D::Scalar>,
    F: AssignFunctor<D::Scalar>,
{
    if kernel.size() == 0 {
        return;
    }
    let dst_is_aligned = AssignmentTraits::<D, S>::DST_IS_ALIGNED;
    let alignable = <D::Scalar as PacketTraits>::ALIGNED_ON_SCALAR || dst_is_aligned;
    let dst_ptr = kernel.dst_data_ptr();

    // Not even scalar aligned: no packet boundary is ever reachable.
    if !alignable && (dst_ptr as usize) % std::mem::size_of::<D::Scalar>() != 0 {
        return default_no_unrolling(kernel);
    }

    let aligned_start = if !alignable || dst_is_aligned {
        0
    } else {
        first_aligned(dst_ptr, kernel.inner_size())
    };
    if alignable {
        slice_vectorized_body::<Aligned, _, _, _>(kernel, aligned_start, true);
    } else {
        slice_vectorized_body::<Unaligned, _, _, _>(kernel, aligned_start, false);
    }
}

#[inline(always)]
unsafe fn slice_vectorized_body<St, D, S, F>(
    kernel: &mut Kernel<'_, D, S, F>,
    mut aligned_start: usize,
    alignable: bool,
) where
    St: dense_traits::Alignment,
    D: EvaluateMut,
    S: Evaluate<Scalar = D::Scalar>,
    F: AssignFunctor<D::Scalar>,
{
    let step = packet_size::<D>();
    let mask = step - 1;
    let (outer_size, inner_size) = (kernel.outer_size(), kernel.inner_size());
    // Shift of the first aligned inner index from one outer slice to the next.
    let aligned_step = if alignable {
        (step - kernel.outer_stride() % step) & mask
    } else {
        0
    };

    dispatch_if_large(kernel.size(), || {
        for outer in 0..outer_size {
            let aligned_end = aligned_start + ((inner_size - aligned_start) & !mask);
            for inner in 0..aligned_start {
                kernel.assign_coeff_by_outer_inner(outer, inner);
            }
            let mut inner = aligned_start;
            while inner < aligned_end {
                kernel.assign_packet_by_outer_inner::<St, Unaligned>(outer, inner);
                inner += step;
            }
            for inner in aligned_end..inner_size {
                kernel.assign_coeff_by_outer_inner(outer, inner);
            }
            aligned_start = ((aligned_start + aligned_step) % step).min(inner_size);
        }
    });
}
