//! Optional runtime target-feature dispatch around dynamic loops.
//!
//! With the `simd` feature the closure runs inside `pulp`'s best available
//! instruction-set context, which lets the compiler widen the packet loops
//! beyond the baseline target. Without it the closure is called directly.

/// Loops shorter than this are not worth the dispatch.
pub(crate) const DISPATCH_THRESHOLD: usize = 64;

#[inline(always)]
pub(crate) fn dispatch<R>(f: impl FnOnce() -> R) -> R {
    #[cfg(feature = "simd")]
    {
        pulp::Arch::new().dispatch(f)
    }
    #[cfg(not(feature = "simd"))]
    {
        f()
    }
}

#[inline(always)]
pub(crate) fn dispatch_if_large<R>(len: usize, f: impl FnOnce() -> R) -> R {
    if len >= DISPATCH_THRESHOLD {
        dispatch(f)
    } else {
        f()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_runs_closure_once() {
        let mut calls = 0;
        let out = dispatch_if_large(1000, || {
            calls += 1;
            7
        });
        assert_eq!((out, calls), (7, 1));
        assert_eq!(dispatch_if_large(3, || 5), 5);
    }
}
