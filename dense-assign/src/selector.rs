//! Static traversal and unrolling selection.
//!
//! [`select`] is a `const fn` over the static properties of both sides, so
//! the strategy of every (destination, source) type pair is a compile-time
//! constant exposed through [`AssignmentTraits`]. The decision order below
//! matters: several conditions can hold at once and the first one wins.

use std::fmt;
use std::marker::PhantomData;

use dense_traits::{is_dynamic, static_mul, Expr, Flags, PacketTraits, DYNAMIC};

/// Order in which destination positions are visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Traversal {
    /// Outer loop over the outer axis, inner loop over the inner axis, one coefficient at a time.
    Default,
    /// One flat loop over the linear index.
    Linear,
    /// Like `Default`, stepping the inner index by whole aligned packets.
    InnerVectorized,
    /// Flat loop with a scalar prefix, an aligned packet body and a scalar suffix.
    LinearVectorized,
    /// Per outer slice, a scalar prefix, packets, and a scalar suffix.
    SliceVectorized,
    /// The source evaluates itself into the destination in one call.
    AllAtOnce,
}

/// How much of the traversal is replicated at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unrolling {
    None,
    /// Every position is emitted without a loop.
    Complete,
    /// The inner axis is emitted without a loop; the outer loop remains.
    Inner,
}

impl Traversal {
    pub const fn name(self) -> &'static str {
        match self {
            Traversal::Default => "default",
            Traversal::Linear => "linear",
            Traversal::InnerVectorized => "inner-vectorized",
            Traversal::LinearVectorized => "linear-vectorized",
            Traversal::SliceVectorized => "slice-vectorized",
            Traversal::AllAtOnce => "all-at-once",
        }
    }

    pub const fn is_vectorized(self) -> bool {
        matches!(
            self,
            Traversal::InnerVectorized | Traversal::LinearVectorized | Traversal::SliceVectorized
        )
    }
}

impl fmt::Display for Traversal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The selected (traversal, unrolling) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Strategy {
    pub traversal: Traversal,
    pub unrolling: Unrolling,
}

impl Strategy {
    pub const fn new(traversal: Traversal, unrolling: Unrolling) -> Self {
        Self {
            traversal,
            unrolling,
        }
    }
}

// ---------------------------------------------------------------------------
// Unrolling limit
// ---------------------------------------------------------------------------

const DEFAULT_UNROLLING_LIMIT: usize = 100;

const fn parse_limit(s: &str) -> usize {
    let bytes = s.as_bytes();
    if bytes.is_empty() {
        panic!("DENSE_ASSIGN_UNROLLING_LIMIT must not be empty");
    }
    let mut value: usize = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if !b.is_ascii_digit() {
            panic!("DENSE_ASSIGN_UNROLLING_LIMIT must be a decimal integer");
        }
        value = match value.checked_mul(10) {
            Some(v) => match v.checked_add((b - b'0') as usize) {
                Some(v) => v,
                None => panic!("DENSE_ASSIGN_UNROLLING_LIMIT overflows usize"),
            },
            None => panic!("DENSE_ASSIGN_UNROLLING_LIMIT overflows usize"),
        };
        i += 1;
    }
    value
}

/// Budget of `size x coefficient cost` below which loops are fully unrolled.
///
/// Scaled by the packet width for vectorized traversals. Set at build time
/// through the `DENSE_ASSIGN_UNROLLING_LIMIT` environment variable.
pub const UNROLLING_LIMIT: usize = match option_env!("DENSE_ASSIGN_UNROLLING_LIMIT") {
    Some(s) => parse_limit(s),
    None => DEFAULT_UNROLLING_LIMIT,
};

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Static properties of one side of an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticInfo {
    pub size: usize,
    pub inner_size: usize,
    pub max_inner_size: usize,
    pub row_major: bool,
    pub flags: Flags,
    pub coeff_read_cost: usize,
    pub eval_before_assign: bool,
}

impl StaticInfo {
    pub const fn of<E: Expr>() -> Self {
        Self {
            size: E::SIZE,
            inner_size: E::INNER_SIZE,
            max_inner_size: E::MAX_INNER_SIZE,
            row_major: E::ROW_MAJOR,
            flags: E::FLAGS,
            coeff_read_cost: E::COEFF_READ_COST,
            eval_before_assign: E::EVAL_BEFORE_ASSIGN,
        }
    }
}

const fn within_limit(count: usize, cost: usize, limit: usize) -> bool {
    !is_dynamic(count) && !is_dynamic(cost) && static_mul(count, cost) <= limit
}

/// Select the traversal and unrolling for assigning `src` into `dst`.
pub const fn select(dst: StaticInfo, src: StaticInfo, packet_size: usize, limit: usize) -> Strategy {
    if src.eval_before_assign {
        return Strategy::new(Traversal::AllAtOnce, Unrolling::None);
    }

    let both = dst.flags.intersection(src.flags);
    let orders_agree = dst.row_major == src.row_major;
    let dst_aligned = dst.flags.contains(Flags::ALIGNED);
    let dst_direct = dst.flags.contains(Flags::DIRECT_ACCESS);

    let might_vectorize = orders_agree && both.contains(Flags::PACKET_ACCESS);
    let may_inner_vectorize = might_vectorize
        && !is_dynamic(dst.inner_size)
        && dst.inner_size % packet_size == 0
        && both.contains(Flags::ALIGNED);
    let may_linearize = orders_agree && both.contains(Flags::LINEAR_ACCESS);
    let may_linear_vectorize = might_vectorize
        && may_linearize
        && dst_direct
        && (dst_aligned || dst.size == DYNAMIC);
    let may_slice_vectorize = might_vectorize
        && dst_direct
        && (is_dynamic(dst.max_inner_size) || dst.max_inner_size >= 3 * packet_size);

    let traversal = if may_inner_vectorize {
        Traversal::InnerVectorized
    } else if may_linear_vectorize {
        Traversal::LinearVectorized
    } else if may_slice_vectorize {
        Traversal::SliceVectorized
    } else if may_linearize {
        Traversal::Linear
    } else {
        Traversal::Default
    };

    let limit = if traversal.is_vectorized() {
        static_mul(limit, packet_size)
    } else {
        limit
    };
    let may_unroll_completely = within_limit(dst.size, src.coeff_read_cost, limit);
    let may_unroll_inner = within_limit(dst.inner_size, src.coeff_read_cost, limit);

    let unrolling = match traversal {
        Traversal::Default | Traversal::InnerVectorized => {
            if may_unroll_completely {
                Unrolling::Complete
            } else if may_unroll_inner {
                Unrolling::Inner
            } else {
                Unrolling::None
            }
        }
        Traversal::LinearVectorized => {
            if may_unroll_completely && dst_aligned {
                Unrolling::Complete
            } else {
                Unrolling::None
            }
        }
        Traversal::Linear => {
            if may_unroll_completely {
                Unrolling::Complete
            } else {
                Unrolling::None
            }
        }
        Traversal::SliceVectorized | Traversal::AllAtOnce => Unrolling::None,
    };

    Strategy::new(traversal, unrolling)
}

/// The static assignment plan of a (destination, source) type pair.
pub struct AssignmentTraits<D, S>(PhantomData<fn(&mut D, &S)>);

impl<D: Expr, S: Expr<Scalar = D::Scalar>> AssignmentTraits<D, S> {
    pub const DST: StaticInfo = StaticInfo::of::<D>();
    pub const SRC: StaticInfo = StaticInfo::of::<S>();
    pub const PACKET_SIZE: usize = <D::Scalar as PacketTraits>::SIZE;

    pub const STRATEGY: Strategy =
        select(Self::DST, Self::SRC, Self::PACKET_SIZE, UNROLLING_LIMIT);
    pub const TRAVERSAL: Traversal = Self::STRATEGY.traversal;
    pub const UNROLLING: Unrolling = Self::STRATEGY.unrolling;

    pub const DST_IS_ALIGNED: bool = D::FLAGS.contains(Flags::ALIGNED);
    pub const JOINT_ALIGNED: bool = Self::DST_IS_ALIGNED && S::FLAGS.contains(Flags::ALIGNED);
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIRECT: Flags = Flags::DIRECT_ACCESS;
    const LINEAR: Flags = Flags::LINEAR_ACCESS;
    const PACKET: Flags = Flags::PACKET_ACCESS;
    const ALIGNED: Flags = Flags::ALIGNED;
    const OWNED: Flags = DIRECT.union(LINEAR).union(PACKET).union(ALIGNED);

    fn info(size: usize, inner: usize, row_major: bool, flags: Flags) -> StaticInfo {
        StaticInfo {
            size,
            inner_size: inner,
            max_inner_size: inner,
            row_major,
            flags,
            coeff_read_cost: 1,
            eval_before_assign: false,
        }
    }

    fn pick(dst: StaticInfo, src: StaticInfo) -> (Traversal, Unrolling) {
        let s = select(dst, src, 2, 100);
        (s.traversal, s.unrolling)
    }

    #[test]
    fn test_eval_before_assign_wins() {
        let mut src = info(16, 4, false, OWNED);
        src.eval_before_assign = true;
        assert_eq!(
            pick(info(16, 4, false, OWNED), src),
            (Traversal::AllAtOnce, Unrolling::None)
        );
    }

    #[test]
    fn test_inner_vectorized_preferred_over_linear_vectorized() {
        // both conditions hold; inner vectorization comes first
        let m = info(16, 4, true, OWNED);
        assert_eq!(pick(m, m), (Traversal::InnerVectorized, Unrolling::Complete));
        let tall = info(DYNAMIC, 256, false, OWNED);
        assert_eq!(pick(tall, tall), (Traversal::InnerVectorized, Unrolling::None));
        let short = info(DYNAMIC, 4, false, OWNED);
        assert_eq!(pick(short, short), (Traversal::InnerVectorized, Unrolling::Inner));
    }

    #[test]
    fn test_linear_vectorized() {
        let odd = info(9, 3, false, OWNED);
        assert_eq!(pick(odd, odd), (Traversal::LinearVectorized, Unrolling::Complete));

        // unaligned but dynamic destination still linear-vectorizes, never unrolled
        let map = info(DYNAMIC, DYNAMIC, false, DIRECT | LINEAR | PACKET);
        assert_eq!(pick(map, map), (Traversal::LinearVectorized, Unrolling::None));

        // unaligned fixed-size destinations cannot
        let wide_map = info(64, 8, false, DIRECT | LINEAR | PACKET);
        assert_eq!(pick(wide_map, wide_map), (Traversal::SliceVectorized, Unrolling::None));
        let small_map = info(9, 3, false, DIRECT | LINEAR | PACKET);
        assert_eq!(pick(small_map, small_map), (Traversal::Linear, Unrolling::Complete));
    }

    #[test]
    fn test_slice_vectorized_requires_room() {
        let block = info(DYNAMIC, DYNAMIC, false, DIRECT | PACKET);
        assert_eq!(pick(block, block), (Traversal::SliceVectorized, Unrolling::None));

        // a static inner extent under three packets falls back to scalar loops
        let thin = info(DYNAMIC, 5, false, DIRECT | PACKET);
        assert_eq!(pick(thin, thin), (Traversal::Default, Unrolling::Inner));
    }

    #[test]
    fn test_scalar_fallbacks() {
        let complex = info(9, 3, false, DIRECT | LINEAR | ALIGNED);
        assert_eq!(pick(complex, complex), (Traversal::Linear, Unrolling::Complete));
        let dynamic = info(DYNAMIC, DYNAMIC, false, DIRECT | LINEAR | ALIGNED);
        assert_eq!(pick(dynamic, dynamic), (Traversal::Linear, Unrolling::None));

        // storage orders disagree
        let col = info(16, 4, false, OWNED);
        let row = info(16, 4, true, OWNED);
        assert_eq!(pick(col, row), (Traversal::Default, Unrolling::Complete));
        let dcol = info(DYNAMIC, DYNAMIC, false, OWNED);
        let drow = info(DYNAMIC, DYNAMIC, true, OWNED);
        assert_eq!(pick(dcol, drow), (Traversal::Default, Unrolling::None));
    }

    #[test]
    fn test_unrolling_limit_and_cost() {
        // 11 x 10 = 110 > 100 for scalar traversals
        let big = info(110, 11, false, DIRECT | LINEAR);
        assert_eq!(pick(big, big), (Traversal::Linear, Unrolling::None));

        // the limit scales with the packet width for vectorized traversals
        let vec = info(110, 110, false, OWNED);
        assert_eq!(pick(vec, vec).1, Unrolling::Complete);

        // unknown cost never unrolls
        let mut src = info(16, 4, true, OWNED);
        src.coeff_read_cost = DYNAMIC;
        assert_eq!(
            pick(info(16, 4, true, OWNED), src),
            (Traversal::InnerVectorized, Unrolling::None)
        );
    }

    #[test]
    fn test_parse_limit() {
        assert_eq!(parse_limit("0"), 0);
        assert_eq!(parse_limit("250"), 250);
        assert_eq!(UNROLLING_LIMIT, option_env!("DENSE_ASSIGN_UNROLLING_LIMIT").map_or(100, parse_limit));
    }

    #[test]
    #[should_panic(expected = "decimal integer")]
    fn test_parse_limit_rejects_garbage() {
        let _ = parse_limit("12a");
    }
}
