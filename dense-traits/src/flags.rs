//! Capability bit-set declared by every expression.

use std::fmt;
use std::ops::{BitAnd, BitOr};

/// Static capabilities of an expression.
///
/// All operations are `const fn` so expression types can compose their
/// flags inside associated constants.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Flags(u32);

impl Flags {
    pub const NONE: Flags = Flags(0);

    /// Coefficients can be addressed by a single linear index.
    pub const LINEAR_ACCESS: Flags = Flags(1 << 0);

    /// Coefficients live in memory and their addresses can be taken.
    pub const DIRECT_ACCESS: Flags = Flags(1 << 1);

    /// Packets can be read (and written, for destinations).
    pub const PACKET_ACCESS: Flags = Flags(1 << 2);

    /// The first coefficient is statically known to be packet aligned.
    pub const ALIGNED: Flags = Flags(1 << 3);

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn union(self, other: Flags) -> Flags {
        Flags(self.0 | other.0)
    }

    #[inline]
    pub const fn intersection(self, other: Flags) -> Flags {
        Flags(self.0 & other.0)
    }

    #[inline]
    pub const fn difference(self, other: Flags) -> Flags {
        Flags(self.0 & !other.0)
    }

    /// `PACKET_ACCESS` when `vectorizable`, otherwise nothing.
    #[inline]
    pub const fn packet_if(vectorizable: bool) -> Flags {
        if vectorizable {
            Flags::PACKET_ACCESS
        } else {
            Flags::NONE
        }
    }
}

impl BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        self.union(rhs)
    }
}

impl BitAnd for Flags {
    type Output = Flags;

    fn bitand(self, rhs: Flags) -> Flags {
        self.intersection(rhs)
    }
}

impl fmt::Debug for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(Flags, &str); 4] = [
            (Flags::LINEAR_ACCESS, "LINEAR_ACCESS"),
            (Flags::DIRECT_ACCESS, "DIRECT_ACCESS"),
            (Flags::PACKET_ACCESS, "PACKET_ACCESS"),
            (Flags::ALIGNED, "ALIGNED"),
        ];
        let mut set = f.debug_set();
        for (flag, name) in NAMES {
            if self.contains(flag) {
                set.entry(&format_args!("{name}"));
            }
        }
        set.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_algebra() {
        let a = Flags::LINEAR_ACCESS | Flags::PACKET_ACCESS;
        let b = Flags::PACKET_ACCESS.union(Flags::ALIGNED);
        assert_eq!(a & b, Flags::PACKET_ACCESS);
        assert!(a.contains(Flags::LINEAR_ACCESS));
        assert!(!a.contains(Flags::ALIGNED));
        assert_eq!(a.difference(Flags::LINEAR_ACCESS), Flags::PACKET_ACCESS);
        assert!(Flags::NONE.contains(Flags::NONE));
    }

    #[test]
    fn test_packet_if() {
        assert_eq!(Flags::packet_if(true), Flags::PACKET_ACCESS);
        assert_eq!(Flags::packet_if(false), Flags::NONE);
    }

    #[test]
    fn test_debug_lists_names() {
        let s = format!("{:?}", Flags::DIRECT_ACCESS | Flags::ALIGNED);
        assert_eq!(s, "{DIRECT_ACCESS, ALIGNED}");
    }
}
