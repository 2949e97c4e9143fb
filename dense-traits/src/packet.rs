//! The fixed-width vector primitive layer.
//!
//! A packet is a 16-byte aligned group of scalars processed as one unit.
//! Loads and stores are parametrized by an [`Alignment`] tag: the `Aligned`
//! variants require a 16-byte aligned address and are undefined behaviour
//! otherwise. Callers prove alignment statically; nothing is checked here.

use std::fmt::Debug;

use num_complex::Complex;

use crate::scalar::Scalar;

/// Width in bytes of one packet (and its required alignment).
pub const PACKET_BYTES: usize = 16;

/// A fixed-width group of `N` scalars, aligned to [`PACKET_BYTES`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(C, align(16))]
pub struct Packet<T, const N: usize>(pub [T; N]);

/// Type-level alignment tag for packet loads and stores.
pub trait Alignment: Copy + Default + Debug + 'static {
    const IS_ALIGNED: bool;
}

/// The address is a multiple of [`PACKET_BYTES`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Aligned;

/// No alignment guarantee beyond the scalar's own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Unaligned;

impl Alignment for Aligned {
    const IS_ALIGNED: bool = true;
}

impl Alignment for Unaligned {
    const IS_ALIGNED: bool = false;
}

/// Vector capabilities of a scalar type.
///
/// Scalars that have no useful vector form use `SIZE == 1`; expressions over
/// them never advertise packet access, so the vectorized traversals are never
/// selected for them.
pub trait PacketTraits: Scalar {
    type Packet: Copy + Debug;

    /// Number of scalars per packet.
    const SIZE: usize;

    /// Whether packet access is worth advertising at all.
    const VECTORIZABLE: bool = Self::SIZE > 1;

    /// Whether a packet boundary can be reached by stepping whole scalars.
    const ALIGNED_ON_SCALAR: bool;

    /// Load `SIZE` consecutive scalars starting at `ptr`.
    ///
    /// # Safety
    /// `ptr..ptr + SIZE` must be readable, and 16-byte aligned when `A` is [`Aligned`].
    unsafe fn load<A: Alignment>(ptr: *const Self) -> Self::Packet;

    /// Store a packet to `SIZE` consecutive scalars starting at `ptr`.
    ///
    /// # Safety
    /// `ptr..ptr + SIZE` must be writable, and 16-byte aligned when `A` is [`Aligned`].
    unsafe fn store<A: Alignment>(ptr: *mut Self, packet: Self::Packet);

    fn splat(value: Self) -> Self::Packet;

    /// Build a packet lane by lane.
    fn gather(f: impl FnMut(usize) -> Self) -> Self::Packet;

    fn lane(packet: Self::Packet, index: usize) -> Self;

    fn padd(a: Self::Packet, b: Self::Packet) -> Self::Packet;

    fn psub(a: Self::Packet, b: Self::Packet) -> Self::Packet;

    fn pmul(a: Self::Packet, b: Self::Packet) -> Self::Packet;
}

macro_rules! impl_packet_traits {
    ($aligned_on_scalar:expr; $($t:ty => $n:literal),* $(,)?) => {
        $(impl PacketTraits for $t {
            type Packet = Packet<$t, $n>;

            const SIZE: usize = $n;
            const ALIGNED_ON_SCALAR: bool = $aligned_on_scalar;

            #[inline(always)]
            unsafe fn load<A: Alignment>(ptr: *const Self) -> Self::Packet {
                if A::IS_ALIGNED {
                    ptr.cast::<Self::Packet>().read()
                } else {
                    ptr.cast::<Self::Packet>().read_unaligned()
                }
            }

            #[inline(always)]
            unsafe fn store<A: Alignment>(ptr: *mut Self, packet: Self::Packet) {
                if A::IS_ALIGNED {
                    ptr.cast::<Self::Packet>().write(packet)
                } else {
                    ptr.cast::<Self::Packet>().write_unaligned(packet)
                }
            }

            #[inline(always)]
            fn splat(value: Self) -> Self::Packet {
                Packet([value; $n])
            }

            #[inline(always)]
            fn gather(f: impl FnMut(usize) -> Self) -> Self::Packet {
                Packet(std::array::from_fn(f))
            }

            #[inline(always)]
            fn lane(packet: Self::Packet, index: usize) -> Self {
                packet.0[index]
            }

            #[inline(always)]
            fn padd(a: Self::Packet, b: Self::Packet) -> Self::Packet {
                Packet(std::array::from_fn(|i| a.0[i] + b.0[i]))
            }

            #[inline(always)]
            fn psub(a: Self::Packet, b: Self::Packet) -> Self::Packet {
                Packet(std::array::from_fn(|i| a.0[i] - b.0[i]))
            }

            #[inline(always)]
            fn pmul(a: Self::Packet, b: Self::Packet) -> Self::Packet {
                Packet(std::array::from_fn(|i| a.0[i] * b.0[i]))
            }
        })*
    };
}

impl_packet_traits!(true; f32 => 4, f64 => 2, i32 => 4, i64 => 2, u32 => 4, u64 => 2);

// Complex scalars: single-lane packets, never vectorized.
impl_packet_traits!(false; Complex<f32> => 1, Complex<f64> => 1);

/// Index of the first element of `ptr[..size]` whose address is packet aligned.
///
/// Returns `0` for single-lane scalars and `size` when no element can be
/// aligned (the base address is not even a multiple of the scalar size).
#[inline]
pub fn first_aligned<T: PacketTraits>(ptr: *const T, size: usize) -> usize {
    let elem = std::mem::size_of::<T>();
    if T::SIZE == 1 || elem == 0 {
        return 0;
    }
    let addr = ptr as usize;
    if !T::ALIGNED_ON_SCALAR || addr % elem != 0 {
        return size;
    }
    let mask = T::SIZE - 1;
    ((T::SIZE - ((addr / elem) & mask)) & mask).min(size)
}
