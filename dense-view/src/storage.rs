//! Over-aligned owned storage.

use std::marker::PhantomData;

use bytemuck::{Pod, Zeroable};
use dense_traits::Scalar;

use crate::{DenseError, Result};

/// Alignment in bytes of every owned buffer. At least one packet.
pub(crate) const STORAGE_ALIGN: usize = 32;

#[derive(Clone, Copy)]
#[repr(C, align(32))]
struct Chunk([u8; STORAGE_ALIGN]);

// SAFETY: a byte array with no padding (size == align == 32).
unsafe impl Zeroable for Chunk {}
unsafe impl Pod for Chunk {}

/// Zero-initialized buffer of `len` scalars whose first element is
/// [`STORAGE_ALIGN`]-byte aligned.
#[derive(Clone)]
pub(crate) struct AlignedBuf<T> {
    chunks: Vec<Chunk>,
    len: usize,
    _marker: PhantomData<T>,
}

const fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

impl<T: Scalar> AlignedBuf<T> {
    /// Fails when `len` scalars do not fit in a single allocation.
    pub(crate) fn zeroed(len: usize) -> Result<Self> {
        let elem = std::mem::size_of::<T>();
        // Round the byte length up to a common multiple of the chunk and
        // element sizes so the chunk slice reinterprets exactly as `[T]`.
        let unit = STORAGE_ALIGN / gcd(STORAGE_ALIGN, elem) * elem;
        let n_chunks = len
            .checked_mul(elem)
            .filter(|&bytes| bytes <= isize::MAX as usize - unit)
            .map(|bytes| bytes.div_ceil(unit) * (unit / STORAGE_ALIGN))
            .ok_or(DenseError::OutOfBounds {
                required: len,
                len: isize::MAX as usize / elem.max(1),
            })?;
        Ok(Self {
            chunks: vec![Chunk([0; STORAGE_ALIGN]); n_chunks],
            len,
            _marker: PhantomData,
        })
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn as_slice(&self) -> &[T] {
        &bytemuck::cast_slice::<Chunk, T>(&self.chunks)[..self.len]
    }

    #[inline]
    pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
        &mut bytemuck::cast_slice_mut::<Chunk, T>(&mut self.chunks)[..self.len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    #[test]
    fn test_zeroed_is_aligned_and_zero() {
        for len in [0usize, 1, 3, 17, 64] {
            let buf = AlignedBuf::<f32>::zeroed(len).unwrap();
            assert_eq!(buf.as_slice().len(), len);
            assert!(buf.as_slice().iter().all(|&x| x == 0.0));
            if len > 0 {
                assert_eq!(buf.as_slice().as_ptr() as usize % STORAGE_ALIGN, 0);
            }
        }
    }

    #[test]
    fn test_complex_elements() {
        let mut buf = AlignedBuf::<Complex64>::zeroed(5).unwrap();
        buf.as_mut_slice()[4] = Complex64::new(1.0, 2.0);
        assert_eq!(buf.as_slice()[4], Complex64::new(1.0, 2.0));
        assert_eq!(buf.len(), 5);
    }

    #[test]
    fn test_oversized_byte_count_is_rejected() {
        // the element count fits in usize, its byte count does not
        let len = usize::MAX / 4;
        assert_eq!(
            AlignedBuf::<f64>::zeroed(len).err(),
            Some(DenseError::OutOfBounds {
                required: len,
                len: isize::MAX as usize / 8,
            })
        );
        assert!(AlignedBuf::<f32>::zeroed(isize::MAX as usize / 2).is_err());
    }

    #[test]
    fn test_chunk_sizing_unit() {
        // 12-byte elements do not divide a chunk: three chunks hold eight of them.
        assert_eq!(STORAGE_ALIGN / gcd(STORAGE_ALIGN, 12) * 12, 96);
        assert_eq!(STORAGE_ALIGN / gcd(STORAGE_ALIGN, 8) * 8, 32);
    }
}
