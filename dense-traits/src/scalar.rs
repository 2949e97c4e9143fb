//! Scalar type bounds for dense assignment.

use std::fmt::Debug;
use std::ops::{Add, Mul, Sub};

use bytemuck::Pod;
use num_traits::{One, Zero};

/// Shared trait bounds for all element types an assignment can move.
///
/// `Pod` is required because owned storage is carved out of aligned byte
/// chunks. Complex scalars satisfy it through `num-complex`'s `bytemuck`
/// feature.
pub trait Scalar:
    Copy
    + PartialEq
    + Debug
    + Pod
    + Zero
    + One
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Send
    + Sync
    + 'static
{
}

impl<T> Scalar for T where
    T: Copy
        + PartialEq
        + Debug
        + Pod
        + Zero
        + One
        + Add<Output = T>
        + Sub<Output = T>
        + Mul<Output = T>
        + Send
        + Sync
        + 'static
{
}
