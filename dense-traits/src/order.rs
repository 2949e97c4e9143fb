//! Storage order markers.

use std::fmt::Debug;

/// Memory layout of a two-dimensional expression.
///
/// The "inner" axis is the one whose consecutive coefficients are adjacent
/// in memory; the "outer" axis is the other one.
pub trait StorageOrder: Copy + Default + Debug + Send + Sync + 'static {
    const ROW_MAJOR: bool;

    /// The order obtained by swapping rows and columns.
    type Transposed: StorageOrder;

    /// Offset of `(row, col)` from the first coefficient, for unit inner stride.
    #[inline(always)]
    fn offset(row: usize, col: usize, outer_stride: usize) -> usize {
        if Self::ROW_MAJOR {
            row * outer_stride + col
        } else {
            col * outer_stride + row
        }
    }

    /// Outer stride of a contiguous `rows x cols` buffer.
    #[inline]
    fn contiguous_outer_stride(rows: usize, cols: usize) -> usize {
        if Self::ROW_MAJOR {
            cols
        } else {
            rows
        }
    }

    /// `(row, col)` of the coefficient at `index` in a contiguous buffer.
    #[inline(always)]
    fn row_col_of(index: usize, rows: usize, cols: usize) -> (usize, usize) {
        if Self::ROW_MAJOR {
            (index / cols, index % cols)
        } else {
            (index % rows, index / rows)
        }
    }
}

/// C-like layout: the column index varies fastest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowMajor;

/// Fortran-like layout: the row index varies fastest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColMajor;

impl StorageOrder for RowMajor {
    const ROW_MAJOR: bool = true;
    type Transposed = ColMajor;
}

impl StorageOrder for ColMajor {
    const ROW_MAJOR: bool = false;
    type Transposed = RowMajor;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets() {
        // 3 x 4 buffer
        assert_eq!(RowMajor::contiguous_outer_stride(3, 4), 4);
        assert_eq!(ColMajor::contiguous_outer_stride(3, 4), 3);
        assert_eq!(RowMajor::offset(2, 1, 4), 9);
        assert_eq!(ColMajor::offset(2, 1, 3), 5);
    }

    #[test]
    fn test_row_col_of_inverts_offset() {
        for index in 0..12 {
            let (r, c) = RowMajor::row_col_of(index, 3, 4);
            assert_eq!(RowMajor::offset(r, c, 4), index);
            let (r, c) = ColMajor::row_col_of(index, 3, 4);
            assert_eq!(ColMajor::offset(r, c, 3), index);
        }
    }

    #[test]
    fn test_transposed_flips() {
        assert!(!<<RowMajor as StorageOrder>::Transposed as StorageOrder>::ROW_MAJOR);
        assert!(<<ColMajor as StorageOrder>::Transposed as StorageOrder>::ROW_MAJOR);
    }
}
