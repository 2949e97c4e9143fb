//! Every executor must produce the coefficients a plain double loop would.

mod common;

use approx::assert_abs_diff_eq;
use common::{coefficients, table};
use dense_assign::{add_assign, assign};
use dense_traits::RowMajor;
use dense_view::{map, scaled, DMatrix, Matrix4, VectorMap, VectorMapMut};
use num_complex::Complex64;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_values(seed: u64, len: usize) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_range(-10.0..10.0)).collect()
}

proptest! {
    #[test]
    fn dynamic_orders_match_reference(rows in 0usize..12, cols in 0usize..12, seed in any::<u64>()) {
        let data = random_values(seed, rows * cols);
        let f = |r: usize, c: usize| data[r * cols + c];
        let expected = table(rows, cols, f);

        let col = DMatrix::<f64>::from_fn(rows, cols, f).unwrap();
        let row = DMatrix::<f64, RowMajor>::from_fn(rows, cols, f).unwrap();

        // linear vectorized
        let mut dst = DMatrix::<f64>::zeros(rows, cols).unwrap();
        assign(&mut dst, &col).unwrap();
        prop_assert_eq!(coefficients(&dst), expected.clone());

        // default traversal across orders
        let mut dst = DMatrix::<f64>::zeros(rows, cols).unwrap();
        assign(&mut dst, &row).unwrap();
        prop_assert_eq!(coefficients(&dst), expected.clone());

        // linear without packets
        let mut dst = DMatrix::<f64, RowMajor>::zeros(rows, cols).unwrap();
        assign(&mut dst, &map(&row, |x: f64| -x)).unwrap();
        prop_assert_eq!(coefficients(&dst), table(rows, cols, |r, c| -f(r, c)));

        // single-lane scalars
        let z = DMatrix::<Complex64>::from_fn(rows, cols, |r, c| Complex64::new(f(r, c), 1.0)).unwrap();
        let mut dst = DMatrix::<Complex64>::zeros(rows, cols).unwrap();
        assign(&mut dst, &z).unwrap();
        prop_assert_eq!(coefficients(&dst), table(rows, cols, |r, c| Complex64::new(f(r, c), 1.0)));
    }

    #[test]
    fn strided_windows_match_reference(
        rows in 0usize..9,
        cols in 0usize..9,
        row0 in 0usize..4,
        col0 in 0usize..4,
        seed in any::<u64>(),
    ) {
        let (prows, pcols) = (rows + row0 + 1, cols + col0 + 2);
        let data = random_values(seed, prows * pcols);
        let f = |r: usize, c: usize| data[r * pcols + c];
        let parent = DMatrix::<f64>::from_fn(prows, pcols, f).unwrap();

        let mut out = DMatrix::<f64>::from_fn(prows, pcols, |_, _| 0.5).unwrap();
        {
            let src = parent.block(row0, col0, rows, cols).unwrap();
            let mut dst = out.block_mut(row0, col0, rows, cols).unwrap();
            add_assign(&mut dst, &src).unwrap();
        }
        let expected = table(prows, pcols, |r, c| {
            let inside = (row0..row0 + rows).contains(&r) && (col0..col0 + cols).contains(&c);
            if inside { f(r, c) + 0.5 } else { 0.5 }
        });
        prop_assert_eq!(coefficients(&out), expected);
    }

    #[test]
    fn misaligned_vectors_match_reference(len in 0usize..40, offset in 0usize..4, seed in any::<u64>()) {
        let src = random_values(seed, len);
        let mut buf = vec![0.0f64; len + offset];
        assign(
            &mut VectorMapMut::from_vector(&mut buf[offset..]),
            &VectorMap::from_vector(&src),
        )
        .unwrap();
        prop_assert!(buf[..offset].iter().all(|&x| x == 0.0));
        prop_assert_eq!(&buf[offset..], &src[..]);
    }

    #[test]
    fn fixed_size_unrolled_matches_reference(seed in any::<u64>(), factor in -4.0f64..4.0) {
        let data = random_values(seed, 16);
        let f = |r: usize, c: usize| data[r * 4 + c];
        let src = Matrix4::<f64, RowMajor>::from_fn(4, 4, f).unwrap();

        let mut packed = Matrix4::<f64, RowMajor>::zeros(4, 4).unwrap();
        assign(&mut packed, &scaled(&src, factor)).unwrap();
        let mut scalar = Matrix4::<f64>::zeros(4, 4).unwrap();
        assign(&mut scalar, &scaled(&src, factor)).unwrap();

        for r in 0..4 {
            for c in 0..4 {
                assert_abs_diff_eq!(packed[(r, c)], f(r, c) * factor, epsilon = 1e-12);
                assert_abs_diff_eq!(scalar[(r, c)], packed[(r, c)], epsilon = 1e-12);
            }
        }
    }
}
