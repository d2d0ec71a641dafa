use qlenet::net::layers::{ConvLayer, Padding};
use qlenet::net::tensor::Tensor32;

fn lcg_values(n: usize, mut seed: u64) -> Vec<i8> {
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
        out.push((((seed >> 32) as i32 % 7) - 3) as i8); // [-3,3]
    }
    out
}

#[test]
fn valid_conv_shrinks_to_in_minus_k_plus_1() {
    let conv = ConvLayer::new(1, 2, 3, Padding::Valid, lcg_values(2 * 9, 7), vec![0, 0]);
    let out = conv.forward(&Tensor32::zeros(1, 6, 6));
    assert_eq!((out.c, out.h, out.w), (2, 4, 4));
}

#[test]
fn same_conv_preserves_spatial_size() {
    let conv = ConvLayer::new(1, 2, 3, Padding::Same, lcg_values(2 * 9, 8), vec![0, 0]);
    let out = conv.forward(&Tensor32::zeros(1, 6, 6));
    assert_eq!((out.c, out.h, out.w), (2, 6, 6));
}

#[test]
fn same_conv_on_zero_input_with_zero_bias_is_zero() {
    let conv = ConvLayer::new(1, 4, 3, Padding::Same, lcg_values(4 * 9, 9), vec![0; 4]);
    let out = conv.forward(&Tensor32::zeros(1, 8, 8));
    assert!(out.data.iter().all(|&v| v == 0));
}

#[test]
fn bias_is_added_once_per_output_cell_not_per_tap() {
    let conv = ConvLayer::new(1, 1, 3, Padding::Same, vec![0; 9], vec![7]);
    let out = conv.forward(&Tensor32::zeros(1, 5, 5));
    assert!(out.data.iter().all(|&v| v == 7), "zero weights must leave exactly the bias");
}

#[test]
fn skipped_taps_match_explicit_zero_padding() {
    // The padded policy skips out-of-range taps instead of summing explicit
    // zeros. Both must agree because a skipped product contributes nothing.
    let weights = lcg_values(9, 42);
    let input_vals: Vec<i32> = lcg_values(36, 43).into_iter().map(i32::from).collect();
    let input = Tensor32::from_vec(1, 6, 6, input_vals.clone());

    let same = ConvLayer::new(1, 1, 3, Padding::Same, weights.clone(), vec![5]);
    let got = same.forward(&input);

    // Explicitly zero-pad to 8x8 and run the unpadded kernel.
    let mut padded = Tensor32::zeros(1, 8, 8);
    for h in 0..6 {
        for w in 0..6 {
            padded.set(0, h + 1, w + 1, input.get(0, h, w));
        }
    }
    let valid = ConvLayer::new(1, 1, 3, Padding::Valid, weights, vec![5]);
    let want = valid.forward(&padded);

    assert_eq!((got.c, got.h, got.w), (want.c, want.h, want.w));
    assert_eq!(got.data, want.data);
}
