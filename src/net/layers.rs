//! The integer layer kernels: convolution, rectification, sum-pooling,
//! flatten, and the dense projection.
//!
//! Weights are i8, biases and all accumulation are i32. At these kernel
//! sizes and channel counts a 32-bit accumulator strictly dominates the
//! worst-case sum of 8-bit products over a receptive field, so no overflow
//! handling exists anywhere in the hot path.

use crate::net::quant::dot_i8_i32;
use crate::net::tensor::Tensor32;

/// Boundary policy for a convolution layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Padding {
    /// Kernel centered on each output cell; output keeps the input's spatial
    /// size. Taps falling outside the grid are skipped, which is numerically
    /// identical to summing explicit zero padding.
    Same,
    /// Every tap in bounds; output shrinks to `in - kernel + 1`.
    Valid,
}

/// A 2D convolution with i8 weights laid out `[out][in][k][k]`.
pub struct ConvLayer {
    pub in_channels: usize,
    pub out_channels: usize,
    pub kernel: usize,
    pub padding: Padding,
    weights: Vec<i8>,
    bias: Vec<i32>,
}

impl ConvLayer {
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        kernel: usize,
        padding: Padding,
        weights: Vec<i8>,
        bias: Vec<i32>,
    ) -> Self {
        debug_assert_eq!(weights.len(), out_channels * in_channels * kernel * kernel);
        debug_assert_eq!(bias.len(), out_channels);
        ConvLayer { in_channels, out_channels, kernel, padding, weights, bias }
    }

    /// Output spatial side for a given input side.
    pub fn out_side(&self, in_side: usize) -> usize {
        match self.padding {
            Padding::Same => in_side,
            Padding::Valid => in_side - self.kernel + 1,
        }
    }

    #[inline]
    fn weight(&self, oc: usize, ic: usize, kh: usize, kw: usize) -> i32 {
        let k = self.kernel;
        self.weights[((oc * self.in_channels + ic) * k + kh) * k + kw] as i32
    }

    pub fn forward(&self, input: &Tensor32) -> Tensor32 {
        debug_assert_eq!(input.c, self.in_channels);
        let h_out = self.out_side(input.h);
        let w_out = self.out_side(input.w);
        // Same: kernel centered, taps offset by k/2. Valid: taps anchored at
        // the output cell, always in bounds.
        let off = match self.padding {
            Padding::Same => (self.kernel / 2) as isize,
            Padding::Valid => 0,
        };
        let mut out = Tensor32::zeros(self.out_channels, h_out, w_out);
        for oc in 0..self.out_channels {
            for oh in 0..h_out {
                for ow in 0..w_out {
                    let mut acc: i32 = 0;
                    for ic in 0..self.in_channels {
                        for kh in 0..self.kernel {
                            for kw in 0..self.kernel {
                                let ih = oh as isize + kh as isize - off;
                                let iw = ow as isize + kw as isize - off;
                                if ih < 0
                                    || iw < 0
                                    || ih >= input.h as isize
                                    || iw >= input.w as isize
                                {
                                    continue;
                                }
                                acc += input.get(ic, ih as usize, iw as usize)
                                    * self.weight(oc, ic, kh, kw);
                            }
                        }
                    }
                    out.set(oc, oh, ow, acc + self.bias[oc]);
                }
            }
        }
        out
    }
}

/// Replace every negative accumulator with zero, in place. Idempotent.
pub fn relu_in_place(xs: &mut [i32]) {
    for x in xs.iter_mut() {
        if *x < 0 {
            *x = 0;
        }
    }
}

/// Rescale one pooled sum: strictly positive sums shift right by 2
/// (floor-division by 4); zero and negative sums pass through unshifted.
/// The asymmetry between the branches is intentional.
#[inline]
pub fn pool_rescale(sum: i32) -> i32 {
    if sum > 0 {
        sum >> 2
    } else {
        sum
    }
}

/// 2x2 non-overlapping sum-pool followed by [`pool_rescale`] on each cell.
/// Requires even spatial sizes; the network validates that at construction.
pub fn sum_pool_2x2(input: &Tensor32) -> Tensor32 {
    debug_assert!(input.h % 2 == 0 && input.w % 2 == 0);
    let h_out = input.h / 2;
    let w_out = input.w / 2;
    let mut out = Tensor32::zeros(input.c, h_out, w_out);
    for c in 0..input.c {
        for h in 0..h_out {
            for w in 0..w_out {
                let sum = input.get(c, 2 * h, 2 * w)
                    + input.get(c, 2 * h + 1, 2 * w)
                    + input.get(c, 2 * h, 2 * w + 1)
                    + input.get(c, 2 * h + 1, 2 * w + 1);
                out.set(c, h, w, pool_rescale(sum));
            }
        }
    }
    out
}

/// Reshape a volume into the channel-major vector the dense layer consumes.
/// The backing buffer already has that layout, so this surrenders it as-is.
pub fn flatten(t: Tensor32) -> Vec<i32> {
    t.data
}

/// A fully-connected layer with i8 weights laid out `[out][in]`, producing
/// raw i32 scores. No activation follows; scores feed softmax directly.
pub struct DenseLayer {
    pub in_features: usize,
    pub out_features: usize,
    weights: Vec<i8>,
    bias: Vec<i32>,
}

impl DenseLayer {
    pub fn new(in_features: usize, out_features: usize, weights: Vec<i8>, bias: Vec<i32>) -> Self {
        debug_assert_eq!(weights.len(), out_features * in_features);
        debug_assert_eq!(bias.len(), out_features);
        DenseLayer { in_features, out_features, weights, bias }
    }

    pub fn forward(&self, input: &[i32]) -> Vec<i32> {
        debug_assert_eq!(input.len(), self.in_features);
        let mut out = Vec::with_capacity(self.out_features);
        for o in 0..self.out_features {
            let row = &self.weights[o * self.in_features..(o + 1) * self.in_features];
            out.push(self.bias[o] + dot_i8_i32(row, input));
        }
        out
    }
}
