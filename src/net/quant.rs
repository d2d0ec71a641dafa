//! Input quantization policies and scalar kernels.

use crate::net::tensor::Tensor32;

/// How a floating-point pixel grid enters the integer pipeline.
///
/// Both variants are observed in deployments of this network and are kept as
/// an explicit configuration choice rather than a build-time decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Truncate each pixel to a 32-bit activation as-is.
    Direct,
    /// Multiply each pixel by an integer scale and truncate to i8 first.
    Quantized { scale: i32 },
}

impl Default for InputMode {
    fn default() -> Self {
        InputMode::Direct
    }
}

/// Quantize a pixel grid to i8: trunc(pixel * scale), saturating at the i8 range.
pub fn quantize_image(pixels: &[f32], scale: i32) -> Vec<i8> {
    pixels.iter().map(|&p| (p * scale as f32) as i8).collect()
}

/// Build the single-channel activation grid the first convolution consumes.
pub fn input_activations(pixels: &[f32], side: usize, mode: InputMode) -> Tensor32 {
    debug_assert_eq!(pixels.len(), side * side);
    let data: Vec<i32> = match mode {
        InputMode::Direct => pixels.iter().map(|&p| p as i32).collect(),
        InputMode::Quantized { scale } => {
            quantize_image(pixels, scale).into_iter().map(i32::from).collect()
        }
    };
    Tensor32::from_vec(1, side, side, data)
}

/// Widen an already-quantized image into the activation grid.
pub fn quantized_activations(pixels: &[i8], side: usize) -> Tensor32 {
    debug_assert_eq!(pixels.len(), side * side);
    let data: Vec<i32> = pixels.iter().map(|&p| p as i32).collect();
    Tensor32::from_vec(1, side, side, data)
}

/// Scalar reference kernel for one dense row.
#[inline]
pub fn dot_i8_i32(w_row: &[i8], x: &[i32]) -> i32 {
    let mut acc: i32 = 0;
    for i in 0..w_row.len() {
        acc += (w_row[i] as i32) * x[i];
    }
    acc
}
