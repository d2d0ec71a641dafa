//! The quantized inference core: a fixed-topology pipeline of integer
//! tensor transforms ending in a floating-point probability distribution.

pub mod layers;
pub mod loader;
pub mod quant;
pub mod softmax;
pub mod tensor;

use crate::net::layers::{flatten, relu_in_place, sum_pool_2x2, ConvLayer, DenseLayer, Padding};
use crate::net::loader::QuantLenet;
use crate::net::quant::{input_activations, quantized_activations, InputMode};
use crate::net::softmax::softmax;
use crate::net::tensor::Tensor32;
use thiserror::Error;

/// Geometry violations caught when a network is assembled. Past
/// construction, the pipeline has no failure paths.
#[derive(Debug, Error)]
pub enum ShapeError {
    #[error("{layer} weight length {got}, expected {want}")]
    WeightLen { layer: &'static str, got: usize, want: usize },
    #[error("{layer} bias length {got}, expected {want}")]
    BiasLen { layer: &'static str, got: usize, want: usize },
    #[error("{layer} kernel {kernel} does not fit input side {side}")]
    KernelTooLarge { layer: &'static str, kernel: usize, side: usize },
    #[error("pooling needs an even spatial size, got {side}")]
    OddPool { side: usize },
    #[error("dense layer is shaped for {want} inputs but the pipeline produces {got}")]
    FlatDim { got: usize, want: usize },
}

/// Per-network configuration: the input adapter and each convolution's
/// boundary policy. The reference instantiation pads the first convolution
/// and leaves the second unpadded.
#[derive(Debug, Clone, Copy)]
pub struct NetConfig {
    pub input: InputMode,
    pub conv1_padding: Padding,
    pub conv2_padding: Padding,
}

impl Default for NetConfig {
    fn default() -> Self {
        NetConfig {
            input: InputMode::Direct,
            conv1_padding: Padding::Same,
            conv2_padding: Padding::Valid,
        }
    }
}

/// The assembled classifier. Weights are immutable after construction and
/// the whole struct is shared read-only across inference calls; each call
/// allocates its own intermediate activations.
pub struct Network {
    image_side: usize,
    input_mode: InputMode,
    conv1: ConvLayer,
    conv2: ConvLayer,
    fc: DenseLayer,
}

impl Network {
    /// Validate the model's geometry against the configuration and wire up
    /// the pipeline. Every shape check lives here; the per-call path only
    /// carries debug assertions.
    pub fn new(model: QuantLenet, cfg: NetConfig) -> Result<Self, ShapeError> {
        let m = model.meta;
        let k = m.kernel;

        check_len("conv1", model.w_conv1.len(), m.conv1_weight_len(), true)?;
        check_len("conv1", model.b_conv1.len(), m.conv1_out, false)?;
        check_len("conv2", model.w_conv2.len(), m.conv2_weight_len(), true)?;
        check_len("conv2", model.b_conv2.len(), m.conv2_out, false)?;
        check_len("fc", model.b_fc.len(), m.classes, false)?;

        let conv1 = ConvLayer::new(1, m.conv1_out, k, cfg.conv1_padding, model.w_conv1, model.b_conv1);
        let conv2 =
            ConvLayer::new(m.conv1_out, m.conv2_out, k, cfg.conv2_padding, model.w_conv2, model.b_conv2);

        // Walk the spatial geometry once so a configuration that cannot
        // reach the dense layer is rejected up front.
        let side1 = checked_out_side(&conv1, m.image_side)?;
        let pooled1 = checked_pool(side1)?;
        let side2 = checked_out_side(&conv2, pooled1)?;
        let pooled2 = checked_pool(side2)?;
        let flat = m.conv2_out * pooled2 * pooled2;
        if model.w_fc.len() != m.classes * flat {
            return Err(ShapeError::FlatDim { got: flat, want: model.w_fc.len() / m.classes.max(1) });
        }
        let fc = DenseLayer::new(flat, m.classes, model.w_fc, model.b_fc);

        Ok(Network { image_side: m.image_side, input_mode: cfg.input, conv1, conv2, fc })
    }

    /// Assemble with the reference configuration.
    pub fn with_defaults(model: QuantLenet) -> Result<Self, ShapeError> {
        Self::new(model, NetConfig::default())
    }

    pub fn image_side(&self) -> usize {
        self.image_side
    }

    pub fn classes(&self) -> usize {
        self.fc.out_features
    }

    /// Run the full pipeline on a float pixel grid of `side * side` values.
    pub fn infer(&self, image: &[f32]) -> Vec<f32> {
        let acts = input_activations(image, self.image_side, self.input_mode);
        self.run(acts)
    }

    /// Run the pipeline on an already-quantized i8 image, bypassing the
    /// input adapter.
    pub fn infer_quantized(&self, image: &[i8]) -> Vec<f32> {
        let acts = quantized_activations(image, self.image_side);
        self.run(acts)
    }

    fn run(&self, input: Tensor32) -> Vec<f32> {
        let mut a1 = self.conv1.forward(&input);
        relu_in_place(&mut a1.data);
        let p1 = sum_pool_2x2(&a1);
        let mut a2 = self.conv2.forward(&p1);
        relu_in_place(&mut a2.data);
        let p2 = sum_pool_2x2(&a2);
        let flat = flatten(p2);
        let scores = self.fc.forward(&flat);
        softmax(&scores)
    }

    /// Predicted label plus the full distribution.
    pub fn classify(&self, image: &[f32]) -> (usize, Vec<f32>) {
        let probs = self.infer(image);
        (argmax(&probs), probs)
    }
}

/// Index of the largest entry; ties break toward the lowest index via a
/// left-to-right strictly-greater scan.
pub fn argmax(probs: &[f32]) -> usize {
    let mut best = 0usize;
    for i in 1..probs.len() {
        if probs[i] > probs[best] {
            best = i;
        }
    }
    best
}

fn check_len(layer: &'static str, got: usize, want: usize, is_weight: bool) -> Result<(), ShapeError> {
    if got != want {
        return Err(if is_weight {
            ShapeError::WeightLen { layer, got, want }
        } else {
            ShapeError::BiasLen { layer, got, want }
        });
    }
    Ok(())
}

fn checked_out_side(conv: &ConvLayer, in_side: usize) -> Result<usize, ShapeError> {
    if conv.padding == Padding::Valid && conv.kernel > in_side {
        return Err(ShapeError::KernelTooLarge {
            layer: "conv",
            kernel: conv.kernel,
            side: in_side,
        });
    }
    Ok(conv.out_side(in_side))
}

fn checked_pool(side: usize) -> Result<usize, ShapeError> {
    if side % 2 != 0 {
        return Err(ShapeError::OddPool { side });
    }
    Ok(side / 2)
}
