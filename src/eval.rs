//! The dataset sweep: classify every image, tally accuracy and wall time.

use crate::data::Dataset;
use crate::net::Network;
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use rayon::prelude::*;
use serde::Serialize;
use std::time::Instant;

/// Accuracy and timing for one sweep.
#[derive(Debug, Clone, Serialize)]
pub struct EvalSummary {
    pub images: usize,
    pub correct: usize,
    pub accuracy: f64,
    pub elapsed_secs: f64,
    pub per_image_micros: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct EvalOptions {
    /// Evaluate at most this many images.
    pub limit: Option<usize>,
    /// Sweep images on the rayon pool. Weights are shared read-only; every
    /// task allocates its own intermediate activations.
    pub parallel: bool,
    /// Show a progress bar on the sequential path.
    pub progress: bool,
}

impl Default for EvalOptions {
    fn default() -> Self {
        EvalOptions { limit: None, parallel: false, progress: true }
    }
}

pub fn evaluate(net: &Network, data: &Dataset, opts: &EvalOptions) -> EvalSummary {
    let n = opts.limit.map_or(data.len(), |l| l.min(data.len()));
    let start = Instant::now();

    let correct = if opts.parallel {
        (0..n)
            .into_par_iter()
            .filter(|&i| net.classify(data.image(i)).0 == data.labels[i] as usize)
            .count()
    } else {
        let bar = if opts.progress {
            let b = ProgressBar::new(n as u64);
            b.set_style(
                ProgressStyle::with_template("{bar:40} {pos}/{len} [{elapsed_precise}]")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            b
        } else {
            ProgressBar::hidden()
        };
        let mut correct = 0usize;
        for i in 0..n {
            let (label, _) = net.classify(data.image(i));
            if label == data.labels[i] as usize {
                correct += 1;
            }
            debug!("image {}: predicted {} target {}", i, label, data.labels[i]);
            bar.inc(1);
        }
        bar.finish_and_clear();
        correct
    };

    let elapsed = start.elapsed().as_secs_f64();
    EvalSummary {
        images: n,
        correct,
        accuracy: if n == 0 { 0.0 } else { correct as f64 / n as f64 },
        elapsed_secs: elapsed,
        per_image_micros: if n == 0 { 0.0 } else { elapsed * 1e6 / n as f64 },
    }
}
