use anyhow::{Context, Result};
use clap::Parser;
use qlenet::net::loader::{ModelMeta, QuantLenet};
use qlenet::net::Network;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "create_model", version, about = "Write a seeded random quantized model for smoke tests and benchmarks")]
struct Args {
    /// Output path for the binary model
    #[arg(long, default_value = "qlenet-random.bin")]
    out: PathBuf,

    /// RNG seed
    #[arg(long, default_value_t = 0xC0FFEE)]
    seed: u64,

    /// Image side length
    #[arg(long, default_value_t = 28)]
    side: usize,

    /// First convolution output channels
    #[arg(long, default_value_t = 6)]
    conv1_out: usize,

    /// Second convolution output channels
    #[arg(long, default_value_t = 16)]
    conv2_out: usize,

    /// Kernel side length
    #[arg(long, default_value_t = 3)]
    kernel: usize,

    /// Output classes
    #[arg(long, default_value_t = 10)]
    classes: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let meta = ModelMeta {
        version: 1,
        image_side: args.side,
        conv1_out: args.conv1_out,
        conv2_out: args.conv2_out,
        kernel: args.kernel,
        classes: args.classes,
    };

    let mut rng = SmallRng::seed_from_u64(args.seed);
    let weight_dist = Normal::new(0.0f32, 24.0).context("weight distribution")?;
    let bias_dist = Normal::new(0.0f32, 64.0).context("bias distribution")?;

    let draw_i8 = |n: usize, rng: &mut SmallRng| -> Vec<i8> {
        (0..n).map(|_| weight_dist.sample(rng).round().clamp(-127.0, 127.0) as i8).collect()
    };
    let w_conv1 = draw_i8(meta.conv1_weight_len(), &mut rng);
    let w_conv2 = draw_i8(meta.conv2_weight_len(), &mut rng);
    let w_fc = draw_i8(meta.fc_weight_len(), &mut rng);
    let draw_i32 = |n: usize, rng: &mut SmallRng| -> Vec<i32> {
        (0..n).map(|_| bias_dist.sample(rng).round() as i32).collect()
    };
    let b_conv1 = draw_i32(meta.conv1_out, &mut rng);
    let b_conv2 = draw_i32(meta.conv2_out, &mut rng);
    let b_fc = draw_i32(meta.classes, &mut rng);

    let model = QuantLenet { meta, w_conv1, b_conv1, w_conv2, b_conv2, w_fc, b_fc };

    // Fail fast if the requested geometry cannot be assembled.
    Network::with_defaults(model.clone()).context("geometry check")?;

    model.save(&args.out)?;
    println!("Model saved to: {}", args.out.display());
    println!(
        "Geometry: side={} conv1={} conv2={} kernel={} classes={}",
        meta.image_side, meta.conv1_out, meta.conv2_out, meta.kernel, meta.classes
    );
    Ok(())
}
