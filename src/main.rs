use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use qlenet::data::Dataset;
use qlenet::eval::{evaluate, EvalOptions};
use qlenet::net::layers::Padding;
use qlenet::net::loader::{ModelMeta, QuantLenet};
use qlenet::net::quant::InputMode;
use qlenet::net::{NetConfig, Network};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "qlenet", version, about = "Evaluate a quantized LeNet model over an MNIST-style dataset")]
struct Args {
    /// Binary model file (QLENET01)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Directory holding the text weight files (w_conv1.txt, ...)
    #[arg(long)]
    weights_dir: Option<PathBuf>,

    /// Image file: text floats, or IDX ubyte (optionally .gz)
    #[arg(long)]
    images: PathBuf,

    /// Label file: text integers, or IDX ubyte (optionally .gz)
    #[arg(long)]
    labels: PathBuf,

    /// Dataset file format
    #[arg(long, value_enum, default_value = "text")]
    format: DataFormat,

    /// How pixels enter the integer pipeline
    #[arg(long, value_enum, default_value = "direct")]
    input_mode: InputModeArg,

    /// Integer scale for --input-mode quantized
    #[arg(long, default_value_t = 2)]
    quant_scale: i32,

    /// Boundary policy for the first convolution
    #[arg(long, value_enum, default_value = "same")]
    conv1_padding: PaddingArg,

    /// Scale IDX pixels to [0,1] instead of raw 0..255
    #[arg(long, default_value_t = false)]
    normalize: bool,

    /// Evaluate at most this many images
    #[arg(long)]
    limit: Option<usize>,

    /// Worker threads for the parallel sweep (0 or 1 = sequential)
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Disable the progress bar
    #[arg(long, default_value_t = false)]
    no_progress: bool,

    /// Print the summary as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DataFormat {
    Text,
    Idx,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum InputModeArg {
    Direct,
    Quantized,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PaddingArg {
    Same,
    Valid,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let model = match (&args.model, &args.weights_dir) {
        (Some(path), _) => QuantLenet::load(path)?,
        (None, Some(dir)) => QuantLenet::load_text_dir(dir, ModelMeta::lenet())?,
        (None, None) => bail!("either --model or --weights-dir is required"),
    };

    let cfg = NetConfig {
        input: match args.input_mode {
            InputModeArg::Direct => InputMode::Direct,
            InputModeArg::Quantized => InputMode::Quantized { scale: args.quant_scale },
        },
        conv1_padding: match args.conv1_padding {
            PaddingArg::Same => Padding::Same,
            PaddingArg::Valid => Padding::Valid,
        },
        ..NetConfig::default()
    };
    let net = Network::new(model, cfg).context("assemble network")?;

    let data = match args.format {
        DataFormat::Text => Dataset::load_text(&args.images, &args.labels, net.image_side())?,
        DataFormat::Idx => Dataset::load_idx(&args.images, &args.labels, args.normalize)?,
    };
    if data.side != net.image_side() {
        bail!(
            "dataset images are {side}x{side} but the model expects {want}x{want}",
            side = data.side,
            want = net.image_side()
        );
    }

    if args.threads > 1 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.threads)
            .build_global()
            .context("build thread pool")?;
    }
    let opts = EvalOptions {
        limit: args.limit,
        parallel: args.threads > 1,
        progress: !args.no_progress && !args.json,
    };
    let summary = evaluate(&net, &data, &opts);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Prediction: {}/{}", summary.correct, summary.images);
        println!("Accuracy = {:.4}", summary.accuracy);
        println!("Total inference time: {:.3} seconds", summary.elapsed_secs);
        println!("Average time per image: {:.1} us", summary.per_image_micros);
    }
    Ok(())
}
