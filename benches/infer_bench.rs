use criterion::{black_box, criterion_group, criterion_main, Criterion};
use qlenet::net::loader::{ModelMeta, QuantLenet};
use qlenet::net::quant::InputMode;
use qlenet::net::{NetConfig, Network};

fn make_random_model() -> QuantLenet {
    let meta = ModelMeta::lenet();
    let mut seed = 0x1234_5678_9abc_def0u64;
    let mut next_i8 = || {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
        let v = ((seed >> 32) as i32 % 7) - 3; // [-3,3]
        v as i8
    };
    let w_conv1: Vec<i8> = (0..meta.conv1_weight_len()).map(|_| next_i8()).collect();
    let w_conv2: Vec<i8> = (0..meta.conv2_weight_len()).map(|_| next_i8()).collect();
    let w_fc: Vec<i8> = (0..meta.fc_weight_len()).map(|_| next_i8()).collect();
    QuantLenet {
        meta,
        w_conv1,
        b_conv1: vec![0; meta.conv1_out],
        w_conv2,
        b_conv2: vec![0; meta.conv2_out],
        w_fc,
        b_fc: vec![0; meta.classes],
    }
}

fn bench_infer(c: &mut Criterion) {
    let image: Vec<f32> = (0..28 * 28).map(|i| (i % 255) as f32).collect();

    let net = Network::with_defaults(make_random_model()).expect("reference geometry");
    c.bench_function("infer_28x28_direct", |b| {
        b.iter(|| {
            let probs = net.infer(black_box(&image));
            black_box(probs)
        })
    });

    let cfg = NetConfig { input: InputMode::Quantized { scale: 2 }, ..NetConfig::default() };
    let net_q = Network::new(make_random_model(), cfg).expect("reference geometry");
    c.bench_function("infer_28x28_quantized", |b| {
        b.iter(|| {
            let probs = net_q.infer(black_box(&image));
            black_box(probs)
        })
    });
}

criterion_group!(benches, bench_infer);
criterion_main!(benches);
