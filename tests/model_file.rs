use qlenet::net::loader::{ModelMeta, QuantLenet};
use std::fs::{self, File};
use std::io::Write;

fn small_meta() -> ModelMeta {
    // 8 -> 8 -> 4 -> 2 -> 1 under the reference boundary policies.
    ModelMeta { version: 1, image_side: 8, conv1_out: 2, conv2_out: 3, kernel: 3, classes: 4 }
}

fn small_model() -> QuantLenet {
    let meta = small_meta();
    let mut seed = 0x51u64;
    let mut next = || {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
        ((seed >> 32) as i32 % 100) - 50
    };
    QuantLenet {
        meta,
        w_conv1: (0..meta.conv1_weight_len()).map(|_| next() as i8).collect(),
        b_conv1: (0..meta.conv1_out).map(|_| next()).collect(),
        w_conv2: (0..meta.conv2_weight_len()).map(|_| next() as i8).collect(),
        b_conv2: (0..meta.conv2_out).map(|_| next()).collect(),
        w_fc: (0..meta.fc_weight_len()).map(|_| next() as i8).collect(),
        b_fc: (0..meta.classes).map(|_| next()).collect(),
    }
}

#[test]
fn binary_round_trip_preserves_everything() {
    let path = "target/qlenet_roundtrip.bin";
    let model = small_model();
    model.save(path).unwrap();
    let loaded = QuantLenet::load(path).unwrap();

    assert_eq!(loaded.meta.version, model.meta.version);
    assert_eq!(loaded.meta.image_side, model.meta.image_side);
    assert_eq!(loaded.meta.conv1_out, model.meta.conv1_out);
    assert_eq!(loaded.meta.conv2_out, model.meta.conv2_out);
    assert_eq!(loaded.meta.kernel, model.meta.kernel);
    assert_eq!(loaded.meta.classes, model.meta.classes);
    assert_eq!(loaded.w_conv1, model.w_conv1);
    assert_eq!(loaded.b_conv1, model.b_conv1);
    assert_eq!(loaded.w_conv2, model.w_conv2);
    assert_eq!(loaded.b_conv2, model.b_conv2);
    assert_eq!(loaded.w_fc, model.w_fc);
    assert_eq!(loaded.b_fc, model.b_fc);
}

#[test]
fn bad_magic_is_rejected() {
    let path = "target/qlenet_badmagic.bin";
    let mut f = File::create(path).unwrap();
    f.write_all(b"NOTQLENE").unwrap();
    f.write_all(&[0u8; 64]).unwrap();
    drop(f);
    assert!(QuantLenet::load(path).is_err());
}

#[test]
fn truncated_file_is_rejected() {
    let path = "target/qlenet_truncated.bin";
    let mut f = File::create(path).unwrap();
    f.write_all(b"QLENET01").unwrap();
    f.write_all(&1u32.to_le_bytes()).unwrap();
    drop(f);
    assert!(QuantLenet::load(path).is_err());
}

#[test]
fn text_dir_loader_reads_the_original_layout() {
    let meta = small_meta();
    let dir = "target/qlenet_textdir";
    fs::create_dir_all(dir).unwrap();

    let ints = |n: usize, base: i32| -> String {
        (0..n).map(|i| (base + i as i32 % 5 - 2).to_string()).collect::<Vec<_>>().join(" ")
    };
    fs::write(format!("{dir}/w_conv1.txt"), ints(meta.conv1_weight_len(), 1)).unwrap();
    fs::write(format!("{dir}/w_conv2.txt"), ints(meta.conv2_weight_len(), -1)).unwrap();
    fs::write(format!("{dir}/w_fc1.txt"), ints(meta.fc_weight_len(), 0)).unwrap();
    // Bias files carry float literals in the original layout; they truncate.
    fs::write(format!("{dir}/b_conv1.txt"), "2.7 -3.9").unwrap();
    fs::write(format!("{dir}/b_conv2.txt"), "1.0 0.0 -1.5").unwrap();
    fs::write(format!("{dir}/b_fc1.txt"), "10.2 -10.2 0.9 4.0").unwrap();

    let model = QuantLenet::load_text_dir(dir, meta).unwrap();
    assert_eq!(model.w_conv1.len(), meta.conv1_weight_len());
    assert_eq!(model.b_conv1, vec![2, -3]);
    assert_eq!(model.b_conv2, vec![1, 0, -1]);
    assert_eq!(model.b_fc, vec![10, -10, 0, 4]);
}

#[test]
fn text_dir_loader_rejects_wrong_counts() {
    let meta = small_meta();
    let dir = "target/qlenet_textdir_bad";
    fs::create_dir_all(dir).unwrap();
    fs::write(format!("{dir}/w_conv1.txt"), "1 2 3").unwrap();
    assert!(QuantLenet::load_text_dir(dir, meta).is_err());
}
