use anyhow::{bail, Context, Result};
use log::debug;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Fixed geometry of a model; spatial sizes of every stage derive from it.
#[derive(Debug, Clone, Copy)]
pub struct ModelMeta {
    pub version: u32,
    pub image_side: usize,
    pub conv1_out: usize,
    pub conv2_out: usize,
    pub kernel: usize,
    pub classes: usize,
}

impl ModelMeta {
    /// Reference geometry: 28x28 input, 6 then 16 channels, 3x3 kernels,
    /// 10 classes.
    pub fn lenet() -> Self {
        ModelMeta { version: 1, image_side: 28, conv1_out: 6, conv2_out: 16, kernel: 3, classes: 10 }
    }

    pub fn conv1_weight_len(&self) -> usize {
        self.conv1_out * self.kernel * self.kernel
    }

    pub fn conv2_weight_len(&self) -> usize {
        self.conv2_out * self.conv1_out * self.kernel * self.kernel
    }

    /// Flattened width feeding the dense layer under the reference boundary
    /// policies (first conv padded, second conv unpadded).
    pub fn flat_dim(&self) -> usize {
        let pooled1 = self.image_side / 2;
        let side2 = pooled1 - self.kernel + 1;
        self.conv2_out * (side2 / 2) * (side2 / 2)
    }

    pub fn fc_weight_len(&self) -> usize {
        self.classes * self.flat_dim()
    }
}

const MAGIC: &[u8; 8] = b"QLENET01";

/// A loaded quantized model: i8 weight tensors, i32 bias vectors.
///
/// Loaded once and treated as read-only shared state; no stage of the
/// pipeline ever mutates it.
#[derive(Debug, Clone)]
pub struct QuantLenet {
    pub meta: ModelMeta,
    pub w_conv1: Vec<i8>, // conv1_out x 1 x k x k
    pub b_conv1: Vec<i32>,
    pub w_conv2: Vec<i8>, // conv2_out x conv1_out x k x k
    pub b_conv2: Vec<i32>,
    pub w_fc: Vec<i8>, // classes x flat_dim
    pub b_fc: Vec<i32>,
}

impl QuantLenet {
    /// Load the binary format:
    /// magic: 8 bytes b"QLENET01"
    /// u32 version (LE)
    /// u32 image_side, conv1_out, conv2_out, kernel, classes (LE)
    /// i8  w_conv1[conv1_out * k * k]
    /// i32 b_conv1[conv1_out] (LE)
    /// i8  w_conv2[conv2_out * conv1_out * k * k]
    /// i32 b_conv2[conv2_out] (LE)
    /// i8  w_fc[classes * flat_dim]
    /// i32 b_fc[classes] (LE)
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = File::open(&path)
            .with_context(|| format!("open model file: {}", path.as_ref().display()))?;
        let mut r = BufReader::new(f);
        let mut magic = [0u8; 8];
        r.read_exact(&mut magic).context("read magic")?;
        if &magic != MAGIC {
            bail!("bad model magic");
        }
        let version = read_u32(&mut r, "version")?;
        let image_side = read_u32(&mut r, "image_side")? as usize;
        let conv1_out = read_u32(&mut r, "conv1_out")? as usize;
        let conv2_out = read_u32(&mut r, "conv2_out")? as usize;
        let kernel = read_u32(&mut r, "kernel")? as usize;
        let classes = read_u32(&mut r, "classes")? as usize;
        let meta = ModelMeta { version, image_side, conv1_out, conv2_out, kernel, classes };

        let w_conv1 = read_i8s(&mut r, meta.conv1_weight_len(), "conv1 weights")?;
        let b_conv1 = read_i32s(&mut r, meta.conv1_out, "conv1 bias")?;
        let w_conv2 = read_i8s(&mut r, meta.conv2_weight_len(), "conv2 weights")?;
        let b_conv2 = read_i32s(&mut r, meta.conv2_out, "conv2 bias")?;
        let w_fc = read_i8s(&mut r, meta.fc_weight_len(), "fc weights")?;
        let b_fc = read_i32s(&mut r, meta.classes, "fc bias")?;

        debug!(
            "loaded model: side={} conv1={} conv2={} k={} classes={}",
            image_side, conv1_out, conv2_out, kernel, classes
        );
        Ok(Self { meta, w_conv1, b_conv1, w_conv2, b_conv2, w_fc, b_fc })
    }

    /// Write the binary format described in [`QuantLenet::load`].
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let f = File::create(&path)
            .with_context(|| format!("create model file: {}", path.as_ref().display()))?;
        let mut w = BufWriter::new(f);
        w.write_all(MAGIC).context("write magic")?;
        for v in [
            self.meta.version,
            self.meta.image_side as u32,
            self.meta.conv1_out as u32,
            self.meta.conv2_out as u32,
            self.meta.kernel as u32,
            self.meta.classes as u32,
        ] {
            w.write_all(&v.to_le_bytes()).context("write header")?;
        }
        write_i8s(&mut w, &self.w_conv1)?;
        write_i32s(&mut w, &self.b_conv1)?;
        write_i8s(&mut w, &self.w_conv2)?;
        write_i32s(&mut w, &self.b_conv2)?;
        write_i8s(&mut w, &self.w_fc)?;
        write_i32s(&mut w, &self.b_fc)?;
        w.flush().context("flush model file")?;
        Ok(())
    }

    /// Load the text directory layout: one whitespace-separated file per
    /// tensor (`w_conv1.txt`, `b_conv1.txt`, ...). The files carry no shape
    /// header, so the geometry comes from the caller.
    pub fn load_text_dir<P: AsRef<Path>>(dir: P, meta: ModelMeta) -> Result<Self> {
        let dir = dir.as_ref();
        let w_conv1 = read_text_i8(&dir.join("w_conv1.txt"), meta.conv1_weight_len())?;
        let w_conv2 = read_text_i8(&dir.join("w_conv2.txt"), meta.conv2_weight_len())?;
        let w_fc = read_text_i8(&dir.join("w_fc1.txt"), meta.fc_weight_len())?;
        let b_conv1 = read_text_i32(&dir.join("b_conv1.txt"), meta.conv1_out)?;
        let b_conv2 = read_text_i32(&dir.join("b_conv2.txt"), meta.conv2_out)?;
        let b_fc = read_text_i32(&dir.join("b_fc1.txt"), meta.classes)?;
        Ok(Self { meta, w_conv1, b_conv1, w_conv2, b_conv2, w_fc, b_fc })
    }
}

fn read_u32(r: &mut impl Read, what: &str) -> Result<u32> {
    let mut b = [0u8; 4];
    r.read_exact(&mut b).with_context(|| format!("read {what}"))?;
    Ok(u32::from_le_bytes(b))
}

fn read_i8s(r: &mut impl Read, n: usize, what: &str) -> Result<Vec<i8>> {
    let mut buf = vec![0u8; n];
    r.read_exact(&mut buf).with_context(|| format!("read {what}"))?;
    Ok(buf.into_iter().map(|b| b as i8).collect())
}

fn read_i32s(r: &mut impl Read, n: usize, what: &str) -> Result<Vec<i32>> {
    let mut buf = vec![0u8; 4 * n];
    r.read_exact(&mut buf).with_context(|| format!("read {what}"))?;
    Ok(buf
        .chunks_exact(4)
        .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

fn write_i8s(w: &mut impl Write, vals: &[i8]) -> Result<()> {
    let bytes: Vec<u8> = vals.iter().map(|&v| v as u8).collect();
    w.write_all(&bytes).context("write weights")?;
    Ok(())
}

fn write_i32s(w: &mut impl Write, vals: &[i32]) -> Result<()> {
    for &v in vals {
        w.write_all(&v.to_le_bytes()).context("write bias")?;
    }
    Ok(())
}

fn read_text_i8(path: &Path, want: usize) -> Result<Vec<i8>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read weight file: {}", path.display()))?;
    let mut out = Vec::with_capacity(want);
    for tok in text.split_whitespace() {
        let v: i32 = tok
            .parse()
            .with_context(|| format!("parse weight '{}' in {}", tok, path.display()))?;
        out.push(v as i8);
    }
    if out.len() != want {
        bail!("{}: expected {} values, found {}", path.display(), want, out.len());
    }
    Ok(out)
}

// Bias files in the original deployment carry float literals; they are
// truncated to i32 the way the integer pipeline expects.
fn read_text_i32(path: &Path, want: usize) -> Result<Vec<i32>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read bias file: {}", path.display()))?;
    let mut out = Vec::with_capacity(want);
    for tok in text.split_whitespace() {
        let v: f32 = tok
            .parse()
            .with_context(|| format!("parse bias '{}' in {}", tok, path.display()))?;
        out.push(v as i32);
    }
    if out.len() != want {
        bail!("{}: expected {} values, found {}", path.display(), want, out.len());
    }
    Ok(out)
}
