//! Dataset loading: the text image/label pair used by the original
//! deployment, and the MNIST IDX ubyte format (optionally gzipped).

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;
use log::info;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// An in-memory labeled image set. Pixels are stored as a single flat
/// buffer, `side * side` floats per image, row-major.
pub struct Dataset {
    pub side: usize,
    pub images: Vec<f32>,
    pub labels: Vec<u8>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn image(&self, idx: usize) -> &[f32] {
        let px = self.side * self.side;
        &self.images[idx * px..(idx + 1) * px]
    }

    /// Load the text pair: an image file of `n * side^2` whitespace-separated
    /// floats and a label file of `n` integers. The image count comes from
    /// the label file; neither file carries a header.
    pub fn load_text<P: AsRef<Path>>(images: P, labels: P, side: usize) -> Result<Self> {
        let labels_path = labels.as_ref();
        let text = std::fs::read_to_string(labels_path)
            .with_context(|| format!("read label file: {}", labels_path.display()))?;
        let mut parsed = Vec::new();
        for tok in text.split_whitespace() {
            let v: u8 = tok
                .parse()
                .with_context(|| format!("parse label '{}' in {}", tok, labels_path.display()))?;
            parsed.push(v);
        }

        let images_path = images.as_ref();
        let text = std::fs::read_to_string(images_path)
            .with_context(|| format!("read image file: {}", images_path.display()))?;
        let mut pixels = Vec::with_capacity(parsed.len() * side * side);
        for tok in text.split_whitespace() {
            let v: f32 = tok
                .parse()
                .with_context(|| format!("parse pixel '{}' in {}", tok, images_path.display()))?;
            pixels.push(v);
        }
        if pixels.len() != parsed.len() * side * side {
            bail!(
                "{}: expected {} pixels for {} images, found {}",
                images_path.display(),
                parsed.len() * side * side,
                parsed.len(),
                pixels.len()
            );
        }

        info!("loaded {} text images of side {}", parsed.len(), side);
        Ok(Dataset { side, images: pixels, labels: parsed })
    }

    /// Load an IDX ubyte pair (the stock MNIST distribution), plain or
    /// gzipped. With `normalize`, pixels scale to [0,1]; otherwise they stay
    /// raw 0..255.
    pub fn load_idx<P: AsRef<Path>>(images: P, labels: P, normalize: bool) -> Result<Self> {
        let labels_path = labels.as_ref();
        let mut r = open_maybe_gz(labels_path)?;
        let magic = read_u32_be(&mut r, "label magic")?;
        if magic != 0x0000_0801 {
            bail!("{}: not an IDX label file", labels_path.display());
        }
        let n = read_u32_be(&mut r, "label count")? as usize;
        let mut parsed = vec![0u8; n];
        r.read_exact(&mut parsed)
            .with_context(|| format!("read {} labels from {}", n, labels_path.display()))?;

        let images_path = images.as_ref();
        let mut r = open_maybe_gz(images_path)?;
        let magic = read_u32_be(&mut r, "image magic")?;
        if magic != 0x0000_0803 {
            bail!("{}: not an IDX image file", images_path.display());
        }
        let count = read_u32_be(&mut r, "image count")? as usize;
        let rows = read_u32_be(&mut r, "row count")? as usize;
        let cols = read_u32_be(&mut r, "column count")? as usize;
        if count != n {
            bail!("{} images but {} labels", count, n);
        }
        if rows != cols {
            bail!("expected square images, got {}x{}", rows, cols);
        }
        let mut raw = vec![0u8; count * rows * cols];
        r.read_exact(&mut raw)
            .with_context(|| format!("read {} pixels from {}", raw.len(), images_path.display()))?;
        let pixels: Vec<f32> = if normalize {
            raw.into_iter().map(|b| b as f32 / 255.0).collect()
        } else {
            raw.into_iter().map(|b| b as f32).collect()
        };

        info!("loaded {} IDX images of side {}", count, rows);
        Ok(Dataset { side: rows, images: pixels, labels: parsed })
    }
}

fn open_maybe_gz(path: &Path) -> Result<Box<dyn Read>> {
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    if path.extension().map_or(false, |e| e == "gz") {
        Ok(Box::new(GzDecoder::new(f)))
    } else {
        Ok(Box::new(BufReader::new(f)))
    }
}

fn read_u32_be(r: &mut dyn Read, what: &str) -> Result<u32> {
    let mut b = [0u8; 4];
    r.read_exact(&mut b).with_context(|| format!("read {what}"))?;
    Ok(u32::from_be_bytes(b))
}
