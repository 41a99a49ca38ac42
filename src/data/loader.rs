use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageFormat, ImageReader};
use serde::{Deserialize, Serialize};

use super::model::{PixelGrid, TrainingSet, INK, PAPER};
use crate::error::{GlyphError, Result};

/// Height every glyph is scaled to.
pub const TARGET_HEIGHT: u32 = 200;
/// Gray levels at or above this become paper, below it ink.
pub const DEFAULT_THRESHOLD: u8 = 128;

// ---------------------------------------------------------------------------
// Loader options
// ---------------------------------------------------------------------------

/// What to do with the normalized image once it has been computed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteBack {
    /// Overwrite the source file. The first load of a path is destructive.
    #[default]
    InPlace,
    /// Keep the result in memory only.
    Skip,
    /// Write a copy with the same file name into the given directory.
    CopyTo(PathBuf),
}

/// Normalization parameters for [`load`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    pub target_height: u32,
    pub threshold: u8,
    pub write_back: WriteBack,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            target_height: TARGET_HEIGHT,
            threshold: DEFAULT_THRESHOLD,
            write_back: WriteBack::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Image loader
// ---------------------------------------------------------------------------

/// Quality used when writing a normalized image back as JPEG; high enough
/// that decoding and re-binarizing reproduces the same grid.
const JPEG_WRITE_QUALITY: u8 = 100;

/// Load a glyph image and normalize it into a binary [`PixelGrid`].
///
/// Steps:
/// 1. binarize against `opts.threshold`
/// 2. crop border rows / columns that hold no ink
/// 3. scale to `opts.target_height` (nearest neighbour), keeping the aspect
///    ratio
/// 4. persist the result according to `opts.write_back`, in the format the
///    file was decoded from
///
/// The format is sniffed from the file contents, so extension-less files
/// load too. An image with no ink at all is left uncropped, so it still
/// normalizes to a full-height all-white grid (and an empty feature vector
/// downstream).
pub fn load(path: &Path, opts: &LoadOptions) -> Result<PixelGrid> {
    if !path.is_file() {
        return Err(GlyphError::NotFound {
            path: path.to_path_buf(),
        });
    }

    log::info!("Reading image {}", path.display());
    let io_err = |source| GlyphError::Io {
        path: path.to_path_buf(),
        source,
    };
    let reader = ImageReader::open(path)
        .map_err(io_err)?
        .with_guessed_format()
        .map_err(io_err)?;
    let format = reader.format();
    let img = reader.decode().map_err(|source| GlyphError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    if img.width() == 0 || img.height() == 0 {
        return Err(GlyphError::EmptyImage {
            path: path.to_path_buf(),
        });
    }

    let normalized = normalize(&img, opts);

    match &opts.write_back {
        WriteBack::InPlace => save(&normalized, path, format)?,
        WriteBack::Skip => {}
        WriteBack::CopyTo(dir) => {
            std::fs::create_dir_all(dir).map_err(|source| GlyphError::Io {
                path: dir.clone(),
                source,
            })?;
            let name = path.file_name().unwrap_or(path.as_os_str());
            save(&normalized, &dir.join(name), format)?;
        }
    }

    log::debug!(
        "normalized {} to {}x{}",
        path.display(),
        normalized.width(),
        normalized.height()
    );
    Ok(PixelGrid::from(normalized))
}

/// Binarize, crop and resize an in-memory image.
///
/// Loading the result again is a no-op: its border lines all carry ink and
/// its height is already the target height.
pub fn normalize(img: &DynamicImage, opts: &LoadOptions) -> GrayImage {
    let mut gray = img.to_luma8();
    binarize(&mut gray, opts.threshold);

    let mut out = crop_and_scale(&gray, opts.target_height);
    // Downscaling can skip a thin border stroke. A second pass re-crops and
    // only ever upscales, which keeps every inked line.
    if let Some(bounds) = ink_bounds(&out) {
        if bounds != (0, 0, out.width(), out.height()) {
            out = crop_and_scale(&out, opts.target_height);
        }
    }
    out
}

fn crop_and_scale(img: &GrayImage, target_height: u32) -> GrayImage {
    match ink_bounds(img) {
        Some((x, y, w, h)) => {
            let cropped = imageops::crop_imm(img, x, y, w, h).to_image();
            scale_to_height(&cropped, target_height)
        }
        None => scale_to_height(img, target_height),
    }
}

/// Bounding box `(x, y, w, h)` of every ink pixel of a binarized image.
/// `None` when the image has no ink.
fn ink_bounds(img: &GrayImage) -> Option<(u32, u32, u32, u32)> {
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0;
    let mut max_y = 0;
    let mut found = false;

    for (x, y, px) in img.enumerate_pixels() {
        if px.0[0] != INK {
            continue;
        }
        found = true;
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }

    found.then(|| (min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
}

fn binarize(img: &mut GrayImage, threshold: u8) {
    for px in img.pixels_mut() {
        px.0[0] = if px.0[0] >= threshold { PAPER } else { INK };
    }
}

/// Nearest sampling of a two-valued image stays two-valued.
fn scale_to_height(img: &GrayImage, target_height: u32) -> GrayImage {
    let (w, h) = img.dimensions();
    if h == target_height {
        return img.clone();
    }
    let scaled_w = ((w as f64 * target_height as f64 / h as f64).round() as u32).max(1);
    imageops::resize(img, scaled_w, target_height, FilterType::Nearest)
}

/// Write `img` in `format`, falling back to the extension when the source
/// format is unknown. JPEG is written at [`JPEG_WRITE_QUALITY`].
fn save(img: &GrayImage, path: &Path, format: Option<ImageFormat>) -> Result<()> {
    let encode_err = |source| GlyphError::Encode {
        path: path.to_path_buf(),
        source,
    };
    match format {
        Some(ImageFormat::Jpeg) => {
            let file = File::create(path).map_err(|source| GlyphError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let encoder = JpegEncoder::new_with_quality(BufWriter::new(file), JPEG_WRITE_QUALITY);
            img.write_with_encoder(encoder).map_err(encode_err)
        }
        Some(format) => img.save_with_format(path, format).map_err(encode_err),
        None => img.save(path).map_err(encode_err),
    }
}

// ---------------------------------------------------------------------------
// Training-set CSV
// ---------------------------------------------------------------------------

/// CSV layout: header `source,length,features`; `features` holds the vector
/// as semicolon-separated floats, e.g. `"12.5;50;3.5"`. An empty vector is an
/// empty field.
#[derive(Debug, Serialize, Deserialize)]
struct FeatureRow {
    source: String,
    length: usize,
    features: String,
}

/// Write a training set so it can be reloaded without touching the images.
pub fn write_training_set(path: &Path, set: &TrainingSet) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for ex in &set.examples {
        let features = ex
            .features
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(";");
        writer.serialize(FeatureRow {
            source: ex.source.clone(),
            length: ex.features.len(),
            features,
        })?;
    }
    writer.flush().map_err(|source| GlyphError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Read a training set written by [`write_training_set`], in file order.
pub fn read_training_set(path: &Path) -> Result<TrainingSet> {
    if !path.is_file() {
        return Err(GlyphError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let mut reader = csv::Reader::from_path(path)?;
    let mut set = TrainingSet::new();

    for (row_no, result) in reader.deserialize::<FeatureRow>().enumerate() {
        let row = result?;
        let features = parse_semicolon_floats(&row.features, row_no)?;
        if features.len() != row.length {
            return Err(GlyphError::Record {
                row: row_no,
                reason: format!(
                    "length column says {} but {} values present",
                    row.length,
                    features.len()
                ),
            });
        }
        set.push(row.source, features);
    }

    Ok(set)
}

fn parse_semicolon_floats(s: &str, row: usize) -> Result<Vec<f64>> {
    if s.trim().is_empty() {
        return Ok(Vec::new());
    }
    s.split(';')
        .enumerate()
        .map(|(j, tok)| {
            tok.trim().parse::<f64>().map_err(|_| GlyphError::Record {
                row,
                reason: format!("features[{j}]: '{tok}' is not a number"),
            })
        })
        .collect()
}
