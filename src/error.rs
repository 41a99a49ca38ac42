use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Error taxonomy for the image → vector → classifier pipeline
// ---------------------------------------------------------------------------

/// Errors surfaced by the loader, the feature extractor and the record / CSV
/// helpers. The classifier itself never fails.
#[derive(Debug, Error)]
pub enum GlyphError {
    /// The path does not resolve to a file.
    #[error("image not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The file exists but is not a readable raster image.
    #[error("cannot decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The decoded image has a zero width or height.
    #[error("image {} has no pixels", path.display())]
    EmptyImage { path: PathBuf },

    /// Requested dimensions disagree with the grid's actual extents.
    #[error("shape mismatch in {what}: expected {expected}, got {actual}")]
    Shape {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Failure writing the normalized image back to disk.
    #[error("cannot write {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A CSV record that parsed but does not describe a feature vector.
    #[error("malformed feature record {row}: {reason}")]
    Record { row: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, GlyphError>;
