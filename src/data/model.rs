use std::fmt;

use image::GrayImage;

use crate::error::{GlyphError, Result};

/// Value of a drawn (black) pixel after binarization.
pub const INK: u8 = 0;
/// Value of a background (white) pixel after binarization.
pub const PAPER: u8 = 255;

// ---------------------------------------------------------------------------
// PixelGrid – one normalized glyph image
// ---------------------------------------------------------------------------

/// Owned single-channel pixel grid, row-major, `width × height`.
///
/// Produced by the loader and consumed by the feature extractor. After
/// binarization every cell is either [`INK`] or [`PAPER`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl PixelGrid {
    /// Wrap raw row-major bytes. Fails with [`GlyphError::Shape`] when the
    /// buffer length is not `width * height`.
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        if data.len() != width * height {
            return Err(GlyphError::Shape {
                what: "pixel buffer length",
                expected: width * height,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Grid where every pixel is [`PAPER`].
    pub fn blank(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![PAPER; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Pixel at column `x`, row `y`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    /// All pixels sharing the horizontal coordinate `x`, top to bottom.
    ///
    /// This is the sample the extractor calls a "row": it is indexed along
    /// the width axis and has `height` entries.
    pub fn line(&self, x: usize) -> impl Iterator<Item = u8> + '_ {
        (0..self.height).map(move |y| self.get(x, y))
    }

    /// Whether the grid contains no ink at all.
    pub fn is_blank(&self) -> bool {
        self.data.iter().all(|&p| p != INK)
    }

    /// Raw row-major bytes.
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }
}

impl From<GrayImage> for PixelGrid {
    fn from(img: GrayImage) -> Self {
        let width = img.width() as usize;
        let height = img.height() as usize;
        Self {
            width,
            height,
            data: img.into_raw(),
        }
    }
}

// ---------------------------------------------------------------------------
// FeatureVector / TrainingSet
// ---------------------------------------------------------------------------

/// Per-line ink percentages (`0.0..=100.0`), one entry per inked line.
pub type FeatureVector = Vec<f64>;

/// One positive example: where it came from and its feature vector.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    /// File name (or other label) of the source image.
    pub source: String,
    pub features: FeatureVector,
}

/// Ordered positive examples of one target character.
///
/// Order matters: the training rule is sequential, so the set keeps the
/// order in which examples were added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingSet {
    pub examples: Vec<TrainingExample>,
}

impl TrainingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from bare vectors, labelling each by its index.
    pub fn from_vectors(vectors: Vec<FeatureVector>) -> Self {
        let examples = vectors
            .into_iter()
            .enumerate()
            .map(|(i, features)| TrainingExample {
                source: i.to_string(),
                features,
            })
            .collect();
        Self { examples }
    }

    pub fn push(&mut self, source: impl Into<String>, features: FeatureVector) {
        self.examples.push(TrainingExample {
            source: source.into(),
            features,
        });
    }

    /// Feature vectors in insertion order.
    pub fn vectors(&self) -> impl Iterator<Item = &[f64]> {
        self.examples.iter().map(|ex| ex.features.as_slice())
    }

    /// Length of the first vector, used to seed classifier weights.
    pub fn first_len(&self) -> Option<usize> {
        self.examples.first().map(|ex| ex.features.len())
    }

    /// Number of examples.
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }
}

impl fmt::Display for TrainingExample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: [", self.source)?;
        for (i, v) in self.features.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v:.4}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_wrong_buffer_length() {
        let err = PixelGrid::new(3, 2, vec![PAPER; 5]).unwrap_err();
        assert!(matches!(err, GlyphError::Shape { .. }));
    }

    #[test]
    fn line_walks_down_one_column() {
        // 2 wide, 3 tall
        let grid = PixelGrid::new(2, 3, vec![0, 255, 0, 255, 255, 0]).unwrap();
        assert_eq!(grid.line(0).collect::<Vec<_>>(), vec![0, 0, 255]);
        assert_eq!(grid.line(1).collect::<Vec<_>>(), vec![255, 255, 0]);
    }

    #[test]
    fn blank_grid_has_no_ink() {
        assert!(PixelGrid::blank(4, 4).is_blank());
        let grid = PixelGrid::new(1, 2, vec![PAPER, INK]).unwrap();
        assert!(!grid.is_blank());
    }

    #[test]
    fn training_set_keeps_order() {
        let set = TrainingSet::from_vectors(vec![vec![1.0], vec![2.0, 3.0]]);
        let lens: Vec<usize> = set.vectors().map(|v| v.len()).collect();
        assert_eq!(lens, vec![1, 2]);
        assert_eq!(set.first_len(), Some(1));
        assert_eq!(set.examples[1].source, "1");
    }

    #[test]
    fn example_display_formats_values() {
        let ex = TrainingExample {
            source: "a.png".into(),
            features: vec![50.0, 12.5],
        };
        assert_eq!(ex.to_string(), "a.png: [50.0000, 12.5000]");
    }
}
