use super::model::{FeatureVector, PixelGrid, INK};
use crate::error::{GlyphError, Result};

// ---------------------------------------------------------------------------
// Feature extraction: pixel grid → per-line ink density
// ---------------------------------------------------------------------------

/// Summarise a grid as the ink percentage of every line that holds ink.
///
/// Lines are indexed along the width axis (`0..width`); each one samples
/// `height` pixels. A line contributes `ink / height * 100` only if it has at
/// least one [`INK`] pixel, so an all-white grid yields an empty vector.
///
/// `width` and `height` must match the grid's extents, otherwise
/// [`GlyphError::Shape`] is returned.
pub fn extract(grid: &PixelGrid, width: usize, height: usize) -> Result<FeatureVector> {
    if width != grid.width() {
        return Err(GlyphError::Shape {
            what: "width",
            expected: width,
            actual: grid.width(),
        });
    }
    if height != grid.height() {
        return Err(GlyphError::Shape {
            what: "height",
            expected: height,
            actual: grid.height(),
        });
    }

    let vector = inked_lines(grid);
    log::debug!(
        "extracted {} inked lines out of {width} from a {width}x{height} grid",
        vector.len()
    );
    Ok(vector)
}

/// [`extract`] using the grid's own dimensions, which cannot mismatch.
pub fn extract_grid(grid: &PixelGrid) -> FeatureVector {
    inked_lines(grid)
}

fn inked_lines(grid: &PixelGrid) -> FeatureVector {
    let height = grid.height() as f64;
    (0..grid.width())
        .filter_map(|x| {
            let ink = grid.line(x).filter(|&p| p == INK).count();
            // A line without ink is skipped entirely, not reported as 0%.
            (ink > 0).then(|| ink as f64 / height * 100.0)
        })
        .collect()
}
