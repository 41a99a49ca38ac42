/// Data layer: core types, image loading and feature extraction.
///
/// Architecture:
/// ```text
///  glyph image (.png / .jpeg)
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  crop → binarize → scale to 200px → PixelGrid
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ features  │  inked lines → FeatureVector (ink %)
///   └──────────┘
///        │
///        ▼
///   TrainingSet  (ordered FeatureVectors, optionally round-tripped via CSV)
/// ```

pub mod features;
pub mod loader;
pub mod model;
