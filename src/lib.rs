//! Glyph image feature extraction and a per-character binary perceptron.
//!
//! file path → [`data::loader`] → [`PixelGrid`] → [`data::features`] →
//! [`FeatureVector`] → [`Classifier::train`] / [`Classifier::predict`].

pub mod data;
pub mod driver;
pub mod error;
pub mod perceptron;
pub mod record;

pub use crate::data::model::{FeatureVector, PixelGrid, TrainingSet};
pub use crate::driver::{run, DriverConfig, RunReport};
pub use crate::error::{GlyphError, Result};
pub use crate::perceptron::{activation, AccumulatorMode, Classifier};
pub use crate::record::ModelRecord;
