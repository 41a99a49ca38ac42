use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GlyphError, Result};
use crate::perceptron::{AccumulatorMode, Classifier};

/// Serialized form of a trained classifier.
///
/// ```json
/// { "letter": "a", "weights": [0.0, 0.0, ...], "bias": 0.1 }
/// ```
///
/// The running sum is not stored; a reloaded classifier starts from zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub letter: char,
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl ModelRecord {
    /// Pretty-print the record as JSON to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| GlyphError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(GlyphError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path).map_err(|source| GlyphError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Rebuild a classifier from this record.
    pub fn into_classifier(self, mode: AccumulatorMode) -> Classifier {
        Classifier::new(self.letter)
            .with_bias(self.bias)
            .with_weights(self.weights)
            .with_mode(mode)
    }
}

impl From<&Classifier> for ModelRecord {
    fn from(clf: &Classifier) -> Self {
        Self {
            letter: clf.letter(),
            weights: clf.weights().to_vec(),
            bias: clf.bias(),
        }
    }
}
