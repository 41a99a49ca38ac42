use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::features::extract;
use crate::data::loader::{self, LoadOptions};
use crate::data::model::{FeatureVector, TrainingSet};
use crate::perceptron::{AccumulatorMode, Classifier, DEFAULT_BIAS};
use crate::record::ModelRecord;

// ---------------------------------------------------------------------------
// Run configuration
// ---------------------------------------------------------------------------

/// What to do when one training image cannot be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Abort the whole run on the first failure.
    #[default]
    Abort,
    /// Log a warning and leave the image out of the training set.
    Skip,
}

/// Everything one training / inference run needs. Built per run and dropped
/// when the run ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Character the classifier discriminates.
    pub letter: char,
    /// Directory of positive example images for `letter`.
    pub training_dir: PathBuf,
    /// Image to classify after training.
    pub query: Option<PathBuf>,
    pub bias: f64,
    /// Value every weight is seeded with before training.
    pub initial_weight: f64,
    pub load: LoadOptions,
    pub accumulator: AccumulatorMode,
    pub on_error: ErrorPolicy,
    /// Where to save the trained `{letter, weights, bias}` record.
    pub model_out: Option<PathBuf>,
    /// Where to dump the training set as CSV.
    pub features_out: Option<PathBuf>,
    /// Train from a previously dumped CSV instead of `training_dir`.
    pub features_in: Option<PathBuf>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            letter: 'a',
            training_dir: PathBuf::from("letters/a"),
            query: None,
            bias: DEFAULT_BIAS,
            initial_weight: 0.0,
            load: LoadOptions::default(),
            accumulator: AccumulatorMode::default(),
            on_error: ErrorPolicy::default(),
            model_out: None,
            features_out: None,
            features_in: None,
        }
    }
}

impl DriverConfig {
    /// Read a config from a JSON file; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}

/// Outcome of [`run`].
#[derive(Debug, Clone)]
pub struct RunReport {
    pub classifier: Classifier,
    /// Number of images that made it into the training set.
    pub examples: usize,
    /// Images left out under [`ErrorPolicy::Skip`].
    pub skipped: Vec<PathBuf>,
    /// `None` when no query image was configured.
    pub prediction: Option<u8>,
}

// ---------------------------------------------------------------------------
// Pipeline steps
// ---------------------------------------------------------------------------

/// Every regular file in `dir`, sorted by file name so the training order
/// does not depend on the platform's directory listing order.
pub fn list_examples(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("listing training directory {}", dir.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("reading entry in {}", dir.display()))?;
        let path = entry.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}

/// Load, normalize and vectorize one image.
pub fn image_features(path: &Path, opts: &LoadOptions) -> crate::Result<FeatureVector> {
    let grid = loader::load(path, opts)?;
    log::info!(
        "Reading pixel grid of {} ({}x{})",
        path.display(),
        grid.width(),
        grid.height()
    );
    log::info!("Generating feature vector for {}", path.display());
    extract(&grid, grid.width(), grid.height())
}

/// Vectorize every example image of `config.training_dir`, in listing order.
///
/// Returns the set plus the paths skipped under [`ErrorPolicy::Skip`].
pub fn build_training_set(config: &DriverConfig) -> Result<(TrainingSet, Vec<PathBuf>)> {
    let paths = list_examples(&config.training_dir)?;
    let mut set = TrainingSet::new();
    let mut skipped = Vec::new();

    for path in paths {
        match image_features(&path, &config.load) {
            Ok(features) => {
                let source = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                set.push(source, features);
            }
            Err(e) if config.on_error == ErrorPolicy::Skip => {
                log::warn!("Skipping {}: {e}", path.display());
                skipped.push(path);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("loading example {}", path.display()));
            }
        }
    }

    Ok((set, skipped))
}

/// Construct a classifier for `config.letter`, seeded to the length of the
/// first training vector.
pub fn build_classifier(config: &DriverConfig, set: &TrainingSet) -> Classifier {
    let mut clf = Classifier::new(config.letter)
        .with_bias(config.bias)
        .with_mode(config.accumulator);
    clf.seed_weights(set.first_len().unwrap_or(0), config.initial_weight);
    clf
}

/// Full run: build the training set, train once, optionally persist, then
/// classify the query image if one is configured.
pub fn run(config: &DriverConfig) -> Result<RunReport> {
    let (set, skipped) = match &config.features_in {
        Some(path) => {
            log::info!("Reading training set for '{}' from {}", config.letter, path.display());
            let set = loader::read_training_set(path)
                .with_context(|| format!("reading features from {}", path.display()))?;
            (set, Vec::new())
        }
        None => {
            log::info!(
                "Building training set for '{}' from {}",
                config.letter,
                config.training_dir.display()
            );
            build_training_set(config)?
        }
    };
    if set.is_empty() {
        bail!("training set for '{}' is empty", config.letter);
    }
    for example in &set.examples {
        log::debug!("{example}");
    }

    if let Some(path) = &config.features_out {
        loader::write_training_set(path, &set)
            .with_context(|| format!("writing features to {}", path.display()))?;
        log::info!("Wrote {} feature vectors to {}", set.len(), path.display());
    }

    let mut classifier = build_classifier(config, &set);
    classifier.train(&set);

    if let Some(path) = &config.model_out {
        ModelRecord::from(&classifier)
            .save(path)
            .with_context(|| format!("saving model to {}", path.display()))?;
        log::info!("Saved model to {}", path.display());
    }

    let prediction = match &config.query {
        Some(query) => {
            let features = image_features(query, &config.load)
                .with_context(|| format!("loading query {}", query.display()))?;
            let label = classifier.predict(&features);
            log::info!(
                "Prediction for {} as '{}': {label}",
                query.display(),
                config.letter
            );
            Some(label)
        }
        None => None,
    };

    Ok(RunReport {
        examples: set.len(),
        classifier,
        skipped,
        prediction,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_classifier_defaults() {
        let config = DriverConfig::default();
        assert_eq!(config.bias, DEFAULT_BIAS);
        assert_eq!(config.initial_weight, 0.0);
        assert_eq!(config.on_error, ErrorPolicy::Abort);
        assert_eq!(config.accumulator, AccumulatorMode::Carried);
    }

    #[test]
    fn partial_json_config_fills_defaults() {
        let config: DriverConfig = serde_json::from_str(
            r#"{ "letter": "z", "on_error": "skip", "load": { "write_back": "skip" } }"#,
        )
        .unwrap();
        assert_eq!(config.letter, 'z');
        assert_eq!(config.on_error, ErrorPolicy::Skip);
        assert_eq!(config.load.write_back, loader::WriteBack::Skip);
        assert_eq!(config.load.target_height, loader::TARGET_HEIGHT);
    }

    #[test]
    fn classifier_is_seeded_from_first_vector() {
        let set = TrainingSet::from_vectors(vec![vec![1.0, 2.0, 3.0], vec![4.0]]);
        let config = DriverConfig {
            letter: 'k',
            initial_weight: 0.5,
            ..Default::default()
        };
        let clf = build_classifier(&config, &set);
        assert_eq!(clf.weights(), &[0.5, 0.5, 0.5]);
        assert_eq!(clf.letter(), 'k');
    }

    #[test]
    fn missing_training_dir_fails() {
        let config = DriverConfig {
            training_dir: PathBuf::from("/nonexistent/letters/a"),
            ..Default::default()
        };
        assert!(run(&config).is_err());
    }
}
