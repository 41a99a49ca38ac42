use serde::{Deserialize, Serialize};

use crate::data::model::TrainingSet;

/// Bias a freshly constructed classifier starts with.
pub const DEFAULT_BIAS: f64 = 0.1;

// ---------------------------------------------------------------------------
// Activation
// ---------------------------------------------------------------------------

/// Step function: `1` when `sum >= 0.0`, else `0` (NaN maps to `0`).
#[inline]
pub fn activation(sum: f64) -> u8 {
    if sum >= 0.0 {
        1
    } else {
        0
    }
}

// ---------------------------------------------------------------------------
// Accumulator handling
// ---------------------------------------------------------------------------

/// How `weighted_sum` behaves between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccumulatorMode {
    /// Never reset: training and every prediction keep adding to one sum.
    #[default]
    Carried,
    /// Zero the sum at the start of each `predict`.
    ResetBeforePredict,
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Binary single-character perceptron.
///
/// Weights and feature values are paired by position and only the first
/// `min(features.len(), weights.len())` pairs take part; the rest of the
/// longer sequence is ignored without error.
#[derive(Debug, Clone, PartialEq)]
pub struct Classifier {
    letter: char,
    weights: Vec<f64>,
    bias: f64,
    weighted_sum: f64,
    mode: AccumulatorMode,
}

impl Classifier {
    /// New classifier for `letter` with empty weights and [`DEFAULT_BIAS`].
    ///
    /// Training is a no-op until the weights are seeded.
    pub fn new(letter: char) -> Self {
        Self {
            letter,
            weights: Vec::new(),
            bias: DEFAULT_BIAS,
            weighted_sum: 0.0,
            mode: AccumulatorMode::default(),
        }
    }

    pub fn with_bias(mut self, bias: f64) -> Self {
        self.bias = bias;
        self
    }

    pub fn with_weights(mut self, weights: Vec<f64>) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_mode(mut self, mode: AccumulatorMode) -> Self {
        self.mode = mode;
        self
    }

    /// Replace the weights with `len` copies of `value`.
    pub fn seed_weights(&mut self, len: usize, value: f64) {
        self.weights = vec![value; len];
    }

    pub fn letter(&self) -> char {
        self.letter
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub fn weighted_sum(&self) -> f64 {
        self.weighted_sum
    }

    pub fn mode(&self) -> AccumulatorMode {
        self.mode
    }

    /// Zero the running sum.
    pub fn reset_accumulator(&mut self) {
        self.weighted_sum = 0.0;
    }

    /// Run every example of `training_set` through [`Self::train_example`],
    /// in order.
    pub fn train(&mut self, training_set: &TrainingSet) {
        log::info!(
            "Training '{}' on {} examples ({} weights)",
            self.letter,
            training_set.len(),
            self.weights.len()
        );
        for features in training_set.vectors() {
            self.train_example(features);
        }
        log::debug!(
            "training of '{}' finished, weighted_sum={:.4}",
            self.letter,
            self.weighted_sum
        );
    }

    /// One pass over a single positive example.
    ///
    /// For every paired position `i` the sum grows by `x[i] * w[i] + bias`,
    /// where `w` is the weight vector as it was when this example started.
    /// Whenever the activation of the running sum drops to `0`, every paired
    /// weight of the current vector is rewritten as `w[j] * x[j] + bias`; the
    /// weights then have exactly the paired length.
    pub fn train_example(&mut self, features: &[f64]) {
        let pairs = features.len().min(self.weights.len());
        let paired = self.weights[..pairs].to_vec();
        for i in 0..pairs {
            self.weighted_sum += features[i] * paired[i] + self.bias;
            if activation(self.weighted_sum) < 1 {
                self.reinforce(features);
            }
        }
    }

    fn reinforce(&mut self, features: &[f64]) {
        let pairs = features.len().min(self.weights.len());
        let bias = self.bias;
        self.weights = (0..pairs)
            .map(|j| self.weights[j] * features[j] + bias)
            .collect();
    }

    /// Decide whether `features` depicts this classifier's letter.
    ///
    /// Accumulates into the same sum `train` uses; with
    /// [`AccumulatorMode::Carried`] the answer depends on every prior call.
    pub fn predict(&mut self, features: &[f64]) -> u8 {
        if self.mode == AccumulatorMode::ResetBeforePredict {
            self.reset_accumulator();
        }
        let pairs = features.len().min(self.weights.len());
        for i in 0..pairs {
            self.weighted_sum += features[i] * self.weights[i] + self.bias;
        }
        activation(self.weighted_sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn activation_is_a_step_at_zero() {
        assert_eq!(activation(0.0), 1);
        assert_eq!(activation(-0.0), 1);
        assert_eq!(activation(3.2), 1);
        assert_eq!(activation(-1e-9), 0);
        assert_eq!(activation(f64::NAN), 0);
    }

    #[test]
    fn empty_weights_make_training_a_no_op() {
        let mut clf = Classifier::new('a');
        clf.train(&TrainingSet::from_vectors(vec![vec![10.0, 20.0]]));
        assert!(clf.weights().is_empty());
        assert_eq!(clf.weighted_sum(), 0.0);
    }

    #[test]
    fn positive_sums_leave_weights_alone() {
        let mut clf = Classifier::new('a').with_weights(vec![1.0, 1.0]);
        clf.train(&TrainingSet::from_vectors(vec![vec![50.0, 0.0]]));
        assert_eq!(clf.weights(), &[1.0, 1.0]);
        assert_relative_eq!(clf.weighted_sum(), 50.2, epsilon = 1e-12);
    }

    #[test]
    fn negative_sum_rewrites_every_paired_weight() {
        let mut clf = Classifier::new('a')
            .with_bias(-10.0)
            .with_weights(vec![1.0, 1.0]);
        clf.train_example(&[2.0, 3.0]);
        // step 0: sum = 2*1 - 10 = -8        → w = [2-10, 3-10]        = [-8, -7]
        // step 1: sum = -8 + 3*1 - 10 = -15  → w = [-8*2-10, -7*3-10]  = [-26, -31]
        assert_relative_eq!(clf.weighted_sum(), -15.0);
        assert_eq!(clf.weights(), &[-26.0, -31.0]);
    }

    #[test]
    fn step_sums_use_weights_from_start_of_example() {
        let mut clf = Classifier::new('a')
            .with_bias(-1.0)
            .with_weights(vec![1.0, 2.0, 4.0]);
        clf.train_example(&[0.5, 1.0, 1.0]);
        // step 0: sum = 0.5 - 1 = -0.5       → w = [-0.5, 1.0, 3.0]
        // step 1: sum = -0.5 + 2 - 1 = 0.5   → unchanged
        // step 2: sum = 0.5 + 4 - 1 = 3.5    → unchanged
        assert_relative_eq!(clf.weighted_sum(), 3.5);
        assert_eq!(clf.weights(), &[-0.5, 1.0, 3.0]);

        // The next example pairs with the rewritten weights.
        clf.train_example(&[0.0, 0.0, 2.0]);
        assert_relative_eq!(clf.weighted_sum(), 3.5 - 1.0 - 1.0 + 6.0 - 1.0);
    }

    #[test]
    fn reinforcement_truncates_to_paired_length() {
        let mut clf = Classifier::new('a')
            .with_bias(-1.0)
            .with_weights(vec![2.0, 2.0, 2.0]);
        clf.train_example(&[0.0]);
        // sum = 0*2 - 1 = -1 → weights rebuilt over one pair only
        assert_eq!(clf.weights(), &[-1.0]);
    }

    #[test]
    fn only_min_length_pairs_are_used() {
        let mut clf = Classifier::new('a')
            .with_bias(0.5)
            .with_weights(vec![1.0, 1.0, 1.0]);
        clf.train_example(&[2.0]);
        assert_relative_eq!(clf.weighted_sum(), 2.5);

        let mut clf = Classifier::new('a')
            .with_bias(0.5)
            .with_weights(vec![1.0]);
        assert_eq!(clf.predict(&[2.0, 100.0, 100.0]), 1);
        assert_relative_eq!(clf.weighted_sum(), 2.5);
    }

    #[test]
    fn carried_sum_couples_training_and_prediction() {
        let mut clf = Classifier::new('a')
            .with_bias(0.0)
            .with_weights(vec![1.0]);
        clf.train_example(&[5.0]);
        assert_relative_eq!(clf.weighted_sum(), 5.0);

        // -3 on its own would be rejected, but 5 - 3 is still >= 0.
        assert_eq!(clf.predict(&[-3.0]), 1);
        assert_eq!(clf.predict(&[-3.0]), 0);
        assert_relative_eq!(clf.weighted_sum(), -1.0);
    }

    #[test]
    fn reset_mode_isolates_predictions() {
        let mut clf = Classifier::new('a')
            .with_bias(0.0)
            .with_weights(vec![1.0])
            .with_mode(AccumulatorMode::ResetBeforePredict);
        clf.train_example(&[5.0]);
        assert_eq!(clf.predict(&[-3.0]), 0);
        assert_eq!(clf.predict(&[4.0]), 1);
        assert_relative_eq!(clf.weighted_sum(), 4.0);
    }

    #[test]
    fn empty_vector_prediction_reads_current_sum() {
        let mut clf = Classifier::new('a')
            .with_bias(-1.0)
            .with_weights(vec![1.0]);
        clf.train_example(&[0.0]);
        let before = clf.weighted_sum();
        assert_eq!(clf.predict(&[]), activation(before));
        assert_eq!(clf.weighted_sum(), before);
    }

    #[test]
    fn seeding_sets_length_and_value() {
        let mut clf = Classifier::new('q');
        clf.seed_weights(3, 0.25);
        assert_eq!(clf.weights(), &[0.25, 0.25, 0.25]);
        assert_eq!(clf.letter(), 'q');
        assert_eq!(clf.bias(), DEFAULT_BIAS);
    }
}
