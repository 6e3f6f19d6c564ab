
use crate::Outcome;
use crate::history::HistoryRegister;

/// Perceptron with real-valued weights and no bias term.
///
/// The input vector is the global [HistoryRegister]; there is one weight
/// per history position. See "Dynamic Branch Prediction with Perceptrons"
/// (Jiménez and Lin, 2001).
#[derive(Clone, Debug, PartialEq)]
pub struct Perceptron {
    weights: Vec<f32>,
}
impl Perceptron {
    /// Create a perceptron with 'len' weights, all zero.
    pub fn new(len: usize) -> Self {
        Self { weights: vec![0.0; len] }
    }

    /// Create a perceptron with the given weights.
    pub fn from_weights(weights: Vec<f32>) -> Self {
        Self { weights }
    }

    /// Zero all weights.
    pub fn reset(&mut self) {
        self.weights.iter_mut().for_each(|w| *w = 0.0);
    }

    /// Return a reference to the list of weights.
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Compute the dot product of the history and weight vectors.
    pub fn output(&self, history: &HistoryRegister) -> f32 {
        debug_assert_eq!(history.len(), self.weights.len());
        history.values().zip(self.weights.iter())
            .fold(0.0, |sum, (x, w)| sum + (x as f32) * *w)
    }

    /// The predicted outcome is 'taken' only for a strictly positive output.
    pub fn predict(&self, history: &HistoryRegister) -> Outcome {
        Outcome::from_bool(self.output(history) > 0.0)
    }

    /// Train on the resolved 'outcome'. Returns 'true' if any weights were
    /// adjusted.
    ///
    /// Training occurs after a misprediction, or when the magnitude of the
    /// output is below 'theta'. Each weight moves by +1 when its history
    /// position agrees with the outcome and by -1 when it disagrees (and
    /// stays put where the history position is still empty).
    pub fn train(&mut self, history: &HistoryRegister, outcome: Outcome,
        theta: f32) -> bool
    {
        let output = self.output(history);
        let prediction = Outcome::from_bool(output > 0.0);
        let t = outcome.signum() as f32;

        let miss = prediction != outcome;
        let below_threshold = output.abs() < theta;
        if !(miss || below_threshold) {
            return false;
        }

        for (w, x) in self.weights.iter_mut().zip(history.values()) {
            *w += t * (x as f32);
        }
        true
    }
}
