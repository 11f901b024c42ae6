/// Black-box tree-ensemble evaluator.
///
/// Consumes one encoded feature vector and returns a raw score. Parsing the
/// binary model file that produces an implementation of this trait is out of
/// scope here; whether an unset slot reads as 0.0 or NaN is the evaluator's
/// convention, not this crate's.
pub trait Predictor: Send + Sync {
    fn predict(&self, features: &[f64]) -> f32;
}
