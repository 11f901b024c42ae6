//! Scoring and ranking for the rankwerk decision SDK.
//!
//! Drives the feature encoder across a batch of variants, forwards vectors
//! to the external predictor, and sorts candidates by descending score.
//! Before a model is loaded, scoring falls back to sorted Gaussian draws so
//! callers always get a legitimate (if uninformed) total order.

pub mod predictor;
pub mod ranker;
pub mod scorer;

pub use predictor::Predictor;
pub use ranker::{rank, Ranker};
pub use scorer::{descending_gaussians, Scorer};
