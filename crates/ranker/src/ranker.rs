//! Ranking by descending score.

use rankwerk_core::{RankwerkError, Result, Value};

use crate::scorer::Scorer;

/// Reorders `variants` by descending score.
///
/// Uses `f64::total_cmp`, a proper three-way comparison; the order among
/// exactly equal scores is unspecified (tie-break jitter makes exact
/// equality astronomically unlikely in practice).
pub fn rank<T: Clone>(variants: &[T], scores: &[f64]) -> Result<Vec<T>> {
    if variants.len() != scores.len() {
        return Err(RankwerkError::InvalidArgument(format!(
            "variants ({}) and scores ({}) must have the same length",
            variants.len(),
            scores.len()
        )));
    }
    let mut order: Vec<usize> = (0..variants.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    Ok(order.into_iter().map(|index| variants[index].clone()).collect())
}

/// Scores and ranks variants with one call.
#[derive(Clone, Default)]
pub struct Ranker {
    scorer: Scorer,
}

impl Ranker {
    pub fn new(scorer: Scorer) -> Self {
        Self { scorer }
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    /// Best first. Errors on empty variants, never on a missing model (the
    /// Gaussian fallback still yields a total order).
    pub fn rank(&self, variants: &[Value], context: Option<&Value>) -> Result<Vec<Value>> {
        let scores = self.scorer.score(variants, context)?;
        rank(variants, &scores)
    }
}
