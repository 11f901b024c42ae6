use rankwerk_core::{RankwerkError, Result, Value};

use crate::tracker::DecisionTracker;

/// A ranked decision with its tracking lifecycle: track once, then reward.
#[derive(Debug, Clone)]
pub struct Decision {
    ranked: Vec<Value>,
    givens: Option<Value>,
    id: Option<String>,
}

impl Decision {
    pub fn new(ranked: Vec<Value>, givens: Option<Value>) -> Self {
        Self {
            ranked,
            givens,
            id: None,
        }
    }

    /// The best variant, if any.
    pub fn best(&self) -> Option<&Value> {
        self.ranked.first()
    }

    pub fn ranked(&self) -> &[Value] {
        &self.ranked
    }

    /// The tracking id, set once [`Decision::track`] has run.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Tracks this decision exactly once; a second call is an error.
    pub fn track(&mut self, tracker: &DecisionTracker) -> Result<&str> {
        if self.id.is_some() {
            return Err(RankwerkError::InvalidState(
                "decision already tracked".into(),
            ));
        }
        let id = tracker.track(&self.ranked, self.givens.as_ref())?;
        self.id = Some(id);
        Ok(self.id.as_deref().unwrap_or_default())
    }

    /// Rewards this decision; requires a prior successful [`Decision::track`].
    pub fn add_reward(&self, tracker: &DecisionTracker, reward: f64) -> Result<String> {
        match &self.id {
            Some(id) => tracker.add_reward(reward, id),
            None => Err(RankwerkError::InvalidState(
                "cannot add reward before tracking the decision".into(),
            )),
        }
    }
}
