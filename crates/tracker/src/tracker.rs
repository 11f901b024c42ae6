//! The decision/reward tracker.
//!
//! Reporting every candidate of every decision would swamp the training
//! endpoint, so the tracker reports the best variant always, the runners-up
//! with probability `1 / min(N-1, max_runners_up)` (expected frequency of
//! "rich" reports independent of N), and one uniformly chosen sample from
//! the unreported remainder as an unbiased contrastive example.

use chrono::{SecondsFormat, Utc};
use rand::Rng;
use reqwest::Client;
use serde_json::json;
use tracing::warn;
use url::Url;

use rankwerk_core::ksuid::{KsuidGenerator, KSUID_STRING_LENGTH};
use rankwerk_core::meta::is_valid_model_name;
use rankwerk_core::{RankwerkError, Result, Value};

use crate::store::DecisionStore;

pub const DEFAULT_MAX_RUNNERS_UP: u32 = 50;

pub struct DecisionTracker {
    model_name: String,
    track_url: Url,
    track_api_key: Option<String>,
    max_runners_up: u32,
    http: Client,
    store: DecisionStore,
    ksuid: KsuidGenerator,
}

impl DecisionTracker {
    /// Argument errors (bad model name) are synchronous and immediate.
    pub fn new(
        model_name: impl Into<String>,
        track_url: Url,
        track_api_key: Option<String>,
        store: DecisionStore,
    ) -> Result<Self> {
        let model_name = model_name.into();
        if !is_valid_model_name(&model_name) {
            return Err(RankwerkError::InvalidArgument(format!(
                "invalid model name: [{model_name}]"
            )));
        }
        Ok(Self {
            model_name,
            track_url,
            track_api_key,
            max_runners_up: DEFAULT_MAX_RUNNERS_UP,
            http: Client::new(),
            store,
            ksuid: KsuidGenerator::new(),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn max_runners_up(&self) -> u32 {
        self.max_runners_up
    }

    pub fn set_max_runners_up(&mut self, max_runners_up: u32) {
        self.max_runners_up = max_runners_up;
    }

    /// Tracks a ranked decision (best first) and returns its fresh id.
    ///
    /// The payload is validated before any network attempt; the post itself
    /// is fire-and-forget. The id is also persisted as "last decision id"
    /// for this model so a later reward can find it.
    pub fn track(&self, ranked: &[Value], givens: Option<&Value>) -> Result<String> {
        self.track_with_rng(ranked, givens, &mut rand::thread_rng())
    }

    pub(crate) fn track_with_rng<R: Rng>(
        &self,
        ranked: &[Value],
        givens: Option<&Value>,
        rng: &mut R,
    ) -> Result<String> {
        let message_id = self.ksuid.next();
        let body = build_decision_body(
            &self.model_name,
            ranked,
            givens,
            self.max_runners_up,
            &message_id,
            rng,
        )?;
        self.store
            .persist_decision_id_detached(self.model_name.clone(), message_id.clone());
        self.post(body);
        Ok(message_id)
    }

    /// Posts a reward record referencing a previously tracked decision.
    /// Non-finite rewards and malformed ids are rejected synchronously.
    pub fn add_reward(&self, reward: f64, decision_id: &str) -> Result<String> {
        if !reward.is_finite() {
            return Err(RankwerkError::InvalidArgument(
                "reward must not be NaN or infinity".into(),
            ));
        }
        if decision_id.len() != KSUID_STRING_LENGTH {
            return Err(RankwerkError::InvalidArgument(format!(
                "invalid decision id: [{decision_id}]"
            )));
        }
        let message_id = self.ksuid.next();
        let body = json!({
            "type": "reward",
            "model": self.model_name,
            "message_id": message_id,
            "decision_id": decision_id,
            "reward": reward,
            "timestamp": timestamp(),
        });
        self.post(body);
        Ok(message_id)
    }

    /// Attributes a reward to the most recent tracked decision for this
    /// model. If none exists the reward is dropped with a warning — not an
    /// error, matching "rewards are best-effort training signal".
    pub async fn add_reward_for_model(&self, reward: f64) -> Result<Option<String>> {
        if !reward.is_finite() {
            return Err(RankwerkError::InvalidArgument(
                "reward must not be NaN or infinity".into(),
            ));
        }
        match self.store.last_decision_id(&self.model_name).await? {
            Some(decision_id) => Ok(Some(self.add_reward(reward, &decision_id)?)),
            None => {
                warn!(model = %self.model_name, "no tracked decision for model, reward dropped");
                Ok(None)
            }
        }
    }

    /// Tracks a free-form named event.
    pub fn track_event(&self, event: &str, properties: Option<&Value>) -> Result<String> {
        let message_id = self.ksuid.next();
        let mut body = json!({
            "type": "event",
            "event": event,
            "model": self.model_name,
            "message_id": message_id,
            "timestamp": timestamp(),
        });
        if let Some(properties) = properties {
            body["properties"] = properties.to_json()?;
        }
        self.post(body);
        Ok(message_id)
    }

    // Fire and forget: requires a tokio runtime; transport errors are
    // logged, never surfaced to the caller. In-flight posts are not
    // cancelled but process termination may drop them.
    fn post(&self, body: serde_json::Value) {
        let mut request = self.http.post(self.track_url.clone()).json(&body);
        if let Some(key) = &self.track_api_key {
            request = request.header("x-api-key", key);
        }
        let url = self.track_url.clone();
        tokio::spawn(async move {
            match request.send().await {
                Ok(response) => {
                    if let Err(err) = response.error_for_status() {
                        warn!(url = %url, error = %err, "tracking request rejected");
                    }
                }
                Err(err) => warn!(url = %url, error = %err, "tracking request failed"),
            }
        });
    }
}

/// True with probability `1 / min(variants_count - 1, max_runners_up)`;
/// never for a single variant or a zero cap.
pub fn should_track_runners_up<R: Rng>(
    variants_count: usize,
    max_runners_up: u32,
    rng: &mut R,
) -> bool {
    if variants_count <= 1 || max_runners_up == 0 {
        return false;
    }
    let pool = (variants_count - 1).min(max_runners_up as usize);
    rng.gen::<f64>() < 1.0 / pool as f64
}

/// The next-best variants after the best, capped by `max_runners_up`.
pub fn top_runners_up(ranked: &[Value], max_runners_up: u32) -> &[Value] {
    let end = 1 + (max_runners_up as usize).min(ranked.len().saturating_sub(1));
    &ranked[1..end]
}

/// Uniform index into the unreported remainder `[runners_up_count + 1, N)`,
/// or `None` when nothing remains after best and runners-up.
pub(crate) fn sample_index<R: Rng>(
    variants_count: usize,
    runners_up_count: usize,
    rng: &mut R,
) -> Option<usize> {
    let samples_count = variants_count.saturating_sub(runners_up_count + 1);
    if samples_count == 0 {
        return None;
    }
    Some(rng.gen_range(0..samples_count) + runners_up_count + 1)
}

/// Builds the decision payload. Every field passes through
/// [`Value::to_json`], so anything non-JSON-encodable fails here,
/// synchronously, before a network attempt.
pub(crate) fn build_decision_body<R: Rng>(
    model_name: &str,
    ranked: &[Value],
    givens: Option<&Value>,
    max_runners_up: u32,
    message_id: &str,
    rng: &mut R,
) -> Result<serde_json::Value> {
    let mut body = serde_json::Map::new();
    body.insert("type".into(), json!("decision"));
    body.insert("model".into(), json!(model_name));
    // count is forced to 1 for an empty list; the best slot then reports an
    // explicit null (distinguished from field absence).
    body.insert(
        "count".into(),
        json!(if ranked.is_empty() { 1 } else { ranked.len() }),
    );
    body.insert("message_id".into(), json!(message_id));
    let best = ranked.first().cloned().unwrap_or(Value::Null);
    body.insert("variant".into(), best.to_json()?);
    if let Some(givens) = givens {
        body.insert("givens".into(), givens.to_json()?);
    }

    let mut runners_up_count = 0;
    if should_track_runners_up(ranked.len(), max_runners_up, rng) {
        let runners_up = top_runners_up(ranked, max_runners_up);
        runners_up_count = runners_up.len();
        body.insert(
            "runners_up".into(),
            serde_json::Value::Array(
                runners_up.iter().map(Value::to_json).collect::<Result<_>>()?,
            ),
        );
    }

    // The sample may itself be null; that's an explicit null on the wire,
    // while "no eligible sample" omits the field entirely.
    if let Some(index) = sample_index(ranked.len(), runners_up_count, rng) {
        body.insert("sample".into(), ranked[index].to_json()?);
    }

    body.insert("timestamp".into(), json!(timestamp()));
    Ok(serde_json::Value::Object(body))
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
