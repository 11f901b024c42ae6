use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use url::Url;

use rankwerk_core::config::TrackConfig;
use rankwerk_core::{RankwerkError, Result};

use crate::store::DecisionStore;
use crate::tracker::DecisionTracker;

/// Composition root: holds the track configuration and the decision store,
/// and hands out one shared [`DecisionTracker`] per model name.
pub struct SdkContext {
    config: TrackConfig,
    store: DecisionStore,
    trackers: Mutex<HashMap<String, Arc<DecisionTracker>>>,
}

impl SdkContext {
    pub fn new(config: TrackConfig, store: DecisionStore) -> Self {
        Self {
            config,
            store,
            trackers: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_defaults(config: TrackConfig) -> Self {
        Self::new(config, DecisionStore::default())
    }

    pub fn config(&self) -> &TrackConfig {
        &self.config
    }

    /// Returns the tracker for `model_name`, creating it on first use.
    /// Fails when no track URL is configured or the name is invalid.
    pub fn tracker(&self, model_name: &str) -> Result<Arc<DecisionTracker>> {
        let mut trackers = self
            .trackers
            .lock()
            .map_err(|_| RankwerkError::InvalidState("tracker registry poisoned".into()))?;
        if let Some(tracker) = trackers.get(model_name) {
            return Ok(Arc::clone(tracker));
        }

        let track_url = self.config.track_url.as_deref().ok_or_else(|| {
            RankwerkError::InvalidArgument("no track URL configured".into())
        })?;
        let track_url = Url::parse(track_url).map_err(|err| {
            RankwerkError::InvalidArgument(format!("invalid track URL [{track_url}]: {err}"))
        })?;

        let mut tracker = DecisionTracker::new(
            model_name,
            track_url,
            self.config.track_api_key.clone(),
            self.store.clone(),
        )?;
        tracker.set_max_runners_up(self.config.max_runners_up);
        let tracker = Arc::new(tracker);
        trackers.insert(model_name.to_owned(), Arc::clone(&tracker));
        Ok(tracker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(dir: &tempfile::TempDir) -> SdkContext {
        let config = TrackConfig {
            track_url: Some("http://127.0.0.1:9/track".into()),
            track_api_key: Some("secret".into()),
            max_runners_up: 7,
        };
        SdkContext::new(config, DecisionStore::open(dir.path().join("t.db")))
    }

    #[test]
    fn trackers_are_created_once_per_model() {
        let dir = tempfile::tempdir().unwrap();
        let context = context(&dir);

        let first = context.tracker("greetings").unwrap();
        let second = context.tracker("greetings").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.max_runners_up(), 7);

        let other = context.tracker("songs").unwrap();
        assert!(!Arc::ptr_eq(&first, &other));
    }

    #[test]
    fn missing_track_url_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let context = SdkContext::new(
            TrackConfig::default(),
            DecisionStore::open(dir.path().join("t.db")),
        );
        assert!(matches!(
            context.tracker("greetings"),
            Err(RankwerkError::InvalidArgument(_))
        ));
    }

    #[test]
    fn invalid_model_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let context = context(&dir);
        assert!(context.tracker(".leading-dot").is_err());
        assert!(context.tracker(&"x".repeat(65)).is_err());
    }
}
