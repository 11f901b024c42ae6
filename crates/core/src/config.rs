use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

const fn default_max_runners_up() -> u32 {
    50
}

/// Default tracker configuration, owned by the composition root and applied
/// to every tracker it creates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackConfig {
    /// Endpoint all tracked decisions, rewards, and events are posted to.
    /// Tracking is unavailable until this is set.
    #[serde(default)]
    pub track_url: Option<String>,
    #[serde(default)]
    pub track_api_key: Option<String>,
    /// Hyperparameter that trades training signal for payload size.
    /// Values from 10-100 are reasonable; 0 disables runners-up tracking.
    #[serde(default = "default_max_runners_up")]
    pub max_runners_up: u32,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            track_url: None,
            track_api_key: None,
            max_runners_up: default_max_runners_up(),
        }
    }
}

pub fn load_track_config<P: AsRef<Path>>(path: P) -> anyhow::Result<TrackConfig> {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(content) => match serde_yaml_ng::from_str(&content) {
            Ok(config) => Ok(config),
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to parse track config YAML, falling back to defaults"
                );
                Ok(TrackConfig::default())
            }
        },
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "failed to read track config YAML, falling back to defaults"
            );
            Ok(TrackConfig::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let config = load_track_config("/does/not/exist.yaml").unwrap();
        assert_eq!(config.track_url, None);
        assert_eq!(config.max_runners_up, default_max_runners_up());
    }

    #[test]
    fn partial_yaml_merges_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.yaml");
        {
            let mut file = fs::File::create(&path).unwrap();
            writeln!(file, "track_url: \"https://track.example/events\"").unwrap();
        }

        let config = load_track_config(&path).unwrap();
        assert_eq!(
            config.track_url.as_deref(),
            Some("https://track.example/events")
        );
        assert_eq!(config.track_api_key, None);
        assert_eq!(config.max_runners_up, default_max_runners_up());
    }

    #[test]
    fn malformed_yaml_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.yaml");
        {
            let mut file = fs::File::create(&path).unwrap();
            writeln!(file, "track_url: [not, a, string").unwrap();
        }

        let config = load_track_config(&path).unwrap();
        assert_eq!(config.track_url, None);
    }
}
