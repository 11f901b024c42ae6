use tracing::info;

use rankwerk_core::config::{load_track_config, TrackConfig};
use rankwerk_core::Value;
use rankwerk_ranker::Ranker;
use rankwerk_tracker::{Decision, SdkContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // YAML config when pointed at one, env overrides on top.
    let mut config = match std::env::var("RANKWERK_CONFIG") {
        Ok(path) => load_track_config(path)?,
        Err(_) => TrackConfig::default(),
    };
    if let Ok(url) = std::env::var("RANKWERK_TRACK_URL") {
        config.track_url = Some(url);
    }
    if let Ok(key) = std::env::var("RANKWERK_TRACK_API_KEY") {
        config.track_api_key = Some(key);
    }
    let context = SdkContext::with_defaults(config);
    let tracker = context.tracker("greetings")?;

    let variants: Vec<Value> = ["Hello", "Howdy", "Hi there", "Hey"]
        .into_iter()
        .map(Value::from)
        .collect();

    // No model loaded: ranked by descending Gaussian scores.
    let ranker = Ranker::default();
    let ranked = ranker.rank(&variants, None)?;

    let mut decision = Decision::new(ranked, None);
    let id = decision.track(&tracker)?.to_owned();
    info!(decision_id = %id, "tracked shadow decision");

    let reward_id = decision.add_reward(&tracker, 1.0)?;
    info!(reward_id = %reward_id, "tracked shadow reward");

    // Posts are fire-and-forget; give them a moment before the runtime exits.
    tokio::time::sleep(std::time::Duration::from_millis(500)).await;
    println!("decision {id} rewarded ({reward_id})");
    Ok(())
}
