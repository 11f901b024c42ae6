//! Scoring with an asynchronously loaded model.

use std::future::Future;
use std::sync::{Arc, RwLock};

use rand::Rng;
use rand_distr::StandardNormal;
use tokio::sync::oneshot;
use tracing::{info, warn};

use rankwerk_core::{ModelMetadata, RankwerkError, Result, Value};
use rankwerk_encoder::{xxh3_64, FeatureEncoder, StringTableSet};

use crate::predictor::Predictor;

struct LoadedModel {
    metadata: ModelMetadata,
    encoder: FeatureEncoder,
    string_tables: StringTableSet,
    predictor: Arc<dyn Predictor>,
}

/// Scores variants with optional shared context.
///
/// Cheap to clone; clones share the loaded model. `score` never blocks on
/// loading: until a model is installed it returns descending Gaussian draws.
#[derive(Clone, Default)]
pub struct Scorer {
    state: Arc<RwLock<Option<LoadedModel>>>,
}

impl Scorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.state.read().map(|state| state.is_some()).unwrap_or(false)
    }

    pub fn model_name(&self) -> Option<String> {
        self.state
            .read()
            .ok()
            .and_then(|state| state.as_ref().map(|model| model.metadata.model_name.clone()))
    }

    /// Installs a model immediately. The feature encoder and per-feature
    /// string tables are built once here from the metadata; metadata whose
    /// string tables reference unknown features is rejected.
    pub fn install(&self, metadata: ModelMetadata, predictor: Arc<dyn Predictor>) -> Result<()> {
        let encoder = FeatureEncoder::new(metadata.model_seed, &metadata.feature_names, xxh3_64);
        let string_tables = StringTableSet::from_metadata(&metadata, xxh3_64)?;
        let mut state = self
            .state
            .write()
            .map_err(|_| RankwerkError::InvalidState("scorer lock poisoned".into()))?;
        info!(model = %metadata.model_name, features = metadata.feature_count(), "model installed");
        *state = Some(LoadedModel {
            metadata,
            encoder,
            string_tables,
            predictor,
        });
        Ok(())
    }

    /// Alternate string encoding for models trained with lookup tables:
    /// returns the trained (or miss-band) value for `string` at
    /// `feature_index`, or `None` when no model is loaded or the index is
    /// out of range.
    pub fn lookup_string(&self, feature_index: usize, string: &str) -> Option<f64> {
        let state = self.state.read().ok()?;
        state
            .as_ref()
            .and_then(|model| model.string_tables.encode(feature_index, string))
    }

    /// Awaits a caller-supplied source (download, file read, ...) and
    /// installs the result. A failed source is an error here, unlike the
    /// background path.
    pub async fn load<F>(&self, source: F) -> Result<()>
    where
        F: Future<Output = Result<(ModelMetadata, Arc<dyn Predictor>)>> + Send,
    {
        let (metadata, predictor) = source.await?;
        self.install(metadata, predictor)
    }

    /// Spawns the load on the runtime. Failure is reported through the
    /// returned channel and logged; scoring keeps using the Gaussian
    /// fallback until the load succeeds.
    pub fn load_in_background<F>(&self, source: F) -> oneshot::Receiver<Result<()>>
    where
        F: Future<Output = Result<(ModelMetadata, Arc<dyn Predictor>)>> + Send + 'static,
    {
        let scorer = self.clone();
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let result = scorer.load(source).await;
            if let Err(err) = &result {
                warn!(error = %err, "background model load failed");
            }
            let _ = tx.send(result);
        });
        rx
    }

    /// Scores each variant; higher is better. One fresh encoding noise per
    /// call, plus an independent per-variant tie-break epsilon so exact
    /// score ties are vanishingly unlikely.
    pub fn score(&self, variants: &[Value], context: Option<&Value>) -> Result<Vec<f64>> {
        let mut rng = rand::thread_rng();
        let noise = rng.gen();
        self.score_with(variants, context, noise, &mut rng)
    }

    pub(crate) fn score_with<R: Rng>(
        &self,
        variants: &[Value],
        context: Option<&Value>,
        noise: f64,
        rng: &mut R,
    ) -> Result<Vec<f64>> {
        if variants.is_empty() {
            return Err(RankwerkError::InvalidArgument(
                "variants must not be empty".into(),
            ));
        }
        let state = self
            .state
            .read()
            .map_err(|_| RankwerkError::InvalidState("scorer lock poisoned".into()))?;
        let Some(model) = state.as_ref() else {
            return Ok(descending_gaussians_with(rng, variants.len()));
        };

        let vectors = model.encoder.encode(variants, context, noise);
        Ok(vectors
            .iter()
            .map(|features| {
                f64::from(model.predictor.predict(features)) + rng.gen::<f64>() * 2f64.powi(-23)
            })
            .collect())
    }
}

/// Model-not-loaded fallback: `count` i.i.d. standard-Gaussian draws sorted
/// descending. Mean and median of the draws are ~0 over many calls.
pub fn descending_gaussians(count: usize) -> Vec<f64> {
    descending_gaussians_with(&mut rand::thread_rng(), count)
}

fn descending_gaussians_with<R: Rng>(rng: &mut R, count: usize) -> Vec<f64> {
    let mut scores: Vec<f64> = (0..count).map(|_| rng.sample(StandardNormal)).collect();
    scores.sort_by(|a, b| b.total_cmp(a));
    scores
}
