//! Model metadata as supplied by the external predictor.
//!
//! Parsing the binary model file is out of scope; whatever loads the model
//! hands over a [`ModelMetadata`] describing the feature-vector layout.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

/// 1-64 chars, alphanumeric first, then alphanumeric / '_' / '-' / '.'.
static MODEL_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9][\w\-.]{0,63}$").expect("model name regex"));

pub fn is_valid_model_name(name: &str) -> bool {
    MODEL_NAME_RE.is_match(name)
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelMetadata {
    pub model_name: String,
    /// Seed for the 64-bit hashing scheme; identical across all SDK
    /// implementations consuming the same model.
    pub model_seed: u64,
    /// Ordered; position assigns the feature-vector index, length fixes the
    /// vector length.
    pub feature_names: Vec<String>,
    /// Per-feature raw string-table hashes, for models trained with lookup
    /// string encoding. Features without an entry share an empty table.
    #[serde(default)]
    pub string_tables: BTreeMap<String, Vec<u64>>,
}

impl ModelMetadata {
    pub fn feature_count(&self) -> usize {
        self.feature_names.len()
    }
}
