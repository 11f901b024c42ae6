//! Deterministic feature-encoding codec.
//!
//! Converts JSON-like variants plus optional shared context into fixed-length
//! numeric vectors via a seeded 64-bit hashing scheme. The output must be
//! bit-identical across platforms and SDK implementations; everything here is
//! exact unsigned arithmetic over immutable tables, safe for unsynchronized
//! concurrent use.

pub mod feature_encoder;
pub mod hash;
pub mod string_table;

pub use feature_encoder::{hash_to_feature_name, sprinkle, FeatureEncoder};
pub use hash::{xxh3_64, Hash64};
pub use string_table::{StringTable, StringTableSet};
