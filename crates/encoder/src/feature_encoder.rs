//! Feature encoding via the hashing trick.
//!
//! Every node in a variant is addressed by a feature name derived from a
//! chain of seeded hashes; values land in the model's feature vector by name
//! lookup. Contributions accumulate (`+=`), so paths that alias to the same
//! slot sum instead of clobbering — standard hashing-trick degradation under
//! collision.

use std::collections::HashMap;

use rankwerk_core::Value;

use crate::hash::Hash64;

pub struct FeatureEncoder {
    variant_seed: u64,
    value_seed: u64,
    context_seed: u64,
    feature_indexes: HashMap<String, usize>,
    hash64: Hash64,
}

impl FeatureEncoder {
    /// Derives the three sub-seeds from the model seed and builds the
    /// name-to-index map. Duplicate feature names are a model-validity bug
    /// and are not handled defensively; the last occurrence wins.
    pub fn new(model_seed: u64, feature_names: &[String], hash64: Hash64) -> Self {
        let variant_seed = hash64(b"variant", model_seed);
        let value_seed = hash64(b"$value", variant_seed);
        let context_seed = hash64(b"context", model_seed);
        let feature_indexes = feature_names
            .iter()
            .enumerate()
            .map(|(index, name)| (name.clone(), index))
            .collect();
        Self {
            variant_seed,
            value_seed,
            context_seed,
            feature_indexes,
            hash64,
        }
    }

    pub fn feature_count(&self) -> usize {
        self.feature_indexes.len()
    }

    /// Encodes a batch of variants against one optional context.
    ///
    /// The context is encoded once and copied as the baseline of every
    /// variant's vector — context features are additive priors shared across
    /// all candidates. All vectors in one call share the same noise-derived
    /// jitter scale, so calling twice with identical arguments yields
    /// bit-identical vectors.
    pub fn encode(&self, variants: &[Value], context: Option<&Value>, noise: f64) -> Vec<Vec<f64>> {
        let small_noise = shrink(noise);
        let baseline = context.map(|context| {
            let mut features = vec![0.0; self.feature_count()];
            self.encode_internal(context, self.context_seed, small_noise, &mut features);
            features
        });
        variants
            .iter()
            .map(|variant| {
                let mut features = baseline
                    .clone()
                    .unwrap_or_else(|| vec![0.0; self.feature_count()]);
                // Scalars, lists, and null are treated as if wrapped under a
                // synthetic "$value" key; only maps root at the variant seed.
                let seed = match variant {
                    Value::Map(_) => self.variant_seed,
                    _ => self.value_seed,
                };
                self.encode_internal(variant, seed, small_noise, &mut features);
                features
            })
            .collect()
    }

    fn encode_internal(&self, node: &Value, seed: u64, small_noise: f64, features: &mut [f64]) {
        match node {
            Value::Null => {}
            Value::Bool(b) => {
                self.add(seed, if *b { 1.0 } else { 0.0 }, small_noise, features);
            }
            Value::Number(n) => {
                // NaN means "missing": no contribution, slot left untouched.
                if !n.is_nan() {
                    self.add(seed, *n, small_noise, features);
                }
            }
            Value::String(s) => {
                let hashed = (self.hash64)(s.as_bytes(), seed);
                // Two independent contributions: the key's "something was
                // present" slot, and a slot distinct per concrete string
                // value. Both are signed 16-bit slices of the hash.
                self.add(
                    seed,
                    (((hashed & 0xffff_0000) >> 16) as f64) - 0x8000 as f64,
                    small_noise,
                    features,
                );
                self.add(
                    hashed,
                    ((hashed & 0xffff) as f64) - 0x8000 as f64,
                    small_noise,
                    features,
                );
            }
            Value::Map(map) => {
                for (key, value) in map {
                    let seed = (self.hash64)(key.as_bytes(), seed);
                    self.encode_internal(value, seed, small_noise, features);
                }
            }
            Value::List(items) => {
                for (index, item) in items.iter().enumerate() {
                    let seed = (self.hash64)(&(index as u64).to_be_bytes(), seed);
                    self.encode_internal(item, seed, small_noise, features);
                }
            }
        }
    }

    fn add(&self, hash: u64, value: f64, small_noise: f64, features: &mut [f64]) {
        if let Some(&index) = self.feature_indexes.get(&hash_to_feature_name(hash)) {
            features[index] += sprinkle(value, small_noise);
        }
    }
}

/// Lowercase hex of the high 32 bits of a hash, matched against the model's
/// feature names.
pub fn hash_to_feature_name(hash: u64) -> String {
    format!("{:08x}", (hash >> 32) as u32)
}

/// Deterministic jitter: shift then scale by the same epsilon. Exact for
/// `small_noise == 0.0`.
pub fn sprinkle(x: f64, small_noise: f64) -> f64 {
    (x + small_noise) * (1.0 + small_noise)
}

fn shrink(noise: f64) -> f64 {
    noise * 2f64.powi(-17)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::xxh3_64;
    use rankwerk_core::Value;

    /// Maps every input to one constant, so every path aliases to the same
    /// feature slot.
    fn colliding_hash(_bytes: &[u8], _seed: u64) -> u64 {
        0xdead_beef_0000_0000
    }

    fn map(entries: &[(&str, Value)]) -> Value {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn feature_names_for(variant: &Value, model_seed: u64) -> Vec<String> {
        // Replays the seed chain to discover which names the encoder will
        // address; keeps fixtures in sync with the hashing scheme.
        let variant_seed = xxh3_64(b"variant", model_seed);
        let value_seed = xxh3_64(b"$value", variant_seed);
        match variant {
            Value::Map(entries) => entries
                .keys()
                .map(|key| hash_to_feature_name(xxh3_64(key.as_bytes(), variant_seed)))
                .collect(),
            _ => vec![hash_to_feature_name(value_seed)],
        }
    }

    #[test]
    fn identical_arguments_yield_bit_identical_vectors() {
        let variant = map(&[
            ("price", Value::Number(2.5)),
            ("label", Value::from("summer-sale")),
            ("flags", Value::List(vec![Value::Bool(true), Value::Null])),
        ]);
        let context = map(&[("device", Value::from("tablet"))]);
        let names: Vec<String> = (0u32..64).map(|i| format!("{i:08x}")).collect();
        let encoder = FeatureEncoder::new(0x5eed, &names, xxh3_64);

        let first = encoder.encode(&[variant.clone()], Some(&context), 0.42);
        let second = encoder.encode(&[variant], Some(&context), 0.42);
        for (a, b) in first[0].iter().zip(&second[0]) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn scalar_number_lands_in_value_slot_exactly() {
        let variant = Value::Number(3.25);
        let names = feature_names_for(&variant, 99);
        let encoder = FeatureEncoder::new(99, &names, xxh3_64);
        // noise 0 makes sprinkle the identity
        let vectors = encoder.encode(&[variant], None, 0.0);
        assert_eq!(vectors[0], vec![3.25]);
    }

    #[test]
    fn map_number_lands_in_key_slot_exactly() {
        let variant = map(&[("a", Value::Number(1.0))]);
        let names = feature_names_for(&variant, 7);
        let encoder = FeatureEncoder::new(7, &names, xxh3_64);
        let vectors = encoder.encode(&[variant], None, 0.0);
        assert_eq!(vectors[0], vec![1.0]);
    }

    #[test]
    fn colliding_paths_accumulate_their_sprinkled_contributions() {
        let variant = map(&[("a", Value::Number(1.0)), ("b", Value::Number(2.0))]);
        let names = vec![hash_to_feature_name(colliding_hash(b"", 0))];
        let encoder = FeatureEncoder::new(0, &names, colliding_hash);

        let noise = 0.5;
        let small_noise = noise * 2f64.powi(-17);
        let vectors = encoder.encode(&[variant], None, noise);
        let expected = sprinkle(1.0, small_noise) + sprinkle(2.0, small_noise);
        assert_eq!(vectors[0][0].to_bits(), expected.to_bits());
    }

    #[test]
    fn nan_variant_without_context_leaves_every_slot_untouched() {
        let names: Vec<String> = (0u32..16).map(|i| format!("{i:08x}")).collect();
        let encoder = FeatureEncoder::new(1, &names, xxh3_64);
        let vectors = encoder.encode(&[Value::Number(f64::NAN)], None, 0.77);
        assert!(vectors[0].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn string_contributes_both_signed_hash_slices() {
        // One constant hash makes both string slots and the slice arithmetic
        // fully predictable.
        fn fixed_hash(_bytes: &[u8], _seed: u64) -> u64 {
            0x1234_5678_9abc_def0
        }
        let seed_name = hash_to_feature_name(fixed_hash(b"", 0)); // "12345678"
        let names = vec![seed_name];
        let encoder = FeatureEncoder::new(0, &names, fixed_hash);

        let vectors = encoder.encode(&[Value::from("anything")], None, 0.0);
        // 0x9abc - 0x8000 = 6844 (upper slice), 0xdef0 - 0x8000 = 24304
        // (lower slice); the hash collides both into the single slot.
        assert_eq!(vectors[0][0], 6844.0 + 24304.0);
    }

    #[test]
    fn context_is_a_shared_baseline_for_every_variant() {
        let context = map(&[("device", Value::Number(4.0))]);
        let context_seed = xxh3_64(b"context", 11);
        let names = vec![hash_to_feature_name(xxh3_64(b"device", context_seed))];
        let encoder = FeatureEncoder::new(11, &names, xxh3_64);

        let vectors = encoder.encode(
            &[Value::Null, Value::from("ignored-by-this-layout")],
            Some(&context),
            0.0,
        );
        // A null variant adds nothing, so its vector IS the baseline.
        assert_eq!(vectors[0], vec![4.0]);
        assert_eq!(vectors.len(), 2);
    }

    #[test]
    fn list_elements_are_seeded_by_big_endian_index() {
        let variant = Value::List(vec![Value::Number(1.0), Value::Number(1.0)]);
        let variant_seed = xxh3_64(b"variant", 3);
        let value_seed = xxh3_64(b"$value", variant_seed);
        let names = vec![
            hash_to_feature_name(xxh3_64(&0u64.to_be_bytes(), value_seed)),
            hash_to_feature_name(xxh3_64(&1u64.to_be_bytes(), value_seed)),
        ];
        let encoder = FeatureEncoder::new(3, &names, xxh3_64);

        let vectors = encoder.encode(&[variant], None, 0.0);
        // Same element value, distinct slots per position.
        assert_eq!(vectors[0], vec![1.0, 1.0]);
    }

    #[test]
    fn unknown_feature_names_contribute_nothing() {
        let encoder = FeatureEncoder::new(5, &["ffffffff".to_string()], xxh3_64);
        let vectors = encoder.encode(&[map(&[("a", Value::Number(9.0))])], None, 0.0);
        assert_eq!(vectors[0], vec![0.0]);
    }

    #[test]
    fn feature_name_is_lowercase_hex_of_high_bits() {
        assert_eq!(hash_to_feature_name(0x1234_5678_0000_0000), "12345678");
        assert_eq!(hash_to_feature_name(0xffff_ffff_ffff_ffff), "ffffffff");
        assert_eq!(hash_to_feature_name(0x0000_00ab_ffff_ffff), "000000ab");
    }
}
