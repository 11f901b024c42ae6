//! Per-feature string embedding via pre-trained lookup tables.
//!
//! A model trained with lookup string encoding ships, per feature, an
//! ordered list of masked hash values. Earlier positions in the list were
//! more predictive during training and map to higher target values in
//! [-1, 1]; unseen strings land deterministically in a 0-centered "miss
//! band" narrower than the gap between trained values.

use std::sync::Arc;

use std::collections::HashMap;

use rankwerk_core::{ModelMetadata, RankwerkError, Result};

use crate::hash::Hash64;

pub struct StringTable {
    model_seed: u64,
    /// Smallest `2^k - 1` covering every table entry; 0 for empty or
    /// all-zero tables.
    mask: u64,
    /// Width of the miss interval: 1 for tables of at most one entry, else
    /// `2 / max_position` so misses never overlap nonzero trained values.
    miss_width: f64,
    value_table: HashMap<u64, f64>,
    hash64: Hash64,
}

impl StringTable {
    pub fn new(raw_table: &[u64], model_seed: u64, hash64: Hash64) -> Self {
        let mask = mask_for(raw_table);
        let max_position = raw_table.len().saturating_sub(1);
        let miss_width = if max_position < 1 {
            1.0
        } else {
            2.0 / max_position as f64
        };

        // Walk in reverse: the last listed entry gets -1.0, the first 1.0
        // (exactly 1.0 for a single-entry table).
        let mut value_table = HashMap::with_capacity(raw_table.len());
        for (position, &entry) in raw_table.iter().rev().enumerate() {
            let value = if max_position == 0 {
                1.0
            } else {
                scale(position as f64 / max_position as f64, 2.0)
            };
            value_table.insert(entry, value);
        }

        Self {
            model_seed,
            mask,
            miss_width,
            value_table,
            hash64,
        }
    }

    /// Looks the string up by masked hash; unseen strings get a
    /// deterministic miss value.
    pub fn encode(&self, string: &str) -> f64 {
        let hashed = (self.hash64)(string.as_bytes(), self.model_seed);
        if let Some(&value) = self.value_table.get(&(hashed & self.mask)) {
            return value;
        }
        self.encode_miss(hashed)
    }

    /// Scales the hash's low 32 bits into the miss band.
    pub fn encode_miss(&self, hashed: u64) -> f64 {
        scale((hashed & 0xffff_ffff) as f64 * 2f64.powi(-32), self.miss_width)
    }

    pub fn miss_width(&self) -> f64 {
        self.miss_width
    }

    pub fn mask(&self) -> u64 {
        self.mask
    }
}

/// One table per feature index, sharing a single empty table for features
/// the model carries no entries for.
pub struct StringTableSet {
    tables: Vec<Arc<StringTable>>,
}

impl StringTableSet {
    pub fn from_metadata(metadata: &ModelMetadata, hash64: Hash64) -> Result<Self> {
        let shared = Arc::new(StringTable::new(&[], metadata.model_seed, hash64));
        let mut tables = vec![shared; metadata.feature_count()];
        for (feature_name, raw_table) in &metadata.string_tables {
            let index = metadata
                .feature_names
                .iter()
                .position(|name| name == feature_name)
                .ok_or_else(|| {
                    RankwerkError::InvalidArgument(format!(
                        "bad model metadata: string table for unknown feature {feature_name:?}"
                    ))
                })?;
            tables[index] = Arc::new(StringTable::new(raw_table, metadata.model_seed, hash64));
        }
        Ok(Self { tables })
    }

    pub fn encode(&self, feature_index: usize, string: &str) -> Option<f64> {
        self.tables.get(feature_index).map(|table| table.encode(string))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

fn mask_for(raw_table: &[u64]) -> u64 {
    let max = raw_table.iter().copied().max().unwrap_or(0);
    if max == 0 {
        return 0;
    }
    match max.leading_zeros() {
        0 => u64::MAX,
        zeros => (1u64 << (64 - zeros)) - 1,
    }
}

/// Scales a value in [0, 1] to [-width/2, width/2].
pub fn scale(value: f64, width: f64) -> f64 {
    debug_assert!(width >= 0.0, "width must be positive");
    width * (value - 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::xxh3_64;
    use std::collections::BTreeMap;

    fn table_hash(entry: u64) -> Hash64 {
        // Hash64 is a plain fn pointer, so pick from a fixed set.
        match entry {
            1 => |_: &[u8], _: u64| 1u64,
            2 => |_: &[u8], _: u64| 2u64,
            3 => |_: &[u8], _: u64| 3u64,
            _ => |_: &[u8], _: u64| 7u64,
        }
    }

    #[test]
    fn mask_covers_the_largest_entry() {
        assert_eq!(mask_for(&[]), 0);
        assert_eq!(mask_for(&[0]), 0);
        assert_eq!(mask_for(&[1]), 1);
        assert_eq!(mask_for(&[5]), 7);
        assert_eq!(mask_for(&[8]), 15);
        assert_eq!(mask_for(&[3, 200, 17]), 255);
        assert_eq!(mask_for(&[u64::MAX]), u64::MAX);
    }

    #[test]
    fn single_entry_table_encodes_hit_as_one() {
        let table = StringTable::new(&[3], 0, table_hash(3));
        assert_eq!(table.encode("whatever"), 1.0);
        assert_eq!(table.miss_width(), 1.0);
    }

    #[test]
    fn entries_map_to_descending_targets_in_unit_range() {
        // Listed order [1, 2, 3]: earlier entries are more predictive.
        let table = StringTable::new(&[1, 2, 3], 0, xxh3_64);
        let targets: Vec<f64> = [1u64, 2, 3]
            .iter()
            .map(|&e| {
                StringTable::new(&[1, 2, 3], 0, table_hash(e)).encode("x")
            })
            .collect();
        assert_eq!(targets, vec![1.0, 0.0, -1.0]);
        assert_eq!(table.miss_width(), 1.0);
    }

    #[test]
    fn misses_land_in_the_zero_centered_band() {
        let table = StringTable::new(&[1, 2, 3, 4, 5], 42, xxh3_64);
        let half_width = table.miss_width() / 2.0;
        for hashed in [0u64, 0xdead_beef, u64::MAX, 0x1234_5678_9abc_def0] {
            // Force a miss by probing values outside the table keys.
            let miss = table.encode_miss(hashed);
            assert!(miss >= -half_width && miss < half_width, "miss {miss}");
        }
    }

    #[test]
    fn empty_table_always_misses_within_half_unit() {
        let table = StringTable::new(&[], 9, xxh3_64);
        for s in ["a", "b", "never seen"] {
            let value = table.encode(s);
            assert!(value >= -0.5 && value < 0.5);
        }
    }

    #[test]
    fn encoding_is_deterministic() {
        let table = StringTable::new(&[10, 20, 30], 1234, xxh3_64);
        for s in ["alpha", "beta", "unseen string"] {
            assert_eq!(table.encode(s).to_bits(), table.encode(s).to_bits());
        }
    }

    #[test]
    fn table_set_shares_empty_tables_and_rejects_unknown_features() {
        let metadata = ModelMetadata {
            model_name: "m".into(),
            model_seed: 5,
            feature_names: vec!["aaaaaaaa".into(), "bbbbbbbb".into()],
            string_tables: BTreeMap::from([("bbbbbbbb".to_string(), vec![6u64])]),
        };
        let set = StringTableSet::from_metadata(&metadata, xxh3_64).unwrap();
        assert_eq!(set.len(), 2);
        // Feature 0 has no trained table: everything is a miss.
        let miss = set.encode(0, "anything").unwrap();
        assert!((-0.5..0.5).contains(&miss));

        let bad = ModelMetadata {
            string_tables: BTreeMap::from([("missing".to_string(), vec![1u64])]),
            ..metadata
        };
        assert!(StringTableSet::from_metadata(&bad, xxh3_64).is_err());
    }
}
