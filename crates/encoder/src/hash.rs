//! Seeded 64-bit hashing.
//!
//! The encoder takes the hash function as a constructor argument so tests can
//! inject engineered hashes; production models use xxh3, the scheme all SDK
//! implementations share.

/// A seeded 64-bit hash over raw bytes.
pub type Hash64 = fn(&[u8], u64) -> u64;

/// xxh3 with an explicit seed, the default [`Hash64`].
pub fn xxh3_64(bytes: &[u8], seed: u64) -> u64 {
    xxhash_rust::xxh3::xxh3_64_with_seed(bytes, seed)
}
