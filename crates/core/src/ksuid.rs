//! K-sortable unique ids for tracked decisions and rewards.
//!
//! A KSUID is 160 bits: a 32-bit seconds-since-custom-epoch timestamp
//! followed by a 128-bit random payload, base62 encoded to exactly 27
//! characters. Ids sort lexicographically by creation time, which is why
//! they are used for `message_id` and `decision_id` on the wire.

use chrono::Utc;
use rand::RngCore;

/// Custom epoch (2014-05-13T16:53:20Z), shared across SDK implementations.
pub const KSUID_EPOCH: i64 = 1_400_000_000;

pub const KSUID_STRING_LENGTH: usize = 27;

const PAYLOAD_BYTES: usize = 16;
const TIMESTAMP_BYTES: usize = 4;
const TOTAL_BYTES: usize = TIMESTAMP_BYTES + PAYLOAD_BYTES;

const BASE62: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, Copy, Default)]
pub struct KsuidGenerator;

impl KsuidGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generates a fresh id for the current wall-clock second.
    pub fn next(&self) -> String {
        let mut payload = [0u8; PAYLOAD_BYTES];
        rand::thread_rng().fill_bytes(&mut payload);
        let seconds = Utc::now().timestamp().saturating_sub(KSUID_EPOCH).max(0) as u32;
        Self::at(seconds, &payload)
    }

    /// Encodes an id from explicit parts. Used by `next` and by fixture
    /// tests; `seconds` counts from [`KSUID_EPOCH`].
    pub fn at(seconds: u32, payload: &[u8; PAYLOAD_BYTES]) -> String {
        let mut bytes = [0u8; TOTAL_BYTES];
        bytes[..TIMESTAMP_BYTES].copy_from_slice(&seconds.to_be_bytes());
        bytes[TIMESTAMP_BYTES..].copy_from_slice(payload);
        base62_encode(&bytes)
    }
}

/// Base62-encodes the 160-bit big-endian integer, left-padded with '0' to
/// [`KSUID_STRING_LENGTH`] characters (62^27 > 2^160, so 27 always fits).
fn base62_encode(bytes: &[u8; TOTAL_BYTES]) -> String {
    let mut digits = [b'0'; KSUID_STRING_LENGTH];
    let mut scratch = *bytes;
    for slot in digits.iter_mut().rev() {
        let mut remainder: u32 = 0;
        for byte in scratch.iter_mut() {
            let acc = (remainder << 8) | u32::from(*byte);
            *byte = (acc / 62) as u8;
            remainder = acc % 62;
        }
        *slot = BASE62[remainder as usize];
    }
    digits.iter().map(|&b| b as char).collect()
}
