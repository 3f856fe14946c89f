// Message Identity (ULID layout)
//
// 128 bits: 48-bit millisecond timestamp followed by 80 bits of randomness,
// rendered as 26 Crockford base32 characters. The textual form sorts the same
// way as the numeric value.

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Number of random bits following the timestamp
pub const RANDOM_BITS: u32 = Ulid::RAND_BITS as u32;
/// Largest value the random component can hold
pub const RANDOM_MAX: u128 = (1u128 << RANDOM_BITS) - 1;
/// Largest timestamp (ms) the layout can hold
pub const TIMESTAMP_MAX: u64 = (1u64 << Ulid::TIME_BITS) - 1;

/// Locally generated message identifier, used for correlation only
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Encode a timestamp and random component into a message id
    pub fn from_parts(timestamp_ms: u64, random: u128) -> Self {
        Self(Ulid::from_parts(timestamp_ms & TIMESTAMP_MAX, random & RANDOM_MAX).to_string())
    }

    /// Wrap an identifier received from elsewhere (e.g. a delivery envelope)
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Millisecond timestamp embedded in the id, if it is a well-formed ULID
    pub fn timestamp_ms(&self) -> Option<u64> {
        // A leading digit above 7 would overflow 128 bits
        if !matches!(self.0.bytes().next(), Some(b'0'..=b'7')) {
            return None;
        }
        Ulid::from_string(&self.0).ok().map(|ulid| ulid.timestamp_ms())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for MessageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
