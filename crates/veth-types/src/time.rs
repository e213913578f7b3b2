//! Day-bucket arithmetic.
//!
//! Drip cadence is tied to calendar days: a timestamp belongs to the bucket
//! `floor(ts / DAY_SECONDS) * DAY_SECONDS`, not to a rolling 24h window.

use crate::Timestamp;

/// Seconds per day bucket.
pub const DAY_SECONDS: u64 = 86_400;

/// Truncate a timestamp to the start of its day bucket.
pub fn day_floor(ts: Timestamp) -> Timestamp {
    ts / DAY_SECONDS * DAY_SECONDS
}

/// Index of the day bucket containing `ts`.
pub fn day_index(ts: Timestamp) -> u64 {
    ts / DAY_SECONDS
}
