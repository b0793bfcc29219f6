//! Commit timestamps and the clock that produces them.
//!
//! The engine never reasons about time: timestamps are recorded on commits
//! and shown in `log`, nothing more.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Point in time a commit was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// display format, in the local timezone
    pub const FORMAT: &'static str = "%Y-%m-%d %H:%M:%S";

    /// build a timestamp from unix seconds, falling back to the epoch when out of range
    pub fn from_unix(seconds: i64) -> Self {
        let at = Utc
            .timestamp_opt(seconds, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        Self(at)
    }

}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.with_timezone(&Local).format(Self::FORMAT))
    }
}

/// Source of commit timestamps.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp(Utc::now())
    }
}

/// Deterministic clock for tests and scripted sessions.
///
/// Starts at the given unix second and advances by one second per reading,
/// so consecutive commits get distinct, ordered timestamps.
#[derive(Debug)]
pub struct FixedClock {
    next: AtomicI64,
}

impl FixedClock {
    pub fn starting_at(unix_seconds: i64) -> Self {
        Self {
            next: AtomicI64::new(unix_seconds),
        }
    }
}

impl Default for FixedClock {
    fn default() -> Self {
        // 2024-01-01T00:00:00Z
        Self::starting_at(1_704_067_200)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_unix(self.next.fetch_add(1, Ordering::Relaxed))
    }
}
