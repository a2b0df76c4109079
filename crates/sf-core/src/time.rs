//! Millisecond timestamps in SubRip notation (`HH:MM:SS,mmm`).

use serde::{Deserialize, Serialize};
use std::fmt;

const MS_PER_SECOND: u64 = 1_000;
const MS_PER_MINUTE: u64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;

/// Point on the subtitle timeline, in milliseconds from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    pub fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    pub fn saturating_add(self, ms: u64) -> Self {
        Self(self.0.saturating_add(ms))
    }

    pub fn saturating_sub(self, ms: u64) -> Self {
        Self(self.0.saturating_sub(ms))
    }

    /// Milliseconds from `earlier` to `self`, zero if `earlier` is later.
    pub fn since(self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    /// Parse `HH:MM:SS,mmm`. A `.` is accepted in place of the comma and
    /// the fraction may have one to three digits (`00:00:01,5` is 1500 ms).
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (clock, frac) = s.split_once([',', '.'])?;
        let mut parts = clock.split(':');
        let h: u64 = parts.next()?.trim().parse().ok()?;
        let m: u64 = parts.next()?.parse().ok()?;
        let sec: u64 = parts.next()?.parse().ok()?;
        if parts.next().is_some() || m >= 60 || sec >= 60 {
            return None;
        }
        if frac.is_empty() || frac.len() > 3 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let ms: u64 = frac.parse().ok()?;
        let ms = ms * 10u64.pow(3 - frac.len() as u32);
        // Hours too large for the millisecond range are unreadable, not wrapped.
        let total = h
            .checked_mul(MS_PER_HOUR)?
            .checked_add(m * MS_PER_MINUTE + sec * MS_PER_SECOND + ms)?;
        Some(Self(total))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = self.0 / MS_PER_HOUR;
        let m = (self.0 % MS_PER_HOUR) / MS_PER_MINUTE;
        let s = (self.0 % MS_PER_MINUTE) / MS_PER_SECOND;
        let ms = self.0 % MS_PER_SECOND;
        write!(f, "{:02}:{:02}:{:02},{:03}", h, m, s, ms)
    }
}
