//! Timestamp source for the `timestamp` column.

use chrono::{SecondsFormat, Utc};

pub trait Clock: Send {
    /// Marker written into a row whenever it is added, renamed, or gets an address.
    fn timestamp(&self) -> String;
}

/// Wall clock rendered as UTC RFC 3339 with second precision.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn timestamp(&self) -> String {
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// Clock that always returns the same marker; keeps replays and tests deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedClock(String);

impl FixedClock {
    pub fn new(marker: impl Into<String>) -> Self {
        Self(marker.into())
    }
}

impl Clock for FixedClock {
    fn timestamp(&self) -> String {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_renders_utc_seconds() {
        let stamp = SystemClock.timestamp();
        assert!(stamp.ends_with('Z'), "expected UTC marker in {stamp}");
        assert_eq!(stamp.len(), "2026-01-01T00:00:00Z".len());
    }

    #[test]
    fn fixed_clock_repeats_marker() {
        let clock = FixedClock::new("t1");
        assert_eq!(clock.timestamp(), "t1");
        assert_eq!(clock.timestamp(), "t1");
    }
}
