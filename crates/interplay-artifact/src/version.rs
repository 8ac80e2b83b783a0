//! Artifact version tokens: millisecond timestamps, bumped to stay strictly
//! increasing per clock.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(u64);

impl VersionToken {
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct VersionClock {
    last: AtomicU64,
}

impl VersionClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next token: `max(now_ms, last + 1)`.
    pub fn next(&self) -> VersionToken {
        let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
        self.next_at(now)
    }

    fn next_at(&self, now_ms: u64) -> VersionToken {
        let bump = |last: u64| now_ms.max(last.saturating_add(1));
        let previous = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(bump(last)))
            .unwrap_or_else(|last| last);
        VersionToken(bump(previous))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_strictly_increase_within_one_millisecond() {
        let clock = VersionClock::new();
        let a = clock.next_at(1_000);
        let b = clock.next_at(1_000);
        let c = clock.next_at(999);
        assert_eq!(a.as_millis(), 1_000);
        assert_eq!(b.as_millis(), 1_001);
        assert_eq!(c.as_millis(), 1_002);
    }

    #[test]
    fn test_wall_clock_tokens_increase() {
        let clock = VersionClock::new();
        let tokens: Vec<VersionToken> = (0..100).map(|_| clock.next()).collect();
        assert!(tokens.windows(2).all(|w| w[0] < w[1]));
        assert!(tokens[0].as_millis() > 1_600_000_000_000);
    }
}
