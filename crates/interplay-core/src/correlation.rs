//! Correlation ids: `prefix-timestamp-sequence`.
//!
//! The sequence is per generator and strictly increasing, so two ids from the
//! same generator never collide even within one millisecond.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug)]
pub struct CorrelationIdGenerator {
    prefix: String,
    sequence: AtomicU64,
}

impl CorrelationIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix: String = prefix.into();
        let prefix = if prefix.trim().is_empty() {
            "rpc".to_string()
        } else {
            prefix.trim().replace('-', "_")
        };
        Self {
            prefix,
            sequence: AtomicU64::new(1),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn next_id(&self) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let ts = chrono::Utc::now().timestamp_millis();
        format!("{}-{}-{}", self.prefix, ts, seq)
    }
}

/// Parsed parts of a correlation id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationParts {
    pub prefix: String,
    pub timestamp_ms: i64,
    pub sequence: u64,
}

/// Split an id produced by [`CorrelationIdGenerator`]. Ids from other peers
/// are opaque; `None` just means the id is not in our format.
pub fn parse_correlation_id(id: &str) -> Option<CorrelationParts> {
    let mut parts = id.rsplitn(3, '-');
    let sequence = parts.next()?.parse().ok()?;
    let timestamp_ms = parts.next()?.parse().ok()?;
    let prefix = parts.next()?.to_string();
    if prefix.is_empty() {
        return None;
    }
    Some(CorrelationParts {
        prefix,
        timestamp_ms,
        sequence,
    })
}
