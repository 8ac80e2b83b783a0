//! Owned map of outstanding request/response calls.
//!
//! Every entry carries a deadline. An entry leaves the map exactly once: when a
//! matching reply arrives, when it expires, or when the bridge closes. Whichever
//! happens first sends on the entry's oneshot; the others find nothing to do.

use interplay_core::envelope::{MessageType, RpcReply};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

struct PendingCall {
    kind: MessageType,
    deadline: Instant,
    timeout: Duration,
    tx: oneshot::Sender<RpcReply>,
}

/// How a reply was matched against the pending map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    Resolved,
    UnknownCorrelation,
    /// Id is outstanding but the reply type answers a different request.
    KindMismatch,
}

#[derive(Default)]
pub struct PendingCalls {
    calls: HashMap<String, PendingCall>,
}

impl PendingCalls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        correlation_id: String,
        kind: MessageType,
        timeout: Duration,
        tx: oneshot::Sender<RpcReply>,
    ) {
        let deadline = Instant::now() + timeout;
        self.calls.insert(
            correlation_id,
            PendingCall {
                kind,
                deadline,
                timeout,
                tx,
            },
        );
    }

    /// Resolve the call with `correlation_id` if `replied` names its request type.
    /// `replied == None` skips the type check.
    pub fn resolve(
        &mut self,
        correlation_id: &str,
        replied: Option<MessageType>,
        reply: RpcReply,
    ) -> ResolveOutcome {
        match self.calls.get(correlation_id) {
            None => return ResolveOutcome::UnknownCorrelation,
            Some(call) => {
                if let Some(kind) = replied {
                    if kind != call.kind {
                        return ResolveOutcome::KindMismatch;
                    }
                }
            }
        }
        if let Some(call) = self.calls.remove(correlation_id) {
            // Receiver may already be gone (caller stopped waiting); nothing to do.
            let _ = call.tx.send(reply);
        }
        ResolveOutcome::Resolved
    }

    /// Resolve every call whose deadline is at or before `now` with a timeout
    /// error. Returns the expired correlation ids.
    pub fn expire(&mut self, now: Instant) -> Vec<String> {
        let expired: Vec<String> = self
            .calls
            .iter()
            .filter(|(_, call)| call.deadline <= now)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &expired {
            if let Some(call) = self.calls.remove(id) {
                let _ = call.tx.send(RpcReply::error(timeout_message(call.kind, call.timeout)));
            }
        }
        expired
    }

    /// Resolve every outstanding call with `reason`.
    pub fn fail_all(&mut self, reason: &str) -> usize {
        let count = self.calls.len();
        for (_, call) in self.calls.drain() {
            let _ = call.tx.send(RpcReply::error(reason));
        }
        count
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.calls.values().map(|c| c.deadline).min()
    }

    pub fn contains(&self, correlation_id: &str) -> bool {
        self.calls.contains_key(correlation_id)
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

pub fn timeout_message(kind: MessageType, timeout: Duration) -> String {
    format!("Request timed out after {}ms: {}", timeout.as_millis(), kind)
}
