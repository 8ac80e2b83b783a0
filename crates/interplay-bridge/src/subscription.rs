//! Single long-lived subscription owned by a [`crate::Bridge`].

use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Handler invoked once per delivered push, in emission order.
pub type PushHandler = Box<dyn FnMut(Value) + Send>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionState {
    Uninitialized,
    /// `subscribe` sent, ack not yet received.
    Pending(String),
    /// Ack received; pushes with this id reach the handler.
    Active(String),
    /// `unsubscribe` sent; handler dropped.
    TornDown(String),
}

impl SubscriptionState {
    pub fn label(&self) -> &'static str {
        match self {
            SubscriptionState::Uninitialized => "uninitialized",
            SubscriptionState::Pending(_) => "pending",
            SubscriptionState::Active(_) => "active",
            SubscriptionState::TornDown(_) => "torn down",
        }
    }

    pub fn subscription_id(&self) -> Option<&str> {
        match self {
            SubscriptionState::Uninitialized => None,
            SubscriptionState::Pending(id)
            | SubscriptionState::Active(id)
            | SubscriptionState::TornDown(id) => Some(id),
        }
    }

    /// Pending or Active: a new subscribe must be rejected.
    pub fn is_live(&self) -> bool {
        matches!(
            self,
            SubscriptionState::Pending(_) | SubscriptionState::Active(_)
        )
    }
}

/// Handler plus a liveness flag cleared on teardown. A push checks the flag
/// under the handler lock, so once teardown returns no later push runs the
/// handler. Clearing the flag never takes the handler lock, which keeps
/// `unsubscribe` callable from inside the handler.
pub(crate) struct HandlerCell {
    live: AtomicBool,
    handler: Mutex<PushHandler>,
}

impl HandlerCell {
    pub(crate) fn new(handler: PushHandler) -> Arc<Self> {
        Arc::new(Self {
            live: AtomicBool::new(true),
            handler: Mutex::new(handler),
        })
    }

    pub(crate) fn retire(&self) {
        self.live.store(false, Ordering::SeqCst);
    }

    /// Run the handler if still live. Returns whether it ran.
    pub(crate) fn deliver(&self, data: Value) -> bool {
        let mut handler = self.handler.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.live.load(Ordering::SeqCst) {
            return false;
        }
        let handler: &mut PushHandler = &mut handler;
        handler(data);
        true
    }
}

/// Subscription state plus the registered handler.
pub(crate) struct SubscriptionSlot {
    pub(crate) state: SubscriptionState,
    pub(crate) topic: Option<String>,
    handler: Option<Arc<HandlerCell>>,
}

impl Default for SubscriptionSlot {
    fn default() -> Self {
        Self {
            state: SubscriptionState::Uninitialized,
            topic: None,
            handler: None,
        }
    }
}

impl SubscriptionSlot {
    pub(crate) fn begin(&mut self, id: String, topic: Option<String>, handler: PushHandler) {
        self.retire_handler();
        self.state = SubscriptionState::Pending(id);
        self.topic = topic;
        self.handler = Some(HandlerCell::new(handler));
    }

    /// Pending(id) → Active(id). False if `id` is not the pending subscription.
    pub(crate) fn acknowledge(&mut self, id: &str) -> bool {
        match &self.state {
            SubscriptionState::Pending(pending) if pending == id => {
                self.state = SubscriptionState::Active(id.to_string());
                true
            }
            _ => false,
        }
    }

    /// Handler for a push with `id`, only while Active(id).
    pub(crate) fn handler_for(&self, id: &str) -> Option<Arc<HandlerCell>> {
        match &self.state {
            SubscriptionState::Active(active) if active == id => self.handler.clone(),
            _ => None,
        }
    }

    /// Move a live subscription to TornDown. Returns its id.
    pub(crate) fn tear_down(&mut self) -> Option<String> {
        if !self.state.is_live() {
            return None;
        }
        let id = self.state.subscription_id()?.to_string();
        self.retire_handler();
        self.state = SubscriptionState::TornDown(id.clone());
        Some(id)
    }

    /// Undo a `begin` whose subscribe message never left.
    pub(crate) fn abandon(&mut self, previous: SubscriptionState) {
        self.retire_handler();
        self.state = previous;
        self.topic = None;
    }

    fn retire_handler(&mut self) {
        if let Some(cell) = self.handler.take() {
            cell.retire();
        }
    }
}
