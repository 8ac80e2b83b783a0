//! Sandboxed-side RPC bridge.
//!
//! Calls return immediately. Notifications are posted and forgotten; requests
//! register a pending entry and hand back a [`PendingReply`] that resolves
//! exactly once with `(result, error)`: on the correlated reply, on deadline
//! expiry, or when the bridge closes.

use crate::error::{BridgeError, Result};
use crate::pending::{PendingCalls, ResolveOutcome};
use crate::subscription::{PushHandler, SubscriptionSlot, SubscriptionState};
use crate::transport::Transport;
use interplay_core::config::BridgeConfig;
use interplay_core::correlation::CorrelationIdGenerator;
use interplay_core::envelope::{payload_from, Envelope, MessageType, RpcReply};
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

const BRIDGE_CLOSED: &str = "Bridge closed before a reply arrived";

/// What happened to one inbound envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundDisposition {
    /// Reply matched a pending call.
    Resolved,
    /// Subscription ack moved Pending → Active.
    Acknowledged,
    /// Subscription push reached the handler.
    Delivered,
    Dropped(DropReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    UnknownCorrelation,
    ReplyTypeMismatch,
    /// Push or ack for an id that is not the current subscription.
    StaleSubscription,
    /// Not a reply and not a subscription message.
    Unroutable,
}

struct BridgeState {
    pending: PendingCalls,
    subscription: SubscriptionSlot,
    closed: bool,
}

pub struct Bridge {
    transport: Arc<dyn Transport>,
    ids: CorrelationIdGenerator,
    config: BridgeConfig,
    state: Mutex<BridgeState>,
}

/// Receiving end of one request/response call.
pub struct PendingReply {
    correlation_id: String,
    rx: Option<oneshot::Receiver<RpcReply>>,
}

impl PendingReply {
    fn new(correlation_id: String, rx: oneshot::Receiver<RpcReply>) -> Self {
        Self {
            correlation_id,
            rx: Some(rx),
        }
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Wait for the reply. Never hangs past the call deadline as long as
    /// something sweeps the bridge ([`spawn_expiry_sweeper`] or inbound traffic).
    pub async fn wait(mut self) -> RpcReply {
        match self.rx.take() {
            Some(rx) => rx.await.unwrap_or_else(|_| RpcReply::error(BRIDGE_CLOSED)),
            None => RpcReply::error("Reply already taken"),
        }
    }

    /// Non-blocking poll. Yields `Some` once; later calls return `None`.
    pub fn try_reply(&mut self) -> Option<RpcReply> {
        let rx = self.rx.as_mut()?;
        let reply = match rx.try_recv() {
            Ok(reply) => reply,
            Err(oneshot::error::TryRecvError::Empty) => return None,
            Err(oneshot::error::TryRecvError::Closed) => RpcReply::error(BRIDGE_CLOSED),
        };
        self.rx = None;
        Some(reply)
    }
}

impl Bridge {
    pub fn new(transport: Arc<dyn Transport>, config: BridgeConfig) -> Self {
        let ids = CorrelationIdGenerator::new(config.correlation_prefix.clone());
        Self {
            transport,
            ids,
            config,
            state: Mutex::new(BridgeState {
                pending: PendingCalls::new(),
                subscription: SubscriptionSlot::default(),
                closed: false,
            }),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    fn state(&self) -> MutexGuard<'_, BridgeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ─── Core send path ─────────────────────────────────────────────────────

    /// Fire-and-forget message.
    pub fn notify(&self, kind: MessageType, payload: Map<String, Value>) -> Result<()> {
        if self.state().closed {
            return Err(BridgeError::Closed);
        }
        let envelope = Envelope::new(kind, self.ids.next_id(), payload);
        tracing::debug!(transport = self.transport.name(), %kind, "notify");
        self.transport.post(envelope)?;
        Ok(())
    }

    pub fn request(&self, kind: MessageType, payload: Map<String, Value>) -> PendingReply {
        self.request_with_timeout(kind, payload, self.config.call_timeout)
    }

    pub fn request_with_timeout(
        &self,
        kind: MessageType,
        payload: Map<String, Value>,
        timeout: Duration,
    ) -> PendingReply {
        let id = self.ids.next_id();
        let (tx, rx) = oneshot::channel();
        {
            let mut state = self.state();
            if state.closed {
                let _ = tx.send(RpcReply::error(BRIDGE_CLOSED));
                return PendingReply::new(id, rx);
            }
            state.pending.expire(Instant::now());
            // Registered before posting: an in-process peer may reply synchronously.
            state.pending.insert(id.clone(), kind, timeout, tx);
        }

        let envelope = Envelope::new(kind, id.clone(), payload);
        tracing::debug!(transport = self.transport.name(), %kind, correlation_id = %id, "request");
        if let Err(e) = self.transport.post(envelope) {
            tracing::debug!(correlation_id = %id, "request not sent: {}", e);
            self.state()
                .pending
                .resolve(&id, None, RpcReply::error(format!("Transport error: {}", e)));
        }
        PendingReply::new(id, rx)
    }

    // ─── Inbound ────────────────────────────────────────────────────────────

    /// Route one envelope arriving from the host. Malformed or unroutable
    /// envelopes are dropped with a debug log.
    pub fn dispatch_inbound(&self, envelope: Envelope) -> InboundDisposition {
        let disposition = self.route_inbound(envelope);
        if let InboundDisposition::Dropped(reason) = &disposition {
            tracing::debug!(?reason, "inbound envelope dropped");
        }
        disposition
    }

    fn route_inbound(&self, envelope: Envelope) -> InboundDisposition {
        if envelope.kind() == Some(MessageType::SubscriptionPush) {
            return self.deliver_push(&envelope);
        }
        if envelope.replied_kind() == Some(MessageType::Subscribe) {
            return self.acknowledge_subscription(&envelope);
        }
        if !envelope.is_reply() {
            return InboundDisposition::Dropped(DropReason::Unroutable);
        }

        let reply = RpcReply::from_payload(&envelope.payload);
        let mut state = self.state();
        state.pending.expire(Instant::now());
        match envelope.replied_kind() {
            Some(kind) => match state.pending.resolve(&envelope.correlation_id, Some(kind), reply) {
                ResolveOutcome::Resolved => InboundDisposition::Resolved,
                ResolveOutcome::UnknownCorrelation => {
                    InboundDisposition::Dropped(DropReason::UnknownCorrelation)
                }
                ResolveOutcome::KindMismatch => {
                    InboundDisposition::Dropped(DropReason::ReplyTypeMismatch)
                }
            },
            None => InboundDisposition::Dropped(DropReason::Unroutable),
        }
    }

    fn acknowledge_subscription(&self, envelope: &Envelope) -> InboundDisposition {
        let id = envelope
            .payload
            .get("result")
            .and_then(|r| r.get("subscriptionId"))
            .and_then(|v| v.as_str())
            .unwrap_or(&envelope.correlation_id);
        let rejected = envelope
            .payload
            .get("error")
            .is_some_and(|e| !e.is_null());

        let mut state = self.state();
        if rejected {
            if state.subscription.state == SubscriptionState::Pending(id.to_string()) {
                tracing::warn!(subscription_id = id, "host rejected subscription");
                state.subscription.tear_down();
                return InboundDisposition::Acknowledged;
            }
            return InboundDisposition::Dropped(DropReason::StaleSubscription);
        }
        if state.subscription.acknowledge(id) {
            InboundDisposition::Acknowledged
        } else {
            InboundDisposition::Dropped(DropReason::StaleSubscription)
        }
    }

    fn deliver_push(&self, envelope: &Envelope) -> InboundDisposition {
        let Some(id) = envelope.payload_str("subscriptionId") else {
            return InboundDisposition::Dropped(DropReason::Unroutable);
        };
        let data = envelope.payload.get("data").cloned().unwrap_or(Value::Null);
        let cell = self.state().subscription.handler_for(id);
        // Handler runs outside the state lock so it may call back into the bridge.
        match cell {
            Some(cell) if cell.deliver(data) => InboundDisposition::Delivered,
            _ => InboundDisposition::Dropped(DropReason::StaleSubscription),
        }
    }

    /// Resolve every call overdue at `now` with a timeout error.
    pub fn sweep_expired(&self, now: Instant) -> usize {
        let expired = self.state().pending.expire(now);
        if !expired.is_empty() {
            tracing::debug!(count = expired.len(), "expired pending calls");
        }
        expired.len()
    }

    pub fn pending_len(&self) -> usize {
        self.state().pending.len()
    }

    // ─── Subscription ───────────────────────────────────────────────────────

    /// Open the single subscription. Rejected while another one is pending or
    /// active; allowed again after `unsubscribe`. Returns the subscription id.
    pub fn subscribe<F>(&self, topic: Option<&str>, handler: F) -> Result<String>
    where
        F: FnMut(Value) + Send + 'static,
    {
        let id = self.ids.next_id();
        let previous = {
            let mut state = self.state();
            if state.closed {
                return Err(BridgeError::Closed);
            }
            let current = &state.subscription.state;
            if current.is_live() {
                return Err(BridgeError::SubscriptionBusy {
                    state: current.label(),
                    subscription_id: current.subscription_id().unwrap_or_default().to_string(),
                });
            }
            let previous = current.clone();
            let handler: PushHandler = Box::new(handler);
            state
                .subscription
                .begin(id.clone(), topic.map(str::to_string), handler);
            previous
        };

        let mut payload = Map::new();
        payload.insert("subscriptionId".to_string(), json!(id));
        if let Some(topic) = topic {
            payload.insert("topic".to_string(), json!(topic));
        }
        if let Err(e) = self
            .transport
            .post(Envelope::new(MessageType::Subscribe, id.clone(), payload))
        {
            self.state().subscription.abandon(previous);
            return Err(e.into());
        }
        tracing::debug!(subscription_id = %id, "subscribe sent");
        Ok(id)
    }

    /// Tear down the current subscription. The handler is deregistered before
    /// the `unsubscribe` notification is sent.
    pub fn unsubscribe(&self) -> Result<()> {
        let id = self
            .state()
            .subscription
            .tear_down()
            .ok_or(BridgeError::NoSubscription)?;
        let mut payload = Map::new();
        payload.insert("subscriptionId".to_string(), json!(id));
        self.transport
            .post(Envelope::new(MessageType::Unsubscribe, self.ids.next_id(), payload))?;
        Ok(())
    }

    pub fn subscription_state(&self) -> SubscriptionState {
        self.state().subscription.state.clone()
    }

    pub fn subscription_topic(&self) -> Option<String> {
        self.state().subscription.topic.clone()
    }

    // ─── Teardown ───────────────────────────────────────────────────────────

    /// Resolve every pending call with an error and tear down the subscription.
    /// Idempotent.
    pub fn close(&self) {
        let (failed, torn_down) = {
            let mut state = self.state();
            if state.closed {
                return;
            }
            state.closed = true;
            (
                state.pending.fail_all(BRIDGE_CLOSED),
                state.subscription.tear_down(),
            )
        };
        if let Some(id) = torn_down {
            let mut payload = Map::new();
            payload.insert("subscriptionId".to_string(), json!(id));
            if let Err(e) = self
                .transport
                .post(Envelope::new(MessageType::Unsubscribe, self.ids.next_id(), payload))
            {
                tracing::debug!("unsubscribe on close not sent: {}", e);
            }
        }
        tracing::debug!(failed, "bridge closed");
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    // ─── Capability surface: notifications ──────────────────────────────────

    pub fn emit_event(&self, name: &str, data: Value) -> Result<()> {
        self.notify(
            MessageType::EmitEvent,
            payload_from(json!({ "name": name, "data": data })),
        )
    }

    pub fn update_state(&self, state: Value) -> Result<()> {
        self.notify(MessageType::UpdateState, payload_from(json!({ "state": state })))
    }

    pub fn ready(&self) -> Result<()> {
        self.notify(MessageType::Ready, Map::new())
    }

    pub fn minimize_chat(&self) -> Result<()> {
        self.notify(MessageType::MinimizeChat, Map::new())
    }

    pub fn show_chat(&self) -> Result<()> {
        self.notify(MessageType::ShowChat, Map::new())
    }

    pub fn enter_fullscreen(&self) -> Result<()> {
        self.notify(MessageType::EnterFullscreen, Map::new())
    }

    pub fn exit_fullscreen(&self) -> Result<()> {
        self.notify(MessageType::ExitFullscreen, Map::new())
    }

    pub fn show_script(&self, script: Value) -> Result<()> {
        self.notify(MessageType::ShowScript, payload_from(json!({ "script": script })))
    }

    pub fn hide_snack(&self) -> Result<()> {
        self.notify(MessageType::HideSnack, Map::new())
    }

    // ─── Capability surface: request/response ──────────────────────────────

    pub fn get_state(&self) -> PendingReply {
        self.request(MessageType::GetState, Map::new())
    }

    pub fn save_instance_data(&self, data: Value) -> PendingReply {
        self.request(
            MessageType::SaveInstanceData,
            payload_from(json!({ "data": data })),
        )
    }

    pub fn query_instance_data(&self, query: Value) -> PendingReply {
        self.request(
            MessageType::QueryInstanceData,
            payload_from(json!({ "query": query })),
        )
    }

    pub fn save_progress(&self, progress: Value) -> PendingReply {
        self.request(
            MessageType::SaveProgress,
            payload_from(json!({ "progress": progress })),
        )
    }

    pub fn query_progress(&self) -> PendingReply {
        self.request(MessageType::QueryProgress, Map::new())
    }

    pub fn mark_complete(&self) -> PendingReply {
        self.request(MessageType::MarkComplete, Map::new())
    }

    pub fn increment_progress(&self, amount: f64) -> PendingReply {
        self.request(
            MessageType::IncrementProgress,
            payload_from(json!({ "amount": amount })),
        )
    }

    pub fn fetch_public_profile(&self, user_id: Option<&str>) -> PendingReply {
        let mut payload = Map::new();
        if let Some(user_id) = user_id {
            payload.insert("userId".to_string(), json!(user_id));
        }
        self.request(MessageType::FetchPublicProfile, payload)
    }

    pub fn post_to_chat(&self, message: &str) -> PendingReply {
        self.request(
            MessageType::PostToChat,
            payload_from(json!({ "message": message })),
        )
    }

    /// `duration` is forwarded as `durationMs`; the host picks a default when absent.
    pub fn show_snack(&self, message: &str, duration: Option<Duration>) -> PendingReply {
        let mut payload = Map::new();
        payload.insert("message".to_string(), json!(message));
        if let Some(duration) = duration {
            payload.insert("durationMs".to_string(), json!(duration.as_millis() as u64));
        }
        self.request(MessageType::ShowSnack, payload)
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.close();
    }
}

/// Sweep `bridge` every `sweep_interval` of its config until it is closed
/// or dropped.
pub fn spawn_expiry_sweeper(bridge: &Arc<Bridge>) -> tokio::task::JoinHandle<()> {
    let interval = bridge.config().sweep_interval.max(Duration::from_millis(1));
    let weak: Weak<Bridge> = Arc::downgrade(bridge);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let Some(bridge) = weak.upgrade() else {
                break;
            };
            if bridge.is_closed() {
                break;
            }
            bridge.sweep_expired(Instant::now());
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ChannelTransport;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn bridge() -> (Bridge, UnboundedReceiver<Envelope>) {
        let (transport, rx) = ChannelTransport::channel("test");
        (Bridge::new(Arc::new(transport), BridgeConfig::default()), rx)
    }

    fn reply_to(env: &Envelope, reply: RpcReply) -> Envelope {
        env.reply(&reply)
    }

    #[tokio::test]
    async fn test_matching_reply_resolves_once() {
        let (bridge, mut rx) = bridge();
        let pending = bridge.get_state();
        let sent = rx.recv().await.unwrap();
        assert_eq!(sent.message_type, "get-state");
        assert_eq!(sent.correlation_id, pending.correlation_id());

        let response = reply_to(&sent, RpcReply::ok(json!({"score": 3})));
        assert_eq!(
            bridge.dispatch_inbound(response.clone()),
            InboundDisposition::Resolved
        );
        assert_eq!(
            bridge.dispatch_inbound(response),
            InboundDisposition::Dropped(DropReason::UnknownCorrelation)
        );

        let reply = pending.wait().await;
        assert_eq!(reply.result, Some(json!({"score": 3})));
        assert!(reply.error.is_none());
        assert_eq!(bridge.pending_len(), 0);
    }

    #[tokio::test]
    async fn test_result_and_error_both_surface() {
        let (bridge, mut rx) = bridge();
        let pending = bridge.save_progress(json!({"step": 2}));
        let sent = rx.recv().await.unwrap();
        assert_eq!(sent.payload["progress"], json!({"step": 2}));

        let mut partial = RpcReply::ok(json!({"saved": false}));
        partial.error = Some("quota exceeded".into());
        bridge.dispatch_inbound(reply_to(&sent, partial));

        let reply = pending.wait().await;
        assert_eq!(reply.result, Some(json!({"saved": false})));
        assert_eq!(reply.error.as_deref(), Some("quota exceeded"));
    }

    #[test]
    fn test_non_matching_reply_is_ignored() {
        let (bridge, mut rx) = bridge();
        let mut pending = bridge.query_progress();
        let sent = rx.try_recv().unwrap();

        let wrong_id = Envelope {
            correlation_id: "rpc-0-0".into(),
            ..reply_to(&sent, RpcReply::ok(json!(1)))
        };
        assert_eq!(
            bridge.dispatch_inbound(wrong_id),
            InboundDisposition::Dropped(DropReason::UnknownCorrelation)
        );
        let wrong_type = Envelope {
            message_type: "get-state-response".into(),
            ..reply_to(&sent, RpcReply::ok(json!(1)))
        };
        assert_eq!(
            bridge.dispatch_inbound(wrong_type),
            InboundDisposition::Dropped(DropReason::ReplyTypeMismatch)
        );
        assert!(pending.try_reply().is_none());
        assert_eq!(bridge.pending_len(), 1);
    }

    #[test]
    fn test_zero_replies_zero_resolutions_until_deadline() {
        let (transport, _rx) = ChannelTransport::channel("test");
        let bridge = Bridge::new(
            Arc::new(transport),
            BridgeConfig::default().with_call_timeout(Duration::from_millis(50)),
        );
        let mut pending = bridge.mark_complete();
        assert!(pending.try_reply().is_none());
        assert_eq!(bridge.sweep_expired(Instant::now()), 0);

        assert_eq!(bridge.sweep_expired(Instant::now() + Duration::from_secs(1)), 1);
        let reply = pending.try_reply().unwrap();
        assert!(reply.result.is_none());
        assert!(reply.error.unwrap().contains("timed out"));
        assert!(pending.try_reply().is_none());
        assert_eq!(bridge.pending_len(), 0);
    }

    #[tokio::test]
    async fn test_sweeper_times_out_unanswered_call() {
        let (transport, _rx) = ChannelTransport::channel("test");
        let bridge = Arc::new(Bridge::new(
            Arc::new(transport),
            BridgeConfig::default()
                .with_call_timeout(Duration::from_millis(20))
                .with_sweep_interval(Duration::from_millis(5)),
        ));
        assert_eq!(bridge.config().sweep_interval, Duration::from_millis(5));
        let sweeper = spawn_expiry_sweeper(&bridge);
        let reply = bridge.fetch_public_profile(Some("u-1")).wait().await;
        assert!(reply.error.unwrap().contains("fetch-public-profile"));
        bridge.close();
        sweeper.await.unwrap();
    }

    #[tokio::test]
    async fn test_close_resolves_pending_with_error() {
        let (bridge, _rx) = bridge();
        let pending = bridge.post_to_chat("hi");
        bridge.close();
        let reply = pending.wait().await;
        assert_eq!(reply.error.as_deref(), Some(BRIDGE_CLOSED));

        let after = bridge.get_state().wait().await;
        assert!(after.is_error());
        assert!(matches!(bridge.ready(), Err(BridgeError::Closed)));
    }

    #[tokio::test]
    async fn test_transport_failure_resolves_immediately() {
        let (bridge, rx) = bridge();
        drop(rx);
        let reply = bridge.increment_progress(1.0).wait().await;
        assert!(reply.error.unwrap().starts_with("Transport error"));
        assert_eq!(bridge.pending_len(), 0);
    }

    #[test]
    fn test_show_snack_forwards_duration() {
        let (bridge, mut rx) = bridge();
        let _with = bridge.show_snack("saved", Some(Duration::from_secs(3)));
        let _without = bridge.show_snack("saved", None);
        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert_eq!(first.payload["durationMs"], json!(3000));
        assert!(second.payload.get("durationMs").is_none());
    }

    #[test]
    fn test_notifications_register_nothing() {
        let (bridge, mut rx) = bridge();
        bridge.emit_event("answered", json!({"correct": true})).unwrap();
        bridge.update_state(json!({"page": 2})).unwrap();
        bridge.hide_snack().unwrap();
        assert_eq!(bridge.pending_len(), 0);
        let first = rx.try_recv().unwrap();
        assert_eq!(first.message_type, "emit-event");
        assert_eq!(first.payload["name"], "answered");
    }

    #[test]
    fn test_second_subscribe_rejected_until_torn_down() {
        let (bridge, mut rx) = bridge();
        let id = bridge.subscribe(Some("chat"), |_| {}).unwrap();
        let sent = rx.try_recv().unwrap();
        assert_eq!(sent.message_type, "subscribe");
        assert_eq!(sent.payload["subscriptionId"], json!(id));
        assert_eq!(sent.payload["topic"], "chat");

        let err = bridge.subscribe(None, |_| {}).unwrap_err();
        assert!(matches!(err, BridgeError::SubscriptionBusy { state: "pending", .. }));
        assert_eq!(bridge.subscription_state(), SubscriptionState::Pending(id.clone()));

        bridge.unsubscribe().unwrap();
        let unsub = rx.try_recv().unwrap();
        assert_eq!(unsub.message_type, "unsubscribe");
        assert_eq!(bridge.subscription_state(), SubscriptionState::TornDown(id));

        assert!(bridge.subscribe(None, |_| {}).is_ok());
    }

    #[test]
    fn test_push_flow_and_no_push_after_unsubscribe() {
        let (bridge, mut rx) = bridge();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let id = bridge
            .subscribe(None, move |v| sink.lock().unwrap().push(v))
            .unwrap();
        let sub = rx.try_recv().unwrap();

        let push = |n: i64| {
            Envelope::new(
                MessageType::SubscriptionPush,
                "host-1",
                payload_from(json!({"subscriptionId": id, "data": n})),
            )
        };

        // Before the ack, pushes are dropped.
        assert_eq!(
            bridge.dispatch_inbound(push(0)),
            InboundDisposition::Dropped(DropReason::StaleSubscription)
        );

        let ack = sub.reply(&RpcReply::ok(json!({"subscriptionId": id})));
        assert_eq!(bridge.dispatch_inbound(ack), InboundDisposition::Acknowledged);
        assert_eq!(bridge.subscription_state(), SubscriptionState::Active(id.clone()));

        for n in 1..=3 {
            assert_eq!(bridge.dispatch_inbound(push(n)), InboundDisposition::Delivered);
        }
        let other = Envelope::new(
            MessageType::SubscriptionPush,
            "host-2",
            payload_from(json!({"subscriptionId": "someone-else", "data": 99})),
        );
        assert!(matches!(
            bridge.dispatch_inbound(other),
            InboundDisposition::Dropped(_)
        ));

        bridge.unsubscribe().unwrap();
        assert!(matches!(
            bridge.dispatch_inbound(push(4)),
            InboundDisposition::Dropped(_)
        ));
        assert_eq!(*seen.lock().unwrap(), vec![json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn test_rejected_subscription_is_torn_down() {
        let (bridge, mut rx) = bridge();
        let id = bridge.subscribe(None, |_| {}).unwrap();
        let sub = rx.try_recv().unwrap();
        bridge.dispatch_inbound(sub.reply(&RpcReply::error("not allowed")));
        assert_eq!(bridge.subscription_state(), SubscriptionState::TornDown(id));
    }

    #[test]
    fn test_unroutable_envelope_dropped() {
        let (bridge, _rx) = bridge();
        let env = Envelope::new(MessageType::Ready, "x", Map::new());
        assert_eq!(
            bridge.dispatch_inbound(env),
            InboundDisposition::Dropped(DropReason::Unroutable)
        );
        assert!(matches!(bridge.unsubscribe(), Err(BridgeError::NoSubscription)));
    }
}
