//! Host side of the boundary: answer requests, acknowledge subscriptions,
//! push subscription data.

use crate::error::{BridgeError, Result};
use crate::transport::Transport;
use interplay_core::correlation::CorrelationIdGenerator;
use interplay_core::envelope::{Envelope, MessageType, RpcReply};
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::Arc;

/// Privileged capabilities the host exposes to the sandbox.
///
/// `handle_request` is called for every type with [`MessageType::expects_reply`];
/// `handle_notification` for the fire-and-forget types.
pub trait HostCapabilities: Send {
    fn handle_request(&mut self, kind: MessageType, payload: &Map<String, Value>) -> RpcReply;

    fn handle_notification(&mut self, kind: MessageType, payload: &Map<String, Value>);

    /// Accept or refuse a subscription. Default: accept everything.
    fn accept_subscription(&mut self, _subscription_id: &str, _topic: Option<&str>) -> bool {
        true
    }

    fn end_subscription(&mut self, _subscription_id: &str) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    Replied,
    Notified,
    Subscribed,
    SubscriptionRefused,
    Unsubscribed,
    /// Unknown type, a stray reply, or a message the host does not route.
    Dropped,
}

pub struct HostRouter<H: HostCapabilities> {
    host: H,
    transport: Arc<dyn Transport>,
    subscriptions: HashSet<String>,
    push_ids: CorrelationIdGenerator,
}

impl<H: HostCapabilities> HostRouter<H> {
    pub fn new(host: H, transport: Arc<dyn Transport>) -> Self {
        Self {
            host,
            transport,
            subscriptions: HashSet::new(),
            push_ids: CorrelationIdGenerator::new("push"),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn active_subscriptions(&self) -> impl Iterator<Item = &str> {
        self.subscriptions.iter().map(String::as_str)
    }

    /// Route one envelope from the sandbox.
    pub fn handle(&mut self, envelope: Envelope) -> Result<RouteOutcome> {
        let Some(kind) = envelope.kind() else {
            tracing::debug!(message_type = %envelope.message_type, "dropping unknown message type");
            return Ok(RouteOutcome::Dropped);
        };

        match kind {
            MessageType::Subscribe => self.open_subscription(&envelope),
            MessageType::Unsubscribe => {
                if let Some(id) = envelope.payload_str("subscriptionId") {
                    if self.subscriptions.remove(id) {
                        self.host.end_subscription(id);
                    }
                }
                Ok(RouteOutcome::Unsubscribed)
            }
            MessageType::SubscriptionPush => {
                tracing::debug!("dropping push sent toward the host");
                Ok(RouteOutcome::Dropped)
            }
            kind if kind.expects_reply() => {
                let reply = self.host.handle_request(kind, &envelope.payload);
                self.transport.post(envelope.reply(&reply))?;
                Ok(RouteOutcome::Replied)
            }
            kind => {
                self.host.handle_notification(kind, &envelope.payload);
                Ok(RouteOutcome::Notified)
            }
        }
    }

    fn open_subscription(&mut self, envelope: &Envelope) -> Result<RouteOutcome> {
        let id = envelope
            .payload_str("subscriptionId")
            .unwrap_or(&envelope.correlation_id)
            .to_string();
        let topic = envelope.payload_str("topic");
        if !self.host.accept_subscription(&id, topic) {
            self.transport
                .post(envelope.reply(&RpcReply::error("Subscription refused")))?;
            return Ok(RouteOutcome::SubscriptionRefused);
        }
        self.subscriptions.insert(id.clone());
        self.transport
            .post(envelope.reply(&RpcReply::ok(json!({ "subscriptionId": id }))))?;
        Ok(RouteOutcome::Subscribed)
    }

    /// Push `data` to an open subscription.
    pub fn push(&self, subscription_id: &str, data: Value) -> Result<()> {
        if !self.subscriptions.contains(subscription_id) {
            return Err(BridgeError::NoSubscription);
        }
        let mut payload = Map::new();
        payload.insert("subscriptionId".to_string(), json!(subscription_id));
        payload.insert("data".to_string(), data);
        self.transport.post(Envelope::new(
            MessageType::SubscriptionPush,
            self.push_ids.next_id(),
            payload,
        ))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{Bridge, InboundDisposition};
    use crate::preview_host::PreviewHost;
    use crate::transport::ChannelTransport;
    use interplay_core::config::BridgeConfig;
    use std::sync::Mutex;

    /// Bridge and router wired back to back over in-process channels.
    fn wired() -> (
        Bridge,
        HostRouter<PreviewHost>,
        tokio::sync::mpsc::UnboundedReceiver<Envelope>,
        tokio::sync::mpsc::UnboundedReceiver<Envelope>,
    ) {
        let (to_host, host_inbox) = ChannelTransport::channel("sandbox->host");
        let (to_sandbox, sandbox_inbox) = ChannelTransport::channel("host->sandbox");
        let bridge = Bridge::new(Arc::new(to_host), BridgeConfig::default());
        let router = HostRouter::new(PreviewHost::new(), Arc::new(to_sandbox));
        (bridge, router, host_inbox, sandbox_inbox)
    }

    #[tokio::test]
    async fn test_round_trip_state() {
        let (bridge, mut router, mut host_inbox, mut sandbox_inbox) = wired();

        bridge.update_state(json!({"answered": 2})).unwrap();
        let pending = bridge.get_state();

        while let Ok(env) = host_inbox.try_recv() {
            router.handle(env).unwrap();
        }
        while let Ok(env) = sandbox_inbox.try_recv() {
            assert_eq!(bridge.dispatch_inbound(env), InboundDisposition::Resolved);
        }

        let reply = pending.wait().await;
        assert_eq!(reply.result, Some(json!({"answered": 2})));
    }

    #[tokio::test]
    async fn test_subscription_round_trip() {
        let (bridge, mut router, mut host_inbox, mut sandbox_inbox) = wired();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let id = bridge
            .subscribe(Some("chat"), move |v| sink.lock().unwrap().push(v))
            .unwrap();

        let outcome = router.handle(host_inbox.try_recv().unwrap()).unwrap();
        assert_eq!(outcome, RouteOutcome::Subscribed);
        bridge.dispatch_inbound(sandbox_inbox.try_recv().unwrap());

        router.push(&id, json!("first")).unwrap();
        router.push(&id, json!("second")).unwrap();
        while let Ok(env) = sandbox_inbox.try_recv() {
            bridge.dispatch_inbound(env);
        }
        assert_eq!(*seen.lock().unwrap(), vec![json!("first"), json!("second")]);

        bridge.unsubscribe().unwrap();
        assert_eq!(
            router.handle(host_inbox.try_recv().unwrap()).unwrap(),
            RouteOutcome::Unsubscribed
        );
        assert!(matches!(
            router.push(&id, json!("late")),
            Err(BridgeError::NoSubscription)
        ));
    }

    #[test]
    fn test_unknown_and_reply_types_dropped() {
        let (_bridge, mut router, _h, mut sandbox_inbox) = wired();
        let unknown = Envelope {
            message_type: "launch-rockets".into(),
            correlation_id: "x".into(),
            payload: Map::new(),
        };
        assert_eq!(router.handle(unknown).unwrap(), RouteOutcome::Dropped);

        let stray = Envelope {
            message_type: "get-state-response".into(),
            correlation_id: "x".into(),
            payload: Map::new(),
        };
        assert_eq!(router.handle(stray).unwrap(), RouteOutcome::Dropped);
        assert!(sandbox_inbox.try_recv().is_err());
    }
}
