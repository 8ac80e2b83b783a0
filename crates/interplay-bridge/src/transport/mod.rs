//! Boundary transports.
//!
//! A transport only moves [`Envelope`]s one way; each side of the boundary owns
//! one transport for its outbound direction and feeds inbound envelopes to its
//! dispatcher ([`crate::Bridge::dispatch_inbound`] or [`crate::HostRouter::handle`]).

pub mod stdio;

use crate::error::TransportError;
use interplay_core::envelope::Envelope;
use tokio::sync::mpsc;

/// Outbound half of a structured message channel.
pub trait Transport: Send + Sync {
    /// Transport name for logs.
    fn name(&self) -> &str;

    /// Send one envelope. Must not block on the peer handling it.
    fn post(&self, envelope: Envelope) -> Result<(), TransportError>;
}

/// In-process transport backed by an unbounded channel. FIFO per sender.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    name: String,
    tx: mpsc::UnboundedSender<Envelope>,
}

impl ChannelTransport {
    /// Create a transport and the receiving end the peer drains.
    pub fn channel(name: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<Envelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                name: name.into(),
                tx,
            },
            rx,
        )
    }
}

impl Transport for ChannelTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn post(&self, envelope: Envelope) -> Result<(), TransportError> {
        self.tx
            .send(envelope)
            .map_err(|_| TransportError::Closed(self.name.clone()))
    }
}
