//! Sandboxed side and host side of the interaction message protocol.
//!
//! - [`Bridge`]: the capability surface code inside the sandbox calls. Requests
//!   return a [`PendingReply`] that resolves exactly once, with a deadline.
//! - [`HostRouter`]: the privileged side. Turns inbound requests into
//!   correlated `-response` envelopes using a [`HostCapabilities`] backend.
//! - [`transport`]: in-process channel and NDJSON-over-stdio framing.

pub mod bridge;
pub mod error;
pub mod host;
pub mod pending;
pub mod preview_host;
pub mod subscription;
pub mod transport;

pub use bridge::{spawn_expiry_sweeper, Bridge, DropReason, InboundDisposition, PendingReply};
pub use error::{BridgeError, Result, TransportError};
pub use host::{HostCapabilities, HostRouter, RouteOutcome};
pub use preview_host::PreviewHost;
pub use subscription::SubscriptionState;
pub use transport::{ChannelTransport, Transport};
