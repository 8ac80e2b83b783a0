use thiserror::Error;

/// Failure to move an envelope across the boundary.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Transport closed: {0}")]
    Closed(String),

    #[error("Failed to encode envelope: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("A subscription is already {state} ({subscription_id}); unsubscribe first")]
    SubscriptionBusy {
        state: &'static str,
        subscription_id: String,
    },

    #[error("No subscription to tear down")]
    NoSubscription,

    #[error("Bridge is closed")]
    Closed,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
