// ── Core error types ──
//
// User-facing errors from zigwatch-core. These are NOT transport-specific --
// consumers never see rumqttc internals directly. The
// `From<TransportError>` impl translates transport-layer errors into
// domain-appropriate variants.

use thiserror::Error;

use zigwatch_mqtt::TransportError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to broker at {address}: {reason}")]
    ConnectionFailed { address: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Broker connection timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Broker connection lost: {reason}")]
    ConnectionLost { reason: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("No coordinators configured")]
    NoCoordinators,

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<TransportError> for CoreError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::ConnectionRefused { host, port, reason } => {
                CoreError::ConnectionFailed {
                    address: format!("{host}:{port}"),
                    reason,
                }
            }
            TransportError::AuthenticationFailed { reason } => {
                CoreError::AuthenticationFailed { message: reason }
            }
            TransportError::Io { host, port, source } => CoreError::ConnectionFailed {
                address: format!("{host}:{port}"),
                reason: source.to_string(),
            },
            TransportError::ConnectTimeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            TransportError::ConnectionLost { reason } => CoreError::ConnectionLost { reason },
            TransportError::ChannelClosed => CoreError::ConnectionLost {
                reason: "client request channel closed".into(),
            },
            TransportError::Protocol { reason } => {
                CoreError::Internal(format!("protocol error: {reason}"))
            }
        }
    }
}
