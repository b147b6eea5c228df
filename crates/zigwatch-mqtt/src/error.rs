// ── Transport error types ──
//
// Everything rumqttc can throw at us, folded into variants the core crate
// can translate without knowing the client library. Connection and auth
// failures are fatal to a run (no retries); the caller decides.

use thiserror::Error;

/// Errors surfaced by the MQTT transport layer.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Broker at {host}:{port} refused the connection: {reason}")]
    ConnectionRefused {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("Broker rejected credentials: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Could not reach broker at {host}:{port}: {source}")]
    Io {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("No CONNACK from broker within {timeout_secs}s")]
    ConnectTimeout { timeout_secs: u64 },

    #[error("Connection to broker lost: {reason}")]
    ConnectionLost { reason: String },

    #[error("MQTT client request channel closed")]
    ChannelClosed,

    #[error("MQTT protocol error: {reason}")]
    Protocol { reason: String },
}

impl TransportError {
    /// Fold a rumqttc poll error into a transport error, attaching the
    /// broker address for user-facing messages.
    pub(crate) fn from_connection_error(
        err: &rumqttc::ConnectionError,
        host: &str,
        port: u16,
    ) -> Self {
        use rumqttc::ConnectionError;

        match err {
            ConnectionError::ConnectionRefused(code) => {
                let reason = format!("{code:?}");
                // Auth-shaped refusal codes get their own variant so the CLI
                // can point the user at credentials rather than the network.
                if reason.contains("BadUserNamePassword") || reason.contains("NotAuthorized") {
                    TransportError::AuthenticationFailed { reason }
                } else {
                    TransportError::ConnectionRefused {
                        host: host.to_owned(),
                        port,
                        reason,
                    }
                }
            }
            ConnectionError::Io(e) => TransportError::Io {
                host: host.to_owned(),
                port,
                source: std::io::Error::new(e.kind(), e.to_string()),
            },
            other => TransportError::ConnectionLost {
                reason: other.to_string(),
            },
        }
    }
}

impl From<rumqttc::ClientError> for TransportError {
    fn from(_: rumqttc::ClientError) -> Self {
        // ClientError only occurs when the event loop has gone away and the
        // request channel is full or closed.
        TransportError::ChannelClosed
    }
}
