//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use zigwatch_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    /// Findings (offline devices) with --fail-on-offline share the general
    /// failure code so monitoring integrations need only test non-zero.
    pub const FINDINGS: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to broker at {address}")]
    #[diagnostic(
        code(zigwatch::connection_failed),
        help(
            "Check that the broker is running and accessible.\n\
             Address: {address}\n\
             Override with: zigwatch --broker mqtt://host:1883 ..."
        )
    )]
    ConnectionFailed {
        address: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Connection to broker lost")]
    #[diagnostic(
        code(zigwatch::connection_lost),
        help("The broker dropped the connection mid-run: {reason}")
    )]
    ConnectionLost { reason: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Broker rejected credentials")]
    #[diagnostic(
        code(zigwatch::auth_failed),
        help(
            "Verify the broker username and password.\n\
             Run: zigwatch config set-password --profile {profile}"
        )
    )]
    AuthFailed { profile: String },

    // ── Timeout ──────────────────────────────────────────────────────

    #[error("Broker did not answer within {seconds}s")]
    #[diagnostic(
        code(zigwatch::timeout),
        help("Increase the timeout with --timeout or check broker responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── Data ─────────────────────────────────────────────────────────

    #[error("No roster received from any coordinator")]
    #[diagnostic(
        code(zigwatch::no_roster),
        help(
            "Zigbee2MQTT publishes its device list as a retained message on\n\
             <coordinator>/bridge/devices. Check the coordinator names and\n\
             that the bridges are running. Waited {waited_secs}s."
        )
    )]
    NoRosterReceived { waited_secs: u64 },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(zigwatch::validation))]
    Validation { field: String, reason: String },

    #[error("No coordinators configured")]
    #[diagnostic(
        code(zigwatch::no_coordinators),
        help(
            "Pass one or more with --coordinator (e.g. -c zigbee11 -c zigbee15)\n\
             or add a `coordinators` list to your profile: zigwatch config init"
        )
    )]
    NoCoordinators,

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(zigwatch::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: zigwatch config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(zigwatch::no_config),
        help(
            "Create one with: zigwatch config init\n\
             Or pass the broker directly: --broker mqtt://host:1883\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(zigwatch::config))]
    Config(#[from] zigwatch_config::ConfigError),

    // ── Internal ─────────────────────────────────────────────────────

    #[error("Internal error: {message}")]
    #[diagnostic(code(zigwatch::internal))]
    Internal { message: String },

    // ── IO ───────────────────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::ConnectionLost { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NoCoordinators => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { address, reason } => CliError::ConnectionFailed {
                address,
                source: reason.into(),
            },

            CoreError::AuthenticationFailed { message: _ } => CliError::AuthFailed {
                profile: "current".into(),
            },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::ConnectionLost { reason } => CliError::ConnectionLost { reason },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::NoCoordinators => CliError::NoCoordinators,

            CoreError::Internal(message) => CliError::Internal { message },
        }
    }
}
