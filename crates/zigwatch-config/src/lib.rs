//! Shared configuration for the zigwatch CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), and
//! translation to `zigwatch_mqtt::BrokerSettings`. The CLI adds flag-aware
//! overrides on top.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use zigwatch_mqtt::BrokerSettings;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found in configuration")]
    ProfileNotFound { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named broker profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    /// Monitoring window length in seconds.
    #[serde(default = "default_duration")]
    pub duration_secs: u64,

    /// Broker connect timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            duration_secs: default_duration(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_duration() -> u64 {
    5
}
fn default_timeout() -> u64 {
    10
}

/// A named broker profile.
#[derive(Debug, Deserialize, Serialize)]
pub struct Profile {
    /// Broker URL (e.g. "mqtt://192.168.1.10:1883").
    pub broker: String,

    /// Coordinators (top-level topic namespaces) to monitor.
    #[serde(default)]
    pub coordinators: Vec<String>,

    /// Username for broker auth.
    pub username: Option<String>,

    /// Password (plaintext — prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// MQTT client id prefix (default: "zigwatch").
    pub client_id: Option<String>,

    /// Override connect timeout.
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "zigwatch", "zigwatch").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("zigwatch");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    let path = config_path();

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("ZIGWATCH_").split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve a broker password from the credential chain.
///
/// Order: profile's `password_env` env var, system keyring, plaintext in
/// config. `None` means no password anywhere — fine for anonymous brokers.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    // 1. Profile's password_env → env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new("zigwatch", &format!("{profile_name}/password")) {
        if let Ok(secret) = entry.get_password() {
            return Some(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    profile
        .password
        .as_ref()
        .map(|pw| SecretString::from(pw.clone()))
}

/// Store a broker password in the system keyring for a profile.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new("zigwatch", &format!("{profile_name}/password")).map_err(
        |e| ConfigError::Validation {
            field: "keyring".into(),
            reason: e.to_string(),
        },
    )?;
    entry
        .set_password(password)
        .map_err(|e| ConfigError::Validation {
            field: "keyring".into(),
            reason: e.to_string(),
        })
}

// ── Broker URL parsing ──────────────────────────────────────────────

/// Parse an `mqtt://host:port` URL into a host/port pair.
pub fn parse_broker_url(raw: &str) -> Result<(String, u16), ConfigError> {
    let url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: "broker".into(),
        reason: format!("invalid URL: {raw}"),
    })?;

    if url.scheme() != "mqtt" && url.scheme() != "tcp" {
        return Err(ConfigError::Validation {
            field: "broker".into(),
            reason: format!("unsupported scheme '{}' (expected mqtt://)", url.scheme()),
        });
    }

    let host = url
        .host_str()
        .ok_or_else(|| ConfigError::Validation {
            field: "broker".into(),
            reason: format!("missing host in URL: {raw}"),
        })?
        .to_owned();

    Ok((host, url.port().unwrap_or(1883)))
}

/// Build `BrokerSettings` from a profile — no CLI flag overrides.
pub fn profile_to_broker_settings(
    profile: &Profile,
    profile_name: &str,
) -> Result<BrokerSettings, ConfigError> {
    let (host, port) = parse_broker_url(&profile.broker)?;
    let password = resolve_password(profile, profile_name);

    Ok(BrokerSettings {
        host,
        port,
        username: profile.username.clone(),
        password,
        client_id: profile.client_id.clone().unwrap_or_else(|| "zigwatch".into()),
        connect_timeout: Duration::from_secs(profile.timeout.unwrap_or(default_timeout())),
        ..BrokerSettings::default()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn profile(broker: &str) -> Profile {
        Profile {
            broker: broker.into(),
            coordinators: vec!["zigbee11".into(), "zigbee15".into()],
            username: None,
            password: None,
            password_env: None,
            client_id: None,
            timeout: None,
        }
    }

    #[test]
    fn broker_url_with_port() {
        let (host, port) = parse_broker_url("mqtt://broker.lan:1884").unwrap();
        assert_eq!(host, "broker.lan");
        assert_eq!(port, 1884);
    }

    #[test]
    fn broker_url_defaults_port() {
        let (host, port) = parse_broker_url("mqtt://10.0.0.5").unwrap();
        assert_eq!(host, "10.0.0.5");
        assert_eq!(port, 1883);
    }

    #[test]
    fn non_mqtt_scheme_is_rejected() {
        assert!(parse_broker_url("https://broker.lan").is_err());
        assert!(parse_broker_url("not a url").is_err());
    }

    #[test]
    fn settings_from_profile_carry_plaintext_password() {
        let mut p = profile("mqtt://broker.lan");
        p.username = Some("pi".into());
        p.password = Some("hunter2".into());

        let settings = profile_to_broker_settings(&p, "home").unwrap();
        assert_eq!(settings.host, "broker.lan");
        assert_eq!(settings.username.as_deref(), Some("pi"));
        assert!(settings.password.is_some());
    }

    #[test]
    fn password_env_wins_over_plaintext() {
        let mut p = profile("mqtt://broker.lan");
        p.password = Some("plaintext".into());
        p.password_env = Some("ZIGWATCH_TEST_PW_UNSET".into());

        // Env var not set: falls through to plaintext.
        assert!(resolve_password(&p, "home").is_some());
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let cfg = Config::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.default_profile.as_deref(), Some("default"));
        assert_eq!(parsed.defaults.duration_secs, 5);
    }
}
