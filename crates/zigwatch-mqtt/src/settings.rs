// ── Broker connection settings ──
//
// Describes *how* to connect to an MQTT broker. Carries credential data and
// connection tuning, never touches disk — the CLI builds a `BrokerSettings`
// from its config layer and hands it in.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

/// Configuration for connecting to a single MQTT broker.
#[derive(Debug, Clone)]
pub struct BrokerSettings {
    /// Broker hostname or IP.
    pub host: String,
    /// Broker port (1883 for plain MQTT).
    pub port: u16,
    /// Username, if the broker requires auth.
    pub username: Option<String>,
    /// Password, if the broker requires auth.
    pub password: Option<SecretString>,
    /// Client identifier presented to the broker.
    pub client_id: String,
    /// MQTT keep-alive interval.
    pub keep_alive: Duration,
    /// How long to wait for the broker's CONNACK before giving up.
    pub connect_timeout: Duration,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 1883,
            username: None,
            password: None,
            client_id: "zigwatch".into(),
            keep_alive: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl BrokerSettings {
    /// Derive a client id with a per-tool suffix, the way the monitoring
    /// scripts distinguish themselves on a shared broker.
    pub fn client_id_for(&self, suffix: &str) -> String {
        format!("{}_{suffix}", self.client_id)
    }

    /// Build `rumqttc::MqttOptions` from these settings.
    pub(crate) fn to_mqtt_options(&self, client_id: &str) -> rumqttc::MqttOptions {
        let mut opts = rumqttc::MqttOptions::new(client_id, &self.host, self.port);
        opts.set_keep_alive(self.keep_alive);
        opts.set_clean_session(true);
        if let (Some(user), Some(pass)) = (&self.username, &self.password) {
            opts.set_credentials(user, pass.expose_secret());
        }
        opts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_id_suffix_is_appended() {
        let settings = BrokerSettings {
            client_id: "homelab".into(),
            ..BrokerSettings::default()
        };
        assert_eq!(settings.client_id_for("monitor"), "homelab_monitor");
    }

    #[test]
    fn options_carry_host_and_port() {
        let settings = BrokerSettings {
            host: "broker.lan".into(),
            port: 1884,
            ..BrokerSettings::default()
        };
        let opts = settings.to_mqtt_options("zigwatch_test");
        assert_eq!(opts.broker_address(), ("broker.lan".to_owned(), 1884));
    }

    #[test]
    fn credentials_require_both_parts() {
        // Username without password connects anonymously rather than
        // sending a half-formed CONNECT.
        let settings = BrokerSettings {
            username: Some("pi".into()),
            password: None,
            ..BrokerSettings::default()
        };
        let opts = settings.to_mqtt_options("zigwatch_test");
        assert!(opts.credentials().is_none());
    }
}
