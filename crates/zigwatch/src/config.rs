//! Profile resolution: config file + environment + CLI flag overrides.

use std::time::Duration;

use secrecy::SecretString;

use zigwatch_config::{self as config_file, Config};
use zigwatch_core::Coordinator;
use zigwatch_mqtt::BrokerSettings;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Everything a broker-facing command needs to run.
pub struct RunTarget {
    pub settings: BrokerSettings,
    pub coordinators: Vec<Coordinator>,
}

/// The profile the invocation selects: `--profile` flag, then the config
/// file's default, then `"default"`.
pub fn active_profile_name(global: &GlobalOpts, cfg: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| cfg.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Resolve broker settings and coordinator list from profile + flags.
pub fn resolve_target(global: &GlobalOpts) -> Result<RunTarget, CliError> {
    let cfg = config_file::load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let (mut settings, profile_coordinators) = match cfg.profiles.get(&profile_name) {
        Some(profile) => (
            config_file::profile_to_broker_settings(profile, &profile_name)?,
            profile.coordinators.clone(),
        ),
        None => {
            // An explicit --profile pointing nowhere is an error; otherwise
            // flags and env vars alone may be enough.
            if global.profile.is_some() {
                let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
                available.sort();
                return Err(CliError::ProfileNotFound {
                    name: profile_name,
                    available: if available.is_empty() {
                        "(none)".into()
                    } else {
                        available.join(", ")
                    },
                });
            }
            let Some(ref broker) = global.broker else {
                return Err(CliError::NoConfig {
                    path: config_file::config_path().display().to_string(),
                });
            };
            let (host, port) = config_file::parse_broker_url(broker)?;
            (
                BrokerSettings {
                    host,
                    port,
                    ..BrokerSettings::default()
                },
                Vec::new(),
            )
        }
    };

    // CLI flag overrides.
    if let Some(ref broker) = global.broker {
        let (host, port) = config_file::parse_broker_url(broker)?;
        settings.host = host;
        settings.port = port;
    }
    if let Some(ref username) = global.username {
        settings.username = Some(username.clone());
    }
    if let Some(ref password) = global.password {
        settings.password = Some(SecretString::from(password.clone()));
    }
    settings.connect_timeout = Duration::from_secs(global.timeout);

    let coordinators: Vec<Coordinator> = if global.coordinator.is_empty() {
        profile_coordinators
    } else {
        global.coordinator.clone()
    }
    .into_iter()
    .map(Coordinator::from)
    .collect();

    if coordinators.is_empty() {
        return Err(CliError::NoCoordinators);
    }

    Ok(RunTarget {
        settings,
        coordinators,
    })
}
