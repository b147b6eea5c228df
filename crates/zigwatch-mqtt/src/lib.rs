//! Async MQTT transport for zigwatch.
//!
//! A thin wrapper over `rumqttc` providing what the monitoring tools need
//! and nothing more: a CONNACK-verified connection, subscription management,
//! a pollable stream of inbound publishes, and retained-message tombstones.
//!
//! # Retained-message contract
//!
//! The cleanup protocol in `zigwatch-core` depends on a broker behavior, not
//! on anything this crate implements: brokers redeliver the last retained
//! payload of a topic to every *new* subscription, and there is no "list
//! retained topics" query. Discovering retained state therefore always means
//! subscribing and collecting whatever arrives within a bounded window.
//! Publishing a zero-length payload with the retain flag set
//! ([`BrokerClient::publish_tombstone`]) erases the retained message.

pub mod client;
pub mod error;
pub mod settings;

pub use client::{BrokerClient, InboundMessage};
pub use error::TransportError;
pub use settings::BrokerSettings;
