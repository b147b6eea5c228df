// ── Broker client ──
//
// Owns the rumqttc AsyncClient + EventLoop pair. The event loop must be
// polled to make progress, so inbound traffic is consumed by calling
// `next_publish` in a loop; acks, pings, and other control packets are
// handled inside it.

use bytes::Bytes;
use rumqttc::{AsyncClient, Event, EventLoop, Packet, QoS, SubscribeFilter};
use tracing::{debug, trace};

use crate::error::TransportError;
use crate::settings::BrokerSettings;

const REQUEST_CHANNEL_SIZE: usize = 64;

/// One PUBLISH received from the broker.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Bytes,
    /// Set when the broker redelivered a retained message on subscribe.
    pub retained: bool,
}

/// A connected MQTT client.
///
/// Construction via [`BrokerClient::connect`] blocks until the broker's
/// CONNACK arrives, so a `BrokerClient` in hand means the broker accepted
/// us. There is no reconnect logic: a lost connection surfaces as an error
/// from [`next_publish`](Self::next_publish) and ends the run.
pub struct BrokerClient {
    client: AsyncClient,
    events: EventLoop,
    host: String,
    port: u16,
}

impl BrokerClient {
    /// Connect to the broker and wait for a successful CONNACK.
    ///
    /// `client_id_suffix` distinguishes the individual tools on a shared
    /// broker (e.g. `"monitor"`, `"devices"`).
    pub async fn connect(
        settings: &BrokerSettings,
        client_id_suffix: &str,
    ) -> Result<Self, TransportError> {
        let client_id = settings.client_id_for(client_id_suffix);
        let opts = settings.to_mqtt_options(&client_id);
        let (client, mut events) = AsyncClient::new(opts, REQUEST_CHANNEL_SIZE);

        debug!(host = %settings.host, port = settings.port, %client_id, "connecting to broker");

        let connack = tokio::time::timeout(settings.connect_timeout, events.poll())
            .await
            .map_err(|_| TransportError::ConnectTimeout {
                timeout_secs: settings.connect_timeout.as_secs(),
            })?;

        match connack {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                trace!(?ack, "broker accepted connection");
            }
            Ok(other) => {
                return Err(TransportError::Protocol {
                    reason: format!("expected CONNACK, got {other:?}"),
                });
            }
            Err(ref e) => {
                return Err(TransportError::from_connection_error(
                    e,
                    &settings.host,
                    settings.port,
                ));
            }
        }

        Ok(Self {
            client,
            events,
            host: settings.host.clone(),
            port: settings.port,
        })
    }

    /// Subscribe to a single topic filter.
    pub async fn subscribe(&self, filter: &str) -> Result<(), TransportError> {
        self.client.subscribe(filter, QoS::AtMostOnce).await?;
        Ok(())
    }

    /// Subscribe to a batch of topic filters in one request.
    pub async fn subscribe_many<I>(&self, filters: I) -> Result<(), TransportError>
    where
        I: IntoIterator<Item = String>,
    {
        let subs: Vec<SubscribeFilter> = filters
            .into_iter()
            .map(|path| SubscribeFilter::new(path, QoS::AtMostOnce))
            .collect();
        if subs.is_empty() {
            return Ok(());
        }
        self.client.subscribe_many(subs).await?;
        Ok(())
    }

    /// Unsubscribe from a batch of topic filters.
    pub async fn unsubscribe_many<I>(&self, filters: I) -> Result<(), TransportError>
    where
        I: IntoIterator<Item = String>,
    {
        for filter in filters {
            self.client.unsubscribe(filter).await?;
        }
        Ok(())
    }

    /// Drive the event loop until the next PUBLISH arrives.
    ///
    /// Control packets (acks, pings, subacks) are consumed silently.
    /// Cancellation-safe: dropping the future mid-poll leaves the
    /// connection usable, which is what lets the caller race this against
    /// a deadline.
    pub async fn next_publish(&mut self) -> Result<InboundMessage, TransportError> {
        loop {
            match self.events.poll().await {
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    return Ok(InboundMessage {
                        topic: publish.topic,
                        payload: publish.payload,
                        retained: publish.retain,
                    });
                }
                Ok(event) => trace!(?event, "control packet"),
                Err(ref e) => {
                    return Err(TransportError::from_connection_error(e, &self.host, self.port));
                }
            }
        }
    }

    /// Publish an empty retained payload, erasing the retained message on
    /// `topic`. See the crate docs for the broker contract this relies on.
    pub async fn publish_tombstone(&self, topic: &str) -> Result<(), TransportError> {
        self.client
            .publish(topic, QoS::AtLeastOnce, true, Vec::<u8>::new())
            .await?;
        Ok(())
    }

    /// Send DISCONNECT and drop the connection.
    ///
    /// Errors are ignored: the broker closing first is indistinguishable
    /// from a clean goodbye at this point.
    pub async fn disconnect(mut self) {
        let _ = self.client.disconnect().await;
        // Drain until the broker closes the socket so the DISCONNECT and
        // any outstanding publishes actually hit the wire.
        while let Ok(event) = self.events.poll().await {
            trace!(?event, "draining before close");
            if matches!(event, Event::Outgoing(rumqttc::Outgoing::Disconnect)) {
                break;
            }
        }
    }
}
