use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::{select, time::sleep};
use tokio_util::sync::CancellationToken;

use super::{PublishError, Publisher};
use crate::record::InverterRecord;

/// Requests queued in the client before `publish` starts waiting.
const REQUEST_CAPACITY: usize = 16;

/// Connection settings for the MQTT broker.
#[derive(Clone, PartialEq, Eq)]
pub struct MqttConfig {
    /// Broker host name or address, without a scheme.
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub username: String,
    pub password: String,
    /// Topic every record is published on.
    pub topic: String,
    pub keep_alive: Duration,
}

impl MqttConfig {
    /// Default client identifier announced to the broker.
    pub const DEFAULT_CLIENT_ID: &'static str = "ginlong-inverter-monitor";

    /// Topic used when none is configured explicitly.
    #[must_use]
    pub fn default_topic(client_id: &str) -> String { format!("sensor/inverter/{client_id}/status") }
}

impl std::fmt::Debug for MqttConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("topic", &self.topic)
            .field("keep_alive", &self.keep_alive)
            .finish()
    }
}

/// Remove a leading `tcp://` or `mqtt://` from a broker address.
///
/// ```
/// use ginlong_monitor::publish::strip_scheme;
///
/// assert_eq!(strip_scheme("tcp://127.0.0.1"), "127.0.0.1");
/// assert_eq!(strip_scheme("broker.local"), "broker.local");
/// ```
#[must_use]
pub fn strip_scheme(address: &str) -> &str {
    ["tcp://", "mqtt://"]
        .iter()
        .find_map(|scheme| address.strip_prefix(scheme))
        .unwrap_or(address)
}

/// Publishes records as JSON on a single MQTT topic.
///
/// Records are sent at QoS 0 and are not retained.
#[derive(Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
    topic: String,
}

impl MqttPublisher {
    /// Create the client and its event loop.
    ///
    /// Nothing is sent until the returned [`EventLoop`] is polled, normally by
    /// spawning [`drive_event_loop`].
    #[must_use]
    pub fn new(config: &MqttConfig) -> (Self, EventLoop) {
        let mut options =
            MqttOptions::new(&config.client_id, strip_scheme(&config.host), config.port);
        options.set_keep_alive(config.keep_alive);
        options.set_credentials(&config.username, &config.password);

        let (client, event_loop) = AsyncClient::new(options, REQUEST_CAPACITY);
        (
            Self {
                client,
                topic: config.topic.clone(),
            },
            event_loop,
        )
    }

    /// Topic records are published on.
    #[must_use]
    pub fn topic(&self) -> &str { &self.topic }
}

#[async_trait]
impl Publisher for MqttPublisher {
    async fn publish(&self, record: &InverterRecord) -> Result<(), PublishError> {
        let payload = serde_json::to_vec(record)?;
        debug!("publishing record: topic={}, bytes={}", self.topic, payload.len());
        self.client
            .publish(&self.topic, QoS::AtMostOnce, false, payload)
            .await?;
        Ok(())
    }
}

/// Poll the MQTT event loop until `shutdown` is cancelled.
///
/// Connection errors are logged and the loop reconnects after `retry_delay`.
#[expect(
    clippy::integer_division_remainder_used,
    reason = "tokio::select! expands to modulus internally"
)]
pub async fn drive_event_loop(
    mut event_loop: EventLoop,
    shutdown: CancellationToken,
    retry_delay: Duration,
) {
    loop {
        select! {
            biased;

            () = shutdown.cancelled() => break,
            event = event_loop.poll() => match event {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    info!("connected to mqtt broker: code={:?}", ack.code);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("mqtt connection error: error={e}, retry_in={retry_delay:?}");
                    select! {
                        () = shutdown.cancelled() => break,
                        () = sleep(retry_delay) => {}
                    }
                }
            },
        }
    }
}
