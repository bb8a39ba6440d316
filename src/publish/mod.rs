//! Hand-off of decoded records to downstream consumers.
//!
//! The dispatcher only knows the [`Publisher`] trait. [`MqttPublisher`] is the
//! production sink; [`ChannelPublisher`] forwards records into a Tokio channel
//! for embedding and tests.

mod channel;
mod mqtt;

use async_trait::async_trait;
pub use channel::ChannelPublisher;
pub use mqtt::{MqttConfig, MqttPublisher, drive_event_loop, strip_scheme};
use thiserror::Error;

use crate::record::InverterRecord;

/// Errors raised while publishing a record.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The record could not be encoded as JSON.
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
    /// The MQTT client rejected the publish request.
    #[error("mqtt client error: {0}")]
    Client(#[from] rumqttc::ClientError),
    /// The receiving side of a [`ChannelPublisher`] has gone away.
    #[error("record channel closed")]
    Closed,
}

/// Destination for decoded inverter records.
///
/// Implementations are shared between dispatch tasks and must tolerate
/// concurrent calls. Ordering between calls is not guaranteed.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish `record`.
    ///
    /// # Errors
    ///
    /// Returns a [`PublishError`] if the record could not be delivered. The
    /// caller logs the failure and does not retry.
    async fn publish(&self, record: &InverterRecord) -> Result<(), PublishError>;
}
