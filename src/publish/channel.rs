use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{PublishError, Publisher};
use crate::record::InverterRecord;

/// Publisher that sends every record into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    tx: mpsc::UnboundedSender<InverterRecord>,
}

impl ChannelPublisher {
    /// Create a publisher together with the receiver for its records.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<InverterRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Publisher for ChannelPublisher {
    async fn publish(&self, record: &InverterRecord) -> Result<(), PublishError> {
        self.tx
            .send(record.clone())
            .map_err(|_| PublishError::Closed)
    }
}
