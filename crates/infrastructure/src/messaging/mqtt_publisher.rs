use async_trait::async_trait;
use domain::{GatewaySnapshot, SnapshotObserver};
use rumqttc::QoS;
use tracing::debug;

use crate::messaging::mqtt_client::MqttPublisherClient;

/// Publishes the flat sensor projection of every committed snapshot.
///
/// Messages are retained so a dashboard subscribing late still gets the
/// latest values. Commits made while the broker is unreachable are skipped:
/// the next commit supersedes them anyway.
pub struct MqttSnapshotPublisher<C> {
    client: C,
    topic: String,
}

impl<C: MqttPublisherClient> MqttSnapshotPublisher<C> {
    pub fn new(client: C, topic: impl Into<String>) -> Self {
        Self {
            client,
            topic: topic.into(),
        }
    }
}

#[async_trait]
impl<C: MqttPublisherClient> SnapshotObserver for MqttSnapshotPublisher<C> {
    fn name(&self) -> &str {
        "mqtt"
    }

    async fn on_commit(
        &self,
        snapshot: &GatewaySnapshot,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if !self.client.is_connected() {
            debug!(cycle = snapshot.cycle, "MQTT offline, skipping publish");
            return Ok(());
        }

        let payload = serde_json::to_vec(&snapshot.sensor_fields())?;
        self.client
            .publish_bytes(&self.topic, &payload, QoS::AtLeastOnce, true)
            .await?;
        Ok(())
    }
}
