use async_trait::async_trait;
use domain::{Alarm, AlarmPublisher};
use rumqttc::QoS;
use tracing::debug;

use crate::messaging::mqtt_client::MqttPublisherClient;

/// Sends each raised alarm to `<topic>/alarms` with exactly-once delivery.
///
/// Alarms are events, not state, so they are not retained. While the broker
/// is unreachable they are dropped; the alarm monitor keeps them for the API.
pub struct MqttAlarmPublisher<C> {
    client: C,
    topic: String,
}

impl<C: MqttPublisherClient> MqttAlarmPublisher<C> {
    pub fn new(client: C, base_topic: &str) -> Self {
        Self {
            client,
            topic: format!("{}/alarms", base_topic),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait]
impl<C: MqttPublisherClient> AlarmPublisher for MqttAlarmPublisher<C> {
    async fn publish_alarm(
        &self,
        alarm: &Alarm,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if !self.client.is_connected() {
            debug!(sensor = %alarm.sensor, "MQTT offline, dropping alarm");
            return Ok(());
        }

        let payload = serde_json::to_vec(alarm)?;
        self.client
            .publish_bytes(&self.topic, &payload, QoS::ExactlyOnce, false)
            .await?;
        Ok(())
    }
}
