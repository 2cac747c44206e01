pub mod alarm_publisher;
pub mod mqtt_client;
pub mod mqtt_publisher;

pub use alarm_publisher::MqttAlarmPublisher;
pub use mqtt_client::{MqttClient, MqttMessage, MqttPublisherClient, MqttSubscriberClient};
pub use mqtt_publisher::MqttSnapshotPublisher;
