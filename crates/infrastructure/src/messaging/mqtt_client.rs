use anyhow::{Result, anyhow};
use rumqttc::{AsyncClient, Event, LastWill, MqttOptions, Packet, QoS};
use std::sync::{
    Arc, PoisonError, RwLock,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task;
use tracing::{debug, error, info};

use crate::config::MqttConfig;

#[derive(Clone, Debug, PartialEq)]
pub struct MqttMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

#[async_trait::async_trait]
pub trait MqttPublisherClient: Send + Sync {
    async fn publish_bytes(
        &self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<()>;
    fn is_connected(&self) -> bool;
}

#[async_trait::async_trait]
pub trait MqttSubscriberClient: Send + Sync {
    /// Subscribe now and again after every reconnect
    async fn subscribe(&self, topic: &str) -> Result<()>;
    /// Incoming publishes on every subscribed topic
    fn subscribe_messages(&self) -> broadcast::Receiver<MqttMessage>;
}

/// Broker connection.
///
/// The event loop runs on its own task and reconnects on its own; callers
/// only see `is_connected` flip while the broker is unreachable. Incoming
/// publishes are fanned out to every `subscribe_messages` receiver.
#[derive(Clone)]
pub struct MqttClient {
    client: AsyncClient,
    tx: broadcast::Sender<MqttMessage>,
    connected: Arc<AtomicBool>,
    subscriptions: Arc<RwLock<Vec<String>>>,
}

impl MqttClient {
    pub async fn new(
        config: &MqttConfig,
        client_id: &str,
        last_will: Option<LastWill>,
    ) -> Result<Self> {
        let mut mqttoptions = MqttOptions::new(client_id, config.host.as_str(), config.port);
        mqttoptions.set_keep_alive(Duration::from_secs(20));
        mqttoptions.set_clean_session(true);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            mqttoptions.set_credentials(username.as_str(), password.as_str());
        }
        if let Some(will) = last_will {
            mqttoptions.set_last_will(will);
        }

        let (client, mut eventloop) = AsyncClient::new(mqttoptions, 100);
        let (tx, _) = broadcast::channel(64);
        let tx_clone = tx.clone();
        let connected = Arc::new(AtomicBool::new(false));
        let connected_clone = connected.clone();
        let subscriptions = Arc::new(RwLock::new(Vec::<String>::new()));
        let subscriptions_clone = subscriptions.clone();
        let client_clone = client.clone();
        let host = format!("{}:{}", config.host, config.port);

        // Spawn a task to handle the event loop
        task::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        let msg = MqttMessage {
                            topic: publish.topic,
                            payload: publish.payload.to_vec(),
                        };
                        // No receiver yet is fine: nothing is listening for that topic
                        if tx_clone.send(msg).is_err() {
                            debug!("Dropped MQTT message, no listeners");
                        }
                    }
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        info!(broker = %host, "MQTT Connected");
                        connected_clone.store(true, Ordering::Relaxed);

                        // Clean sessions forget subscriptions across reconnects
                        let subs = subscriptions_clone
                            .read()
                            .unwrap_or_else(PoisonError::into_inner)
                            .clone();
                        for topic in subs {
                            if let Err(e) = client_clone.subscribe(&topic, QoS::AtLeastOnce).await {
                                error!(topic = %topic, error = %e, "Failed to re-subscribe");
                            }
                        }
                    }
                    Ok(Event::Outgoing(rumqttc::Outgoing::Disconnect)) => {
                        connected_clone.store(false, Ordering::Relaxed);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!("MQTT Connection error: {:?}", e);
                        connected_clone.store(false, Ordering::Relaxed);
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });

        Ok(Self {
            client,
            tx,
            connected,
            subscriptions,
        })
    }

    pub async fn publish(&self, topic: &str, payload: &str, retain: bool) -> Result<()> {
        self.publish_bytes(topic, payload.as_bytes(), QoS::AtLeastOnce, retain)
            .await
    }
}

#[async_trait::async_trait]
impl MqttPublisherClient for MqttClient {
    async fn publish_bytes(
        &self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
    ) -> Result<()> {
        self.client
            .publish(topic, qos, retain, payload)
            .await
            .map_err(|e| anyhow!("Failed to publish MQTT message: {}", e))?;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }
}

#[async_trait::async_trait]
impl MqttSubscriberClient for MqttClient {
    async fn subscribe(&self, topic: &str) -> Result<()> {
        {
            let mut subs = self
                .subscriptions
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            if !subs.iter().any(|s| s == topic) {
                subs.push(topic.to_string());
            }
        }

        self.client
            .subscribe(topic, QoS::AtLeastOnce)
            .await
            .map_err(|e| anyhow!("Failed to subscribe to topic {}: {}", topic, e))
    }

    fn subscribe_messages(&self) -> broadcast::Receiver<MqttMessage> {
        self.tx.subscribe()
    }
}
