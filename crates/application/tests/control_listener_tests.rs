mod common;

use anyhow::Result;
use application::ControlListener;
use async_trait::async_trait;
use common::Harness;
use domain::SnapshotRepository;
use infrastructure::messaging::{MqttMessage, MqttSubscriberClient};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Broker stand-in: tests push messages through `tx`
#[derive(Clone)]
struct FakeSubscriber {
    tx: broadcast::Sender<MqttMessage>,
    subscribed: Arc<Mutex<Vec<String>>>,
}

impl FakeSubscriber {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self {
            tx,
            subscribed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn deliver(&self, topic: &str, payload: &str) {
        self.tx
            .send(MqttMessage {
                topic: topic.to_string(),
                payload: payload.as_bytes().to_vec(),
            })
            .unwrap();
    }
}

#[async_trait]
impl MqttSubscriberClient for FakeSubscriber {
    async fn subscribe(&self, topic: &str) -> Result<()> {
        self.subscribed.lock().unwrap().push(topic.to_string());
        Ok(())
    }

    fn subscribe_messages(&self) -> broadcast::Receiver<MqttMessage> {
        self.tx.subscribe()
    }
}

fn message(topic: &str, payload: &str) -> MqttMessage {
    MqttMessage {
        topic: topic.to_string(),
        payload: payload.as_bytes().to_vec(),
    }
}

#[tokio::test]
async fn set_and_toggle_commands_drive_outputs() {
    let harness = Harness::new(&[]);
    let listener = ControlListener::new(FakeSubscriber::new(), "site/sensors", harness.outputs.clone());
    let topic = listener.topic().to_string();
    assert_eq!(topic, "site/sensors/control");

    let on = listener
        .handle_message(&message(&topic, r#"{"channel": 4, "state": true}"#))
        .await
        .unwrap();
    assert!(on);
    assert!(harness.outputs.get(4).unwrap());

    let toggled = listener
        .handle_message(&message(&topic, r#"{"channel": 4, "state": "toggle"}"#))
        .await
        .unwrap();
    assert!(!toggled);
    assert!(!harness.outputs.get(4).unwrap());

    // Remote commands are persisted like local ones
    let persisted = harness.repository.load().await.unwrap().unwrap();
    assert!(!persisted.outputs[4].energized);
    assert_eq!(harness.repository.saved.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn bad_commands_change_nothing() {
    let harness = Harness::new(&[]);
    let listener = ControlListener::new(FakeSubscriber::new(), "site/sensors", harness.outputs.clone());
    let topic = listener.topic().to_string();
    let before = harness.store.read_snapshot();

    for payload in [
        "not json",
        r#"{"channel": 1}"#,
        r#"{"channel": 1, "state": "flip"}"#,
        r#"{"channel": 8, "state": true}"#,
        r#"{"channel": 9, "state": "toggle"}"#,
    ] {
        assert!(
            listener.handle_message(&message(&topic, payload)).await.is_err(),
            "{}",
            payload
        );
    }

    assert_eq!(harness.store.read_snapshot(), before);
}

#[tokio::test(start_paused = true)]
async fn listener_applies_messages_on_its_topic_until_cancelled() {
    let harness = Harness::new(&[]);
    let subscriber = FakeSubscriber::new();
    let listener = Arc::new(ControlListener::new(
        subscriber.clone(),
        "site/sensors",
        harness.outputs.clone(),
    ));
    let cancel = CancellationToken::new();
    let task = {
        let listener = listener.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { listener.run(cancel).await })
    };

    // Wait for the subscription
    while subscriber.subscribed.lock().unwrap().is_empty() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    assert_eq!(
        *subscriber.subscribed.lock().unwrap(),
        vec!["site/sensors/control".to_string()]
    );

    subscriber.deliver("site/sensors", r#"{"channel": 0, "state": true}"#);
    subscriber.deliver("site/sensors/control", "garbage");
    subscriber.deliver("site/sensors/control", r#"{"channel": 2, "state": true}"#);

    tokio::time::timeout(Duration::from_secs(1), async {
        while !harness.outputs.get(2).unwrap() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .unwrap();
    assert!(!harness.outputs.get(0).unwrap());

    cancel.cancel();
    task.await.unwrap();
}
