use std::sync::Arc;

use anyhow::{Context, Result};
use infrastructure::messaging::{MqttMessage, MqttSubscriberClient};
use serde::Deserialize;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::output::OutputBank;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Keyword {
    Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
enum RequestedState {
    Set(bool),
    Keyword(Keyword),
}

/// Remote output command, e.g. `{"channel": 2, "state": true}` or
/// `{"channel": 2, "state": "toggle"}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
struct ControlCommand {
    channel: usize,
    state: RequestedState,
}

/// Applies output commands received on `<topic>/control`
pub struct ControlListener<C> {
    client: C,
    topic: String,
    outputs: Arc<OutputBank>,
}

impl<C: MqttSubscriberClient> ControlListener<C> {
    pub fn new(client: C, base_topic: &str, outputs: Arc<OutputBank>) -> Self {
        Self {
            client,
            topic: format!("{}/control", base_topic),
            outputs,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Listen until cancelled or the broker connection goes away
    pub async fn run(&self, cancel: CancellationToken) {
        // Take the receiver first so nothing published right after the subscribe is missed
        let mut rx = self.client.subscribe_messages();
        if let Err(e) = self.client.subscribe(&self.topic).await {
            error!(topic = %self.topic, error = %e, "Failed to subscribe to control topic");
            return;
        }
        info!(topic = %self.topic, "🎛️ Listening for output commands");

        loop {
            let msg = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                msg = rx.recv() => msg,
            };

            match msg {
                Ok(msg) if msg.topic == self.topic => {
                    if let Err(e) = self.handle_message(&msg).await {
                        warn!(topic = %msg.topic, error = %format!("{e:#}"), "Control command rejected");
                    }
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Control listener lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    warn!("Control channel closed");
                    break;
                }
            }
        }
    }

    /// Decode one message, apply it and return the channel's new state
    pub async fn handle_message(&self, msg: &MqttMessage) -> Result<bool> {
        let command: ControlCommand =
            serde_json::from_slice(&msg.payload).context("Malformed control command")?;
        info!(channel = command.channel, state = ?command.state, "Received output command");

        let energized = match command.state {
            RequestedState::Set(energized) => {
                self.outputs.set(command.channel, energized).await?.energized
            }
            RequestedState::Keyword(Keyword::Toggle) => {
                self.outputs.toggle(command.channel).await?
            }
        };
        Ok(energized)
    }
}
