use std::sync::Arc;

use async_trait::async_trait;
use domain::{GatewaySnapshot, RelayRule, SnapshotObserver};
use tracing::{debug, info};

use crate::output::OutputBank;

/// Drives outputs from sensor signals after each commit.
///
/// A rule only acts when its source device answered in the committed cycle
/// and the output is not already in the desired state. Manual changes stick
/// until the signal next disagrees with them.
pub struct RelayAutomation {
    rules: Vec<RelayRule>,
    outputs: Arc<OutputBank>,
}

impl RelayAutomation {
    pub fn new(rules: Vec<RelayRule>, outputs: Arc<OutputBank>) -> Self {
        if !rules.is_empty() {
            info!(count = rules.len(), "⚙️ Relay automation rules loaded");
        }
        Self { rules, outputs }
    }

    pub fn rules(&self) -> &[RelayRule] {
        &self.rules
    }
}

#[async_trait]
impl SnapshotObserver for RelayAutomation {
    fn name(&self) -> &str {
        "relay-automation"
    }

    async fn on_commit(
        &self,
        snapshot: &GatewaySnapshot,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut first_error = None;

        for rule in &self.rules {
            let Some(desired) = rule.desired_state(snapshot) else {
                debug!(channel = rule.channel.index(), source = ?rule.source, "Rule source not fresh, skipping");
                continue;
            };

            let index = rule.channel.index();
            // Read the live state: a previous rule in this pass may have changed it
            match self.outputs.get(index) {
                Ok(current) if current == desired => continue,
                Ok(_) => {}
                Err(e) => {
                    first_error.get_or_insert(e);
                    continue;
                }
            }

            match self.outputs.set(index, desired).await {
                Ok(_) => info!(channel = index, source = ?rule.source, energized = desired, "Automation switched output"),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(Box::new(e)),
            None => Ok(()),
        }
    }
}
