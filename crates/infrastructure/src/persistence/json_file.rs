use std::path::{Path, PathBuf};

use async_trait::async_trait;
use domain::{DomainError, GatewaySnapshot, SnapshotRepository};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Snapshot stored as a single JSON document.
///
/// Saves go to a sibling temporary file which is synced and then renamed
/// over the target, so a crash mid-write leaves the previous snapshot intact.
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

fn io_failure(context: &str, path: &Path, e: std::io::Error) -> DomainError {
    DomainError::PersistenceFailure(format!("{} {:?}: {}", context, path, e))
}

#[async_trait]
impl SnapshotRepository for JsonFileRepository {
    async fn load(&self) -> Result<Option<GatewaySnapshot>, DomainError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No saved state at {:?}", self.path);
                return Ok(None);
            }
            Err(e) => return Err(io_failure("Failed to read", &self.path, e)),
        };

        let snapshot = serde_json::from_slice(&bytes).map_err(|e| {
            DomainError::PersistenceFailure(format!("Corrupt state file {:?}: {}", self.path, e))
        })?;
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &GatewaySnapshot) -> Result<(), DomainError> {
        let json = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| DomainError::PersistenceFailure(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| io_failure("Failed to create", parent, e))?;
        }

        let temp = self.temp_path();
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp)
            .await
            .map_err(|e| io_failure("Failed to open", &temp, e))?;
        file.write_all(&json)
            .await
            .map_err(|e| io_failure("Failed to write", &temp, e))?;
        file.sync_all()
            .await
            .map_err(|e| io_failure("Failed to sync", &temp, e))?;
        drop(file);

        fs::rename(&temp, &self.path)
            .await
            .map_err(|e| io_failure("Failed to replace", &self.path, e))?;

        debug!(cycle = snapshot.cycle, path = ?self.path, "Snapshot saved");
        Ok(())
    }
}
