//! JSON-file snapshot persistence.

use async_trait::async_trait;
use benchmaker_application::SnapshotStore;
use benchmaker_domain::{Snapshot, StoreError};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Keeps the whole snapshot in one pretty-printed JSON file.
///
/// Saves go to a sibling temp file that is then renamed over the target, so
/// a crash mid-write never leaves a truncated snapshot behind.
#[derive(Debug, Clone)]
pub struct JsonSnapshotStore {
    path: PathBuf,
}

impl JsonSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File the snapshot lives in
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "snapshot".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SnapshotStore for JsonSnapshotStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load(&self) -> Result<Snapshot, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No snapshot yet, starting empty");
                return Ok(Snapshot::default());
            }
            Err(e) => return Err(persistence("read", &self.path, e)),
        };

        let snapshot: Snapshot = serde_json::from_slice(&bytes)
            .map_err(|e| persistence("decode", &self.path, e))?;
        debug!(
            suites = snapshot.test_suites.len(),
            runs = snapshot.runs.len(),
            "Snapshot loaded"
        );
        Ok(snapshot)
    }

    #[instrument(skip(self, snapshot), fields(path = %self.path.display()))]
    async fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(snapshot).map_err(|e| persistence("encode", &self.path, e))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| persistence("create directory for", &self.path, e))?;
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, &json)
            .await
            .map_err(|e| persistence("write", &temp, e))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| persistence("replace", &self.path, e))?;

        info!(runs = snapshot.runs.len(), bytes = json.len(), "Snapshot saved");
        Ok(())
    }
}

fn persistence(action: &str, path: &Path, error: impl std::fmt::Display) -> StoreError {
    StoreError::Persistence(format!("failed to {} {}: {}", action, path.display(), error))
}
