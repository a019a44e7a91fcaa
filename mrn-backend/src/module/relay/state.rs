///! Persistent announcement state
///!
///! The only state that survives a restart: which windows and downlinks have
///! already been announced, keyed by the timestamp used for retention.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

#[derive(Debug, Error)]
pub enum StatePersistError {
    #[error("state file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("state could not be encoded: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("state file {path:?} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Announced ids keyed by their defining timestamp.
///
/// Several entities may share a timestamp, so each key holds a list.
/// Files written by older versions stored a single id per key; those still
/// load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SeenMap(BTreeMap<DateTime<Utc>, Vec<String>>);

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredIds {
    One(String),
    Many(Vec<String>),
}

impl<'de> Deserialize<'de> for SeenMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let stored = BTreeMap::<DateTime<Utc>, StoredIds>::deserialize(deserializer)?;
        Ok(SeenMap(
            stored
                .into_iter()
                .map(|(at, ids)| match ids {
                    StoredIds::One(id) => (at, vec![id]),
                    StoredIds::Many(ids) => (at, ids),
                })
                .collect(),
        ))
    }
}

impl SeenMap {
    /// Drop every entry keyed before `cutoff`; returns how many ids went
    pub fn prune_before(&mut self, cutoff: DateTime<Utc>) -> usize {
        let kept = self.0.split_off(&cutoff);
        let dropped = self.0.values().map(Vec::len).sum();
        self.0 = kept;
        dropped
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.0.values().flatten().any(|seen| seen == id)
    }

    pub fn insert(&mut self, at: DateTime<Utc>, id: &str) {
        let ids = self.0.entry(at).or_default();
        if !ids.iter().any(|seen| seen == id) {
            ids.push(id.to_string());
        }
    }

    /// Number of tracked ids
    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }
}

/// Everything the bot persists between runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeenState {
    #[serde(default)]
    pub windows: SeenMap,
    #[serde(default)]
    pub downlinks: SeenMap,
}

/// Durable storage for [`SeenState`]
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn load(&self) -> Result<SeenState, StatePersistError>;
    async fn save(&self, state: &SeenState) -> Result<(), StatePersistError>;
}

/// Keeps the state in a JSON file on local disk
pub struct JsonFileStateStore {
    path: PathBuf,
}

impl JsonFileStateStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StatePersistError {
        StatePersistError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl StateStore for JsonFileStateStore {
    async fn load(&self) -> Result<SeenState, StatePersistError> {
        if !self.path.exists() {
            tracing::info!("No state file at {:?}, starting with empty state", self.path);
            return Ok(SeenState::default());
        }

        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        let state: SeenState =
            serde_json::from_str(&content).map_err(|source| StatePersistError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        tracing::info!(
            "Loaded state from {:?}: {} windows, {} downlinks",
            self.path,
            state.windows.len(),
            state.downlinks.len()
        );
        Ok(state)
    }

    async fn save(&self, state: &SeenState) -> Result<(), StatePersistError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let content = serde_json::to_string_pretty(state)?;

        // Write beside the target and rename so a crash never leaves half a file
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content)
            .await
            .map_err(|e| self.io_error(e))?;
        fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        tracing::debug!("Saved state to {:?}", self.path);
        Ok(())
    }
}
