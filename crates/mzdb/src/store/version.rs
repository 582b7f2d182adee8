use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::info;

use super::atomic_io::write_bytes_with_backup;
use super::collection::ValidationError;
use super::error::StoreError;
use super::json_io::{encode_json, read_json};

pub const SYSTEM_FILE_NAME: &str = "System.json";
pub const VERSION_FIELD: &str = "versionId";
pub const DEFAULT_VERSION_STEP: i64 = 1;

/// Tells the live editor that database files changed underneath it.
///
/// Implementations are only invoked after the primary write committed.
pub trait ChangeSignal {
    fn bump(&self) -> Result<i64, StoreError>;
}

/// Keeps `versionId` in `System.json` moving forward by a fixed step.
#[derive(Debug, Clone)]
pub struct VersionCoordinator {
    system_path: PathBuf,
    step: i64,
}

impl VersionCoordinator {
    pub fn new(system_path: impl Into<PathBuf>, step: i64) -> Self {
        Self {
            system_path: system_path.into(),
            step: step.max(1),
        }
    }

    pub fn system_path(&self) -> &Path {
        &self.system_path
    }

    pub fn current(&self) -> Result<i64, StoreError> {
        let system = self.read_system()?;
        Ok(version_of(&system))
    }

    fn read_system(&self) -> Result<Map<String, Value>, StoreError> {
        match read_json::<Value>(&self.system_path)? {
            Value::Object(map) => Ok(map),
            _ => Err(StoreError::validation(
                &self.system_path,
                ValidationError::Rejected("system file must hold a json object".to_string()),
            )),
        }
    }
}

impl ChangeSignal for VersionCoordinator {
    fn bump(&self) -> Result<i64, StoreError> {
        let mut system = self.read_system()?;
        let previous = version_of(&system);
        let next = previous.saturating_add(self.step);
        system.insert(VERSION_FIELD.to_string(), Value::from(next));

        let bytes = encode_json(&self.system_path, &system)?;
        write_bytes_with_backup(&self.system_path, &bytes)?;
        info!(
            path = %self.system_path.display(),
            previous,
            next,
            "version_bumped"
        );
        Ok(next)
    }
}

fn version_of(system: &Map<String, Value>) -> i64 {
    match system.get(VERSION_FIELD) {
        Some(value) => value
            .as_i64()
            .or_else(|| value.as_f64().map(|float| float as i64))
            .unwrap_or(0),
        None => 0,
    }
}
