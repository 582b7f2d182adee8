use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use crate::paths::ProjectPaths;
use crate::records::{
    map_file_name, new_registry_text, plugin_script_path, registry_anchor,
    render_registry_literal, MapBody, MapInfo, PluginEntry, MAP_INDEX_FILE_NAME,
    PLUGIN_REGISTRY_PATH,
};

use super::atomic_io::{write_text_with_backup, WriteReceipt};
use super::collection::{Collection, Record, ValidationError};
use super::embedded::EmbeddedDataDocument;
use super::error::StoreError;
use super::json_io::{list_files, read_json, write_json};
use super::version::{ChangeSignal, VersionCoordinator, SYSTEM_FILE_NAME};

/// Result of a committed database mutation.
///
/// `version` is `None` when the data landed but the reload signal could not
/// be raised; the next successful bump catches the editor up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub receipt: WriteReceipt,
    pub version: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapCommit {
    pub body: WriteReceipt,
    pub index: WriteReceipt,
    pub version: Option<i64>,
}

/// The persistence layer every tool goes through.
///
/// Mutations run `read -> mutate -> backup -> replace -> bump`; the bump only
/// happens once the replace has committed.
pub struct ProjectDatabase {
    paths: ProjectPaths,
    signal: Box<dyn ChangeSignal + Send>,
}

impl ProjectDatabase {
    pub fn open(paths: ProjectPaths, version_step: i64) -> Self {
        let coordinator = VersionCoordinator::new(paths.data_file(SYSTEM_FILE_NAME), version_step);
        Self::with_signal(paths, Box::new(coordinator))
    }

    pub fn with_signal(paths: ProjectPaths, signal: Box<dyn ChangeSignal + Send>) -> Self {
        Self { paths, signal }
    }

    pub fn paths(&self) -> &ProjectPaths {
        &self.paths
    }

    pub fn exists(&self, logical: impl AsRef<Path>) -> bool {
        self.paths.resolve(logical).exists()
    }

    pub fn list_files(
        &self,
        dir: impl AsRef<Path>,
        suffix: Option<&str>,
    ) -> Result<Vec<String>, StoreError> {
        list_files(&self.paths.resolve(dir), suffix)
    }

    /// `None` when no engine root is configured.
    pub fn list_engine_files(
        &self,
        dir: impl AsRef<Path>,
        suffix: Option<&str>,
    ) -> Option<Result<Vec<String>, StoreError>> {
        let resolved = self.paths.resolve_engine(dir)?;
        Some(list_files(&resolved, suffix))
    }

    pub fn read_json<T: DeserializeOwned>(
        &self,
        logical: impl AsRef<Path>,
    ) -> Result<T, StoreError> {
        read_json(&self.paths.resolve(logical))
    }

    /// Plain write with backup; does not signal the editor.
    pub fn write_json<T: Serialize>(
        &self,
        logical: impl AsRef<Path>,
        value: &T,
    ) -> Result<WriteReceipt, StoreError> {
        write_json(&self.paths.resolve(logical), value)
    }

    pub fn read_collection<T>(&self, file_name: &str) -> Result<Collection<T>, StoreError>
    where
        T: Record + DeserializeOwned,
    {
        read_json(&self.paths.data_file(file_name))
    }

    /// Reads a collection that is about to be mutated; it must already obey
    /// the id-equals-index rule.
    pub fn read_collection_for_update<T>(
        &self,
        file_name: &str,
    ) -> Result<Collection<T>, StoreError>
    where
        T: Record + DeserializeOwned,
    {
        let path = self.paths.data_file(file_name);
        let collection: Collection<T> = read_json(&path)?;
        collection
            .validate()
            .map_err(|source| StoreError::validation(&path, source))?;
        Ok(collection)
    }

    pub fn write_collection<T>(
        &self,
        file_name: &str,
        collection: &Collection<T>,
    ) -> Result<Commit, StoreError>
    where
        T: Record + Serialize,
    {
        let path = self.paths.data_file(file_name);
        collection
            .validate()
            .map_err(|source| StoreError::validation(&path, source))?;
        let receipt = write_json(&path, collection)?;
        info!(
            file = file_name,
            len = collection.len(),
            sha256 = %receipt.sha256_hex,
            "store_collection_committed"
        );
        let version = self.signal_change();
        Ok(Commit { receipt, version })
    }

    /// Body first (inert until indexed), then the index entry, then the bump.
    /// A failed index write leaves the body in place for a retry.
    pub fn write_map(
        &self,
        id: usize,
        body: &MapBody,
        entry: MapInfo,
    ) -> Result<MapCommit, StoreError> {
        let index_path = self.paths.data_file(MAP_INDEX_FILE_NAME);
        if entry.id != id {
            return Err(StoreError::validation(
                &index_path,
                ValidationError::IdMismatch {
                    index: id,
                    id: Some(entry.id),
                },
            ));
        }
        let mut index = self.read_map_index()?;
        index
            .validate()
            .map_err(|source| StoreError::validation(&index_path, source))?;
        if index.get(id).is_some() {
            return Err(StoreError::validation(&index_path, ValidationError::SlotOccupied { id }));
        }

        let body_path = self.paths.data_file(&map_file_name(id));
        let body_receipt = write_json(&body_path, body)?;

        index
            .insert_at(id, entry)
            .map_err(|source| StoreError::validation(&index_path, source))?;
        let index_receipt = write_json(&index_path, &index).map_err(|error| {
            warn!(
                map_id = id,
                body = %body_path.display(),
                error = %error,
                "map_index_write_failed_body_kept"
            );
            error
        })?;
        info!(
            map_id = id,
            width = body.width,
            height = body.height,
            body = %body_receipt.path.display(),
            "store_map_committed"
        );
        let version = self.signal_change();
        Ok(MapCommit {
            body: body_receipt,
            index: index_receipt,
            version,
        })
    }

    /// A missing index is an empty one; a corrupt index is an error.
    pub fn read_map_index(&self) -> Result<Collection<MapInfo>, StoreError> {
        match self.read_collection::<MapInfo>(MAP_INDEX_FILE_NAME) {
            Ok(index) => Ok(index),
            Err(error) if error.is_not_found() => Ok(Collection::new()),
            Err(error) => Err(error),
        }
    }

    pub fn read_map(&self, id: usize) -> Result<MapBody, StoreError> {
        read_json(&self.paths.data_file(&map_file_name(id)))
    }

    /// Writes the script file only. Nothing loads it until the registry names it.
    pub fn write_plugin(&self, name: &str, code: &str) -> Result<WriteReceipt, StoreError> {
        let path = self.paths.resolve(plugin_script_path(name));
        let receipt = write_text_with_backup(&path, code)?;
        info!(
            plugin = name,
            bytes = receipt.bytes,
            sha256 = %receipt.sha256_hex,
            "store_plugin_script_written"
        );
        Ok(receipt)
    }

    /// A missing registry file reads as an empty registry.
    pub fn read_plugin_registry(&self) -> Result<Vec<PluginEntry>, StoreError> {
        let path = self.paths.resolve(PLUGIN_REGISTRY_PATH);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StoreError::ReadIo { path, source }),
        };
        let document = EmbeddedDataDocument::locate(text, registry_anchor())
            .map_err(|source| StoreError::ReadRegion { path: path.clone(), source })?;
        document
            .parse_data()
            .map_err(|source| StoreError::ReadRegion { path, source })
    }

    /// Rewrites only the `$plugins` literal; every other byte of the file is kept.
    pub fn update_plugin_registry(&self, entries: &[PluginEntry]) -> Result<Commit, StoreError> {
        let path = self.paths.resolve(PLUGIN_REGISTRY_PATH);
        let literal = render_registry_literal(entries).map_err(|source| StoreError::Encode {
            path: path.clone(),
            source,
        })?;

        let text = match fs::read_to_string(&path) {
            Ok(existing) => {
                let mut document = EmbeddedDataDocument::locate(existing, registry_anchor())
                    .map_err(|source| StoreError::ReadRegion { path: path.clone(), source })?;
                document.replace_data(&literal);
                document.into_text()
            }
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                new_registry_text(&literal)
            }
            Err(source) => return Err(StoreError::ReadIo { path, source }),
        };

        let receipt = write_text_with_backup(&path, &text)?;
        info!(
            entries = entries.len(),
            sha256 = %receipt.sha256_hex,
            "store_plugin_registry_committed"
        );
        let version = self.signal_change();
        Ok(Commit { receipt, version })
    }

    pub fn current_version(&self) -> Result<i64, StoreError> {
        VersionCoordinator::new(self.paths.data_file(SYSTEM_FILE_NAME), 1).current()
    }

    fn signal_change(&self) -> Option<i64> {
        match self.signal.bump() {
            Ok(version) => Some(version),
            Err(error) => {
                warn!(error = %error, "version_bump_failed_editor_reload_may_lag");
                None
            }
        }
    }
}
