use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

mod paths;
pub mod records;
pub mod store;

pub use paths::ProjectPaths;
pub use records::{
    map_file_name, AudioFile, Damage, Effect, EffectCode, EntityKind, EntityRecord, Item, MapBody,
    MapInfo, PluginEntry, PluginParameters, ScriptHeader,
};
pub use store::{
    ChangeSignal, Collection, Commit, EmbeddedDataDocument, EmbeddedRegionError, MapCommit,
    ProjectDatabase, Record, Slot, StoreError, StoreErrorKind, ValidationError,
    VersionCoordinator, WriteReceipt,
};

pub const PROJECT_ROOT_ENV_VAR: &str = "MZDB_PROJECT_ROOT";
pub const ENGINE_ROOT_ENV_VAR: &str = "MZDB_ENGINE_ROOT";

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error(
        "No project root configured.\n\
Pass --project <dir> or set {env_var}, for example:\n\
PowerShell: $env:{env_var}=\"C:\\path\\to\\MyGame\"\n\
Bash/zsh: export {env_var}=\"/path/to/MyGame\""
    )]
    ProjectRootMissing { env_var: &'static str },
    #[error(
        "project root does not look like an RPG Maker MZ project: {path}\n\
A valid root must contain a data/ directory."
    )]
    InvalidProjectRoot { path: PathBuf },
    #[error("engine root is not a directory: {path}")]
    InvalidEngineRoot { path: PathBuf },
}

/// Resolves the project and engine roots. Explicit arguments win over the
/// environment; the engine root stays optional throughout.
pub fn resolve_project_paths(
    project_override: Option<PathBuf>,
    engine_override: Option<PathBuf>,
) -> Result<ProjectPaths, StartupError> {
    let root = match project_override {
        Some(path) => path,
        None => read_env_path(PROJECT_ROOT_ENV_VAR)?.ok_or(StartupError::ProjectRootMissing {
            env_var: PROJECT_ROOT_ENV_VAR,
        })?,
    };
    let root = normalize_path(&root);
    if !is_project_marker(&root) {
        return Err(StartupError::InvalidProjectRoot { path: root });
    }

    let engine_root = match engine_override {
        Some(path) => Some(path),
        None => read_env_path(ENGINE_ROOT_ENV_VAR)?,
    };
    let engine_root = match engine_root {
        Some(path) => {
            let normalized = normalize_path(&path);
            if !normalized.is_dir() {
                return Err(StartupError::InvalidEngineRoot { path: normalized });
            }
            Some(normalized)
        }
        None => None,
    };

    Ok(ProjectPaths::new(root, engine_root))
}

fn read_env_path(var: &'static str) -> Result<Option<PathBuf>, StartupError> {
    match env::var(var) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(PathBuf::from(value))),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(source) => Err(StartupError::EnvVar { var, source }),
    }
}

fn is_project_marker(path: &Path) -> bool {
    path.join("data").is_dir()
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn project_marker_requires_data_dir() {
        let temp = TempDir::new().expect("tempdir");
        assert!(!is_project_marker(temp.path()));
        fs::create_dir_all(temp.path().join("data")).expect("mkdir data");
        assert!(is_project_marker(temp.path()));
    }

    #[test]
    fn explicit_roots_are_validated() {
        let temp = TempDir::new().expect("tempdir");
        let error = resolve_project_paths(Some(temp.path().to_path_buf()), None)
            .expect_err("no data dir");
        assert!(matches!(error, StartupError::InvalidProjectRoot { .. }));

        fs::create_dir_all(temp.path().join("data")).expect("mkdir data");
        let missing_engine = temp.path().join("no_engine_here");
        let error = resolve_project_paths(Some(temp.path().to_path_buf()), Some(missing_engine))
            .expect_err("engine root missing");
        assert!(matches!(error, StartupError::InvalidEngineRoot { .. }));

        let paths = resolve_project_paths(
            Some(temp.path().to_path_buf()),
            Some(temp.path().to_path_buf()),
        )
        .expect("resolve");
        assert!(paths.engine_root().is_some());
    }
}
