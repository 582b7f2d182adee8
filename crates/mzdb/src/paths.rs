use std::path::{Path, PathBuf};

pub const DATA_DIR: &str = "data";

/// Maps logical in-project paths onto the filesystem.
///
/// Relative paths are joined to the project root; absolute paths pass through
/// unchanged. The engine root, when configured, is only ever used for
/// read-only scans of bundled sample resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    root: PathBuf,
    engine_root: Option<PathBuf>,
}

impl ProjectPaths {
    pub fn new(root: impl Into<PathBuf>, engine_root: Option<PathBuf>) -> Self {
        Self {
            root: root.into(),
            engine_root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn engine_root(&self) -> Option<&Path> {
        self.engine_root.as_deref()
    }

    pub fn resolve(&self, logical: impl AsRef<Path>) -> PathBuf {
        let logical = logical.as_ref();
        if logical.is_absolute() {
            logical.to_path_buf()
        } else {
            self.root.join(logical)
        }
    }

    /// `None` means engine-scoped operations are unavailable, not that they failed.
    pub fn resolve_engine(&self, logical: impl AsRef<Path>) -> Option<PathBuf> {
        let logical = logical.as_ref();
        let engine_root = self.engine_root.as_ref()?;
        if logical.is_absolute() {
            Some(logical.to_path_buf())
        } else {
            Some(engine_root.join(logical))
        }
    }

    pub fn data_file(&self, file_name: &str) -> PathBuf {
        self.root.join(DATA_DIR).join(file_name)
    }
}
