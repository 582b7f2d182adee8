use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::collection::ValidationError;
use super::embedded::EmbeddedRegionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    Read,
    Write,
    Validation,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read file {path}: {source}")]
    ReadIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("file {path} is not valid json: {source}")]
    ReadParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("file {path} has no usable data region: {source}")]
    ReadRegion {
        path: PathBuf,
        #[source]
        source: EmbeddedRegionError,
    },
    #[error("failed to back up {path} to {backup_path}; target left untouched: {source}")]
    Backup {
        path: PathBuf,
        backup_path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write file {path}: {source}")]
    WriteIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode json for {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path}: {source}")]
    Validation {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },
}

impl StoreError {
    pub fn kind(&self) -> StoreErrorKind {
        match self {
            Self::ReadIo { .. } | Self::ReadParse { .. } | Self::ReadRegion { .. } => {
                StoreErrorKind::Read
            }
            Self::Backup { .. } | Self::WriteIo { .. } | Self::Encode { .. } => {
                StoreErrorKind::Write
            }
            Self::Validation { .. } => StoreErrorKind::Validation,
        }
    }

    /// True when a read failed only because the file does not exist yet.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ReadIo { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }

    pub(crate) fn validation(path: impl Into<PathBuf>, source: ValidationError) -> Self {
        Self::Validation {
            path: path.into(),
            source,
        }
    }
}
