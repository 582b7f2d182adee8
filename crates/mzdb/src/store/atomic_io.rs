use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;

use super::error::StoreError;

const BACKUP_EXTENSION: &str = "bak";
const TEMP_EXTENSION: &str = "tmp";

/// What landed on disk for a single committed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    pub path: PathBuf,
    pub bytes: usize,
    pub sha256_hex: String,
    pub backup_path: Option<PathBuf>,
}

pub(crate) fn write_bytes_with_backup(
    path: &Path,
    bytes: &[u8],
) -> Result<WriteReceipt, StoreError> {
    write_bytes_with_backup_then(path, bytes, || Ok(()))
}

pub(crate) fn write_text_with_backup(path: &Path, text: &str) -> Result<WriteReceipt, StoreError> {
    write_bytes_with_backup(path, text.as_bytes())
}

/// Backup, then replace. `after_backup` runs between the two steps; an error
/// from it aborts the write exactly as a crash at that point would.
pub(crate) fn write_bytes_with_backup_then<F>(
    path: &Path,
    bytes: &[u8],
    after_backup: F,
) -> Result<WriteReceipt, StoreError>
where
    F: FnOnce() -> io::Result<()>,
{
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| StoreError::WriteIo {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let backup_path = backup_existing(path)?;
    after_backup().map_err(|source| StoreError::WriteIo {
        path: path.to_path_buf(),
        source,
    })?;

    let tmp_path = sibling_path(path, TEMP_EXTENSION);
    write_and_sync(&tmp_path, bytes)
        .and_then(|()| fs::rename(&tmp_path, path))
        .map_err(|source| {
            let _ = fs::remove_file(&tmp_path);
            StoreError::WriteIo {
                path: path.to_path_buf(),
                source,
            }
        })?;

    let receipt = WriteReceipt {
        path: path.to_path_buf(),
        bytes: bytes.len(),
        sha256_hex: sha256_hex(bytes),
        backup_path,
    };
    debug!(
        path = %receipt.path.display(),
        bytes = receipt.bytes,
        sha256 = %receipt.sha256_hex,
        backed_up = receipt.backup_path.is_some(),
        "store_file_replaced"
    );
    Ok(receipt)
}

pub fn backup_path_for(path: &Path) -> PathBuf {
    sibling_path(path, BACKUP_EXTENSION)
}

fn backup_existing(path: &Path) -> Result<Option<PathBuf>, StoreError> {
    if !path.is_file() {
        return Ok(None);
    }
    let backup_path = backup_path_for(path);
    fs::copy(path, &backup_path).map_err(|source| StoreError::Backup {
        path: path.to_path_buf(),
        backup_path: backup_path.clone(),
        source,
    })?;
    Ok(Some(backup_path))
}

// The rename is the commit point: readers see either the old file or the
// fully synced new one.
fn write_and_sync(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn sibling_path(path: &Path, extension: &str) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("store");
    let sibling_name = format!("{file_name}.{extension}");
    match path.parent() {
        Some(parent) => parent.join(sibling_name),
        None => PathBuf::from(sibling_name),
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut output = String::with_capacity(digest.len() * 2);
    for byte in digest.iter() {
        use std::fmt::Write as _;
        let _ = write!(&mut output, "{byte:02x}");
    }
    output
}
