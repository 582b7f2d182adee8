use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::atomic_io::{write_bytes_with_backup, WriteReceipt};
use super::error::StoreError;

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let raw = fs::read_to_string(path).map_err(|source| StoreError::ReadIo {
        path: path.to_path_buf(),
        source,
    })?;
    // The MZ editor writes a UTF-8 BOM on some platforms.
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(&raw);
    serde_json::from_str(raw).map_err(|source| StoreError::ReadParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Pretty-printed with two-space indentation and every object key-sorted.
///
/// Going through `Value` first gives typed records and free-form records the
/// same layout, so a file never reorders depending on which writer touched it.
pub(crate) fn encode_json<T: Serialize>(path: &Path, value: &T) -> Result<Vec<u8>, StoreError> {
    let encode_error = |source: serde_json::Error| StoreError::Encode {
        path: path.to_path_buf(),
        source,
    };
    let canonical = serde_json::to_value(value).map_err(encode_error)?;
    serde_json::to_vec_pretty(&canonical).map_err(encode_error)
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<WriteReceipt, StoreError> {
    let bytes = encode_json(path, value)?;
    write_bytes_with_backup(path, &bytes)
}

/// Sorted file names directly under `dir`. A missing directory is an empty listing.
pub(crate) fn list_files(dir: &Path, suffix: Option<&str>) -> Result<Vec<String>, StoreError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(dir).map_err(|source| StoreError::ReadIo {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| StoreError::ReadIo {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if let Some(suffix) = suffix {
            if !has_suffix_ignore_case(name, suffix) {
                continue;
            }
        }
        names.push(name.to_string());
    }
    names.sort();
    Ok(names)
}

fn has_suffix_ignore_case(name: &str, suffix: &str) -> bool {
    name.len() >= suffix.len()
        && name.is_char_boundary(name.len() - suffix.len())
        && name[name.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn missing_and_malformed_files_are_read_failures() {
        let temp = TempDir::new().expect("tempdir");
        let missing = temp.path().join("Skills.json");
        let error = read_json::<Value>(&missing).expect_err("missing");
        assert!(error.is_not_found());

        fs::write(&missing, "[null, {").expect("write broken");
        let error = read_json::<Value>(&missing).expect_err("broken");
        assert!(matches!(error, StoreError::ReadParse { .. }));
        assert!(!error.is_not_found());
    }

    #[test]
    fn reads_files_with_byte_order_mark() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("System.json");
        fs::write(&path, "\u{feff}{\"versionId\": 4}").expect("write");
        let value = read_json::<Value>(&path).expect("read");
        assert_eq!(value["versionId"], 4);
    }

    #[test]
    fn written_json_is_pretty_and_key_sorted() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("data").join("Misc.json");
        write_json(&path, &json!({"zeta": 1, "alpha": [1, 2]})).expect("write");
        let text = fs::read_to_string(&path).expect("read");
        assert!(text.contains('\n'));
        assert!(text.find("alpha").expect("alpha") < text.find("zeta").expect("zeta"));
    }

    #[test]
    fn typed_and_free_form_values_share_one_layout() {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Row {
            id: usize,
            name: String,
            animation_id: i32,
        }

        let temp = TempDir::new().expect("tempdir");
        let typed_path = temp.path().join("typed.json");
        let loose_path = temp.path().join("loose.json");
        let row = Row {
            id: 1,
            name: "Potion".to_string(),
            animation_id: 0,
        };
        write_json(&typed_path, &row).expect("typed");
        write_json(&loose_path, &json!({"name": "Potion", "id": 1, "animationId": 0}))
            .expect("loose");

        let typed = fs::read(&typed_path).expect("read typed");
        assert_eq!(typed, fs::read(&loose_path).expect("read loose"));
        assert!(String::from_utf8(typed).expect("utf8").starts_with("{\n  \"animationId\""));
    }

    #[test]
    fn listing_filters_by_suffix_and_tolerates_missing_dir() {
        let temp = TempDir::new().expect("tempdir");
        let dir = temp.path().join("js").join("plugins");
        assert!(list_files(&dir, Some(".js")).expect("missing dir").is_empty());

        fs::create_dir_all(dir.join("nested")).expect("mkdir");
        fs::write(dir.join("Zed.js"), "").expect("write");
        fs::write(dir.join("Alpha.JS"), "").expect("write");
        fs::write(dir.join("readme.txt"), "").expect("write");

        assert_eq!(
            list_files(&dir, Some(".js")).expect("list"),
            vec!["Alpha.JS".to_string(), "Zed.js".to_string()]
        );
        assert_eq!(list_files(&dir, None).expect("list all").len(), 3);
    }
}
