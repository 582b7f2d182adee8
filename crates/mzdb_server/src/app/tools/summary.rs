use mzdb::{EntityKind, EntityRecord, ProjectDatabase};
use serde_json::{json, Map, Value};
use tracing::warn;

use super::{ToolError, ToolOutput};

/// Counts are best effort: a missing or unreadable file shows up as `null`
/// with a note instead of failing the whole summary.
pub(super) fn database_summary(
    db: &ProjectDatabase,
    _args: &Value,
) -> Result<ToolOutput, ToolError> {
    let mut counts = Map::new();
    let mut notes = Vec::new();
    for kind in EntityKind::ALL {
        match db.read_collection::<EntityRecord>(kind.file_name()) {
            Ok(collection) => {
                counts.insert(kind.label().to_string(), json!(collection.occupied_count()));
            }
            Err(error) => {
                if !error.is_not_found() {
                    warn!(file = kind.file_name(), error = %error, "summary_collection_unreadable");
                }
                counts.insert(kind.label().to_string(), Value::Null);
                notes.push(format!("{}: {error}", kind.file_name()));
            }
        }
    }

    let maps = match db.read_map_index() {
        Ok(index) => json!(index.present().count()),
        Err(error) => {
            notes.push(format!("map index: {error}"));
            Value::Null
        }
    };
    let plugins = match db.read_plugin_registry() {
        Ok(entries) => json!({
            "registered": entries.len(),
            "enabled": entries.iter().filter(|entry| entry.status).count(),
        }),
        Err(error) => {
            notes.push(format!("plugin registry: {error}"));
            Value::Null
        }
    };
    let version = match db.current_version() {
        Ok(version) => json!(version),
        Err(error) => {
            notes.push(format!("version: {error}"));
            Value::Null
        }
    };

    Ok(ToolOutput::new(
        format!(
            "database summary for {} ({} notes)",
            db.paths().root().display(),
            notes.len()
        ),
        json!({
            "records": counts,
            "maps": maps,
            "plugins": plugins,
            "versionId": version,
            "notes": notes,
        }),
    ))
}
