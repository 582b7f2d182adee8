use mzdb::records::is_valid_plugin_name;
use mzdb::{PluginEntry, PluginParameters, ProjectDatabase, ScriptHeader};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::{decode_args, ToolError, ToolOutput};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct InstallArgs {
    name: String,
    code: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    author: String,
    #[serde(default)]
    parameters: PluginParameters,
    #[serde(default = "enabled_by_default")]
    enabled: bool,
}

#[derive(Debug, Deserialize)]
struct ToggleArgs {
    name: String,
    enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

fn read_registry(db: &ProjectDatabase) -> Result<Vec<PluginEntry>, ToolError> {
    db.read_plugin_registry()
        .map_err(|error| ToolError::store("cannot read js/plugins.js", error))
}

pub(super) fn list_plugins(db: &ProjectDatabase, _args: &Value) -> Result<ToolOutput, ToolError> {
    let entries = read_registry(db)?;
    let enabled = entries.iter().filter(|entry| entry.status).count();
    Ok(ToolOutput::new(
        format!("{} plugins registered, {enabled} enabled", entries.len()),
        json!(entries),
    ))
}

pub(super) fn install_plugin(db: &ProjectDatabase, args: &Value) -> Result<ToolOutput, ToolError> {
    let parsed: InstallArgs = decode_args("install_plugin", args)?;
    if !is_valid_plugin_name(&parsed.name) {
        return Err(ToolError::Rejected(format!(
            "plugin name '{}' may only contain letters, digits and underscores",
            parsed.name
        )));
    }
    if parsed.code.trim().is_empty() {
        return Err(ToolError::Rejected("plugin code cannot be empty".to_string()));
    }
    // Parse the registry before touching the script so a broken registry aborts cleanly.
    let mut entries = read_registry(db)?;

    let header = ScriptHeader {
        description: parsed.description.clone(),
        author: parsed.author.clone(),
    };
    let script = header.apply(&parsed.name, &parsed.code);
    let script_receipt = db
        .write_plugin(&parsed.name, &script)
        .map_err(|error| ToolError::store(format!("cannot write plugin {}", parsed.name), error))?;

    let replaced = match entries.iter_mut().find(|existing| existing.name == parsed.name) {
        // Keep editor-only keys and the entry's position in the load order.
        Some(existing) => {
            existing.status = parsed.enabled;
            existing.description = parsed.description.clone();
            existing.parameters = parsed.parameters;
            true
        }
        None => {
            entries.push(PluginEntry {
                parameters: parsed.parameters,
                ..PluginEntry::new(parsed.name.clone(), parsed.enabled, parsed.description.clone())
            });
            false
        }
    };
    let commit = db
        .update_plugin_registry(&entries)
        .map_err(|error| ToolError::store("script written but registry update failed", error))?;

    info!(
        plugin = %parsed.name,
        replaced,
        enabled = parsed.enabled,
        header_added = !ScriptHeader::has_header(&parsed.code),
        "plugin_installed"
    );
    Ok(ToolOutput::new(
        format!(
            "{} plugin {}",
            if replaced { "updated" } else { "installed" },
            parsed.name
        ),
        json!({
            "name": parsed.name,
            "file": script_receipt.path.display().to_string(),
            "sha256": script_receipt.sha256_hex,
            "replaced": replaced,
            "versionId": commit.version,
        }),
    ))
}

pub(super) fn set_plugin_enabled(
    db: &ProjectDatabase,
    args: &Value,
) -> Result<ToolOutput, ToolError> {
    let parsed: ToggleArgs = decode_args("set_plugin_enabled", args)?;
    let mut entries = read_registry(db)?;
    let entry = entries
        .iter_mut()
        .find(|entry| entry.name == parsed.name)
        .ok_or_else(|| ToolError::Rejected(format!("plugin {} is not registered", parsed.name)))?;
    let previous = entry.status;
    entry.status = parsed.enabled;

    let commit = db
        .update_plugin_registry(&entries)
        .map_err(|error| ToolError::store("cannot update js/plugins.js", error))?;
    info!(plugin = %parsed.name, previous, enabled = parsed.enabled, "plugin_toggled");
    Ok(ToolOutput::new(
        format!(
            "plugin {} {}",
            parsed.name,
            if parsed.enabled { "enabled" } else { "disabled" }
        ),
        json!({"name": parsed.name, "enabled": parsed.enabled, "versionId": commit.version}),
    ))
}
