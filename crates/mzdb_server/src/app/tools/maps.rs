use mzdb::records::MAX_MAP_DIMENSION;
use mzdb::{MapBody, MapInfo, ProjectDatabase, StoreError};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::{decode_args, ToolError, ToolOutput};

#[derive(Debug, Deserialize)]
struct GetMapArgs {
    id: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct CreateMapArgs {
    name: String,
    width: u32,
    height: u32,
    #[serde(default = "default_tileset")]
    tileset_id: i32,
    #[serde(default)]
    parent_id: usize,
    #[serde(default)]
    display_name: String,
}

fn default_tileset() -> i32 {
    1
}

fn index_read_error(error: StoreError) -> ToolError {
    ToolError::store("cannot read map index", error)
}

pub(super) fn list_maps(db: &ProjectDatabase, _args: &Value) -> Result<ToolOutput, ToolError> {
    let index = db.read_map_index().map_err(index_read_error)?;
    let maps = index
        .present()
        .map(|info| {
            json!({
                "id": info.id,
                "name": info.name,
                "parentId": info.parent_id,
                "order": info.order,
            })
        })
        .collect::<Vec<_>>();
    Ok(ToolOutput::new(format!("{} maps", maps.len()), Value::Array(maps)))
}

pub(super) fn get_map(db: &ProjectDatabase, args: &Value) -> Result<ToolOutput, ToolError> {
    let parsed: GetMapArgs = decode_args("get_map", args)?;
    let index = db.read_map_index().map_err(index_read_error)?;
    let info = index
        .get(parsed.id)
        .ok_or_else(|| ToolError::Rejected(format!("map {} is not in the map index", parsed.id)))?;
    let body = db
        .read_map(parsed.id)
        .map_err(|error| ToolError::store(format!("cannot read map {}", parsed.id), error))?;
    Ok(ToolOutput::new(
        format!("map {} '{}' ({}x{})", parsed.id, info.name, body.width, body.height),
        json!({
            "id": parsed.id,
            "name": info.name,
            "displayName": body.display_name,
            "width": body.width,
            "height": body.height,
            "tilesetId": body.tileset_id,
            "events": body.event_count(),
        }),
    ))
}

pub(super) fn create_map(db: &ProjectDatabase, args: &Value) -> Result<ToolOutput, ToolError> {
    let parsed: CreateMapArgs = decode_args("create_map", args)?;
    let name = parsed.name.trim();
    if name.is_empty() {
        return Err(ToolError::Rejected("map name cannot be empty".to_string()));
    }
    for (field, value) in [("width", parsed.width), ("height", parsed.height)] {
        if value == 0 || value > MAX_MAP_DIMENSION {
            return Err(ToolError::Rejected(format!(
                "{field} must be within 1..={MAX_MAP_DIMENSION}, got {value}"
            )));
        }
    }

    let index = db.read_map_index().map_err(index_read_error)?;
    if parsed.parent_id != 0 && index.get(parsed.parent_id).is_none() {
        return Err(ToolError::Rejected(format!(
            "parent map {} does not exist",
            parsed.parent_id
        )));
    }
    let id = index.max_present_id() + 1;
    let order = index.present().map(|info| info.order).max().unwrap_or(0) + 1;

    let mut body = MapBody::blank(parsed.width, parsed.height, parsed.tileset_id);
    body.display_name = parsed.display_name.clone();
    let entry = MapInfo {
        id,
        expanded: false,
        name: name.to_string(),
        order,
        parent_id: parsed.parent_id,
        scroll_x: 0.0,
        scroll_y: 0.0,
    };

    let commit = db
        .write_map(id, &body, entry)
        .map_err(|error| ToolError::store(format!("cannot create map {id}"), error))?;
    info!(
        map_id = id,
        order,
        parent_id = parsed.parent_id,
        version = ?commit.version,
        "map_created"
    );
    Ok(ToolOutput::new(
        format!("created map {id} '{name}' ({}x{})", parsed.width, parsed.height),
        json!({
            "id": id,
            "order": order,
            "file": commit.body.path.display().to_string(),
            "versionId": commit.version,
        }),
    ))
}
