use mzdb::store::MAX_COLLECTION_LEN;
use mzdb::{Collection, EntityKind, EntityRecord, ProjectDatabase, Record, StoreErrorKind};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::info;

use super::{decode_args, parse_kind, ToolError, ToolOutput};

#[derive(Debug, Deserialize)]
struct KindArgs {
    kind: String,
}

#[derive(Debug, Deserialize)]
struct GetArgs {
    kind: String,
    id: usize,
}

#[derive(Debug, Deserialize)]
struct CreateArgs {
    kind: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct UpdateArgs {
    kind: String,
    id: usize,
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ResizeArgs {
    kind: String,
    max: usize,
}

pub(super) fn list_entities(db: &ProjectDatabase, args: &Value) -> Result<ToolOutput, ToolError> {
    let parsed: KindArgs = decode_args("list_entities", args)?;
    let kind = parse_kind("list_entities", &parsed.kind)?;
    let collection = match db.read_collection::<EntityRecord>(kind.file_name()) {
        Ok(collection) => collection,
        Err(error) if error.is_not_found() => {
            return Ok(ToolOutput::new(
                format!("{} does not exist yet; no {kind} records", kind.file_name()),
                json!({"kind": kind.label(), "max": 0, "records": []}),
            ));
        }
        Err(error) => {
            return Err(ToolError::store(format!("cannot list {kind} records"), error));
        }
    };

    let records = collection
        .occupied()
        .map(|record| json!({"id": record.id(), "name": record.name()}))
        .collect::<Vec<_>>();
    Ok(ToolOutput::new(
        format!("{} {kind} records", records.len()),
        json!({
            "kind": kind.label(),
            "max": collection.len().saturating_sub(1),
            "records": records,
        }),
    ))
}

pub(super) fn get_entity(db: &ProjectDatabase, args: &Value) -> Result<ToolOutput, ToolError> {
    let parsed: GetArgs = decode_args("get_entity", args)?;
    let kind = parse_kind("get_entity", &parsed.kind)?;
    let collection = db
        .read_collection::<EntityRecord>(kind.file_name())
        .map_err(|error| ToolError::store(format!("cannot read {kind} records"), error))?;
    let record = collection
        .get(parsed.id)
        .ok_or_else(|| ToolError::Rejected(format!("{kind} {} does not exist", parsed.id)))?;
    Ok(ToolOutput::new(
        format!("{kind} {} '{}'", parsed.id, record.name()),
        record.clone().into_value(),
    ))
}

pub(super) fn create_entity(db: &ProjectDatabase, args: &Value) -> Result<ToolOutput, ToolError> {
    let parsed: CreateArgs = decode_args("create_entity", args)?;
    let kind = parse_kind("create_entity", &parsed.kind)?;
    let name = parsed
        .fields
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or("");
    if name.is_empty() {
        return Err(ToolError::Rejected(format!(
            "a new {kind} needs a non-empty fields.name"
        )));
    }

    let mut collection = read_for_update::<EntityRecord>(db, kind)?;
    let mut record = kind.blank_record();
    record.merge(&parsed.fields);
    let id = collection
        .append(record)
        .map_err(|error| ToolError::Rejected(error.to_string()))?;
    let commit = db
        .write_collection(kind.file_name(), &collection)
        .map_err(|error| ToolError::store(format!("cannot save new {kind}"), error))?;

    info!(kind = kind.label(), id, version = ?commit.version, "entity_created");
    let created = collection.get(id).cloned().unwrap_or_default();
    Ok(ToolOutput::new(
        format!("created {kind} {id} '{}'", created.name()),
        json!({"id": id, "record": created.into_value(), "versionId": commit.version}),
    ))
}

pub(super) fn update_entity(db: &ProjectDatabase, args: &Value) -> Result<ToolOutput, ToolError> {
    let parsed: UpdateArgs = decode_args("update_entity", args)?;
    let kind = parse_kind("update_entity", &parsed.kind)?;
    if let Some(id_value) = parsed.fields.get("id") {
        if id_value.as_u64() != Some(parsed.id as u64) {
            return Err(ToolError::Rejected(
                "fields.id cannot change; a record's id is its position".to_string(),
            ));
        }
    }
    if parsed.fields.is_empty() {
        return Err(ToolError::Rejected("fields must name at least one field".to_string()));
    }

    let mut collection = read_for_update::<EntityRecord>(db, kind)?;
    let record = collection
        .get_mut(parsed.id)
        .ok_or_else(|| ToolError::Rejected(format!("{kind} {} does not exist", parsed.id)))?;
    record.merge(&parsed.fields);
    let commit = db
        .write_collection(kind.file_name(), &collection)
        .map_err(|error| ToolError::store(format!("cannot save {kind} {}", parsed.id), error))?;

    let updated = parsed.fields.keys().cloned().collect::<Vec<_>>();
    info!(kind = kind.label(), id = parsed.id, fields = ?updated, "entity_updated");
    Ok(ToolOutput::new(
        format!("updated {kind} {} ({} fields)", parsed.id, updated.len()),
        json!({"id": parsed.id, "updatedFields": updated, "versionId": commit.version}),
    ))
}

pub(super) fn resize_collection(
    db: &ProjectDatabase,
    args: &Value,
) -> Result<ToolOutput, ToolError> {
    let parsed: ResizeArgs = decode_args("resize_collection", args)?;
    let kind = parse_kind("resize_collection", &parsed.kind)?;
    let new_len = parsed.max.checked_add(1).ok_or_else(|| {
        ToolError::Rejected(format!(
            "max {} is out of range 1..{MAX_COLLECTION_LEN}",
            parsed.max
        ))
    })?;
    let mut collection = read_for_update::<EntityRecord>(db, kind)?;
    let previous_max = collection.len().saturating_sub(1);

    collection
        .resize_with(new_len, |_| kind.blank_record())
        .map_err(|error| ToolError::Rejected(format!("cannot resize {kind} records: {error}")))?;
    let commit = db
        .write_collection(kind.file_name(), &collection)
        .map_err(|error| ToolError::store(format!("cannot save resized {kind} records"), error))?;

    info!(kind = kind.label(), previous_max, max = parsed.max, "collection_resized");
    Ok(ToolOutput::new(
        format!("{kind} maximum changed from {previous_max} to {}", parsed.max),
        json!({"previousMax": previous_max, "max": parsed.max, "versionId": commit.version}),
    ))
}

pub(super) fn read_for_update<T>(
    db: &ProjectDatabase,
    kind: EntityKind,
) -> Result<Collection<T>, ToolError>
where
    T: Record + DeserializeOwned,
{
    db.read_collection_for_update::<T>(kind.file_name())
        .map_err(|error| {
            let file = kind.file_name();
            let context = match error.kind() {
                StoreErrorKind::Read if error.is_not_found() => {
                    format!("{file} is missing; open the project in the editor once")
                }
                StoreErrorKind::Validation => format!("{file} is in a corrupt state"),
                _ => format!("cannot load {file} for update"),
            };
            ToolError::store(context, error)
        })
}
