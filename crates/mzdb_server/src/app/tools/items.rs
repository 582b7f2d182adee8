use mzdb::{Effect, EffectCode, EntityKind, Item, ProjectDatabase};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::entities::read_for_update;
use super::{decode_args, ToolError, ToolOutput};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct CreateItemArgs {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    price: i64,
    #[serde(default)]
    icon_index: i32,
    consumable: Option<bool>,
    scope: Option<i32>,
    #[serde(default)]
    note: String,
    hp_recovery_percent: Option<f64>,
    hp_recovery_flat: Option<f64>,
    mp_recovery_percent: Option<f64>,
    mp_recovery_flat: Option<f64>,
    tp_gain: Option<f64>,
    add_state_id: Option<i32>,
    remove_state_id: Option<i32>,
    common_event_id: Option<i32>,
}

impl CreateItemArgs {
    fn effects(&self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Some(effect) = recovery(
            EffectCode::RecoverHp,
            self.hp_recovery_percent,
            self.hp_recovery_flat,
        ) {
            effects.push(effect);
        }
        if let Some(effect) = recovery(
            EffectCode::RecoverMp,
            self.mp_recovery_percent,
            self.mp_recovery_flat,
        ) {
            effects.push(effect);
        }
        if let Some(amount) = self.tp_gain {
            effects.push(Effect::new(EffectCode::GainTp, 0, amount, 0.0));
        }
        if let Some(state_id) = self.add_state_id {
            effects.push(Effect::new(EffectCode::AddState, state_id, 1.0, 0.0));
        }
        if let Some(state_id) = self.remove_state_id {
            effects.push(Effect::new(EffectCode::RemoveState, state_id, 1.0, 0.0));
        }
        if let Some(event_id) = self.common_event_id {
            effects.push(Effect::new(EffectCode::CommonEvent, event_id, 0.0, 0.0));
        }
        effects
    }

    fn validate(&self) -> Result<(), ToolError> {
        if self.name.trim().is_empty() {
            return Err(ToolError::Rejected("item name cannot be empty".to_string()));
        }
        if self.price < 0 {
            return Err(ToolError::Rejected(format!(
                "price {} cannot be negative",
                self.price
            )));
        }
        for (field, value) in [
            ("hpRecoveryPercent", self.hp_recovery_percent),
            ("mpRecoveryPercent", self.mp_recovery_percent),
        ] {
            if let Some(percent) = value {
                if !(0.0..=100.0).contains(&percent) {
                    return Err(ToolError::Rejected(format!(
                        "{field} must be within 0..=100, got {percent}"
                    )));
                }
            }
        }
        for (field, value) in [
            ("addStateId", self.add_state_id),
            ("removeStateId", self.remove_state_id),
            ("commonEventId", self.common_event_id),
        ] {
            if matches!(value, Some(id) if id < 1) {
                return Err(ToolError::Rejected(format!("{field} must be a positive id")));
            }
        }
        Ok(())
    }
}

// Percent and flat amounts share one effect: value1 is the rate, value2 the flat part.
fn recovery(code: EffectCode, percent: Option<f64>, flat: Option<f64>) -> Option<Effect> {
    if percent.is_none() && flat.is_none() {
        return None;
    }
    Some(Effect::new(
        code,
        0,
        percent.unwrap_or(0.0) / 100.0,
        flat.unwrap_or(0.0),
    ))
}

pub(super) fn create_item(db: &ProjectDatabase, args: &Value) -> Result<ToolOutput, ToolError> {
    let parsed: CreateItemArgs = decode_args("create_item", args)?;
    parsed.validate()?;

    let mut items = read_for_update::<Item>(db, EntityKind::Item)?;
    let defaults = Item::default();
    let item = Item {
        name: parsed.name.trim().to_string(),
        description: parsed.description.clone(),
        price: parsed.price,
        icon_index: parsed.icon_index,
        consumable: parsed.consumable.unwrap_or(defaults.consumable),
        scope: parsed.scope.unwrap_or(defaults.scope),
        note: parsed.note.clone(),
        effects: parsed.effects(),
        ..defaults
    };
    let id = items
        .append(item)
        .map_err(|error| ToolError::Rejected(error.to_string()))?;
    let commit = db
        .write_collection(EntityKind::Item.file_name(), &items)
        .map_err(|error| ToolError::store("cannot save new item", error))?;

    let created = items
        .get(id)
        .ok_or_else(|| ToolError::Rejected(format!("item {id} vanished after append")))?;
    info!(
        id,
        effects = created.effects.len(),
        version = ?commit.version,
        "item_created"
    );
    Ok(ToolOutput::new(
        format!("created item {id} '{}'", created.name),
        json!({
            "id": id,
            "effects": created.effects,
            "versionId": commit.version,
        }),
    ))
}
