use std::fmt;

use serde_json::{json, Value};

use super::entity::EntityRecord;

const PARAM_COUNT: usize = 8;
const CLASS_MAX_LEVEL: usize = 99;

/// The flat database collections, one JSON array file each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Actor,
    Class,
    Skill,
    Item,
    Weapon,
    Armor,
    Enemy,
    State,
}

impl EntityKind {
    pub const ALL: [EntityKind; 8] = [
        Self::Actor,
        Self::Class,
        Self::Skill,
        Self::Item,
        Self::Weapon,
        Self::Armor,
        Self::Enemy,
        Self::State,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Actor => "Actors.json",
            Self::Class => "Classes.json",
            Self::Skill => "Skills.json",
            Self::Item => "Items.json",
            Self::Weapon => "Weapons.json",
            Self::Armor => "Armors.json",
            Self::Enemy => "Enemies.json",
            Self::State => "States.json",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Actor => "actor",
            Self::Class => "class",
            Self::Skill => "skill",
            Self::Item => "item",
            Self::Weapon => "weapon",
            Self::Armor => "armor",
            Self::Enemy => "enemy",
            Self::State => "state",
        }
    }

    /// Accepts singular or plural labels in any case.
    pub fn parse(raw: &str) -> Option<Self> {
        let lower = raw.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|kind| {
            lower == kind.label()
                || lower == kind.plural()
                || lower == kind.file_name().to_ascii_lowercase()
        })
    }

    fn plural(self) -> &'static str {
        match self {
            Self::Actor => "actors",
            Self::Class => "classes",
            Self::Skill => "skills",
            Self::Item => "items",
            Self::Weapon => "weapons",
            Self::Armor => "armors",
            Self::Enemy => "enemies",
            Self::State => "states",
        }
    }

    /// The record the editor produces for a fresh slot.
    pub fn blank_record(self) -> EntityRecord {
        let value = match self {
            Self::Actor => json!({
                "battlerName": "",
                "characterIndex": 0,
                "characterName": "",
                "classId": 1,
                "equips": [0, 0, 0, 0, 0],
                "faceIndex": 0,
                "faceName": "",
                "traits": [],
                "initialLevel": 1,
                "maxLevel": 99,
                "name": "",
                "nickname": "",
                "note": "",
                "profile": ""
            }),
            Self::Class => json!({
                "expParams": [30, 20, 30, 30],
                "traits": [
                    {"code": 23, "dataId": 0, "value": 1},
                    {"code": 22, "dataId": 0, "value": 0.95},
                    {"code": 22, "dataId": 1, "value": 0.05},
                    {"code": 22, "dataId": 2, "value": 0.04},
                    {"code": 41, "dataId": 1, "value": 1}
                ],
                "learnings": [],
                "name": "",
                "note": "",
                "params": default_class_params()
            }),
            Self::Skill => json!({
                "animationId": -1,
                "damage": {"critical": false, "elementId": -1, "formula": "0", "type": 0, "variance": 20},
                "description": "",
                "effects": [],
                "hitType": 0,
                "iconIndex": 0,
                "message1": "",
                "message2": "",
                "messageType": 1,
                "mpCost": 0,
                "name": "",
                "note": "",
                "occasion": 0,
                "repeats": 1,
                "requiredWtypeId1": 0,
                "requiredWtypeId2": 0,
                "scope": 1,
                "speed": 0,
                "stypeId": 1,
                "successRate": 100,
                "tpCost": 0,
                "tpGain": 0
            }),
            Self::Item => json!({
                "animationId": 0,
                "consumable": true,
                "damage": {"critical": false, "elementId": 0, "formula": "0", "type": 0, "variance": 20},
                "description": "",
                "effects": [],
                "hitType": 0,
                "iconIndex": 0,
                "itypeId": 1,
                "name": "",
                "note": "",
                "occasion": 0,
                "price": 0,
                "repeats": 1,
                "scope": 7,
                "speed": 0,
                "successRate": 100,
                "tpGain": 0
            }),
            Self::Weapon => json!({
                "animationId": 1,
                "description": "",
                "etypeId": 1,
                "traits": [
                    {"code": 31, "dataId": 1, "value": 0},
                    {"code": 22, "dataId": 0, "value": 0}
                ],
                "iconIndex": 0,
                "name": "",
                "note": "",
                "params": [0, 0, 0, 0, 0, 0, 0, 0],
                "price": 0,
                "wtypeId": 0
            }),
            Self::Armor => json!({
                "atypeId": 0,
                "description": "",
                "etypeId": 2,
                "traits": [{"code": 22, "dataId": 1, "value": 0}],
                "iconIndex": 0,
                "name": "",
                "note": "",
                "params": [0, 0, 0, 0, 0, 0, 0, 0],
                "price": 0
            }),
            Self::Enemy => json!({
                "actions": [
                    {"conditionParam1": 0, "conditionParam2": 0, "conditionType": 0, "rating": 5, "skillId": 1}
                ],
                "battlerHue": 0,
                "battlerName": "",
                "dropItems": [
                    {"dataId": 1, "denominator": 1, "kind": 0},
                    {"dataId": 1, "denominator": 1, "kind": 0},
                    {"dataId": 1, "denominator": 1, "kind": 0}
                ],
                "exp": 0,
                "traits": [
                    {"code": 22, "dataId": 0, "value": 0.95},
                    {"code": 22, "dataId": 1, "value": 0.05},
                    {"code": 31, "dataId": 1, "value": 0}
                ],
                "gold": 0,
                "name": "",
                "note": "",
                "params": [100, 0, 10, 10, 10, 10, 10, 10]
            }),
            Self::State => json!({
                "autoRemovalTiming": 0,
                "chanceByDamage": 100,
                "iconIndex": 0,
                "maxTurns": 1,
                "message1": "",
                "message2": "",
                "message3": "",
                "message4": "",
                "messageType": 1,
                "minTurns": 1,
                "motion": 0,
                "name": "",
                "note": "",
                "overlay": 0,
                "priority": 50,
                "releaseByDamage": false,
                "removeAtBattleEnd": false,
                "removeByDamage": false,
                "removeByRestriction": false,
                "removeByWalking": false,
                "restriction": 0,
                "stepsToRemove": 100,
                "traits": []
            }),
        };
        match value {
            Value::Object(fields) => EntityRecord::from_map(fields),
            _ => EntityRecord::default(),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// Linear growth curves; level 1 sits at index 1, index 0 mirrors it.
fn default_class_params() -> Vec<Vec<i64>> {
    const BASE: [i64; PARAM_COUNT] = [450, 90, 16, 16, 16, 16, 16, 16];
    const GROWTH: [i64; PARAM_COUNT] = [50, 8, 3, 3, 3, 3, 3, 3];
    (0..PARAM_COUNT)
        .map(|param| {
            (0..=CLASS_MAX_LEVEL)
                .map(|level| BASE[param] + GROWTH[param] * (level.max(1) as i64 - 1))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::store::Record;

    use super::*;

    #[test]
    fn parse_accepts_labels_plurals_and_file_names() {
        assert_eq!(EntityKind::parse("Item"), Some(EntityKind::Item));
        assert_eq!(EntityKind::parse("enemies"), Some(EntityKind::Enemy));
        assert_eq!(EntityKind::parse("Classes.json"), Some(EntityKind::Class));
        assert_eq!(EntityKind::parse("tilesets"), None);
    }

    #[test]
    fn blank_records_are_blank_and_unnumbered() {
        for kind in EntityKind::ALL {
            let record = kind.blank_record();
            assert!(record.is_blank(), "{kind} template should be blank");
            assert_eq!(record.id(), None);
            assert!(record.get("note").is_some(), "{kind} template needs a note");
        }
    }

    #[test]
    fn class_params_cover_every_level() {
        let params = default_class_params();
        assert_eq!(params.len(), PARAM_COUNT);
        assert!(params.iter().all(|curve| curve.len() == CLASS_MAX_LEVEL + 1));
        assert_eq!(params[0][1], 450);
        assert_eq!(params[0][2], 500);
    }
}
