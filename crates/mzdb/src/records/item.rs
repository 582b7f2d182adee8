use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::store::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectCode {
    RecoverHp,
    RecoverMp,
    GainTp,
    AddState,
    RemoveState,
    AddBuff,
    AddDebuff,
    RemoveBuff,
    RemoveDebuff,
    Special,
    Grow,
    LearnSkill,
    CommonEvent,
}

impl EffectCode {
    pub fn code(self) -> i32 {
        match self {
            Self::RecoverHp => 11,
            Self::RecoverMp => 12,
            Self::GainTp => 13,
            Self::AddState => 21,
            Self::RemoveState => 22,
            Self::AddBuff => 31,
            Self::AddDebuff => 32,
            Self::RemoveBuff => 33,
            Self::RemoveDebuff => 34,
            Self::Special => 41,
            Self::Grow => 42,
            Self::LearnSkill => 43,
            Self::CommonEvent => 44,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            11 => Self::RecoverHp,
            12 => Self::RecoverMp,
            13 => Self::GainTp,
            21 => Self::AddState,
            22 => Self::RemoveState,
            31 => Self::AddBuff,
            32 => Self::AddDebuff,
            33 => Self::RemoveBuff,
            34 => Self::RemoveDebuff,
            41 => Self::Special,
            42 => Self::Grow,
            43 => Self::LearnSkill,
            44 => Self::CommonEvent,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Effect {
    pub code: i32,
    pub data_id: i32,
    pub value1: f64,
    pub value2: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Effect {
    pub fn new(code: EffectCode, data_id: i32, value1: f64, value2: f64) -> Self {
        Self {
            code: code.code(),
            data_id,
            value1,
            value2,
            extra: Map::new(),
        }
    }

    pub fn effect_code(&self) -> Option<EffectCode> {
        EffectCode::from_code(self.code)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Damage {
    pub critical: bool,
    pub element_id: i32,
    pub formula: String,
    #[serde(rename = "type")]
    pub kind: i32,
    pub variance: i32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Damage {
    fn default() -> Self {
        Self {
            critical: false,
            element_id: 0,
            formula: "0".to_string(),
            kind: 0,
            variance: 20,
            extra: Map::new(),
        }
    }
}

/// An entry of `Items.json`. Fields the model does not name are carried in
/// `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Item {
    pub id: usize,
    pub animation_id: i32,
    pub consumable: bool,
    pub damage: Damage,
    pub description: String,
    pub effects: Vec<Effect>,
    pub hit_type: i32,
    pub icon_index: i32,
    pub itype_id: i32,
    pub name: String,
    pub note: String,
    pub occasion: i32,
    pub price: i64,
    pub repeats: i32,
    pub scope: i32,
    pub speed: i32,
    pub success_rate: i32,
    pub tp_gain: i32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Item {
    fn default() -> Self {
        Self {
            id: 0,
            animation_id: 0,
            consumable: true,
            damage: Damage::default(),
            description: String::new(),
            effects: Vec::new(),
            hit_type: 0,
            icon_index: 0,
            itype_id: 1,
            name: String::new(),
            note: String::new(),
            occasion: 0,
            price: 0,
            repeats: 1,
            scope: 7,
            speed: 0,
            success_rate: 100,
            tp_gain: 0,
            extra: Map::new(),
        }
    }
}

impl Item {
    pub fn effects_with(&self, code: EffectCode) -> impl Iterator<Item = &Effect> {
        self.effects
            .iter()
            .filter(move |effect| effect.code == code.code())
    }
}

impl Record for Item {
    fn id(&self) -> Option<usize> {
        Some(self.id)
    }

    fn set_id(&mut self, id: usize) {
        self.id = id;
    }

    fn is_blank(&self) -> bool {
        self.name.trim().is_empty()
    }

    fn matches_template(&self, template: &Self) -> bool {
        self == template
    }
}
