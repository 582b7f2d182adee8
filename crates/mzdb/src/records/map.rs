use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::store::Record;

/// Tile layers, shadow layer and region layer per map cell.
pub const MAP_LAYER_COUNT: usize = 6;
pub const MAP_INDEX_FILE_NAME: &str = "MapInfos.json";
pub const MAX_MAP_DIMENSION: u32 = 256;

pub fn map_file_name(id: usize) -> String {
    format!("Map{id:03}.json")
}

/// Descriptor row of `MapInfos.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapInfo {
    pub id: usize,
    #[serde(default)]
    pub expanded: bool,
    pub name: String,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub parent_id: usize,
    #[serde(default)]
    pub scroll_x: f64,
    #[serde(default)]
    pub scroll_y: f64,
}

impl Record for MapInfo {
    fn id(&self) -> Option<usize> {
        Some(self.id)
    }

    fn set_id(&mut self, id: usize) {
        self.id = id;
    }

    // An indexed map always has a body file behind it.
    fn is_blank(&self) -> bool {
        false
    }

    fn matches_template(&self, _template: &Self) -> bool {
        false
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioFile {
    pub name: String,
    pub pan: i32,
    pub pitch: i32,
    pub volume: i32,
}

impl Default for AudioFile {
    fn default() -> Self {
        Self {
            name: String::new(),
            pan: 0,
            pitch: 100,
            volume: 90,
        }
    }
}

/// Contents of one `MapNNN.json` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapBody {
    pub autoplay_bgm: bool,
    pub autoplay_bgs: bool,
    pub battleback1_name: String,
    pub battleback2_name: String,
    pub bgm: AudioFile,
    pub bgs: AudioFile,
    pub disable_dashing: bool,
    pub display_name: String,
    pub encounter_list: Vec<Value>,
    pub encounter_step: i32,
    pub height: u32,
    pub note: String,
    pub parallax_loop_x: bool,
    pub parallax_loop_y: bool,
    pub parallax_name: String,
    pub parallax_show: bool,
    pub parallax_sx: i32,
    pub parallax_sy: i32,
    pub scroll_type: i32,
    pub specify_battleback: bool,
    pub tileset_id: i32,
    pub width: u32,
    pub data: Vec<i64>,
    pub events: Vec<Option<Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for MapBody {
    fn default() -> Self {
        Self::blank(0, 0, 1)
    }
}

impl MapBody {
    /// An empty map: every layer of every cell is tile 0 and the event list
    /// holds only the reserved slot.
    pub fn blank(width: u32, height: u32, tileset_id: i32) -> Self {
        let cells = width as usize * height as usize * MAP_LAYER_COUNT;
        Self {
            autoplay_bgm: false,
            autoplay_bgs: false,
            battleback1_name: String::new(),
            battleback2_name: String::new(),
            bgm: AudioFile::default(),
            bgs: AudioFile::default(),
            disable_dashing: false,
            display_name: String::new(),
            encounter_list: Vec::new(),
            encounter_step: 30,
            height,
            note: String::new(),
            parallax_loop_x: false,
            parallax_loop_y: false,
            parallax_name: String::new(),
            parallax_show: true,
            parallax_sx: 0,
            parallax_sy: 0,
            scroll_type: 0,
            specify_battleback: false,
            tileset_id,
            width,
            data: vec![0; cells],
            events: vec![None],
            extra: Map::new(),
        }
    }

    pub fn event_count(&self) -> usize {
        self.events.iter().filter(|event| event.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_are_zero_padded() {
        assert_eq!(map_file_name(1), "Map001.json");
        assert_eq!(map_file_name(42), "Map042.json");
        assert_eq!(map_file_name(1234), "Map1234.json");
    }

    #[test]
    fn blank_body_has_one_zero_per_layer_cell() {
        let body = MapBody::blank(20, 15, 1);
        assert_eq!(body.data.len(), 20 * 15 * 6);
        assert!(body.data.iter().all(|tile| *tile == 0));
        assert_eq!(body.event_count(), 0);

        let encoded = serde_json::to_value(&body).expect("encode");
        assert_eq!(encoded["events"], serde_json::json!([null]));
        assert_eq!(encoded["battleback1Name"], "");
        assert_eq!(encoded["tilesetId"], 1);
    }
}
