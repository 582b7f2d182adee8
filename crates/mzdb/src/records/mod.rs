mod entity;
mod item;
mod kinds;
mod map;
mod plugin;

pub use entity::EntityRecord;
pub use item::{Damage, Effect, EffectCode, Item};
pub use kinds::EntityKind;
pub use map::{
    map_file_name, AudioFile, MapBody, MapInfo, MAP_INDEX_FILE_NAME, MAP_LAYER_COUNT,
    MAX_MAP_DIMENSION,
};
pub use plugin::{
    is_valid_plugin_name, plugin_script_path, PluginEntry, PluginParameters, ScriptHeader,
    PLUGINS_DIR, PLUGIN_REGISTRY_PATH, PLUGIN_SUFFIX,
};
pub(crate) use plugin::{new_registry_text, registry_anchor, render_registry_literal};
