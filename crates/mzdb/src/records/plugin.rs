use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

pub const PLUGINS_DIR: &str = "js/plugins";
pub const PLUGIN_REGISTRY_PATH: &str = "js/plugins.js";
pub const PLUGIN_SUFFIX: &str = ".js";

const REGISTRY_BANNER: &str = "// Generated by RPG Maker.\n// Do not edit this file directly.\n";

/// One element of the `$plugins` array in `js/plugins.js`. Keys the editor
/// adds beyond the four known ones are carried in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginEntry {
    pub name: String,
    pub status: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: PluginParameters,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PluginEntry {
    pub fn new(name: impl Into<String>, status: bool, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status,
            description: description.into(),
            parameters: PluginParameters::default(),
            extra: Map::new(),
        }
    }
}

/// Plugin parameters in the order the registry lists them, so rewriting one
/// entry never reorders another.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginParameters(Vec<(String, Value)>);

impl PluginParameters {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    /// Replaces an existing key in place or appends a new one.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.0.iter_mut().find(|(name, _)| *name == key) {
            Some((_, existing)) => *existing = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for PluginParameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut parameters = Self::default();
        for (key, value) in iter {
            parameters.insert(key, value.into());
        }
        parameters
    }
}

impl Serialize for PluginParameters {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PluginParameters {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = PluginParameters;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a json object of plugin parameters")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut parameters = PluginParameters::default();
                while let Some((key, value)) = access.next_entry::<String, Value>()? {
                    parameters.insert(key, value);
                }
                Ok(parameters)
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

pub fn is_valid_plugin_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

pub fn plugin_script_path(name: &str) -> String {
    format!("{PLUGINS_DIR}/{name}{PLUGIN_SUFFIX}")
}

pub(crate) fn registry_anchor() -> &'static Regex {
    static ANCHOR: OnceLock<Regex> = OnceLock::new();
    ANCHOR.get_or_init(|| {
        Regex::new(r"var\s+\$plugins\s*=").expect("registry anchor regex is valid")
    })
}

fn header_pattern() -> &'static Regex {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    HEADER.get_or_init(|| Regex::new(r"(?m)^\s*/\*:").expect("header regex is valid"))
}

/// Serializes entries the way the editor lays out `$plugins`: one object per line.
pub(crate) fn render_registry_literal(
    entries: &[PluginEntry],
) -> Result<String, serde_json::Error> {
    let mut lines = Vec::with_capacity(entries.len());
    for entry in entries {
        lines.push(serde_json::to_string(entry)?);
    }
    if lines.is_empty() {
        return Ok("[\n]".to_string());
    }
    Ok(format!("[\n{}\n]", lines.join(",\n")))
}

pub(crate) fn new_registry_text(literal: &str) -> String {
    format!("{REGISTRY_BANNER}var $plugins =\n{literal};\n")
}

/// Authoring metadata written above plugin code that lacks its own header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptHeader {
    pub description: String,
    pub author: String,
}

impl ScriptHeader {
    pub fn has_header(code: &str) -> bool {
        header_pattern().is_match(code)
    }

    pub fn apply(&self, name: &str, code: &str) -> String {
        if Self::has_header(code) {
            return code.to_string();
        }
        let description = single_line(&self.description);
        let author = single_line(&self.author);
        format!(
            "/*:\n * @target MZ\n * @plugindesc {description}\n * @author {author}\n *\n * @help {name}.js\n */\n\n{code}"
        )
    }
}

// A newline would end the annotation early and leak text into the script body.
fn single_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .replace("*/", "* /")
}
