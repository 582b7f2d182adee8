use std::collections::HashMap;

use mzdb::{EntityKind, ProjectDatabase, StoreError, StoreErrorKind};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;

mod entities;
mod items;
mod maps;
mod plugins;
mod resources;
mod summary;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ToolOutput {
    pub(crate) message: String,
    pub(crate) data: Value,
}

impl ToolOutput {
    pub(crate) fn new(message: impl Into<String>, data: Value) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum ToolError {
    #[error("unknown tool '{name}'; call 'help' for the list of tools")]
    UnknownTool { name: String },
    #[error("invalid arguments for {tool}: {message}")]
    InvalidArgs { tool: String, message: String },
    #[error("{0}")]
    Rejected(String),
    #[error("{0}")]
    Unavailable(String),
    #[error("{context}: {source}")]
    Store {
        context: String,
        #[source]
        source: StoreError,
    },
}

impl ToolError {
    pub(crate) fn store(context: impl Into<String>, source: StoreError) -> Self {
        Self::Store {
            context: context.into(),
            source,
        }
    }

    /// Stable label for logs; the wire only carries the message.
    pub(crate) fn category(&self) -> &'static str {
        match self {
            Self::UnknownTool { .. } | Self::InvalidArgs { .. } => "invalid_request",
            Self::Rejected(_) => "validation_rejection",
            Self::Unavailable(_) => "feature_unavailable",
            Self::Store { source, .. } => match source.kind() {
                StoreErrorKind::Read => "read_failure",
                StoreErrorKind::Write => "write_failure",
                StoreErrorKind::Validation => "validation_rejection",
            },
        }
    }
}

type ToolHandler = fn(&ProjectDatabase, &Value) -> Result<ToolOutput, ToolError>;
type HandlerFn = dyn Fn(&ProjectDatabase, &Value) -> Result<ToolOutput, ToolError> + Send + Sync;

pub(crate) struct ToolSpec {
    name: String,
    help: String,
    arg_schema: String,
    handler: Box<HandlerFn>,
}

pub(crate) struct ToolRegistry {
    specs: Vec<ToolSpec>,
    lookup_by_lower_name: HashMap<String, usize>,
}

impl ToolRegistry {
    pub(crate) fn new() -> Self {
        Self {
            specs: Vec::new(),
            lookup_by_lower_name: HashMap::new(),
        }
    }

    pub(crate) fn with_builtins() -> Self {
        let mut registry = Self::new();
        let builtins: [(&str, &str, &str, ToolHandler); 14] = [
            (
                "list_entities",
                "List named records of a database collection",
                "{kind}",
                entities::list_entities,
            ),
            (
                "get_entity",
                "Fetch one record by id",
                "{kind, id}",
                entities::get_entity,
            ),
            (
                "create_entity",
                "Append a record built from the editor template plus fields",
                "{kind, fields}",
                entities::create_entity,
            ),
            (
                "update_entity",
                "Overwrite fields of an existing record",
                "{kind, id, fields}",
                entities::update_entity,
            ),
            (
                "resize_collection",
                "Change the maximum record count of a collection",
                "{kind, max}",
                entities::resize_collection,
            ),
            (
                "create_item",
                "Create an item with recovery/state effect shorthands",
                concat!(
                    "{name, description?, price?, iconIndex?, consumable?, scope?, note?, ",
                    "hpRecoveryPercent?, hpRecoveryFlat?, mpRecoveryPercent?, mpRecoveryFlat?, ",
                    "tpGain?, addStateId?, removeStateId?, commonEventId?}"
                ),
                items::create_item,
            ),
            ("list_maps", "List the map index", "{}", maps::list_maps),
            (
                "get_map",
                "Summarize one map body",
                "{id}",
                maps::get_map,
            ),
            (
                "create_map",
                "Create a map body and its index entry",
                "{name, width, height, tilesetId?, parentId?, displayName?}",
                maps::create_map,
            ),
            (
                "list_plugins",
                "List the plugin registry",
                "{}",
                plugins::list_plugins,
            ),
            (
                "install_plugin",
                "Write a plugin script and register it",
                "{name, code, description?, author?, parameters?, enabled?}",
                plugins::install_plugin,
            ),
            (
                "set_plugin_enabled",
                "Turn a registered plugin on or off",
                "{name, enabled}",
                plugins::set_plugin_enabled,
            ),
            (
                "scan_resources",
                "List image/audio resources of the project or the engine install",
                "{category, scope?: project|engine}",
                resources::scan_resources,
            ),
            (
                "database_summary",
                "Record counts, map and plugin totals, versionId",
                "{}",
                summary::database_summary,
            ),
        ];
        for (name, help, arg_schema, handler) in builtins {
            registry
                .register(name, help, arg_schema, handler)
                .expect("built-in tool registration should not fail");
        }
        registry
    }

    pub(crate) fn register<F>(
        &mut self,
        name: impl Into<String>,
        help: impl Into<String>,
        arg_schema: impl Into<String>,
        handler: F,
    ) -> Result<(), String>
    where
        F: Fn(&ProjectDatabase, &Value) -> Result<ToolOutput, ToolError> + Send + Sync + 'static,
    {
        let name = name.into();
        if name.trim().is_empty() {
            return Err("tool name cannot be empty".to_string());
        }
        let lower = name.to_ascii_lowercase();
        if lower == "help" || self.lookup_by_lower_name.contains_key(&lower) {
            return Err(format!("duplicate tool registration: {name}"));
        }

        self.specs.push(ToolSpec {
            name,
            help: help.into(),
            arg_schema: arg_schema.into(),
            handler: Box::new(handler),
        });
        self.lookup_by_lower_name
            .insert(lower, self.specs.len() - 1);
        Ok(())
    }

    pub(crate) fn lookup(&self, input_name: &str) -> Option<&ToolSpec> {
        let lower = input_name.to_ascii_lowercase();
        let index = self.lookup_by_lower_name.get(&lower)?;
        self.specs.get(*index)
    }

    pub(crate) fn dispatch(
        &self,
        database: &ProjectDatabase,
        tool: &str,
        args: &Value,
    ) -> Result<ToolOutput, ToolError> {
        if tool.eq_ignore_ascii_case("help") {
            return Ok(self.help_output());
        }
        let spec = self.lookup(tool).ok_or_else(|| ToolError::UnknownTool {
            name: tool.to_string(),
        })?;
        (spec.handler)(database, args)
    }

    fn help_output(&self) -> ToolOutput {
        // Registration order by contract.
        let tools = self
            .specs
            .iter()
            .map(|spec| json!({"name": spec.name, "help": spec.help, "args": spec.arg_schema}))
            .collect::<Vec<_>>();
        ToolOutput::new(format!("{} tools available", tools.len()), Value::Array(tools))
    }
}

pub(crate) fn decode_args<T: DeserializeOwned>(tool: &str, args: &Value) -> Result<T, ToolError> {
    serde_path_to_error::deserialize(args).map_err(|error| {
        let path = error.path().to_string();
        let inner = error.into_inner();
        ToolError::InvalidArgs {
            tool: tool.to_string(),
            message: if path == "." {
                inner.to_string()
            } else {
                format!("{path}: {inner}")
            },
        }
    })
}

pub(crate) fn parse_kind(tool: &str, raw: &str) -> Result<EntityKind, ToolError> {
    EntityKind::parse(raw).ok_or_else(|| ToolError::InvalidArgs {
        tool: tool.to_string(),
        message: format!(
            "unknown kind '{raw}' (expected one of: {})",
            EntityKind::ALL
                .iter()
                .map(|kind| kind.label())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    })
}
