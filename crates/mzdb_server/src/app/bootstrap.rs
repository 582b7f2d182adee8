use std::path::PathBuf;

use mzdb::store::DEFAULT_VERSION_STEP;
use mzdb::{resolve_project_paths, ProjectDatabase, StartupError};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::tools::ToolRegistry;

const VERSION_STEP_ENV_VAR: &str = "MZDB_VERSION_STEP";

pub(crate) struct Server {
    pub(crate) database: ProjectDatabase,
    pub(crate) registry: ToolRegistry,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ServerConfig {
    pub(crate) project_root: Option<PathBuf>,
    pub(crate) engine_root: Option<PathBuf>,
    pub(crate) version_step: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ConfigOutcome {
    Run(ServerConfig),
    PrintUsage,
}

impl ServerConfig {
    pub(crate) fn from_env_and_args(args: &[String]) -> Result<ConfigOutcome, String> {
        let env_step = std::env::var(VERSION_STEP_ENV_VAR).ok();
        Self::from_parts(args, env_step.as_deref())
    }

    fn from_parts(args: &[String], env_step: Option<&str>) -> Result<ConfigOutcome, String> {
        let mut config = ServerConfig {
            project_root: None,
            engine_root: None,
            version_step: parse_version_step(env_step),
        };

        let mut index = 0usize;
        while index < args.len() {
            match args[index].as_str() {
                "-h" | "--help" => return Ok(ConfigOutcome::PrintUsage),
                "--project" => {
                    let value = args
                        .get(index + 1)
                        .ok_or_else(|| "missing value for --project".to_string())?;
                    config.project_root = Some(PathBuf::from(value));
                    index += 2;
                }
                "--engine" => {
                    let value = args
                        .get(index + 1)
                        .ok_or_else(|| "missing value for --engine".to_string())?;
                    config.engine_root = Some(PathBuf::from(value));
                    index += 2;
                }
                "--version-step" => {
                    let value = args
                        .get(index + 1)
                        .ok_or_else(|| "missing value for --version-step".to_string())?;
                    config.version_step = value
                        .parse::<i64>()
                        .ok()
                        .filter(|step| *step > 0)
                        .ok_or_else(|| {
                            format!("invalid --version-step value '{value}' (expected positive)")
                        })?;
                    index += 2;
                }
                other => return Err(format!("unknown argument '{other}'")),
            }
        }
        Ok(ConfigOutcome::Run(config))
    }
}

fn parse_version_step(raw: Option<&str>) -> i64 {
    match raw {
        Some(value) => match value.trim().parse::<i64>() {
            Ok(step) if step > 0 => step,
            _ => {
                warn!(
                    value,
                    fallback_step = DEFAULT_VERSION_STEP,
                    "version_step_invalid_using_default"
                );
                DEFAULT_VERSION_STEP
            }
        },
        None => DEFAULT_VERSION_STEP,
    }
}

pub(crate) fn build_server(config: &ServerConfig) -> Result<Server, StartupError> {
    info!("=== mzdb server startup ===");
    let paths = resolve_project_paths(config.project_root.clone(), config.engine_root.clone())?;
    let engine_root = paths
        .engine_root()
        .map(|root| root.display().to_string())
        .unwrap_or_else(|| "<none>".to_string());
    info!(
        project_root = %paths.root().display(),
        engine_root = %engine_root,
        version_step = config.version_step,
        "project_paths_resolved"
    );
    Ok(Server {
        database: ProjectDatabase::open(paths, config.version_step),
        registry: ToolRegistry::with_builtins(),
    })
}

// Stdout carries the protocol, so diagnostics go to stderr.
pub(crate) fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(false)
        .compact()
        .init();
}

pub(crate) fn usage_text() -> String {
    [
        "mzdb_server - line-delimited JSON tool server for RPG Maker MZ project data",
        "",
        "Usage:",
        "  mzdb_server [--project <dir>] [--engine <dir>] [--version-step <i64>]",
        "",
        "Environment:",
        "  MZDB_PROJECT_ROOT   project directory (contains data/), used when --project is absent",
        "  MZDB_ENGINE_ROOT    optional RPG Maker MZ install, enables engine resource scans",
        "  MZDB_VERSION_STEP   versionId increment per mutation (default 1)",
        "  RUST_LOG            log filter for stderr diagnostics (default info)",
        "",
        "Protocol:",
        "  stdin:  {\"id\": <any>, \"tool\": \"<name>\", \"args\": {...}}   one request per line",
        "  stdout: {\"id\": <any>, \"ok\": <bool>, \"message\": \"...\", \"data\": ...}",
    ]
    .join("\n")
}
