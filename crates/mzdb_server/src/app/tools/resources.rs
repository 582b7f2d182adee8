use mzdb::ProjectDatabase;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{decode_args, ToolError, ToolOutput};

const IMAGE_CATEGORIES: [&str; 14] = [
    "animations",
    "battlebacks1",
    "battlebacks2",
    "characters",
    "enemies",
    "faces",
    "parallaxes",
    "pictures",
    "sv_actors",
    "sv_enemies",
    "system",
    "tilesets",
    "titles1",
    "titles2",
];
const AUDIO_CATEGORIES: [&str; 4] = ["bgm", "bgs", "me", "se"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Scope {
    Project,
    Engine,
}

#[derive(Debug, Deserialize)]
struct ScanArgs {
    category: String,
    #[serde(default = "project_scope")]
    scope: Scope,
}

fn project_scope() -> Scope {
    Scope::Project
}

/// Maps `faces`, `img/faces` or `audio/bgm` to the resource directory and the
/// extension the editor stores for it.
fn resolve_category(raw: &str) -> Option<(String, &'static str)> {
    let trimmed = raw.trim().trim_matches('/').to_ascii_lowercase();
    let (group, name) = match trimmed.split_once('/') {
        Some((group, name)) => (Some(group.to_string()), name.to_string()),
        None => (None, trimmed),
    };
    let in_images = IMAGE_CATEGORIES.contains(&name.as_str());
    let in_audio = AUDIO_CATEGORIES.contains(&name.as_str());
    match group.as_deref() {
        Some("img") | None if in_images => Some((format!("img/{name}"), ".png")),
        Some("audio") | None if in_audio => Some((format!("audio/{name}"), ".ogg")),
        _ => None,
    }
}

pub(super) fn scan_resources(db: &ProjectDatabase, args: &Value) -> Result<ToolOutput, ToolError> {
    let parsed: ScanArgs = decode_args("scan_resources", args)?;
    let (dir, suffix) = resolve_category(&parsed.category).ok_or_else(|| {
        ToolError::Rejected(format!(
            "unknown resource category '{}' (img: {}; audio: {})",
            parsed.category,
            IMAGE_CATEGORIES.join(", "),
            AUDIO_CATEGORIES.join(", ")
        ))
    })?;

    let listing = match parsed.scope {
        Scope::Project => db.list_files(&dir, Some(suffix)),
        Scope::Engine => db.list_engine_files(&dir, Some(suffix)).ok_or_else(|| {
            ToolError::Unavailable(
                "engine resource scans need an engine root (--engine or MZDB_ENGINE_ROOT)"
                    .to_string(),
            )
        })?,
    };
    let files = listing.map_err(|error| ToolError::store(format!("cannot list {dir}"), error))?;
    let names = files
        .iter()
        .map(|file| file.strip_suffix(suffix).unwrap_or(file.as_str()))
        .collect::<Vec<_>>();

    Ok(ToolOutput::new(
        format!("{} files in {dir}", names.len()),
        json!({
            "category": dir,
            "scope": match parsed.scope {
                Scope::Project => "project",
                Scope::Engine => "engine",
            },
            "files": names,
        }),
    ))
}
