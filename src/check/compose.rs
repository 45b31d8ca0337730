//! Compose 单元展开
//! systemd 单元头部注释里 `# compose_file=<path>` 指向 compose 文件，
//! 每个 service 展开为 `<project>_<service>_1`

use crate::utils::{CheckError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const MARKER_KEY: &str = "compose_file";

/// Schema versions whose container naming we know how to replicate.
pub const KNOWN_VERSIONS: &[&str] = &[
    "2", "2.0", "2.1", "2.2", "2.3", "2.4",
    "3", "3.0", "3.1", "3.2", "3.3", "3.4", "3.5", "3.6", "3.7", "3.8", "3.9",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeManifest {
    pub version: String,
    pub services: Vec<String>,
}

#[derive(Deserialize)]
struct RawManifest {
    version: Option<serde_yaml::Value>,
    #[serde(default)]
    services: Option<serde_yaml::Mapping>,
}

// ── 公开接口 ────────────────────────────────────────────────────────────────

/// Expands one unit file into container names. Units without the marker
/// contribute nothing.
pub fn expand_unit(unit: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(unit)?;

    let Some(target) = marker_path(&contents) else {
        return Ok(Vec::new());
    };

    let compose_file = resolve(unit, &target);
    let manifest = load_manifest(&compose_file)?;
    let project = project_name(&compose_file).ok_or_else(|| CheckError::Manifest {
        path: compose_file.clone(),
        reason: "cannot derive project name from directory".to_string(),
    })?;

    debug!(file = %compose_file.display(), %project, version = %manifest.version, "compose manifest");
    Ok(container_names(&project, &manifest))
}

/// Reads the leading `#` block and returns the marker value, if any.
pub fn marker_path(unit_contents: &str) -> Option<String> {
    unit_contents
        .lines()
        .map(str::trim_start)
        .take_while(|l| l.starts_with('#'))
        .filter_map(|l| l.trim_start_matches('#').split_once('='))
        .find(|(key, _)| key.trim() == MARKER_KEY)
        .map(|(_, value)| value.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn load_manifest(path: &Path) -> Result<ComposeManifest> {
    let manifest_err = |reason: String| CheckError::Manifest { path: path.to_path_buf(), reason };

    let text = fs::read_to_string(path).map_err(|e| manifest_err(e.to_string()))?;
    parse_manifest(&text).map_err(manifest_err)
}

/// `<project>_<service>_1` for every service key.
pub fn container_names(project: &str, manifest: &ComposeManifest) -> Vec<String> {
    manifest
        .services
        .iter()
        .map(|service| format!("{}_{}_1", project, service))
        .collect()
}

/// Project name as compose derives it: the containing directory's name,
/// lowercased, keeping only `[a-z0-9_-]`.
pub fn project_name(compose_file: &Path) -> Option<String> {
    let dir = compose_file.parent()?.file_name()?.to_str()?;
    let name: String = dir
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    (!name.is_empty()).then_some(name)
}

// ── 解析 ────────────────────────────────────────────────────────────────────

fn parse_manifest(text: &str) -> std::result::Result<ComposeManifest, String> {
    let raw: RawManifest = serde_yaml::from_str(text).map_err(|e| e.to_string())?;

    let version = match raw.version {
        Some(serde_yaml::Value::String(s)) => s,
        Some(serde_yaml::Value::Number(n)) => n.to_string(),
        Some(_) => return Err("version is not a string or number".to_string()),
        None => return Err("no version declared".to_string()),
    };

    if !KNOWN_VERSIONS.contains(&version.as_str()) {
        return Err(format!("unsupported version {:?}", version));
    }

    let services = raw
        .services
        .unwrap_or_default()
        .into_iter()
        .map(|(key, _)| match key {
            serde_yaml::Value::String(s) => Ok(s),
            other => Err(format!("non-string service key {:?}", other)),
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(ComposeManifest { version, services })
}

fn resolve(unit: &Path, target: &str) -> PathBuf {
    let target = Path::new(target);
    match unit.parent() {
        Some(dir) if target.is_relative() => dir.join(target),
        _ => target.to_path_buf(),
    }
}
