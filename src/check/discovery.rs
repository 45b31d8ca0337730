//! 期望容器收集
//! 来源：/etc/init.d/docker-*, /etc/systemd/system/docker-*.service, compose 单元

use crate::check::compose;
use crate::utils::{CheckError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const NAME_PREFIX: &str = "docker-";
const UNIT_SUFFIX: &str = ".service";

/// Discovery roots; `None` disables the mode.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryRoots {
    pub init_d: Option<PathBuf>,
    /// Enables both plain systemd and compose discovery.
    pub systemd: Option<PathBuf>,
}

// ── 公开接口 ────────────────────────────────────────────────────────────────

/// Collects expected container names from every enabled mode.
///
/// A failing mode is logged and contributes nothing; the others still run.
/// Duplicates are kept.
pub fn collect(roots: &DiscoveryRoots) -> Vec<String> {
    let mut expected = Vec::new();

    if let Some(dir) = &roots.init_d {
        match scan_init_d(dir) {
            Ok(names) => {
                debug!(dir = %dir.display(), ?names, "init.d containers");
                expected.extend(names);
            }
            Err(e) => warn!("init.d discovery skipped: {}", e),
        }
    }

    if let Some(dir) = &roots.systemd {
        match unit_files(dir) {
            Ok(units) => {
                let names: Vec<String> = units.iter().filter_map(|u| systemd_name(u)).collect();
                debug!(dir = %dir.display(), ?names, "systemd containers");
                expected.extend(names);

                for unit in &units {
                    match compose::expand_unit(unit) {
                        Ok(names) if !names.is_empty() => {
                            debug!(unit = %unit.display(), ?names, "compose containers");
                            expected.extend(names);
                        }
                        Ok(_) => {}
                        Err(e) => warn!(unit = %unit.display(), "compose expansion skipped: {}", e),
                    }
                }
            }
            Err(e) => warn!("systemd discovery skipped: {}", e),
        }
    }

    expected
}

pub fn scan_init_d(dir: &Path) -> Result<Vec<String>> {
    Ok(regular_files(dir)?
        .iter()
        .filter_map(|p| file_name(p))
        .filter_map(|n| n.strip_prefix(NAME_PREFIX).map(String::from))
        .filter(|n| !n.is_empty())
        .collect())
}

/// All `*.service` regular files, prefixed or not.
pub fn unit_files(dir: &Path) -> Result<Vec<PathBuf>> {
    Ok(regular_files(dir)?
        .into_iter()
        .filter(|p| file_name(p).is_some_and(|n| n.ends_with(UNIT_SUFFIX)))
        .collect())
}

/// `docker-<name>.service` → `<name>`
pub fn systemd_name(unit: &Path) -> Option<String> {
    let name = file_name(unit)?
        .strip_prefix(NAME_PREFIX)?
        .strip_suffix(UNIT_SUFFIX)?;
    (!name.is_empty()).then(|| name.to_string())
}

// ── 工具 ────────────────────────────────────────────────────────────────────

fn regular_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let discovery_err = |source| CheckError::Discovery { path: dir.to_path_buf(), source };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(discovery_err)? {
        let entry = entry.map_err(discovery_err)?;
        if entry.file_type().map_err(discovery_err)?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}
