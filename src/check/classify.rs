//! 容器健康分级

use crate::check::inspect::ContainerState;
use crate::utils::Classification;
use chrono::{DateTime, Utc};
use tracing::debug;

pub const HEALTHY: &str = "healthy";
pub const UNHEALTHY: &str = "unhealthy";

/// Elapsed-runtime thresholds in seconds. `runtime_ok >= runtime_warn` is
/// expected but not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub runtime_ok: u64,
    pub runtime_warn: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self { runtime_ok: 120, runtime_warn: 60 }
    }
}

/// Classifies one expected container. First matching rule wins.
pub fn classify(
    name: &str,
    state: Option<&ContainerState>,
    thresholds: &Thresholds,
    now: DateTime<Utc>,
) -> Classification {
    let Some(state) = state else {
        return Classification::critical(format!("{} not found", name));
    };

    let (Some(status), Some(running), Some(started_at)) =
        (&state.status, state.running, &state.started_at)
    else {
        return Classification::warning(format!("{} unparsable", name));
    };

    if !running {
        return Classification::critical(format!("{} not running ({})", name, status));
    }

    let elapsed = elapsed_since(started_at, now);
    let up = elapsed.map(format_elapsed).unwrap_or_else(|| "unknown".to_string());
    debug!(%name, %status, health = ?state.health, ?elapsed, "classifying");

    match state.health.as_deref() {
        Some(UNHEALTHY) => {
            return Classification::critical(format!("{} {} (up {})", name, UNHEALTHY, up));
        }
        Some(HEALTHY) => {
            return Classification::ok(format!("{} {} (up {})", name, HEALTHY, up));
        }
        Some(other) => {
            return Classification::warning(format!("{} {} (up {})", name, other, up));
        }
        None => {}
    }

    let message = format!("{} up {}", name, up);
    match elapsed {
        // 无法计算运行时长时视为正常
        None => Classification::ok(message),
        Some(secs) if secs >= thresholds.runtime_ok => Classification::ok(message),
        Some(secs) if secs >= thresholds.runtime_warn => Classification::warning(message),
        Some(_) => Classification::critical(message),
    }
}

/// Seconds since `started_at`, which must be RFC 3339 with a `Z` offset.
/// Any other form yields `None`. Start times in the future clamp to zero.
pub fn elapsed_since(started_at: &str, now: DateTime<Utc>) -> Option<u64> {
    if !started_at.ends_with('Z') {
        return None;
    }
    let started = DateTime::parse_from_rfc3339(started_at).ok()?.with_timezone(&Utc);
    Some((now - started).num_seconds().max(0) as u64)
}

/// Largest non-zero unit plus the next one down when non-zero:
/// `2d3h`, `1h5m`, `40s`.
pub fn format_elapsed(secs: u64) -> String {
    let units = [
        (secs / 86400, 'd'),
        ((secs % 86400) / 3600, 'h'),
        ((secs % 3600) / 60, 'm'),
        (secs % 60, 's'),
    ];

    let Some(first) = units.iter().position(|(v, _)| *v > 0) else {
        return "0s".to_string();
    };

    let mut out = format!("{}{}", units[first].0, units[first].1);
    if let Some((v, unit)) = units.get(first + 1) {
        if *v > 0 {
            out.push_str(&format!("{}{}", v, unit));
        }
    }
    out
}
