//! 汇总输出：三级消息列表 + 最严重状态

use crate::utils::{CheckError, Classification, Level, Result, Severity};
use serde::Serialize;

pub const NO_CONTAINERS: &str = "No containers specified";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunResult {
    pub status: Severity,
    pub critical: Vec<String>,
    pub warning: Vec<String>,
    pub ok: Vec<String>,
}

impl RunResult {
    /// Folds classifications into sorted lists. An empty input is UNKNOWN.
    pub fn fold<I>(classifications: I) -> Self
    where
        I: IntoIterator<Item = Classification>,
    {
        let mut critical = Vec::new();
        let mut warning = Vec::new();
        let mut ok = Vec::new();

        for c in classifications {
            match c.level {
                Level::Critical => critical.push(c.message),
                Level::Warning => warning.push(c.message),
                Level::Ok => ok.push(c.message),
            }
        }

        critical.sort();
        warning.sort();
        ok.sort();

        let status = if !critical.is_empty() {
            Severity::Critical
        } else if !warning.is_empty() {
            Severity::Warning
        } else if !ok.is_empty() {
            Severity::Ok
        } else {
            Severity::Unknown
        };

        Self { status, critical, warning, ok }
    }

    pub fn total(&self) -> usize {
        self.critical.len() + self.warning.len() + self.ok.len()
    }

    /// `CRITICAL: a, b, WARNING: c, OK: d`
    pub fn render(&self) -> String {
        if self.total() == 0 {
            return format!("{}: {}", Severity::Unknown, NO_CONTAINERS);
        }

        [
            (Severity::Critical, &self.critical),
            (Severity::Warning, &self.warning),
            (Severity::Ok, &self.ok),
        ]
        .iter()
        .filter(|(_, messages)| !messages.is_empty())
        .map(|(label, messages)| format!("{}: {}", label, messages.join(", ")))
        .collect::<Vec<_>>()
        .join(", ")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| CheckError::Parse(format!("JSON serialize: {}", e)))
    }
}
