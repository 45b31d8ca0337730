//! 运行时查询
//! 来源：docker inspect --type container <name>

use crate::utils::{CheckError, Result};
use std::io::Read;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// Snapshot of `State` from one inspect record. Every field is optional so
/// that a record missing keys can still be reported as unparsable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerState {
    pub status: Option<String>,
    pub running: Option<bool>,
    pub started_at: Option<String>,
    pub health: Option<String>,
}

/// Source of raw inspect output for a single container.
pub trait ContainerRuntime {
    /// Raw JSON document for `name`; an error means the runtime has no
    /// usable answer (absent, failed, timed out).
    fn inspect_raw(&self, name: &str) -> Result<Vec<u8>>;
}

// ── docker CLI ──────────────────────────────────────────────────────────────

pub struct DockerCli {
    binary: String,
    timeout: Duration,
}

impl DockerCli {
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self { binary: binary.into(), timeout }
    }
}

impl ContainerRuntime for DockerCli {
    fn inspect_raw(&self, name: &str) -> Result<Vec<u8>> {
        let mut child = Command::new(&self.binary)
            .args(["inspect", "--type", "container", name])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CheckError::Docker(format!("{} inspect failed: {}", self.binary, e)))?;

        // 管道必须并行读空，否则大输出会阻塞子进程
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match child.wait_timeout(self.timeout)? {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CheckError::Timeout(
                    format!("docker inspect {}", name),
                    self.timeout.as_secs(),
                ));
            }
        };

        let out = stdout.join().unwrap_or_default();
        let err = stderr.join().unwrap_or_default();

        if !status.success() {
            debug!(%name, %status, stderr = %String::from_utf8_lossy(&err).trim(), "inspect exited");
            return Err(CheckError::NotFound(name.to_string()));
        }

        Ok(out)
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut p) = pipe {
            let _ = p.read_to_end(&mut buf);
        }
        buf
    })
}

// ── 查询 ────────────────────────────────────────────────────────────────────

/// Looks up `name`, falling back once from `<x>_1` to `<x>_run_1`.
/// A final failure is logged and reported as absence.
pub fn inspect(runtime: &dyn ContainerRuntime, name: &str) -> Option<ContainerState> {
    match resolve(runtime, name) {
        Ok(state) => Some(state),
        Err(e) => {
            warn!(%name, "inspect: {}", e);
            None
        }
    }
}

/// Same lookup as [`inspect`], keeping the error of the last attempt.
pub fn resolve(runtime: &dyn ContainerRuntime, name: &str) -> Result<ContainerState> {
    let first = match lookup(runtime, name) {
        Ok(state) => return Ok(state),
        Err(e) => e,
    };

    let Some(alternate) = run_variant(name) else {
        return Err(first);
    };

    // 普通缺失可能由 run 容器补上，其余错误直接报出
    match first {
        CheckError::NotFound(_) => debug!(%name, %alternate, "retrying with compose run name"),
        ref e => warn!(%name, %alternate, "inspect: {}; retrying with compose run name", e),
    }
    lookup(runtime, &alternate)
}

/// `<project>_<service>_1` → `<project>_<service>_run_1`; names that
/// already are run containers have no variant.
pub fn run_variant(name: &str) -> Option<String> {
    if name.ends_with("_run_1") {
        return None;
    }
    name.strip_suffix("_1").map(|base| format!("{}_run_1", base))
}

pub fn parse_state(raw: &[u8]) -> Result<ContainerState> {
    let arr: serde_json::Value = serde_json::from_slice(raw)
        .map_err(|e| CheckError::Parse(format!("inspect JSON: {}", e)))?;

    let c = arr
        .as_array()
        .and_then(|a| a.first())
        .filter(|c| c.is_object())
        .ok_or_else(|| CheckError::Parse("empty inspect result".to_string()))?;

    let state = &c["State"];
    Ok(ContainerState {
        status: state["Status"].as_str().map(String::from),
        running: state["Running"].as_bool(),
        started_at: state["StartedAt"].as_str().map(String::from),
        health: state["Health"]["Status"].as_str().map(String::from),
    })
}

fn lookup(runtime: &dyn ContainerRuntime, name: &str) -> Result<ContainerState> {
    let raw = runtime.inspect_raw(name)?;
    parse_state(&raw)
}


#[cfg(test)]
mod tests {
    use super::fake::FakeRuntime;
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_nested_state_fields() {
        let raw = br#"[{"State":{"Status":"running","Running":true,
            "StartedAt":"2024-03-01T10:00:00.123456789Z","Health":{"Status":"healthy"}}}]"#;
        let state = parse_state(raw).unwrap();
        assert_eq!(state.status.as_deref(), Some("running"));
        assert_eq!(state.running, Some(true));
        assert_eq!(state.started_at.as_deref(), Some("2024-03-01T10:00:00.123456789Z"));
        assert_eq!(state.health.as_deref(), Some("healthy"));
    }

    #[test]
    fn missing_fields_stay_absent() {
        let state = parse_state(br#"[{"Id":"abc"}]"#).unwrap();
        assert_eq!(state, ContainerState::default());
    }

    #[test]
    fn malformed_output_is_a_parse_error() {
        assert!(parse_state(b"not json").is_err());
        assert!(parse_state(b"[]").is_err());
        assert!(parse_state(b"{}").is_err());
    }

    #[test]
    fn run_variant_rewrites_single_instance_suffix() {
        assert_eq!(run_variant("myapp_web_1"), Some("myapp_web_run_1".into()));
        assert_eq!(run_variant("nginx"), None);
        assert_eq!(run_variant("web_10"), None);
    }

    #[test]
    fn run_container_names_are_not_retried() {
        assert_eq!(run_variant("myapp_web_run_1"), None);

        let err = resolve(&FakeRuntime::default(), "myapp_web_run_1").unwrap_err();
        assert!(matches!(err, CheckError::NotFound(ref n) if n == "myapp_web_run_1"));
    }

    #[test]
    fn final_failure_reports_the_last_attempt() {
        let err = resolve(&FakeRuntime::default(), "myapp_web_1").unwrap_err();
        assert!(matches!(err, CheckError::NotFound(ref n) if n == "myapp_web_run_1"));

        let runtime = FakeRuntime::default().with_raw("myapp_db_1", "[{");
        let err = resolve(&runtime, "myapp_db_1").unwrap_err();
        assert!(matches!(err, CheckError::NotFound(_)));

        let err = resolve(&runtime, "nginx").unwrap_err();
        assert!(matches!(err, CheckError::NotFound(_)));
    }

    #[test]
    fn spawn_failure_surfaces_from_resolve() {
        let cli = DockerCli::new("/nonexistent/docker-binary", Duration::from_secs(1));
        let err = resolve(&cli, "web").unwrap_err();
        assert!(matches!(err, CheckError::Docker(_)));
        assert!(err.to_string().contains("inspect failed"));
    }

    #[test]
    fn falls_back_to_run_container() {
        let runtime = FakeRuntime::default()
            .with("myapp_web_run_1", json!({"Status": "running", "Running": true}));

        let state = inspect(&runtime, "myapp_web_1").unwrap();
        assert_eq!(state.status.as_deref(), Some("running"));
    }

    #[test]
    fn prefers_service_container_over_run_container() {
        let runtime = FakeRuntime::default()
            .with("myapp_web_1", json!({"Status": "exited", "Running": false}))
            .with("myapp_web_run_1", json!({"Status": "running", "Running": true}));

        let state = inspect(&runtime, "myapp_web_1").unwrap();
        assert_eq!(state.running, Some(false));
    }

    #[test]
    fn malformed_record_counts_as_absent() {
        let runtime = FakeRuntime::default().with_raw("broken", "[{");
        assert_eq!(inspect(&runtime, "broken"), None);
        assert_eq!(inspect(&runtime, "nginx"), None);
    }

    #[test]
    fn docker_cli_spawn_failure_is_an_error() {
        let cli = DockerCli::new("/nonexistent/docker-binary", Duration::from_secs(1));
        assert!(matches!(cli.inspect_raw("web"), Err(CheckError::Docker(_))));
    }
}
