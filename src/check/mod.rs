pub mod classify;
pub mod compose;
pub mod discovery;
pub mod inspect;
pub mod report;

use chrono::{DateTime, Utc};
use classify::Thresholds;
use discovery::DiscoveryRoots;
use inspect::{ContainerRuntime, DockerCli};
use report::RunResult;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct CheckConfig {
    pub roots: DiscoveryRoots,
    pub thresholds: Thresholds,
    pub docker: String,
    pub timeout: Duration,
}

pub fn run_check(config: &CheckConfig) -> RunResult {
    let expected = discovery::collect(&config.roots);
    info!(count = expected.len(), "expected containers collected");

    let runtime = DockerCli::new(config.docker.clone(), config.timeout);
    evaluate(&expected, &runtime, &config.thresholds, Utc::now())
}

/// Inspects and classifies every expected name, one classification each.
pub fn evaluate(
    expected: &[String],
    runtime: &dyn ContainerRuntime,
    thresholds: &Thresholds,
    now: DateTime<Utc>,
) -> RunResult {
    RunResult::fold(expected.iter().map(|name| {
        let state = inspect::inspect(runtime, name);
        let classification = classify::classify(name, state.as_ref(), thresholds, now);
        debug!(%name, level = %classification.level, "classified");
        classification
    }))
}

#[cfg(test)]
mod tests {
    use super::inspect::fake::FakeRuntime;
    use super::*;
    use crate::utils::Severity;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn runtime() -> FakeRuntime {
        FakeRuntime::default()
            .with("nginx", json!({"Status": "running", "Running": true,
                "StartedAt": "2024-02-28T08:00:00.000Z"}))
            .with("myapp_web_run_1", json!({"Status": "running", "Running": true,
                "StartedAt": "2024-03-01T11:59:20Z"}))
            .with("worker", json!({"Status": "exited", "Running": false,
                "StartedAt": "2024-03-01T09:00:00Z"}))
            .with("api", json!({"Status": "running", "Running": true,
                "StartedAt": "2024-02-01T00:00:00Z", "Health": {"Status": "unhealthy"}}))
            .with("cache", json!({"Running": true}))
    }

    #[test]
    fn evaluates_every_expected_container() {
        let expected = names(&["nginx", "myapp_web_1", "worker", "api", "cache", "ghost"]);
        let result = evaluate(&expected, &runtime(), &Thresholds::default(), now());

        assert_eq!(result.total(), expected.len());
        assert_eq!(result.status, Severity::Critical);
        assert_eq!(
            result.critical,
            vec![
                "api unhealthy (up 29d12h)",
                "ghost not found",
                "myapp_web_1 up 40s",
                "worker not running (exited)",
            ]
        );
        assert_eq!(result.warning, vec!["cache unparsable"]);
        assert_eq!(result.ok, vec!["nginx up 2d4h"]);
    }

    #[test]
    fn duplicates_are_classified_independently() {
        let result = evaluate(&names(&["nginx", "nginx"]), &runtime(), &Thresholds::default(), now());
        assert_eq!(result.ok.len(), 2);
        assert_eq!(result.status, Severity::Ok);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let expected = names(&["worker", "nginx", "ghost"]);
        let rt = runtime();
        let first = evaluate(&expected, &rt, &Thresholds::default(), now());
        let second = evaluate(&expected, &rt, &Thresholds::default(), now());
        assert_eq!(first.render(), second.render());
    }

    #[test]
    fn nothing_expected_is_unknown() {
        let result = evaluate(&[], &runtime(), &Thresholds::default(), now());
        assert_eq!(result.render(), "UNKNOWN: No containers specified");
    }
}
