//! Suite runner orchestrating sessions, scenarios, and results

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::browser::Session;
use crate::config::RunnerConfig;
use crate::driver::wait_for_app;
use crate::error::{Error, Result};
use crate::identity::TestIdentity;
use crate::report::{ScenarioResult, StepReport, SuiteResult};
use crate::spec::{step_timeout, Scenario, Step};

/// Runs scenarios against the application under test
pub struct SuiteRunner {
    config: RunnerConfig,
}

impl SuiteRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Run every scenario in the specs directory
    pub async fn run_all(&self) -> Result<SuiteResult> {
        let scenarios = Scenario::load_all(&self.config.specs_dir)?;
        self.run_scenarios(scenarios).await
    }

    /// Run scenarios matching a tag
    pub async fn run_tagged(&self, tag: &str) -> Result<SuiteResult> {
        let scenarios =
            Scenario::filter_by_tag(Scenario::load_all(&self.config.specs_dir)?, tag);
        self.run_scenarios(scenarios).await
    }

    /// Run a specific scenario by name
    pub async fn run_named(&self, name: &str) -> Result<SuiteResult> {
        let scenario = Scenario::load_all(&self.config.specs_dir)?
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| Error::SpecParse(format!("scenario not found: {}", name)))?;
        self.run_scenarios(vec![scenario]).await
    }

    /// Run a list of scenarios
    pub async fn run_scenarios(&self, scenarios: Vec<Scenario>) -> Result<SuiteResult> {
        let start = Instant::now();
        let started_at = chrono::Utc::now().to_rfc3339();

        // The whole suite is pointless if the app never comes up
        wait_for_app(
            &self.config.harness.base_url,
            self.config.app_startup_timeout,
        )
        .await?;

        info!("Running {} scenario(s)...", scenarios.len());

        let mut results = if self.config.jobs > 1 {
            self.run_concurrent(scenarios).await
        } else {
            let mut results = Vec::new();
            for scenario in &scenarios {
                results.push(run_one(&self.config, scenario).await);
            }
            results
        };

        // Completion order is arbitrary under concurrency
        results.sort_by(|a, b| a.name.cmp(&b.name));

        let passed = results.iter().filter(|r| r.success).count();
        let failed = results.len() - passed;
        let duration_ms = start.elapsed().as_millis() as u64;

        info!("");
        info!(
            "Results: {} passed, {} failed ({} ms)",
            passed, failed, duration_ms
        );

        Ok(SuiteResult {
            total: results.len(),
            passed,
            failed,
            duration_ms,
            started_at,
            results,
        })
    }

    /// Run a single scenario in its own session
    pub async fn run_scenario(&self, scenario: &Scenario) -> ScenarioResult {
        run_one(&self.config, scenario).await
    }

    async fn run_concurrent(&self, scenarios: Vec<Scenario>) -> Vec<ScenarioResult> {
        let semaphore = Arc::new(Semaphore::new(self.config.jobs));
        let mut set = JoinSet::new();

        for scenario in scenarios {
            let semaphore = semaphore.clone();
            let config = self.config.clone();
            set.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("semaphore closed while suite running");
                run_one(&config, &scenario).await
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => results.push(ScenarioResult::aborted("(panicked)", e.to_string())),
            }
        }
        results
    }

    /// Write suite results to a JSON file
    pub fn write_results(&self, results: &SuiteResult) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

async fn run_one(config: &RunnerConfig, scenario: &Scenario) -> ScenarioResult {
    let start = Instant::now();
    debug!("Running scenario: {}", scenario.name);

    // Fresh credentials per scenario; the backend user store is shared and
    // never reset, so isolation rests on identity uniqueness
    let identity = TestIdentity::fresh(&config.identity_seed);
    let scenario = scenario.with_identity(&identity);

    let session = match Session::connect(&config.harness).await {
        Ok(session) => session,
        Err(e) => {
            error!("✗ {} - {}", scenario.name, e);
            return ScenarioResult::aborted(&scenario.name, e.to_string());
        }
    };

    let budget = Duration::from_millis(scenario.timeout_ms);
    let outcome = tokio::time::timeout(budget, execute_steps(&session, &scenario)).await;

    let (steps, step_error) = match outcome {
        Ok((steps, error)) => (steps, error),
        Err(_) => (
            Vec::new(),
            Some(format!(
                "scenario exceeded its {} ms budget",
                scenario.timeout_ms
            )),
        ),
    };

    let diagnostic = if step_error.is_some() {
        Some(session.snapshot().await)
    } else {
        None
    };

    // Close the browser regardless of outcome
    if let Err(e) = session.close().await {
        debug!("session close failed: {}", e);
    }

    let duration_ms = start.elapsed().as_millis() as u64;
    let success = step_error.is_none();

    if success {
        info!("✓ {} ({} ms)", scenario.name, duration_ms);
    } else {
        error!(
            "✗ {} - {}",
            scenario.name,
            step_error.as_deref().unwrap_or("unknown error")
        );
    }

    ScenarioResult {
        name: scenario.name.clone(),
        success,
        duration_ms,
        steps,
        diagnostic,
        error: step_error,
    }
}

async fn execute_steps(
    session: &Session,
    scenario: &Scenario,
) -> (Vec<StepReport>, Option<String>) {
    let mut reports = Vec::new();

    // Scenarios are independent: start unauthenticated
    if let Err(e) = session.reset().await {
        return (reports, Some(format!("session reset failed: {}", e)));
    }

    for step in &scenario.steps {
        let step_start = Instant::now();
        let result = execute_step(session, step).await;
        let duration_ms = step_start.elapsed().as_millis() as u64;

        match result {
            Ok(()) => reports.push(StepReport {
                step: step.name(),
                success: true,
                duration_ms,
                error: None,
            }),
            Err(e) => {
                let message = e.to_string();
                reports.push(StepReport {
                    step: step.name(),
                    success: false,
                    duration_ms,
                    error: Some(message.clone()),
                });
                // First failure stops the scenario
                return (reports, Some(format!("{} - {}", step.name(), message)));
            }
        }
    }

    (reports, None)
}

async fn execute_step(session: &Session, step: &Step) -> Result<()> {
    debug!("Executing step: {}", step.name());

    match step {
        Step::Navigate { url } => session.navigate(url).await,
        Step::Fill { locator, value } => session.fill(locator, value).await,
        Step::Click { locator } => session.click(locator).await,
        Step::AssertUrl {
            expected,
            timeout_ms,
        } => session.assert_url(expected, step_timeout(*timeout_ms)).await,
        Step::AssertVisible {
            locator,
            timeout_ms,
        } => {
            session
                .assert_visible(locator, step_timeout(*timeout_ms))
                .await
        }
        Step::AssertText {
            locator,
            pattern,
            timeout_ms,
        } => {
            session
                .assert_text(locator, pattern, step_timeout(*timeout_ms))
                .await
        }
        Step::Reload => session.reload().await,
        Step::Sleep { ms } => {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_suite_fails_fast_when_app_unreachable() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunnerConfig {
            specs_dir: dir.path().to_path_buf(),
            app_startup_timeout: Duration::from_millis(300),
            harness: crate::config::HarnessConfig {
                // Nothing listens here
                base_url: "http://127.0.0.1:1".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let runner = SuiteRunner::new(config);
        let result = runner.run_all().await;
        assert!(matches!(result, Err(Error::AppUnreachable { .. })));
    }

    #[tokio::test]
    async fn test_run_named_missing_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let runner = SuiteRunner::new(RunnerConfig {
            specs_dir: dir.path().to_path_buf(),
            ..Default::default()
        });
        let result = runner.run_named("does-not-exist").await;
        assert!(matches!(result, Err(Error::SpecParse(_))));
    }
}
