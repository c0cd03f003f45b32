//! Result and diagnostic types for scenario runs

use serde::{Deserialize, Serialize};

/// Captured page state at the point of failure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostic {
    /// URL the browser was on, if it could be read
    pub url: Option<String>,

    /// Visible-text excerpt of the page, if it could be read
    pub page_text: Option<String>,
}

/// Result of executing a single step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    pub step: String,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepReport>,
    /// Page state captured when the scenario failed
    pub diagnostic: Option<Diagnostic>,
    pub error: Option<String>,
}

impl ScenarioResult {
    /// A result for a scenario that failed before any step could run
    pub fn aborted(name: &str, error: String) -> Self {
        Self {
            name: name.to_string(),
            success: false,
            duration_ms: 0,
            steps: Vec::new(),
            diagnostic: None,
            error: Some(error),
        }
    }
}

/// Result of running the whole suite
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub started_at: String,
    pub results: Vec<ScenarioResult>,
}

impl SuiteResult {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Bound the size of captured page text in diagnostics
pub(crate) fn truncate_text(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 100), "short");
        let truncated = truncate_text(&"x".repeat(100), 10);
        assert_eq!(truncated, format!("{}…", "x".repeat(10)));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "héllo wörld";
        let truncated = truncate_text(text, 2);
        assert!(truncated.ends_with('…'));
    }

    #[test]
    fn test_suite_result_serializes() {
        let suite = SuiteResult {
            total: 1,
            passed: 1,
            failed: 0,
            duration_ms: 42,
            started_at: "2026-01-01T00:00:00Z".to_string(),
            results: vec![ScenarioResult {
                name: "login".to_string(),
                success: true,
                duration_ms: 42,
                steps: Vec::new(),
                diagnostic: None,
                error: None,
            }],
        };
        let json = serde_json::to_string(&suite).unwrap();
        assert!(json.contains("\"passed\":1"));
        assert!(suite.all_passed());
    }
}
