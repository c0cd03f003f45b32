//! Declarative YAML scenario specification
//!
//! A scenario is an ordered sequence of steps with a name, description, and
//! tags. Step values may reference the scenario's generated identity through
//! `{full_name}`, `{email}`, `{username}` and `{password}` placeholders.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::identity::TestIdentity;
use crate::locator::{build_pattern, Locator};

/// A complete scenario parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Unique name for this scenario
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering
    #[serde(default)]
    pub tags: Vec<String>,

    /// Overall budget for the scenario, session setup included
    #[serde(default = "default_budget_ms")]
    pub timeout_ms: u64,

    /// Steps to execute in order
    pub steps: Vec<Step>,
}

fn default_budget_ms() -> u64 {
    60_000
}

/// A single step in a scenario
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Load a URL (relative to the base URL)
    Navigate { url: String },

    /// Fill an input field
    Fill { locator: Locator, value: String },

    /// Click an element
    Click { locator: Locator },

    /// Assert the current URL path
    AssertUrl {
        expected: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Assert an element is visible
    AssertVisible {
        locator: Locator,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Assert an element's text matches a case-insensitive pattern
    AssertText {
        locator: Locator,
        pattern: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Reload the current page
    Reload,

    /// Wait for a fixed amount of time (use sparingly)
    Sleep { ms: u64 },
}

impl Step {
    /// Short name for logging and step reports
    pub fn name(&self) -> String {
        match self {
            Step::Navigate { url } => format!("navigate:{}", url),
            Step::Fill { locator, .. } => format!("fill:{}", locator),
            Step::Click { locator } => format!("click:{}", locator),
            Step::AssertUrl { expected, .. } => format!("assert_url:{}", expected),
            Step::AssertVisible { locator, .. } => format!("assert_visible:{}", locator),
            Step::AssertText { locator, pattern, .. } => {
                format!("assert_text:{}~/{}/", locator, pattern)
            }
            Step::Reload => "reload".to_string(),
            Step::Sleep { ms } => format!("sleep:{}ms", ms),
        }
    }

    /// Expand identity placeholders in every string the step carries
    fn with_identity(&self, identity: &TestIdentity) -> Step {
        let expand = |s: &str| expand_placeholders(s, identity);
        match self {
            Step::Navigate { url } => Step::Navigate { url: expand(url) },
            Step::Fill { locator, value } => Step::Fill {
                locator: locator.map_strings(&expand),
                value: expand(value),
            },
            Step::Click { locator } => Step::Click {
                locator: locator.map_strings(&expand),
            },
            Step::AssertUrl {
                expected,
                timeout_ms,
            } => Step::AssertUrl {
                expected: expand(expected),
                timeout_ms: *timeout_ms,
            },
            Step::AssertVisible {
                locator,
                timeout_ms,
            } => Step::AssertVisible {
                locator: locator.map_strings(&expand),
                timeout_ms: *timeout_ms,
            },
            Step::AssertText {
                locator,
                pattern,
                timeout_ms,
            } => Step::AssertText {
                locator: locator.map_strings(&expand),
                pattern: expand(pattern),
                timeout_ms: *timeout_ms,
            },
            Step::Reload => Step::Reload,
            Step::Sleep { ms } => Step::Sleep { ms: *ms },
        }
    }
}

/// Convert an optional step timeout to a duration
pub(crate) fn step_timeout(timeout_ms: Option<u64>) -> Option<Duration> {
    timeout_ms.map(Duration::from_millis)
}

fn expand_placeholders(input: &str, identity: &TestIdentity) -> String {
    input
        .replace("{full_name}", &identity.full_name)
        .replace("{email}", &identity.email)
        .replace("{username}", &identity.username)
        .replace("{password}", &identity.password)
}

impl Scenario {
    /// Parse a scenario from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    /// Parse a scenario from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|e| {
            Error::SpecParse(format!("{}: {}", path.display(), e))
        })
    }

    /// Load every scenario under a directory, sorted by name
    pub fn load_all(dir: &Path) -> Result<Vec<Self>> {
        let mut scenarios = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            let scenario = Self::from_file(entry.path())?;
            scenarios.push(scenario);
        }

        scenarios.sort_by(|a, b| a.name.cmp(&b.name));

        for pair in scenarios.windows(2) {
            if pair[0].name == pair[1].name {
                return Err(Error::SpecParse(format!(
                    "duplicate scenario name: {}",
                    pair[0].name
                )));
            }
        }

        Ok(scenarios)
    }

    /// Filter scenarios by tag
    pub fn filter_by_tag(scenarios: Vec<Self>, tag: &str) -> Vec<Self> {
        scenarios
            .into_iter()
            .filter(|s| s.tags.iter().any(|t| t == tag))
            .collect()
    }

    /// Produce a copy with identity placeholders expanded in every step
    pub fn with_identity(&self, identity: &TestIdentity) -> Scenario {
        Scenario {
            name: self.name.clone(),
            description: self.description.clone(),
            tags: self.tags.clone(),
            timeout_ms: self.timeout_ms,
            steps: self
                .steps
                .iter()
                .map(|step| step.with_identity(identity))
                .collect(),
        }
    }

    /// Check the scenario is well-formed without executing it
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::SpecParse("scenario name is empty".to_string()));
        }
        if self.steps.is_empty() {
            return Err(Error::SpecParse(format!(
                "scenario {} has no steps",
                self.name
            )));
        }

        // Patterns must compile once placeholders are expanded
        let probe_identity = TestIdentity {
            full_name: "Probe User".to_string(),
            email: "probe@example.com".to_string(),
            username: "probe".to_string(),
            password: "probe".to_string(),
        };
        for step in self.with_identity(&probe_identity).steps {
            match step {
                Step::AssertText { pattern, .. } => {
                    build_pattern(&pattern)?;
                }
                Step::AssertVisible {
                    locator: Locator::Text { pattern },
                    ..
                } => {
                    build_pattern(&pattern)?;
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_login_scenario() {
        let yaml = r#"
name: login-valid-username
description: Logging in with correct username and password lands on /
tags:
  - auth
  - smoke
steps:
  - action: navigate
    url: /login
  - action: fill
    locator: { by: placeholder, text: username or email }
    value: "{username}"
  - action: fill
    locator: { by: placeholder, text: password }
    value: "{password}"
  - action: click
    locator: { by: css, selector: "button[type='submit']" }
  - action: assert_url
    expected: /
    timeout_ms: 10000
"#;
        let scenario = Scenario::from_yaml(yaml).unwrap();
        assert_eq!(scenario.name, "login-valid-username");
        assert_eq!(scenario.steps.len(), 5);
        assert_eq!(scenario.tags, vec!["auth", "smoke"]);
        assert_eq!(scenario.timeout_ms, 60_000);
        assert!(scenario.validate().is_ok());
    }

    #[test]
    fn test_parse_reload_and_sleep_steps() {
        let yaml = r#"
name: session-persists
steps:
  - action: reload
  - action: sleep
    ms: 100
  - action: assert_url
    expected: /
"#;
        let scenario = Scenario::from_yaml(yaml).unwrap();
        assert_eq!(scenario.steps[0], Step::Reload);
        assert_eq!(scenario.steps[1], Step::Sleep { ms: 100 });
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let yaml = r#"
name: bad
steps:
  - action: teleport
    url: /
"#;
        assert!(Scenario::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_identity_interpolation() {
        let yaml = r#"
name: register
steps:
  - action: fill
    locator: { by: label, text: email }
    value: "{email}"
  - action: assert_text
    locator: { by: css, selector: body }
    pattern: "welcome back.*{username}"
"#;
        let scenario = Scenario::from_yaml(yaml).unwrap();
        let identity = TestIdentity {
            full_name: "Test User".to_string(),
            email: "alice@example.com".to_string(),
            username: "alice42".to_string(),
            password: "secret".to_string(),
        };
        let expanded = scenario.with_identity(&identity);
        assert_eq!(
            expanded.steps[0],
            Step::Fill {
                locator: Locator::Label {
                    text: "email".to_string()
                },
                value: "alice@example.com".to_string(),
            }
        );
        match &expanded.steps[1] {
            Step::AssertText { pattern, .. } => {
                assert_eq!(pattern, "welcome back.*alice42");
            }
            other => panic!("unexpected step: {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_bad_pattern() {
        let yaml = r#"
name: bad-pattern
steps:
  - action: assert_text
    locator: { by: css, selector: body }
    pattern: "welcome (back"
"#;
        let scenario = Scenario::from_yaml(yaml).unwrap();
        assert!(scenario.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_steps() {
        let scenario = Scenario {
            name: "empty".to_string(),
            description: String::new(),
            tags: Vec::new(),
            timeout_ms: 1000,
            steps: Vec::new(),
        };
        assert!(scenario.validate().is_err());
    }

    #[test]
    fn test_step_names() {
        let step = Step::Navigate {
            url: "/login".to_string(),
        };
        assert_eq!(step.name(), "navigate:/login");

        let step = Step::AssertUrl {
            expected: "/".to_string(),
            timeout_ms: None,
        };
        assert_eq!(step.name(), "assert_url:/");
    }
}
