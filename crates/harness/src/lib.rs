//! GateCheck UI Acceptance Harness
//!
//! This crate drives a real browser against an externally running web
//! application and asserts on its observable behavior:
//! - Spawns a WebDriver process (chromedriver/geckodriver) and health-checks it
//! - Parses declarative YAML scenarios
//! - Runs each scenario in an isolated, reset browser session with a fresh
//!   generated identity
//! - Polls assertions until they hold or a deadline passes, capturing the
//!   last observed state on failure
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Suite Runner (Rust)                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  SuiteRunner                                                │
//! │    ├── wait_for_app() ─ health gate on the app under test   │
//! │    ├── Session::connect() per scenario (isolated, reset)    │
//! │    ├── execute_steps(scenario) -> ScenarioResult            │
//! │    └── write_results() -> results.json                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Scenario (YAML)                                            │
//! │    ├── name, description, tags, timeout_ms                  │
//! │    └── steps: [Step]                                        │
//! │          ├── navigate { url }                               │
//! │          ├── fill { locator, value }                        │
//! │          ├── click { locator }                              │
//! │          ├── assert_url { expected }                        │
//! │          ├── assert_visible { locator }                     │
//! │          └── assert_text { locator, pattern }               │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod assertions;
pub mod browser;
pub mod config;
pub mod driver;
pub mod error;
pub mod identity;
pub mod locator;
pub mod poll;
pub mod report;
pub mod runner;
pub mod spec;

pub use browser::Session;
pub use config::{BrowserKind, DriverConfig, HarnessConfig, RunnerConfig};
pub use driver::{wait_for_app, DriverHandle};
pub use error::{Error, Result};
pub use identity::TestIdentity;
pub use locator::Locator;
pub use report::{ScenarioResult, SuiteResult};
pub use runner::SuiteRunner;
pub use spec::{Scenario, Step};
