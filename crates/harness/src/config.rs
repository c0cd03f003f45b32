//! Harness configuration

use std::path::PathBuf;
use std::time::Duration;

/// Browser to drive through the WebDriver endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BrowserKind {
    #[default]
    Chrome,
    Firefox,
}

impl BrowserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserKind::Chrome => "chrome",
            BrowserKind::Firefox => "firefox",
        }
    }
}

/// Configuration shared by every browser session
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Base URL of the application under test
    pub base_url: String,

    /// WebDriver endpoint to open sessions against
    pub webdriver_url: String,

    /// Browser to request from the driver
    pub browser: BrowserKind,

    /// Run the browser headless
    pub headless: bool,

    /// Timeout for direct navigation (page load)
    pub navigation_timeout: Duration,

    /// Timeout for post-submit transitions (redirects after a network call)
    pub transition_timeout: Duration,

    /// Interval between condition probes
    pub poll_interval: Duration,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            webdriver_url: "http://127.0.0.1:9515".to_string(),
            browser: BrowserKind::Chrome,
            headless: true,
            navigation_timeout: Duration::from_secs(5),
            transition_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(250),
        }
    }
}

/// Configuration for spawning a WebDriver process
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Path to the driver binary (chromedriver, geckodriver)
    pub binary_path: PathBuf,

    /// Port to listen on (None = find free port)
    pub port: Option<u16>,

    /// Extra arguments passed to the driver
    pub extra_args: Vec<String>,

    /// Timeout for driver startup
    pub startup_timeout: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            binary_path: PathBuf::from("chromedriver"),
            port: None,
            extra_args: Vec::new(),
            startup_timeout: Duration::from_secs(15),
        }
    }
}

/// Configuration for the suite runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Per-session browser configuration
    pub harness: HarnessConfig,

    /// Directory containing YAML scenario files
    pub specs_dir: PathBuf,

    /// Output directory for results
    pub output_dir: PathBuf,

    /// Maximum number of scenarios running concurrently
    pub jobs: usize,

    /// Seed label for generated identities
    pub identity_seed: String,

    /// Timeout for the application to become reachable before the suite runs
    pub app_startup_timeout: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            harness: HarnessConfig::default(),
            specs_dir: PathBuf::from("specs"),
            output_dir: PathBuf::from("results"),
            jobs: 1,
            identity_seed: "test".to_string(),
            app_startup_timeout: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harness_config_default() {
        let config = HarnessConfig::default();
        assert!(config.headless);
        assert_eq!(config.transition_timeout, Duration::from_secs(10));
        assert!(config.navigation_timeout < config.transition_timeout);
    }

    #[test]
    fn test_runner_config_default() {
        let config = RunnerConfig::default();
        assert_eq!(config.jobs, 1);
        assert_eq!(config.specs_dir, PathBuf::from("specs"));
    }
}
