//! Browser session control
//!
//! One `Session` wraps one WebDriver session. Scenarios run in their own
//! session, reset before the first step so navigation starts unauthenticated.

use std::time::Duration;

use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder};
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::config::{BrowserKind, HarnessConfig};
use crate::error::{Error, Result};
use crate::locator::Locator;
use crate::poll::{poll_until, PollPolicy, PollResult, Probe};
use crate::report::{truncate_text, Diagnostic};

const SNAPSHOT_TEXT_LIMIT: usize = 2000;

/// A live browser session against the application under test
pub struct Session {
    client: Client,
    base: Url,
    config: HarnessConfig,
}

impl Session {
    /// Open a new WebDriver session
    pub async fn connect(config: &HarnessConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url).map_err(|e| {
            Error::InvalidConfig(format!("invalid base URL {}: {}", config.base_url, e))
        })?;

        let mut builder = ClientBuilder::native();
        builder.capabilities(capabilities(config));
        let client = builder.connect(&config.webdriver_url).await?;

        Ok(Self {
            client,
            base,
            config: config.clone(),
        })
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    pub(crate) fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Clear cookies and client-side storage so the session starts
    /// unauthenticated. Storage is per-origin, so the browser lands on the
    /// application first.
    pub async fn reset(&self) -> Result<()> {
        self.goto_absolute(self.base.as_str()).await?;
        self.client.delete_all_cookies().await?;
        self.client
            .execute(
                "window.localStorage.clear(); window.sessionStorage.clear();",
                vec![],
            )
            .await?;
        Ok(())
    }

    /// Load a URL; relative paths resolve against the base URL
    pub async fn navigate(&self, path: &str) -> Result<()> {
        let target = resolve_url(&self.base, path)?;
        self.goto_absolute(target.as_str()).await
    }

    async fn goto_absolute(&self, url: &str) -> Result<()> {
        debug!("navigate: {}", url);
        match tokio::time::timeout(self.config.navigation_timeout, self.client.goto(url)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(Error::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(Error::Navigation {
                url: url.to_string(),
                reason: format!(
                    "page did not respond within {:?}",
                    self.config.navigation_timeout
                ),
            }),
        }
    }

    /// Resolve a locator to exactly one element and set its value
    pub async fn fill(&self, locator: &Locator, value: &str) -> Result<()> {
        debug!("fill: {} = {:?}", locator, value);
        let element = locator.resolve_one(&self.client).await?;
        self.ensure_interactable(locator, &element).await?;
        element.clear().await?;
        element.send_keys(value).await?;
        Ok(())
    }

    /// Resolve a locator to exactly one element and click it
    pub async fn click(&self, locator: &Locator) -> Result<()> {
        debug!("click: {}", locator);
        let element = locator.resolve_one(&self.client).await?;
        self.ensure_interactable(locator, &element).await?;
        element.click().await?;
        Ok(())
    }

    async fn ensure_interactable(&self, locator: &Locator, element: &Element) -> Result<()> {
        if !element.is_displayed().await? {
            return Err(Error::NotInteractable {
                locator: locator.to_string(),
                reason: "element is hidden".to_string(),
            });
        }
        if !element.is_enabled().await? {
            return Err(Error::NotInteractable {
                locator: locator.to_string(),
                reason: "element is disabled".to_string(),
            });
        }
        Ok(())
    }

    /// Reload the current page
    pub async fn reload(&self) -> Result<()> {
        self.client.refresh().await?;
        Ok(())
    }

    /// Path component of the current URL
    pub async fn current_path(&self) -> Result<String> {
        let url = self.client.current_url().await?;
        Ok(url.path().to_string())
    }

    /// Poll the current URL until its path equals `expected` or the deadline
    /// passes. Used by the executor for post-submit transitions.
    pub async fn wait_for_url(&self, expected: &str, timeout: Option<Duration>) -> Result<()> {
        let policy = PollPolicy::new(
            self.config.poll_interval,
            timeout.unwrap_or(self.config.transition_timeout),
        );
        match self.poll_url(&policy, expected).await? {
            PollResult::Ready(()) => Ok(()),
            PollResult::TimedOut { last_observed } => Err(Error::Timeout(format!(
                "URL to become {} ({})",
                expected, last_observed
            ))),
        }
    }

    pub(crate) async fn poll_url(
        &self,
        policy: &PollPolicy,
        expected: &str,
    ) -> Result<PollResult<()>> {
        let client = self.client.clone();
        let expected = expected.to_string();
        poll_until(policy, move || {
            let client = client.clone();
            let expected = expected.clone();
            async move {
                let url = client.current_url().await?;
                if url.path() == expected {
                    Ok(Probe::Ready(()))
                } else {
                    Ok(Probe::Pending(format!("current URL is {}", url)))
                }
            }
        })
        .await
    }

    /// Best-effort capture of the page state for failure diagnostics
    pub async fn snapshot(&self) -> Diagnostic {
        let url = self
            .client
            .current_url()
            .await
            .ok()
            .map(|u| u.to_string());
        let page_text = self
            .client
            .execute(
                "return document.body ? document.body.innerText : '';",
                vec![],
            )
            .await
            .ok()
            .and_then(|value| value.as_str().map(String::from))
            .map(|text| truncate_text(&text, SNAPSHOT_TEXT_LIMIT));
        Diagnostic { url, page_text }
    }

    /// Close the underlying WebDriver session
    pub async fn close(self) -> Result<()> {
        self.client.close().await?;
        Ok(())
    }
}

/// Resolve a possibly-relative path against the application base URL
fn resolve_url(base: &Url, path: &str) -> Result<Url> {
    if path.starts_with("http://") || path.starts_with("https://") {
        Url::parse(path)
    } else {
        base.join(path)
    }
    .map_err(|e| Error::Navigation {
        url: path.to_string(),
        reason: e.to_string(),
    })
}

/// W3C capabilities for the configured browser
fn capabilities(config: &HarnessConfig) -> serde_json::map::Map<String, serde_json::Value> {
    let mut caps = serde_json::map::Map::new();
    caps.insert("browserName".to_string(), json!(config.browser.as_str()));
    match config.browser {
        BrowserKind::Chrome => {
            let mut args = vec![
                "--disable-gpu".to_string(),
                "--window-size=1280,720".to_string(),
            ];
            if config.headless {
                args.push("--headless=new".to_string());
            }
            caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
        }
        BrowserKind::Firefox => {
            let mut args: Vec<String> = Vec::new();
            if config.headless {
                args.push("-headless".to_string());
            }
            caps.insert("moz:firefoxOptions".to_string(), json!({ "args": args }));
        }
    }
    caps
}
