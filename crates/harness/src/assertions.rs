//! Poll-based assertions against the live page
//!
//! Assertions share the executor's poll-with-deadline primitive: the
//! condition is re-checked at a fixed interval because UI state changes
//! asynchronously after actions (a submit triggers a network call before the
//! URL or the feedback text changes). Failures carry the last observed state.

use std::time::Duration;

use crate::browser::Session;
use crate::error::{Error, Result};
use crate::locator::{build_pattern, Locator};
use crate::poll::{poll_until, PollPolicy, PollResult, Probe};
use crate::report::truncate_text;

const OBSERVED_TEXT_LIMIT: usize = 200;

impl Session {
    fn assertion_policy(&self, timeout: Option<Duration>) -> PollPolicy {
        PollPolicy::new(
            self.config().poll_interval,
            timeout.unwrap_or(self.config().transition_timeout),
        )
    }

    /// Assert that the current URL path equals `expected`
    pub async fn assert_url(&self, expected: &str, timeout: Option<Duration>) -> Result<()> {
        let policy = self.assertion_policy(timeout);
        match self.poll_url(&policy, expected).await? {
            PollResult::Ready(()) => Ok(()),
            PollResult::TimedOut { last_observed } => Err(Error::Assertion {
                expected: format!("URL path {}", expected),
                last_observed,
            }),
        }
    }

    /// Assert that at least one element matching the locator is visible
    pub async fn assert_visible(&self, locator: &Locator, timeout: Option<Duration>) -> Result<()> {
        let policy = self.assertion_policy(timeout);
        let client = self.client().clone();
        let locator = locator.clone();

        let outcome = poll_until(&policy, {
            let locator = locator.clone();
            move || {
                let client = client.clone();
                let locator = locator.clone();
                async move {
                    let matches = locator.resolve_all(&client).await?;
                    let total = matches.len();
                    for element in matches {
                        if element.is_displayed().await? {
                            return Ok(Probe::Ready(()));
                        }
                    }
                    Ok(Probe::Pending(format!(
                        "{} element(s) matched, none visible",
                        total
                    )))
                }
            }
        })
        .await?;

        match outcome {
            PollResult::Ready(()) => Ok(()),
            PollResult::TimedOut { last_observed } => Err(Error::Assertion {
                expected: format!("{} to be visible", locator),
                last_observed,
            }),
        }
    }

    /// Assert that a visible element matching the locator has text matching
    /// the case-insensitive pattern
    pub async fn assert_text(
        &self,
        locator: &Locator,
        pattern: &str,
        timeout: Option<Duration>,
    ) -> Result<()> {
        let regex = build_pattern(pattern)?;
        let policy = self.assertion_policy(timeout);
        let client = self.client().clone();
        let locator = locator.clone();

        let outcome = poll_until(&policy, {
            let locator = locator.clone();
            move || {
            let client = client.clone();
            let locator = locator.clone();
            let regex = regex.clone();
            async move {
                let matches = locator.resolve_all(&client).await?;
                if matches.is_empty() {
                    return Ok(Probe::Pending("no elements matched".to_string()));
                }
                let mut last_text = String::new();
                for element in matches {
                    if !element.is_displayed().await? {
                        continue;
                    }
                    let text = element.text().await?;
                    if regex.is_match(&text) {
                        return Ok(Probe::Ready(()));
                    }
                    last_text = text;
                }
                Ok(Probe::Pending(format!(
                    "last text seen: {:?}",
                    truncate_text(&last_text, OBSERVED_TEXT_LIMIT)
                )))
            }
            }
        })
        .await?;

        match outcome {
            PollResult::Ready(()) => Ok(()),
            PollResult::TimedOut { last_observed } => Err(Error::Assertion {
                expected: format!("{} to match /{}/", locator, pattern),
                last_observed,
            }),
        }
    }
}
