//! Locator abstraction for finding UI elements
//!
//! A locator describes how to find an element without referring to the
//! application's internals. Resolution happens against the live DOM at query
//! time and is strict for interactions: zero or many matches fail the step
//! with the observed count.

use std::fmt;

use fantoccini::elements::Element;
use fantoccini::{Client, Locator as WdLocator};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How to find a UI element
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum Locator {
    /// By ARIA role and accessible name (substring, case-insensitive)
    Role { role: String, name: String },

    /// By placeholder text (substring, case-insensitive)
    Placeholder { text: String },

    /// By the text of an associated `<label>` (substring, case-insensitive)
    Label { text: String },

    /// By visible text matching a case-insensitive regular expression
    Text { pattern: String },

    /// By CSS selector
    Css { selector: String },
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Role { role, name } => write!(f, "role={} name={:?}", role, name),
            Locator::Placeholder { text } => write!(f, "placeholder={:?}", text),
            Locator::Label { text } => write!(f, "label={:?}", text),
            Locator::Text { pattern } => write!(f, "text~/{}/", pattern),
            Locator::Css { selector } => write!(f, "css={}", selector),
        }
    }
}

impl Locator {
    /// Resolve to every matching element in the current DOM
    pub(crate) async fn resolve_all(&self, client: &Client) -> Result<Vec<Element>> {
        match self {
            Locator::Css { selector } => Ok(client.find_all(WdLocator::Css(selector)).await?),

            Locator::Placeholder { text } => {
                let candidates = client
                    .find_all(WdLocator::Css("input[placeholder], textarea[placeholder]"))
                    .await?;
                let mut matches = Vec::new();
                for element in candidates {
                    if let Some(placeholder) = element.attr("placeholder").await? {
                        if contains_ci(&placeholder, text) {
                            matches.push(element);
                        }
                    }
                }
                Ok(matches)
            }

            Locator::Label { text } => {
                let labels = client.find_all(WdLocator::Css("label")).await?;
                let mut matches = Vec::new();
                for label in labels {
                    if !contains_ci(&label.text().await?, text) {
                        continue;
                    }
                    match label.attr("for").await? {
                        Some(target) if !target.is_empty() => {
                            let selector = format!("[id=\"{}\"]", target);
                            matches.extend(client.find_all(WdLocator::Css(&selector)).await?);
                        }
                        _ => {
                            // Label wraps its control
                            matches.extend(
                                label.find_all(WdLocator::Css("input, textarea, select")).await?,
                            );
                        }
                    }
                }
                Ok(matches)
            }

            Locator::Role { role, name } => {
                let selector = role_selector(role);
                let candidates = client.find_all(WdLocator::Css(&selector)).await?;
                let mut matches = Vec::new();
                for element in candidates {
                    if contains_ci(&accessible_name(&element).await?, name) {
                        matches.push(element);
                    }
                }
                Ok(matches)
            }

            Locator::Text { pattern } => {
                let regex = build_pattern(pattern)?;
                // Elements carrying a non-empty text node of their own
                let candidates = client
                    .find_all(WdLocator::XPath(
                        "//body//*[text()[normalize-space(.) != '']]",
                    ))
                    .await?;
                let mut matches = Vec::new();
                for element in candidates {
                    if regex.is_match(&element.text().await?) {
                        matches.push(element);
                    }
                }
                Ok(matches)
            }
        }
    }

    /// Resolve to exactly one element, for interaction steps
    pub(crate) async fn resolve_one(&self, client: &Client) -> Result<Element> {
        let mut matches = self.resolve_all(client).await?;
        if matches.len() != 1 {
            return Err(Error::LocatorNotFound {
                locator: self.to_string(),
                count: matches.len(),
            });
        }
        Ok(matches.remove(0))
    }

    /// Rewrite every string field through `f` (identity placeholder expansion)
    pub(crate) fn map_strings(&self, f: &dyn Fn(&str) -> String) -> Locator {
        match self {
            Locator::Role { role, name } => Locator::Role {
                role: role.clone(),
                name: f(name),
            },
            Locator::Placeholder { text } => Locator::Placeholder { text: f(text) },
            Locator::Label { text } => Locator::Label { text: f(text) },
            Locator::Text { pattern } => Locator::Text { pattern: f(pattern) },
            Locator::Css { selector } => Locator::Css {
                selector: f(selector),
            },
        }
    }
}

/// Compile a case-insensitive text pattern
pub(crate) fn build_pattern(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| Error::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

/// CSS candidates for an ARIA role
fn role_selector(role: &str) -> String {
    match role {
        "button" => {
            "button, [role='button'], input[type='submit'], input[type='button']".to_string()
        }
        "link" => "a[href], [role='link']".to_string(),
        "textbox" => {
            "input:not([type]), input[type='text'], input[type='email'], \
             input[type='password'], textarea, [role='textbox']"
                .to_string()
        }
        "heading" => "h1, h2, h3, h4, h5, h6, [role='heading']".to_string(),
        "checkbox" => "input[type='checkbox'], [role='checkbox']".to_string(),
        other => format!("[role='{}']", other),
    }
}

/// Approximate the accessible name: aria-label, then visible text, then value
async fn accessible_name(element: &Element) -> Result<String> {
    if let Some(label) = element.attr("aria-label").await? {
        if !label.trim().is_empty() {
            return Ok(label);
        }
    }
    let text = element.text().await?;
    if !text.trim().is_empty() {
        return Ok(text);
    }
    Ok(element.attr("value").await?.unwrap_or_default())
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_locator_yaml() {
        let locator: Locator =
            serde_yaml::from_str("by: placeholder\ntext: username or email").unwrap();
        assert_eq!(
            locator,
            Locator::Placeholder {
                text: "username or email".to_string()
            }
        );

        let locator: Locator =
            serde_yaml::from_str("by: role\nrole: button\nname: sign in").unwrap();
        assert_eq!(
            locator,
            Locator::Role {
                role: "button".to_string(),
                name: "sign in".to_string()
            }
        );
    }

    #[test]
    fn test_display() {
        let locator = Locator::Label {
            text: "full name".to_string(),
        };
        assert_eq!(locator.to_string(), "label=\"full name\"");

        let locator = Locator::Text {
            pattern: "welcome back".to_string(),
        };
        assert_eq!(locator.to_string(), "text~/welcome back/");
    }

    #[test]
    fn test_role_selector_known_roles() {
        assert!(role_selector("button").contains("input[type='submit']"));
        assert!(role_selector("link").contains("a[href]"));
        assert_eq!(role_selector("alert"), "[role='alert']");
    }

    #[test]
    fn test_contains_ci() {
        assert!(contains_ci("Username or Email", "username"));
        assert!(contains_ci("PASSWORD", "password"));
        assert!(!contains_ci("first name", "email"));
    }

    #[test]
    fn test_build_pattern_case_insensitive() {
        let re = build_pattern("welcome back").unwrap();
        assert!(re.is_match("Welcome Back, testuser!"));
    }

    #[test]
    fn test_build_pattern_invalid() {
        let err = build_pattern("welcome (back").unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }

    #[test]
    fn test_map_strings() {
        let locator = Locator::Text {
            pattern: "{username}".to_string(),
        };
        let mapped = locator.map_strings(&|s| s.replace("{username}", "alice"));
        assert_eq!(
            mapped,
            Locator::Text {
                pattern: "alice".to_string()
            }
        );
    }
}
