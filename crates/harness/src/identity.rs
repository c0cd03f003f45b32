//! Unique registration credentials for scenarios
//!
//! Every scenario registers against a shared, never-reset backend user store,
//! so generated emails and usernames must never collide — within this run and
//! across concurrent runs on other machines. Each value embeds a per-run
//! namespace token, a millisecond timestamp, and an in-process counter.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Counter distinguishing identities minted in the same millisecond
static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Namespace token minted once per process run
static RUN_TOKEN: Lazy<String> = Lazy::new(|| {
    let id = Uuid::new_v4().simple().to_string();
    id[..8].to_string()
});

/// A generated set of registration credentials
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestIdentity {
    pub full_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
}

impl TestIdentity {
    /// Mint a fresh identity. `seed` prefixes the generated email and
    /// username so failures are attributable to a suite in backend data.
    pub fn fresh(seed: &str) -> Self {
        let suffix = unique_suffix();
        Self {
            full_name: "Test User".to_string(),
            email: format!("{}-{}@example.com", seed, suffix),
            username: format!("{}{}", seed, suffix.replace('-', "")),
            password: "Test123456!".to_string(),
        }
    }

    /// The namespace token shared by every identity in this process run
    pub fn run_token() -> &'static str {
        &RUN_TOKEN
    }
}

fn unique_suffix() -> String {
    let millis = Utc::now().timestamp_millis();
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}-{}", *RUN_TOKEN, millis, n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_identities_are_pairwise_distinct() {
        let mut emails = HashSet::new();
        let mut usernames = HashSet::new();
        for _ in 0..1000 {
            let id = TestIdentity::fresh("test");
            assert!(emails.insert(id.email.clone()), "duplicate email: {}", id.email);
            assert!(
                usernames.insert(id.username.clone()),
                "duplicate username: {}",
                id.username
            );
        }
    }

    #[test]
    fn test_distinct_across_threads() {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                std::thread::spawn(|| {
                    (0..100)
                        .map(|_| TestIdentity::fresh("test").username)
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all = HashSet::new();
        for handle in handles {
            for name in handle.join().unwrap() {
                assert!(all.insert(name));
            }
        }
        assert_eq!(all.len(), 800);
    }

    #[test]
    fn test_seed_prefixes_generated_values() {
        let id = TestIdentity::fresh("smoke");
        assert!(id.email.starts_with("smoke-"));
        assert!(id.username.starts_with("smoke"));
        assert!(id.email.ends_with("@example.com"));
        assert!(id.email.contains(TestIdentity::run_token()));
    }
}
