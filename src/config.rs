//! Guard configuration
//! -------------------
//! Environment-backed settings for the session guard. The only variable a
//! deployment must provide is the authority base URL; everything else has a
//! safe default. Environment parsing never fails: unparseable values fall
//! back to the default so a bad variable cannot keep the admin shell from
//! booting.

use std::env;
use std::time::Duration;

pub const DEFAULT_SKEW_SECS: u64 = 30;
pub const DEFAULT_VERIFY_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_REQUIRED_ROLE: &str = "admin";

pub const ENV_BASE_URL: &str = "DOORMAN_API_BASE_URL";
pub const ENV_SKEW_SECS: &str = "DOORMAN_SKEW_SECS";
pub const ENV_VERIFY_TIMEOUT_SECS: &str = "DOORMAN_VERIFY_TIMEOUT_SECS";
pub const ENV_REQUIRED_ROLE: &str = "DOORMAN_REQUIRED_ROLE";

fn parse_secs_env(name: &str) -> Option<u64> {
    match env::var(name) {
        Ok(val) => val.parse::<u64>().ok(),
        Err(_) => None,
    }
}

/// Settings consumed by the guard, expiry evaluator and remote verifier.
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Base URL of the remote authority. `None` disables background
    /// verification and remote logout notification; local guarding still works.
    pub base_url: Option<String>,
    /// Clock-skew margin subtracted from a token's expiry.
    pub skew: Duration,
    /// Hard per-call timeout for verify/logout requests.
    pub verify_timeout: Duration,
    /// Role tag a credential must carry to count as an administrative session.
    pub required_role: String,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            skew: Duration::from_secs(DEFAULT_SKEW_SECS),
            verify_timeout: Duration::from_secs(DEFAULT_VERIFY_TIMEOUT_SECS),
            required_role: DEFAULT_REQUIRED_ROLE.to_string(),
        }
    }
}

impl GuardConfig {
    pub fn from_env() -> Self {
        let base_url = env::var(ENV_BASE_URL).ok().filter(|s| !s.trim().is_empty());
        let skew = parse_secs_env(ENV_SKEW_SECS).unwrap_or(DEFAULT_SKEW_SECS);
        let timeout = parse_secs_env(ENV_VERIFY_TIMEOUT_SECS).unwrap_or(DEFAULT_VERIFY_TIMEOUT_SECS);
        let required_role = env::var(ENV_REQUIRED_ROLE)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REQUIRED_ROLE.to_string());
        Self {
            base_url,
            skew: Duration::from_secs(skew),
            verify_timeout: Duration::from_secs(timeout),
            required_role,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_skew(mut self, skew: Duration) -> Self {
        self.skew = skew;
        self
    }

    pub fn with_verify_timeout(mut self, timeout: Duration) -> Self {
        self.verify_timeout = timeout;
        self
    }

    pub fn with_required_role(mut self, role: impl Into<String>) -> Self {
        self.required_role = role.into();
        self
    }
}
