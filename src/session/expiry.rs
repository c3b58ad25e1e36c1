//! Token expiry evaluation with a clock-skew safety margin.

use std::time::Duration;

use super::token::Claims;

/// Decides whether a token is currently usable: `now < exp - skew`.
/// A token with no expiry claim is invalid (fail closed).
#[derive(Debug, Clone)]
pub struct ExpiryEvaluator {
    skew: Duration,
}

impl Default for ExpiryEvaluator {
    fn default() -> Self { Self { skew: Duration::from_secs(crate::config::DEFAULT_SKEW_SECS) } }
}

impl ExpiryEvaluator {
    pub fn new(skew: Duration) -> Self { Self { skew } }

    pub fn is_valid(&self, claims: &Claims) -> bool {
        self.is_valid_at(claims, chrono::Utc::now().timestamp())
    }

    /// Pure variant for deterministic evaluation against an explicit clock.
    pub fn is_valid_at(&self, claims: &Claims, now_secs: i64) -> bool {
        match claims.exp {
            Some(exp) => now_secs < exp - self.skew.as_secs() as i64,
            None => false,
        }
    }
}
