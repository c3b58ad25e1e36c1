//! Background session verification against the remote authority.
//!
//! Invoked only after a local `Authenticated` verdict and never gating first
//! render. The outcome taxonomy deliberately trades strictness for
//! availability: only an explicit denial from the authority tears a session
//! down; transport trouble (timeout, connect failure, 5xx) leaves the
//! already-rendered session alone.

use std::time::Duration;

use reqwest::Url;
use serde_json::Value;
use tracing::debug;

use crate::config::GuardConfig;
use crate::error::{AuthError, AuthResult};

use super::store::CachedProfile;

pub const VERIFY_PATH: &str = "/admin/verify";
pub const LOGOUT_PATH: &str = "/admin/logout";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Authority confirmed the session and returned a fresh profile.
    Confirmed(CachedProfile),
    /// Authority explicitly denied the token (revoked, unknown, not admin).
    Rejected,
    /// Authority could not be consulted; keep trusting local state.
    Unreachable,
}

#[derive(Debug)]
pub struct RemoteVerifier {
    client: reqwest::Client,
    base: Url,
    timeout: Duration,
}

impl RemoteVerifier {
    pub fn from_config(cfg: &GuardConfig) -> AuthResult<Self> {
        let raw = cfg.base_url.as_deref().ok_or_else(|| {
            AuthError::config("base_url_missing".to_string(), "remote authority base URL not configured".to_string())
        })?;
        let base = Url::parse(raw)
            .map_err(|e| AuthError::config("base_url_invalid".to_string(), e.to_string()))?;
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, base, timeout: cfg.verify_timeout })
    }

    /// Confirm the bearer token with the authority's verify endpoint.
    pub async fn verify(&self, token: &str) -> Outcome {
        match self.call_verify(token).await {
            Ok((status, body)) => classify_response(status, &body),
            Err(e) => {
                debug!("verify.unreachable err={}", e);
                Outcome::Unreachable
            }
        }
    }

    async fn call_verify(&self, token: &str) -> AuthResult<(u16, Value)> {
        let url = self
            .base
            .join(VERIFY_PATH)
            .map_err(|e| AuthError::internal("verify_url".to_string(), e.to_string()))?;
        let resp = self
            .client
            .get(url)
            .bearer_auth(token)
            .timeout(self.timeout)
            .send()
            .await?;
        let status = resp.status().as_u16();
        // Body problems on a 2xx read as an empty object and classify Rejected
        // below; on error statuses the body is irrelevant anyway.
        let body = resp.json::<Value>().await.unwrap_or_else(|_| Value::Object(Default::default()));
        Ok((status, body))
    }

    /// Best-effort logout notification. The response is ignored for control
    /// flow; the caller swallows any error this returns.
    pub async fn notify_logout(&self, token: &str) -> AuthResult<()> {
        let url = self
            .base
            .join(LOGOUT_PATH)
            .map_err(|e| AuthError::internal("logout_url".to_string(), e.to_string()))?;
        self.client
            .post(url)
            .bearer_auth(token)
            .timeout(self.timeout)
            .send()
            .await?;
        Ok(())
    }
}

/// Map an authority response onto an outcome. 5xx counts as unreachable, not
/// rejected: a struggling backend must not log out every admin.
fn classify_response(status: u16, body: &Value) -> Outcome {
    if status >= 500 {
        return Outcome::Unreachable;
    }
    if !(200..300).contains(&status) {
        return Outcome::Rejected;
    }
    let success = body.get("success").and_then(|v| v.as_bool()).unwrap_or(false);
    if !success {
        return Outcome::Rejected;
    }
    match profile_from_admin(body.get("admin")) {
        Some(p) => Outcome::Confirmed(p),
        // success:true without a usable admin record is still a denial of an
        // administrative session.
        None => Outcome::Rejected,
    }
}

/// Lift the authority's admin record into a cached profile. The authority
/// spells the display name as either `full_name` or `name`.
fn profile_from_admin(v: Option<&Value>) -> Option<CachedProfile> {
    let rec = v?.as_object()?;
    let id = match rec.get("id")? {
        Value::String(s) if !s.is_empty() => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let email = rec.get("email").and_then(|v| v.as_str())?.to_string();
    let role = rec.get("usertype").and_then(|v| v.as_str())?.to_string();
    let name = rec
        .get("full_name")
        .or_else(|| rec.get("name"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();
    let avatar = rec.get("image_icon").and_then(|v| v.as_str()).map(String::from);
    Some(CachedProfile { id, name, email, role, avatar })
}
