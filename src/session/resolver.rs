//! Cache-first identity resolution.
//!
//! Merges the cached profile with decoded token claims into a displayable
//! identity without touching the network, so the shell can paint
//! immediately. Expired or role-mismatched credentials are pruned eagerly so
//! stale state never leaks into a later check.

use tracing::debug;

use super::expiry::ExpiryEvaluator;
use super::store::CredentialStore;
use super::token;

/// Where the identity's display fields came from. `Claims` is the degraded
/// path used until the first successful verification fills the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    Profile,
    Claims,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
    pub role: String,
    pub avatar: Option<String>,
    pub source: IdentitySource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionVerdict {
    Unauthenticated,
    Authenticated(Identity),
}

#[derive(Clone)]
pub struct SessionResolver {
    store: CredentialStore,
    expiry: ExpiryEvaluator,
    required_role: String,
}

impl SessionResolver {
    pub fn new(store: CredentialStore, expiry: ExpiryEvaluator, required_role: impl Into<String>) -> Self {
        Self { store, expiry, required_role: required_role.into() }
    }

    /// Evaluate the locally held session. Side effects are limited to
    /// clearing the store when the credential is expired, undecodable or
    /// carries the wrong role.
    pub fn resolve(&self) -> SessionVerdict {
        let Some(raw) = self.store.token() else {
            return SessionVerdict::Unauthenticated;
        };
        let Some(claims) = token::decode(&raw) else {
            debug!("session.resolve undecodable token, clearing");
            self.store.clear();
            return SessionVerdict::Unauthenticated;
        };
        if !self.expiry.is_valid(&claims) {
            debug!("session.resolve expired token user={}, clearing", claims.id);
            self.store.clear();
            return SessionVerdict::Unauthenticated;
        }
        if claims.usertype != self.required_role {
            debug!(
                "session.resolve role mismatch user={} role={} required={}, clearing",
                claims.id, claims.usertype, self.required_role
            );
            self.store.clear();
            return SessionVerdict::Unauthenticated;
        }
        // Cache-first: the profile renders with zero network latency.
        if let Some(p) = self.store.profile() {
            return SessionVerdict::Authenticated(Identity {
                id: p.id,
                name: Some(p.name),
                email: p.email,
                role: p.role,
                avatar: p.avatar,
                source: IdentitySource::Profile,
            });
        }
        SessionVerdict::Authenticated(Identity {
            id: claims.id,
            name: None,
            email: claims.email,
            role: claims.usertype,
            avatar: None,
            source: IdentitySource::Claims,
        })
    }

    /// Identity for shell chrome outside a navigation (header, avatar menu).
    pub fn current_identity(&self) -> Option<Identity> {
        match self.resolve() {
            SessionVerdict::Authenticated(id) => Some(id),
            SessionVerdict::Unauthenticated => None,
        }
    }
}
