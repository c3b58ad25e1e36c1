//! Per-navigation route guard
//! --------------------------
//! The state machine that gates every admin route entry: classify the path,
//! resolve the local session, render or redirect exactly once, and only when
//! rendering a protected page, schedule background reverification.
//!
//! Each navigation owns a `Navigation` scope with a single-shot decision
//! cell. Re-renders of the same route re-read the memoized state; they can
//! never issue a second redirect or schedule a second verification. There is
//! no hydration timer anywhere: the host constructs the scope when it is
//! ready, and `evaluate` is safe to run immediately.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::GuardConfig;

use super::context::{Navigator, SessionCtx};
use super::expiry::ExpiryEvaluator;
use super::logout::LogoutCoordinator;
use super::resolver::{Identity, SessionResolver, SessionVerdict};
use super::routes::{classify, RouteClass, LANDING_ROUTE, LOGIN_ROUTE};
use super::store::CredentialStore;
use super::verifier::{Outcome, RemoteVerifier};

/// Terminal guard state for one navigation. `Checking` is only observable
/// before the first `evaluate` call completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    Checking,
    /// Public route, no session: render the public page (login form etc).
    Public,
    /// Protected route with a locally valid session: render children.
    Protected(Identity),
    /// A redirect was issued; render nothing.
    Redirecting,
}

/// One route entry. Holds the requested path and the single-shot decision.
pub struct Navigation {
    path: String,
    decision: OnceCell<GuardState>,
}

impl Navigation {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), decision: OnceCell::new() }
    }

    pub fn path(&self) -> &str { &self.path }

    /// Current state without evaluating: `Checking` until the guard ran.
    pub fn state(&self) -> GuardState {
        self.decision.get().cloned().unwrap_or(GuardState::Checking)
    }
}

pub struct RouteGuard {
    store: CredentialStore,
    resolver: SessionResolver,
    verifier: Option<Arc<RemoteVerifier>>,
    navigator: Arc<dyn Navigator>,
    ctx: Arc<SessionCtx>,
    logout: LogoutCoordinator,
}

impl RouteGuard {
    pub fn new(store: CredentialStore, cfg: &GuardConfig, navigator: Arc<dyn Navigator>) -> Self {
        let verifier = match RemoteVerifier::from_config(cfg) {
            Ok(v) => Some(Arc::new(v)),
            Err(e) => {
                debug!("guard.verifier disabled: {}", e);
                None
            }
        };
        let ctx = Arc::new(SessionCtx::new());
        let resolver = SessionResolver::new(
            store.clone(),
            ExpiryEvaluator::new(cfg.skew),
            cfg.required_role.clone(),
        );
        let logout = LogoutCoordinator::new(store.clone(), verifier.clone(), navigator.clone(), ctx.clone());
        Self { store, resolver, verifier, navigator, ctx, logout }
    }

    pub fn resolver(&self) -> &SessionResolver { &self.resolver }

    pub fn logout_coordinator(&self) -> &LogoutCoordinator { &self.logout }

    pub fn ctx(&self) -> &Arc<SessionCtx> { &self.ctx }

    /// Teardown hook: invalidates any pending verification so its result is
    /// discarded instead of being applied to a torn-down context.
    pub fn invalidate(&self) {
        self.ctx.bump();
    }

    /// Run the guard for a navigation. Idempotent per scope: the first call
    /// decides (and performs at most one navigation side effect); every later
    /// call returns the memoized state untouched.
    pub fn evaluate(&self, nav: &Navigation) -> GuardState {
        nav.decision.get_or_init(|| self.decide(&nav.path)).clone()
    }

    fn decide(&self, path: &str) -> GuardState {
        match (classify(path), self.resolver.resolve()) {
            (RouteClass::Public, SessionVerdict::Authenticated(_)) => {
                info!("guard.redirect active session on public route path={} -> {}", path, LANDING_ROUTE);
                self.navigator.replace(LANDING_ROUTE);
                GuardState::Redirecting
            }
            (RouteClass::Public, SessionVerdict::Unauthenticated) => GuardState::Public,
            (RouteClass::Protected, SessionVerdict::Unauthenticated) => {
                info!("guard.redirect unauthenticated on protected route path={} -> {}", path, LOGIN_ROUTE);
                self.store.clear();
                self.navigator.replace(LOGIN_ROUTE);
                GuardState::Redirecting
            }
            (RouteClass::Protected, SessionVerdict::Authenticated(identity)) => {
                self.schedule_verify();
                GuardState::Protected(identity)
            }
        }
    }

    /// Fire-and-forget background verification. At most one call is in
    /// flight per session; results carrying a stale generation are dropped.
    fn schedule_verify(&self) {
        let Some(verifier) = self.verifier.clone() else {
            debug!("guard.verify skipped: no verifier configured");
            return;
        };
        let Some(token) = self.store.token() else { return };
        if !self.ctx.begin_verify() {
            debug!("guard.verify already in flight");
            return;
        }
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(h) => h,
            Err(_) => {
                self.ctx.end_verify();
                debug!("guard.verify skipped: no async runtime");
                return;
            }
        };
        let generation = self.ctx.generation();
        let ctx = self.ctx.clone();
        let store = self.store.clone();
        let logout = self.logout.clone();
        handle.spawn(async move {
            let outcome = verifier.verify(&token).await;
            ctx.end_verify();
            if ctx.generation() != generation {
                debug!("guard.verify stale result discarded");
                return;
            }
            match outcome {
                Outcome::Confirmed(profile) => {
                    debug!("guard.verify confirmed user={}", profile.id);
                    store.set_profile(&profile);
                    store.touch_auth_timestamp();
                }
                Outcome::Rejected => {
                    warn!("guard.verify rejected by authority, forcing logout");
                    logout.force_local();
                }
                Outcome::Unreachable => {
                    debug!("guard.verify authority unreachable, keeping cached session");
                }
            }
        });
    }
}
