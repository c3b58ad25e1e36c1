//! Session teardown: local invalidation first-class, remote notification
//! best-effort.

use std::sync::Arc;

use tracing::{debug, info};

use super::context::{Navigator, SessionCtx};
use super::routes::LOGIN_ROUTE;
use super::store::CredentialStore;
use super::verifier::RemoteVerifier;

#[derive(Clone)]
pub struct LogoutCoordinator {
    store: CredentialStore,
    verifier: Option<Arc<RemoteVerifier>>,
    navigator: Arc<dyn Navigator>,
    ctx: Arc<SessionCtx>,
}

impl LogoutCoordinator {
    pub fn new(
        store: CredentialStore,
        verifier: Option<Arc<RemoteVerifier>>,
        navigator: Arc<dyn Navigator>,
        ctx: Arc<SessionCtx>,
    ) -> Self {
        Self { store, verifier, navigator, ctx }
    }

    /// User-initiated logout. Informs the authority (failure swallowed;
    /// logout always succeeds locally), clears the store, then replaces the
    /// current history entry with the login route so the protected page is
    /// not reachable via back-navigation.
    pub async fn logout(&self) {
        let token = self.store.token();
        // Supersede any in-flight verification before touching the store: a
        // verification response that started before this logout must not
        // resurrect the session.
        self.ctx.bump();
        if let (Some(verifier), Some(token)) = (&self.verifier, token) {
            if let Err(e) = verifier.notify_logout(&token).await {
                debug!("logout.notify failed (ignored) err={}", e);
            }
        }
        self.store.clear();
        info!("logout complete");
        self.navigator.replace(LOGIN_ROUTE);
    }

    /// Local-clear path used when the authority has already rejected the
    /// token; no remote call is made.
    pub fn force_local(&self) {
        self.ctx.bump();
        self.store.clear();
        info!("session force-cleared after remote rejection");
        self.navigator.replace(LOGIN_ROUTE);
    }
}
