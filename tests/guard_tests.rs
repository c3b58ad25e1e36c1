//! Guard integration tests: the per-navigation state machine driving
//! background verification against a mock authority endpoint.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::json;

use doorman::config::GuardConfig;
use doorman::session::{
    encode_unsigned, CachedProfile, Claims, CredentialStore, GuardState, Navigation, Navigator,
    RouteGuard, LOGIN_ROUTE,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

#[derive(Default)]
struct RecordingNavigator {
    events: Mutex<Vec<(String, String)>>,
}

impl RecordingNavigator {
    fn events(&self) -> Vec<(String, String)> {
        self.events.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn push(&self, path: &str) {
        self.events.lock().push(("push".into(), path.into()));
    }
    fn replace(&self, path: &str) {
        self.events.lock().push(("replace".into(), path.into()));
    }
}

fn admin_token(exp_offset_secs: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    encode_unsigned(&Claims {
        id: "7".into(),
        email: "dana@example.com".into(),
        usertype: "admin".into(),
        iat: Some(now),
        exp: Some(now + exp_offset_secs),
    })
}

fn cold_profile() -> CachedProfile {
    CachedProfile {
        id: "7".into(),
        name: "Dana".into(),
        email: "dana@example.com".into(),
        role: "admin".into(),
        avatar: None,
    }
}

async fn spawn_authority(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Authority that confirms every verify call and counts hits.
async fn confirming_authority(hits: Arc<AtomicUsize>) -> SocketAddr {
    let app = Router::new().route(
        "/admin/verify",
        get(move || {
            let hits = hits.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Json(json!({
                    "success": true,
                    "admin": {
                        "id": 7,
                        "full_name": "Dana Operations",
                        "email": "dana@example.com",
                        "usertype": "admin",
                        "image_icon": "/media/dana.png"
                    }
                }))
            }
        }),
    );
    spawn_authority(app).await
}

async fn rejecting_authority() -> SocketAddr {
    let app = Router::new().route(
        "/admin/verify",
        get(|| async { Json(json!({"success": false})) }),
    );
    spawn_authority(app).await
}

async fn wait_until(cond: impl Fn() -> bool, ms: u64) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(ms);
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}

fn guard_against(addr: SocketAddr, store: &CredentialStore) -> (RouteGuard, Arc<RecordingNavigator>) {
    let navigator = Arc::new(RecordingNavigator::default());
    let cfg = GuardConfig::default()
        .with_base_url(format!("http://{}", addr))
        .with_verify_timeout(Duration::from_secs(2));
    let guard = RouteGuard::new(store.clone(), &cfg, navigator.clone());
    (guard, navigator)
}

#[tokio::test]
async fn rapid_reevaluation_schedules_exactly_one_verification() {
    init_tracing();
    let hits = Arc::new(AtomicUsize::new(0));
    let addr = confirming_authority(hits.clone()).await;

    let store = CredentialStore::in_memory();
    store.set_token(&admin_token(3600));
    let (guard, navigator) = guard_against(addr, &store);

    let nav = Navigation::new("/admin/dashboard");
    let first = guard.evaluate(&nav);
    let second = guard.evaluate(&nav);
    assert!(matches!(first, GuardState::Protected(_)));
    assert_eq!(first, second);

    assert!(wait_until(|| hits.load(Ordering::SeqCst) >= 1, 2000).await);
    // Give a would-be duplicate call time to land before asserting.
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(navigator.events().is_empty());
}

#[tokio::test]
async fn confirmed_verification_overwrites_profile_and_timestamp() {
    init_tracing();
    let hits = Arc::new(AtomicUsize::new(0));
    let addr = confirming_authority(hits).await;

    let store = CredentialStore::in_memory();
    store.install(&admin_token(3600), &cold_profile());
    let before = store.auth_timestamp().unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;

    let (guard, _navigator) = guard_against(addr, &store);
    let nav = Navigation::new("/admin/dashboard");
    match guard.evaluate(&nav) {
        // Cache-first render uses the stale cached name.
        GuardState::Protected(identity) => assert_eq!(identity.name.as_deref(), Some("Dana")),
        other => panic!("expected protected, got {:?}", other),
    }

    assert!(
        wait_until(
            || store.profile().map(|p| p.name == "Dana Operations").unwrap_or(false),
            2000
        )
        .await,
        "profile should be refreshed from the authority"
    );
    let refreshed = store.profile().unwrap();
    assert_eq!(refreshed.avatar.as_deref(), Some("/media/dana.png"));
    assert!(store.auth_timestamp().unwrap() >= before);
}

#[tokio::test]
async fn rejected_verification_forces_logout_after_render() {
    init_tracing();
    let addr = rejecting_authority().await;

    let store = CredentialStore::in_memory();
    store.install(&admin_token(3600), &cold_profile());
    let (guard, navigator) = guard_against(addr, &store);

    let nav = Navigation::new("/admin/dashboard");
    // The page renders first: rejection only arrives asynchronously.
    assert!(matches!(guard.evaluate(&nav), GuardState::Protected(_)));

    assert!(wait_until(|| !navigator.events().is_empty(), 2000).await);
    assert_eq!(navigator.events(), vec![("replace".to_string(), LOGIN_ROUTE.to_string())]);
    assert_eq!(store.token(), None);
    assert_eq!(store.profile(), None);
}

#[tokio::test]
async fn unreachable_authority_leaves_session_untouched() {
    init_tracing();
    // Bind and immediately drop to get a port with nothing listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let store = CredentialStore::in_memory();
    store.install(&admin_token(3600), &cold_profile());
    let navigator = Arc::new(RecordingNavigator::default());
    let cfg = GuardConfig::default()
        .with_base_url(format!("http://{}", addr))
        .with_verify_timeout(Duration::from_millis(500));
    let guard = RouteGuard::new(store.clone(), &cfg, navigator.clone());

    let nav = Navigation::new("/admin/dashboard");
    assert!(matches!(guard.evaluate(&nav), GuardState::Protected(_)));

    // Wait out the failed call, then confirm nothing changed.
    assert!(wait_until(|| !guard.ctx().verify_inflight(), 2000).await);
    assert!(store.token().is_some());
    assert_eq!(store.profile(), Some(cold_profile()));
    assert!(navigator.events().is_empty());
}

#[tokio::test]
async fn stale_verification_result_is_discarded_after_invalidate() {
    init_tracing();
    // Authority answers slowly so we can supersede the session mid-flight.
    let app = Router::new().route(
        "/admin/verify",
        get(|| async {
            tokio::time::sleep(Duration::from_millis(300)).await;
            Json(json!({
                "success": true,
                "admin": {"id": 7, "full_name": "Too Late", "email": "dana@example.com", "usertype": "admin"}
            }))
        }),
    );
    let addr = spawn_authority(app).await;

    let store = CredentialStore::in_memory();
    store.install(&admin_token(3600), &cold_profile());
    let (guard, navigator) = guard_against(addr, &store);

    let nav = Navigation::new("/admin/dashboard");
    assert!(matches!(guard.evaluate(&nav), GuardState::Protected(_)));
    // Route teardown before the verification resolves.
    guard.invalidate();

    assert!(wait_until(|| !guard.ctx().verify_inflight(), 2000).await);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.profile(), Some(cold_profile()), "stale result must not be applied");
    assert!(navigator.events().is_empty());
}
