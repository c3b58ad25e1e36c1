//! Administrative session lifecycle and route guarding.
//! Keep the public surface thin and split implementation across sub-modules.

mod context;
mod expiry;
mod guard;
mod logout;
mod resolver;
mod routes;
mod store;
mod token;
mod verifier;

pub use context::{Navigator, SessionCtx};
pub use expiry::ExpiryEvaluator;
pub use guard::{GuardState, Navigation, RouteGuard};
pub use logout::LogoutCoordinator;
pub use resolver::{Identity, IdentitySource, SessionResolver, SessionVerdict};
pub use routes::{classify, RouteClass, ADMIN_PREFIX, LANDING_ROUTE, LOGIN_ROUTE, PASSWORD_RESET_ROUTE, PUBLIC_ROUTES};
pub use store::{CachedProfile, CredentialStore, FileMedium, Medium, MemoryMedium, AUTH_AT_KEY, PROFILE_KEY, TOKEN_KEY};
pub use token::{decode, encode_unsigned, Claims};
pub use verifier::{Outcome, RemoteVerifier, LOGOUT_PATH, VERIFY_PATH};
