//! Cookie-backed server-side sessions.

use tower_sessions::{
    Expiry, SessionManagerLayer, SessionStore,
    cookie::{SameSite, time::Duration},
};

use crate::config::AppConfig;

pub const SESSION_COOKIE_NAME: &str = "shopfront_session";

/// Key under which the signed-in [`crate::dto::auth::SessionUser`] is stored.
pub const SESSION_USER_KEY: &str = "user";

/// Session layer over any store; Postgres in production, memory in tests.
pub fn create_session_layer<S>(store: S, config: &AppConfig) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::hours(
            config.session_ttl_hours,
        )))
        .with_secure(config.session_secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
