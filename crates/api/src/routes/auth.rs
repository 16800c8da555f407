//! Route definitions for the login flow.

use axum::routing::get;
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// ```text
/// GET /login     -> login (redirect to Discord)
/// GET /redirect  -> redirect (OAuth2 callback, sets the session cookie)
/// GET /logout    -> logout
/// GET /me        -> me (requires auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login))
        .route("/redirect", get(auth::redirect))
        .route("/logout", get(auth::logout))
        .route("/me", get(auth::me))
}
