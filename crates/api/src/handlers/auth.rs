//! Handlers for the Discord login flow and the session.

use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Redirect};
use axum::Json;
use lostsons_core::error::CoreError;
use serde::{Deserialize, Serialize};

use crate::auth::cookie::{clear_session_cookie, session_cookie};
use crate::auth::discord::DiscordClient;
use crate::auth::jwt::generate_session_token;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Query string Discord appends to the redirect URL.
#[derive(Debug, Deserialize)]
pub struct RedirectParams {
    pub code: Option<String>,
    /// Set instead of `code` when the user denied the authorization.
    pub error: Option<String>,
}

/// Response body for `GET /me`.
#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub username: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /login
///
/// Redirect the browser to Discord's authorize page.
pub async fn login(State(state): State<AppState>) -> AppResult<Redirect> {
    let discord = discord_client(&state)?;
    let url = discord.authorize_url()?;
    Ok(Redirect::to(url.as_str()))
}

/// GET /redirect
///
/// OAuth2 callback: exchange the code, look up the Discord user, and store a
/// session token in the `jwt` cookie.
pub async fn redirect(
    State(state): State<AppState>,
    Query(params): Query<RedirectParams>,
) -> AppResult<impl IntoResponse> {
    let discord = discord_client(&state)?;

    let code = match (params.code, params.error) {
        (Some(code), _) if !code.is_empty() => code,
        (_, Some(error)) => {
            return Err(AppError::BadRequest(format!("Discord login was denied: {error}")))
        }
        _ => return Err(AppError::BadRequest("Missing code query parameter".into())),
    };

    let access_token = discord.exchange_code(&code).await?;
    let user = discord.fetch_user(&access_token).await?;
    let username = user.display_name();

    let token = generate_session_token(&username, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Failed to sign session token: {e}")))?;
    tracing::info!(username = %username, "User logged in");

    Ok((
        [(SET_COOKIE, session_cookie(&token, state.config.jwt.expiry_secs()))],
        Redirect::to("/"),
    ))
}

/// GET /logout
pub async fn logout() -> impl IntoResponse {
    ([(SET_COOKIE, clear_session_cookie())], Redirect::to("/"))
}

/// GET /me
pub async fn me(user: AuthUser) -> Json<SessionInfo> {
    Json(SessionInfo {
        username: user.username,
    })
}

fn discord_client(state: &AppState) -> AppResult<&DiscordClient> {
    state.discord.as_deref().ok_or_else(|| {
        AppError::Core(CoreError::NotFound {
            entity: "Login provider",
            id: "discord".into(),
        })
    })
}
