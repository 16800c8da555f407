use axum::routing::post;
use axum::Router;

use crate::handlers::webhooks;
use crate::state::AppState;

/// `POST /webhooks/mux` -- provider notifications (unauthenticated; see
/// `MUX_WEBHOOK_SECRET`).
pub fn router() -> Router<AppState> {
    Router::new().route("/webhooks/mux", post(webhooks::mux_webhook))
}
