use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::AppState;
use crate::middleware::require_admin;
use crate::{admin, messages};

/// All API routes. Public endpoints need no credentials; everything under
/// `/api/admin` passes the Basic auth gate first.
pub fn router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/pending", get(admin::list_pending))
        .route("/approve/{id}", post(admin::approve_message))
        .layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route(
            "/api/message",
            get(messages::get_random_message).post(messages::submit_message),
        )
        .nest("/api/admin", admin_routes)
        .with_state(state)
}
