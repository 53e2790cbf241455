use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod receipt;
pub mod sessions;

// Build the API router without binding state; it is provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/sessions", sessions::router())
        .nest("/orders", orders::router())
        .nest("/receipt", receipt::router())
        .nest("/admin", admin::router())
}
