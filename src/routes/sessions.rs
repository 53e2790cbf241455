use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::sessions::SessionWithCatalog,
    error::AppResult,
    response::ApiResponse,
    services::session_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", get(get_session))
}

#[utoipa::path(
    get,
    path = "/api/sessions/{id}",
    params(
        ("id" = Uuid, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Session with orderable catalog", body = ApiResponse<SessionWithCatalog>),
        (status = 404, description = "Unknown or deleted session"),
    ),
    tag = "Sessions"
)]
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<SessionWithCatalog>>> {
    let resp = session_service::get_session_public(&state, id).await?;
    Ok(Json(resp))
}
