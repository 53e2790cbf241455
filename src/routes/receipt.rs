use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::orders::ReceiptView,
    error::AppResult,
    response::ApiResponse,
    services::settlement_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/{token}", get(receipt_by_token))
}

#[utoipa::path(
    get,
    path = "/api/receipt/{token}",
    params(
        ("token" = String, Path, description = "Order edit token")
    ),
    responses(
        (status = 200, description = "Settlement document for one order", body = ApiResponse<ReceiptView>),
        (status = 404, description = "Token does not resolve"),
    ),
    tag = "Receipt"
)]
pub async fn receipt_by_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<ApiResponse<ReceiptView>>> {
    let resp = settlement_service::receipt_by_token(&state, &token).await?;
    Ok(Json(resp))
}
