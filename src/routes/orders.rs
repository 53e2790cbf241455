use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};

use crate::{
    dto::orders::{CreateOrderRequest, OrderWithLines, UpdateOrderRequest},
    error::AppResult,
    response::ApiResponse,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order))
        .route("/{token}", get(get_order))
        .route("/{token}", put(update_order))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Order accepted", body = ApiResponse<OrderWithLines>),
        (status = 400, description = "Invalid submission"),
        (status = 404, description = "Unknown session or product"),
        (status = 409, description = "Session closed/deleted or product not orderable"),
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<Json<ApiResponse<OrderWithLines>>> {
    let resp = order_service::create_order(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/{token}",
    params(
        ("token" = String, Path, description = "Order edit token")
    ),
    responses(
        (status = 200, description = "Order with lines", body = ApiResponse<OrderWithLines>),
        (status = 404, description = "Token does not resolve"),
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Json<ApiResponse<OrderWithLines>>> {
    let resp = order_service::get_order_by_token(&state, &token).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/orders/{token}",
    params(
        ("token" = String, Path, description = "Order edit token")
    ),
    request_body = UpdateOrderRequest,
    responses(
        (status = 200, description = "Order replaced", body = ApiResponse<OrderWithLines>),
        (status = 400, description = "Invalid submission"),
        (status = 404, description = "Token does not resolve"),
        (status = 409, description = "Session closed/deleted or product not orderable"),
    ),
    tag = "Orders"
)]
pub async fn update_order(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<UpdateOrderRequest>,
) -> AppResult<Json<ApiResponse<OrderWithLines>>> {
    let resp = order_service::update_order(&state, &token, payload).await?;
    Ok(Json(resp))
}
