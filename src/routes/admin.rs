use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, patch, post, put},
};
use uuid::Uuid;

use crate::{
    dto::{
        orders::{CreateOrderRequest, OrderList, OrderWithLines, SummaryList},
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
        sessions::{
            CreateSessionRequest, OrderCount, SaveNoticeRequest, SessionList, ToggleClosedRequest,
        },
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Order, Product, Session},
    response::ApiResponse,
    routes::params::{OrderListQuery, ProductListQuery, SessionListQuery},
    services::{order_service, product_service, session_service, settlement_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions", get(list_sessions))
        .route("/sessions/{id}/closed", patch(toggle_closed))
        .route("/sessions/{id}", delete(delete_session))
        .route("/sessions/{id}/restore", post(restore_session))
        .route("/sessions/{id}/notice", put(save_notice))
        .route("/sessions/{id}/orders", get(list_session_orders))
        .route("/sessions/{id}/order-count", get(order_count))
        .route("/sessions/{id}/summary", get(session_summary))
        .route("/sessions/{id}/products", get(list_products))
        .route("/products", post(create_product))
        .route("/products/{id}", patch(update_product))
        .route("/products/{id}/toggle-active", post(toggle_active))
        .route("/products/{id}/toggle-soldout", post(toggle_soldout))
        .route("/products/{id}", delete(delete_product))
        .route("/orders/manual", post(create_manual_order))
        .route("/orders/{id}/toggle-paid", post(toggle_paid))
        .route("/orders/{id}/toggle-shipped", post(toggle_shipped))
        .route("/orders/{id}", delete(delete_order))
}

#[utoipa::path(
    post,
    path = "/api/admin/sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 200, description = "Session created", body = ApiResponse<Session>),
        (status = 400, description = "Missing title"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_session(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateSessionRequest>,
) -> AppResult<Json<ApiResponse<Session>>> {
    let resp = session_service::create_session(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/sessions",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 50"),
        ("include_deleted" = Option<bool>, Query, description = "Include soft-deleted sessions"),
    ),
    responses(
        (status = 200, description = "List sessions", body = ApiResponse<SessionList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_sessions(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<SessionListQuery>,
) -> AppResult<Json<ApiResponse<SessionList>>> {
    let resp = session_service::list_sessions(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/sessions/{id}/closed",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = ToggleClosedRequest,
    responses(
        (status = 200, description = "Session open/closed state set", body = ApiResponse<Session>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn toggle_closed(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ToggleClosedRequest>,
) -> AppResult<Json<ApiResponse<Session>>> {
    let resp = session_service::toggle_closed(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session soft-deleted", body = ApiResponse<Session>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_session(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Session>>> {
    let resp = session_service::delete_session(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/sessions/{id}/restore",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session restored", body = ApiResponse<Session>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn restore_session(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Session>>> {
    let resp = session_service::restore_session(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/admin/sessions/{id}/notice",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = SaveNoticeRequest,
    responses(
        (status = 200, description = "Notice upserted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn save_notice(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SaveNoticeRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = session_service::save_notice(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/sessions/{id}/orders",
    params(
        ("id" = Uuid, Path, description = "Session ID"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 50"),
        ("include_deleted" = Option<bool>, Query, description = "Include soft-deleted orders"),
    ),
    responses(
        (status = 200, description = "Orders of one session, newest first", body = ApiResponse<OrderList>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_session_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_session_orders(&state, &user, id, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/sessions/{id}/order-count",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Non-deleted order count", body = ApiResponse<OrderCount>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn order_count(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderCount>>> {
    let resp = session_service::order_count(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/sessions/{id}/summary",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Per-product sales aggregate, revenue descending", body = ApiResponse<SummaryList>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn session_summary(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<SummaryList>>> {
    let resp = settlement_service::session_summary(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/sessions/{id}/products",
    params(
        ("id" = Uuid, Path, description = "Session ID"),
        ("include_deleted" = Option<bool>, Query, description = "Include soft-deleted products"),
    ),
    responses(
        (status = 200, description = "Catalog of one session", body = ApiResponse<ProductList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_products(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<ProductListQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::list_products(&state, &user, id, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/products",
    request_body = CreateProductRequest,
    responses(
        (status = 200, description = "Product created", body = ApiResponse<Product>),
        (status = 400, description = "Invalid name or price"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "Session deleted"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::create_product(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/admin/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product patched", body = ApiResponse<Product>),
        (status = 400, description = "Invalid patch"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::update_product(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/products/{id}/toggle-active",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Visibility toggled", body = ApiResponse<Product>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn toggle_active(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::toggle_active(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/products/{id}/toggle-soldout",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Sold-out flag toggled", body = ApiResponse<Product>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn toggle_soldout(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::toggle_soldout(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product soft-deleted", body = ApiResponse<Product>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::delete_product(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/orders/manual",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Manual order accepted (bypasses session closure)", body = ApiResponse<OrderWithLines>),
        (status = 400, description = "Invalid submission"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Unknown session or product"),
        (status = 409, description = "Session deleted or product not orderable"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_manual_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<Json<ApiResponse<OrderWithLines>>> {
    let resp = order_service::create_manual_order(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/orders/{id}/toggle-paid",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Paid flag toggled", body = ApiResponse<Order>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn toggle_paid(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::toggle_paid(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/orders/{id}/toggle-shipped",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Shipped flag toggled", body = ApiResponse<Order>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn toggle_shipped(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::toggle_shipped(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/admin/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order soft-deleted", body = ApiResponse<Order>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::delete_order(&state, &user, id).await?;
    Ok(Json(resp))
}
