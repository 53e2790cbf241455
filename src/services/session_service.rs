use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::sessions::{
        CreateSessionRequest, OrderCount, SaveNoticeRequest, SessionList, SessionWithCatalog,
        ToggleClosedRequest,
    },
    entity::{
        orders::{Column as OrderCol, Entity as Orders},
        products::{Column as ProdCol, Entity as Products},
        session_notices::{
            ActiveModel as NoticeActive, Column as NoticeCol, Entity as SessionNotices,
        },
        sessions::{ActiveModel as SessionActive, Column as SessionCol, Entity as Sessions,
            Model as SessionModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Session,
    response::{ApiResponse, Meta},
    routes::params::SessionListQuery,
    services::product_service::product_from_entity,
    state::AppState,
};

// Defaults: free shipping from 100,000 KRW, 3,500 normal, 7,000
// Jeju/island tier.
const DEFAULT_SHIP_THRESHOLD: i64 = 100_000;
const DEFAULT_SHIP_FEE_NORMAL: i64 = 3_500;
const DEFAULT_SHIP_FEE_JEJU: i64 = 7_000;

pub async fn create_session(
    state: &AppState,
    user: &AuthUser,
    payload: CreateSessionRequest,
) -> AppResult<ApiResponse<Session>> {
    ensure_admin(user)?;
    let title = payload.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::InvalidInput("title is required".into()));
    }

    let active = SessionActive {
        id: Set(Uuid::new_v4()),
        title: Set(title),
        is_closed: Set(false),
        ship_threshold: Set(payload.ship_threshold.unwrap_or(DEFAULT_SHIP_THRESHOLD)),
        ship_fee_normal: Set(payload.ship_fee_normal.unwrap_or(DEFAULT_SHIP_FEE_NORMAL)),
        ship_fee_jeju: Set(payload.ship_fee_jeju.unwrap_or(DEFAULT_SHIP_FEE_JEJU)),
        deleted_at: Set(None),
        created_at: NotSet,
    };
    let session = active.insert(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "session_create",
        Some("sessions"),
        Some(serde_json::json!({ "session_id": session.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Session created",
        session_from_entity(session),
        Some(Meta::empty()),
    ))
}

pub async fn list_sessions(
    state: &AppState,
    user: &AuthUser,
    query: SessionListQuery,
) -> AppResult<ApiResponse<SessionList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if !query.include_deleted.unwrap_or(false) {
        condition = condition.add(SessionCol::DeletedAt.is_null());
    }

    let finder = Sessions::find()
        .filter(condition)
        .order_by_desc(SessionCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(session_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Sessions",
        SessionList { items },
        Some(meta),
    ))
}

/// Customer-facing fetch: a soft-deleted session is a 404, never an
/// empty shell. Returns the session header plus the orderable catalog
/// (alive and active; sold-out items stay visible for their badge).
pub async fn get_session_public(
    state: &AppState,
    id: Uuid,
) -> AppResult<ApiResponse<SessionWithCatalog>> {
    let session = Sessions::find_by_id(id).one(&state.orm).await?;
    let session = match session {
        Some(s) if s.deleted_at.is_none() => s,
        _ => return Err(AppError::NotFound),
    };

    let products = Products::find()
        .filter(
            Condition::all()
                .add(ProdCol::SessionId.eq(id))
                .add(ProdCol::DeletedAt.is_null())
                .add(ProdCol::IsActive.eq(true)),
        )
        .order_by_asc(ProdCol::SortOrder)
        .order_by_asc(ProdCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Session",
        SessionWithCatalog {
            session: session_from_entity(session),
            products,
        },
        None,
    ))
}

pub async fn toggle_closed(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ToggleClosedRequest,
) -> AppResult<ApiResponse<Session>> {
    ensure_admin(user)?;
    let existing = Sessions::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(s) => s,
        None => return Err(AppError::NotFound),
    };

    let mut active: SessionActive = existing.into();
    active.is_closed = Set(payload.is_closed);
    let session = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "session_toggle_closed",
        Some("sessions"),
        Some(serde_json::json!({ "session_id": session.id, "is_closed": session.is_closed })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Session updated",
        session_from_entity(session),
        Some(Meta::empty()),
    ))
}

pub async fn delete_session(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Session>> {
    ensure_admin(user)?;
    set_session_deleted(state, user, id, true).await
}

pub async fn restore_session(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Session>> {
    ensure_admin(user)?;
    set_session_deleted(state, user, id, false).await
}

async fn set_session_deleted(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    deleted: bool,
) -> AppResult<ApiResponse<Session>> {
    let existing = Sessions::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(s) => s,
        None => return Err(AppError::NotFound),
    };

    let mut active: SessionActive = existing.into();
    active.deleted_at = Set(deleted.then(|| Utc::now().into()));
    let session = active.update(&state.orm).await?;

    let action = if deleted {
        "session_delete"
    } else {
        "session_restore"
    };
    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        action,
        Some("sessions"),
        Some(serde_json::json!({ "session_id": session.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Session updated",
        session_from_entity(session),
        Some(Meta::empty()),
    ))
}

/// One notice row per session, upserted.
pub async fn save_notice(
    state: &AppState,
    user: &AuthUser,
    session_id: Uuid,
    payload: SaveNoticeRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let session = Sessions::find_by_id(session_id).one(&state.orm).await?;
    if session.is_none() {
        return Err(AppError::NotFound);
    }

    let active = NoticeActive {
        session_id: Set(session_id),
        notice: Set(payload.notice.unwrap_or_default()),
        updated_at: Set(Utc::now().into()),
    };
    SessionNotices::insert(active)
        .on_conflict(
            OnConflict::column(NoticeCol::SessionId)
                .update_columns([NoticeCol::Notice, NoticeCol::UpdatedAt])
                .to_owned(),
        )
        .exec(&state.orm)
        .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "notice_save",
        Some("session_notices"),
        Some(serde_json::json!({ "session_id": session_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Notice saved",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Non-deleted order count for one session, shown next to each session
/// in the admin list.
pub async fn order_count(
    state: &AppState,
    user: &AuthUser,
    session_id: Uuid,
) -> AppResult<ApiResponse<OrderCount>> {
    ensure_admin(user)?;
    let session = Sessions::find_by_id(session_id).one(&state.orm).await?;
    if session.is_none() {
        return Err(AppError::NotFound);
    }

    let count = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::SessionId.eq(session_id))
                .add(OrderCol::DeletedAt.is_null()),
        )
        .count(&state.orm)
        .await? as i64;

    Ok(ApiResponse::success(
        "Order count",
        OrderCount { count },
        None,
    ))
}

pub fn session_from_entity(model: SessionModel) -> Session {
    Session {
        id: model.id,
        title: model.title,
        is_closed: model.is_closed,
        ship_threshold: model.ship_threshold,
        ship_fee_normal: model.ship_fee_normal,
        ship_fee_jeju: model.ship_fee_jeju,
        deleted_at: model.deleted_at.map(|dt| dt.with_timezone(&chrono::Utc)),
        created_at: model.created_at.with_timezone(&chrono::Utc),
    }
}
