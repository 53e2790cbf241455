use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    entity::{
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products,
            Model as ProductModel},
        sessions::Entity as Sessions,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::ProductListQuery,
    state::AppState,
};

/// Admin catalog listing for one session: alive rows by default,
/// deleted rows on request, display order.
pub async fn list_products(
    state: &AppState,
    user: &AuthUser,
    session_id: Uuid,
    query: ProductListQuery,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_admin(user)?;

    let session = Sessions::find_by_id(session_id).one(&state.orm).await?;
    if session.is_none() {
        return Err(AppError::NotFound);
    }

    let mut condition = Condition::all().add(ProdCol::SessionId.eq(session_id));
    if !query.include_deleted.unwrap_or(false) {
        condition = condition.add(ProdCol::DeletedAt.is_null());
    }

    let items: Vec<Product> = Products::find()
        .filter(condition)
        .order_by_asc(ProdCol::SortOrder)
        .order_by_asc(ProdCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    let meta = Meta::total_only(items.len() as i64);
    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(meta),
    ))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::InvalidInput("name is required".into()));
    }
    if payload.price <= 0 {
        return Err(AppError::InvalidInput("price must be positive".into()));
    }

    let session = Sessions::find_by_id(payload.session_id)
        .one(&state.orm)
        .await?;
    let session = match session {
        Some(s) => s,
        None => return Err(AppError::NotFound),
    };
    if session.deleted_at.is_some() {
        return Err(AppError::Conflict("session is deleted".into()));
    }

    // sort_order: last value in the session + 1.
    let last = Products::find()
        .filter(ProdCol::SessionId.eq(payload.session_id))
        .order_by_desc(ProdCol::SortOrder)
        .limit(1)
        .one(&state.orm)
        .await?;
    let next_sort = last.map(|p| p.sort_order).unwrap_or(0) + 1;

    let active = ProductActive {
        id: Set(Uuid::new_v4()),
        session_id: Set(payload.session_id),
        name: Set(name),
        price: Set(payload.price),
        image_url: Set(payload.image_url),
        is_active: Set(true),
        is_soldout: Set(false),
        sort_order: Set(next_sort),
        deleted_at: Set(None),
        created_at: NotSet,
    };
    let product = active.insert(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Product created",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

/// Partial patch. A price change affects future orders only: persisted
/// order lines keep their snapshot.
pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let existing = Products::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let mut active: ProductActive = existing.into();
    if let Some(name) = payload.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::InvalidInput("name is required".into()));
        }
        active.name = Set(name);
    }
    if let Some(price) = payload.price {
        if price <= 0 {
            return Err(AppError::InvalidInput("price must be positive".into()));
        }
        active.price = Set(price);
    }
    if let Some(sort_order) = payload.sort_order {
        if sort_order <= 0 {
            return Err(AppError::InvalidInput("sort_order must be positive".into()));
        }
        active.sort_order = Set(sort_order);
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(if image_url.is_empty() {
            None
        } else {
            Some(image_url)
        });
    }

    let product = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_update",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Updated",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

/// Read-negate-write; the possible toggle race is accepted for this
/// low-contention admin tool.
pub async fn toggle_soldout(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let existing = Products::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let next = !existing.is_soldout;
    let mut active: ProductActive = existing.into();
    active.is_soldout = Set(next);
    let product = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_toggle_soldout",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id, "is_soldout": product.is_soldout })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Updated",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn toggle_active(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let existing = Products::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let next = !existing.is_active;
    let mut active: ProductActive = existing.into();
    active.is_active = Set(next);
    let product = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_toggle_active",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id, "is_active": product.is_active })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Updated",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

/// Soft delete: the row stays for historical order lines and summary
/// history; it just stops being orderable and listable.
pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let existing = Products::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let mut active: ProductActive = existing.into();
    active.deleted_at = Set(Some(Utc::now().into()));
    let product = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_delete",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Deleted",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        session_id: model.session_id,
        name: model.name,
        price: model.price,
        image_url: model.image_url,
        is_active: model.is_active,
        is_soldout: model.is_soldout,
        sort_order: model.sort_order,
        deleted_at: model.deleted_at.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
    }
}
