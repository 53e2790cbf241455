use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{BuyerInfo, CreateOrderRequest, LineInput, OrderList, OrderWithLines,
        UpdateOrderRequest},
    entity::{
        order_lines::{ActiveModel as LineActive, Column as LineCol, Entity as OrderLines,
            Model as LineModel},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders,
            Model as OrderModel},
        products::{Column as ProdCol, Entity as Products},
        sessions::{Column as SessionCol, Entity as Sessions, Model as SessionModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, OrderLine},
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    shipping::ShippingMethod,
    state::AppState,
    token::generate_edit_token,
};

/// Whether closure of the session blocks the write. Manual admin entry
/// bypasses closure; the customer link does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IntakePath {
    Customer,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NormalizedLine {
    product_id: Uuid,
    qty: i32,
}

/// One accepted line with its price snapshot taken at validation time.
#[derive(Debug, Clone, Copy)]
struct PricedLine {
    product_id: Uuid,
    qty: i32,
    unit_price: i64,
    amount: i64,
}

/// Drops non-positive quantities, sums duplicate product references
/// into one line each (first-seen order preserved), and rejects a
/// submission that has nothing left afterwards.
fn normalize_lines(raw: &[LineInput]) -> AppResult<Vec<NormalizedLine>> {
    let mut index_by_product: HashMap<Uuid, usize> = HashMap::new();
    let mut out: Vec<NormalizedLine> = Vec::new();
    for line in raw {
        if line.qty <= 0 {
            continue;
        }
        match index_by_product.get(&line.product_id) {
            Some(&idx) => {
                out[idx].qty = out[idx]
                    .qty
                    .checked_add(line.qty)
                    .ok_or_else(|| AppError::InvalidInput("quantity too large".into()))?;
            }
            None => {
                index_by_product.insert(line.product_id, out.len());
                out.push(NormalizedLine {
                    product_id: line.product_id,
                    qty: line.qty,
                });
            }
        }
    }
    if out.is_empty() {
        return Err(AppError::InvalidInput(
            "order needs at least one line with a positive quantity".into(),
        ));
    }
    Ok(out)
}

fn validate_buyer(buyer: &BuyerInfo, path: IntakePath) -> AppResult<(String, ShippingMethod)> {
    let nickname = buyer.nickname.trim().to_string();
    if nickname.is_empty() {
        return Err(AppError::InvalidInput("nickname is required".into()));
    }
    if path == IntakePath::Customer
        && buyer.phone.as_deref().map(str::trim).unwrap_or("").is_empty()
    {
        return Err(AppError::InvalidInput("phone is required".into()));
    }
    let shipping = match buyer.shipping.trim() {
        // Manual entry historically defaulted to the courier tier.
        "" if path == IntakePath::Manual => ShippingMethod::Courier,
        "" => return Err(AppError::InvalidInput("shipping method is required".into())),
        value => ShippingMethod::parse(value),
    };
    Ok((nickname, shipping))
}

async fn load_session_for_intake<C: ConnectionTrait>(
    conn: &C,
    session_id: Uuid,
    path: IntakePath,
) -> AppResult<SessionModel> {
    let session = Sessions::find_by_id(session_id).one(conn).await?;
    let session = match session {
        Some(s) => s,
        None => return Err(AppError::NotFound),
    };
    if session.deleted_at.is_some() {
        return Err(AppError::Conflict("session is deleted".into()));
    }
    if path == IntakePath::Customer && session.is_closed {
        return Err(AppError::Conflict("session is closed".into()));
    }
    Ok(session)
}

/// Validates every referenced product against the owning session and
/// copies its current price into the line (the snapshot that later
/// price edits never touch). The whole submission is rejected — never
/// silently trimmed — when any product fails a check.
async fn price_lines<C: ConnectionTrait>(
    conn: &C,
    session_id: Uuid,
    lines: &[NormalizedLine],
    path: IntakePath,
) -> AppResult<Vec<PricedLine>> {
    let ids: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();
    let products = Products::find()
        .filter(ProdCol::Id.is_in(ids))
        .all(conn)
        .await?;
    let by_id: HashMap<Uuid, _> = products.into_iter().map(|p| (p.id, p)).collect();

    let mut priced = Vec::with_capacity(lines.len());
    for line in lines {
        let product = match by_id.get(&line.product_id) {
            Some(p) => p,
            None => return Err(AppError::NotFound),
        };
        if product.session_id != session_id {
            return Err(AppError::Conflict(
                "product belongs to a different session".into(),
            ));
        }
        if product.deleted_at.is_some() {
            return Err(AppError::Conflict("deleted product included".into()));
        }
        if product.is_soldout {
            return Err(AppError::Conflict("sold-out product included".into()));
        }
        if path == IntakePath::Customer && !product.is_active {
            return Err(AppError::Conflict("hidden product included".into()));
        }
        if product.price <= 0 {
            return Err(AppError::InvalidInput("invalid product price".into()));
        }
        let amount = product
            .price
            .checked_mul(line.qty as i64)
            .ok_or_else(|| AppError::InvalidInput("line amount too large".into()))?;
        priced.push(PricedLine {
            product_id: line.product_id,
            qty: line.qty,
            unit_price: product.price,
            amount,
        });
    }
    Ok(priced)
}

fn totals(priced: &[PricedLine]) -> (i64, i64) {
    let qty = priced.iter().map(|l| l.qty as i64).sum();
    let amount = priced.iter().map(|l| l.amount).sum();
    (qty, amount)
}

/// Customer order intake through the shareable session link.
pub async fn create_order(
    state: &AppState,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithLines>> {
    let order = insert_order(state, payload, IntakePath::Customer).await?;
    Ok(ApiResponse::success(
        "Order created",
        order,
        Some(Meta::empty()),
    ))
}

/// Admin manual entry: same validation, except session closure does not
/// block it (only deletion does). Flagged so the seller can tell the
/// rows apart later.
pub async fn create_manual_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithLines>> {
    ensure_admin(user)?;
    let order = insert_order(state, payload, IntakePath::Manual).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_manual_create",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.order.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order created",
        order,
        Some(Meta::empty()),
    ))
}

async fn insert_order(
    state: &AppState,
    payload: CreateOrderRequest,
    path: IntakePath,
) -> AppResult<OrderWithLines> {
    let (nickname, shipping) = validate_buyer(&payload.buyer, path)?;
    let normalized = normalize_lines(&payload.lines)?;

    // The order row and its lines commit together; a failure after the
    // order insert rolls the whole submission back, so an orphan order
    // with zero lines cannot be persisted.
    let txn = state.orm.begin().await?;

    load_session_for_intake(&txn, payload.session_id, path).await?;
    let priced = price_lines(&txn, payload.session_id, &normalized, path).await?;
    let (total_qty, total_amount) = totals(&priced);

    let now = Utc::now();
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        session_id: Set(payload.session_id),
        nickname: Set(nickname),
        phone: Set(none_if_blank(payload.buyer.phone)),
        shipping: Set(shipping.as_str().to_string()),
        postal_code: Set(none_if_blank(payload.buyer.postal_code)),
        address1: Set(none_if_blank(payload.buyer.address1)),
        address2: Set(none_if_blank(payload.buyer.address2)),
        edit_token: Set(generate_edit_token()),
        total_qty: Set(total_qty),
        total_amount: Set(total_amount),
        is_manual: Set(path == IntakePath::Manual),
        paid_at: Set(None),
        shipped_at: Set(None),
        deleted_at: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let lines = insert_lines(&txn, order.id, &priced).await?;

    txn.commit().await?;

    tracing::info!(order_id = %order.id, total_amount, "order accepted");

    Ok(OrderWithLines {
        order: order_from_entity(order),
        lines,
    })
}

async fn insert_lines<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
    priced: &[PricedLine],
) -> AppResult<Vec<OrderLine>> {
    let mut lines = Vec::with_capacity(priced.len());
    for line in priced {
        let inserted = LineActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            product_id: Set(line.product_id),
            qty: Set(line.qty),
            unit_price: Set(line.unit_price),
            amount: Set(line.amount),
            created_at: NotSet,
        }
        .insert(conn)
        .await?;
        lines.push(line_from_entity(inserted));
    }
    Ok(lines)
}

/// Customer edit through the capability token: full replace of the line
/// set with freshly validated, freshly priced lines. Paid/shipped flags
/// survive the edit untouched. A soft-deleted order stays readable by
/// token but no longer accepts edits.
pub async fn update_order(
    state: &AppState,
    token: &str,
    payload: UpdateOrderRequest,
) -> AppResult<ApiResponse<OrderWithLines>> {
    let (nickname, shipping) = validate_buyer(&payload.buyer, IntakePath::Customer)?;
    let normalized = normalize_lines(&payload.lines)?;

    let txn = state.orm.begin().await?;

    let order = Orders::find()
        .filter(OrderCol::EditToken.eq(token))
        .one(&txn)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };
    if order.deleted_at.is_some() {
        return Err(AppError::Conflict("order is deleted".into()));
    }

    load_session_for_intake(&txn, order.session_id, IntakePath::Customer).await?;
    let priced = price_lines(&txn, order.session_id, &normalized, IntakePath::Customer).await?;
    let (total_qty, total_amount) = totals(&priced);

    let order_id = order.id;
    let mut active: OrderActive = order.into();
    active.nickname = Set(nickname);
    active.phone = Set(none_if_blank(payload.buyer.phone));
    active.shipping = Set(shipping.as_str().to_string());
    active.postal_code = Set(none_if_blank(payload.buyer.postal_code));
    active.address1 = Set(none_if_blank(payload.buyer.address1));
    active.address2 = Set(none_if_blank(payload.buyer.address2));
    active.total_qty = Set(total_qty);
    active.total_amount = Set(total_amount);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    // Replace, not merge: the line set is immutable history except
    // through this delete-all-then-reinsert.
    OrderLines::delete_many()
        .filter(LineCol::OrderId.eq(order_id))
        .exec(&txn)
        .await?;
    let lines = insert_lines(&txn, order_id, &priced).await?;

    txn.commit().await?;

    Ok(ApiResponse::success(
        "Order updated",
        OrderWithLines {
            order: order_from_entity(order),
            lines,
        },
        Some(Meta::empty()),
    ))
}

/// Token-based fetch. Deliberately resolves soft-deleted orders too:
/// the buyer keeps access to the receipt of an order the seller hid.
pub async fn get_order_by_token(
    state: &AppState,
    token: &str,
) -> AppResult<ApiResponse<OrderWithLines>> {
    let order = Orders::find()
        .filter(OrderCol::EditToken.eq(token))
        .one(&state.orm)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let lines = OrderLines::find()
        .filter(LineCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(line_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Order",
        OrderWithLines {
            order: order_from_entity(order),
            lines,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_session_orders(
    state: &AppState,
    user: &AuthUser,
    session_id: Uuid,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination.normalize();

    let session = Sessions::find()
        .filter(SessionCol::Id.eq(session_id))
        .one(&state.orm)
        .await?;
    if session.is_none() {
        return Err(AppError::NotFound);
    }

    let mut condition = Condition::all().add(OrderCol::SessionId.eq(session_id));
    if !query.include_deleted.unwrap_or(false) {
        condition = condition.add(OrderCol::DeletedAt.is_null());
    }

    let finder = Orders::find()
        .filter(condition)
        .order_by_desc(OrderCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

/// Paid and shipped are independent nullable-timestamp toggles; no
/// history of earlier flips is kept. Read-then-write races are an
/// accepted tradeoff here.
pub async fn toggle_paid(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let existing = Orders::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let next = match existing.paid_at {
        Some(_) => None,
        None => Some(Utc::now().into()),
    };
    let mut active: OrderActive = existing.into();
    active.paid_at = Set(next);
    let order = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_toggle_paid",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "paid": order.paid_at.is_some() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order updated",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

pub async fn toggle_shipped(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let existing = Orders::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let next = match existing.shipped_at {
        Some(_) => None,
        None => Some(Utc::now().into()),
    };
    let mut active: OrderActive = existing.into();
    active.shipped_at = Set(next);
    let order = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_toggle_shipped",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "shipped": order.shipped_at.is_some() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order updated",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

/// Soft delete: the order leaves the default list and the revenue
/// aggregates but stays reachable by token. Admin-only; no customer
/// restore exists.
pub async fn delete_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let existing = Orders::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let mut active: OrderActive = existing.into();
    active.deleted_at = Set(Some(Utc::now().into()));
    let order = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_delete",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Deleted",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

fn none_if_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        session_id: model.session_id,
        nickname: model.nickname,
        phone: model.phone,
        shipping: ShippingMethod::parse(&model.shipping),
        postal_code: model.postal_code,
        address1: model.address1,
        address2: model.address2,
        edit_token: model.edit_token,
        total_qty: model.total_qty,
        total_amount: model.total_amount,
        is_manual: model.is_manual,
        paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
        shipped_at: model.shipped_at.map(|dt| dt.with_timezone(&Utc)),
        deleted_at: model.deleted_at.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub fn line_from_entity(model: LineModel) -> OrderLine {
    OrderLine {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        qty: model.qty,
        unit_price: model.unit_price,
        amount: model.amount,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: Uuid, qty: i32) -> LineInput {
        LineInput { product_id, qty }
    }

    #[test]
    fn duplicate_products_are_summed_into_one_line() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let normalized =
            normalize_lines(&[line(a, 2), line(b, 1), line(a, 3)]).expect("valid lines");
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0], NormalizedLine { product_id: a, qty: 5 });
        assert_eq!(normalized[1], NormalizedLine { product_id: b, qty: 1 });
    }

    #[test]
    fn non_positive_quantities_are_dropped_not_rejected() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let normalized = normalize_lines(&[line(a, 0), line(b, 2), line(a, -1)]).unwrap();
        assert_eq!(normalized, vec![NormalizedLine { product_id: b, qty: 2 }]);
    }

    #[test]
    fn empty_after_normalization_is_invalid_input() {
        let a = Uuid::new_v4();
        let err = normalize_lines(&[line(a, 0), line(a, -5)]).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        let err = normalize_lines(&[]).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    fn buyer(nickname: &str, shipping: &str, phone: Option<&str>) -> BuyerInfo {
        BuyerInfo {
            nickname: nickname.into(),
            shipping: shipping.into(),
            phone: phone.map(Into::into),
            postal_code: None,
            address1: None,
            address2: None,
        }
    }

    #[test]
    fn customer_buyer_requires_nickname_and_phone() {
        let err = validate_buyer(&buyer("  ", "일반", Some("010")), IntakePath::Customer)
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let err = validate_buyer(&buyer("kim", "일반", None), IntakePath::Customer).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn manual_buyer_defaults_to_courier_and_allows_missing_phone() {
        let (nickname, shipping) =
            validate_buyer(&buyer(" kim ", "", None), IntakePath::Manual).unwrap();
        assert_eq!(nickname, "kim");
        assert_eq!(shipping, ShippingMethod::Courier);
    }

    #[test]
    fn customer_vocabulary_is_mapped_at_the_boundary() {
        let (_, shipping) =
            validate_buyer(&buyer("kim", "제주/도서", Some("010")), IntakePath::Customer).unwrap();
        assert_eq!(shipping, ShippingMethod::Island);
    }
}
