use std::collections::HashMap;

use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use uuid::Uuid;

use crate::{
    dto::orders::{ReceiptView, SummaryList},
    entity::{
        order_lines::{Column as LineCol, Entity as OrderLines},
        orders::{Column as OrderCol, Entity as Orders},
        products::{Column as ProdCol, Entity as Products},
        session_notices::Entity as SessionNotices,
        sessions::Entity as Sessions,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::ReceiptLine,
    response::{ApiResponse, Meta},
    settlement::{self, CatalogEntry, ReceiptInput, ShipConfig},
    shipping::ShippingMethod,
    state::AppState,
};

/// Shown when a line references a product row that no longer resolves.
/// Soft-deleted products still resolve; this covers genuinely lost rows.
const MISSING_PRODUCT_NAME: &str = "(deleted product)";

/// Renders the settlement document for one order. Works for deleted
/// orders and deleted sessions too — money already changed hands, so
/// the receipt must stay reachable by token.
pub async fn receipt_by_token(state: &AppState, token: &str) -> AppResult<ApiResponse<ReceiptView>> {
    let order = Orders::find()
        .filter(OrderCol::EditToken.eq(token))
        .one(&state.orm)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let session = Sessions::find_by_id(order.session_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let cfg = ShipConfig {
        threshold: session.ship_threshold,
        fee_normal: session.ship_fee_normal,
        fee_jeju: session.ship_fee_jeju,
    };

    let lines = OrderLines::find()
        .filter(LineCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?;

    // Names come from the catalog regardless of product visibility;
    // amounts come from the line snapshots, never from live prices.
    let product_ids: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();
    let names: HashMap<Uuid, String> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();

    let receipt_lines: Vec<ReceiptLine> = lines
        .into_iter()
        .map(|l| ReceiptLine {
            product_id: l.product_id,
            name: names
                .get(&l.product_id)
                .cloned()
                .unwrap_or_else(|| MISSING_PRODUCT_NAME.to_string()),
            qty: l.qty as i64,
            amount: l.amount,
        })
        .collect();

    let receipt = settlement::compute_receipt(
        ReceiptInput {
            session_id: order.session_id,
            nickname: order.nickname,
            shipping: ShippingMethod::parse(&order.shipping),
            phone: order.phone,
            postal_code: order.postal_code,
            address1: order.address1,
            address2: order.address2,
            lines: receipt_lines,
        },
        &cfg,
    );

    let notice = SessionNotices::find_by_id(order.session_id)
        .one(&state.orm)
        .await?
        .map(|n| n.notice)
        .unwrap_or_default();

    Ok(ApiResponse::success(
        "Receipt",
        ReceiptView { receipt, notice },
        None,
    ))
}

/// Per-product sales aggregate for one session. Deleted orders'
/// quantities are excluded from revenue but never physically erased;
/// deleted products stay in the report because their history is real.
pub async fn session_summary(
    state: &AppState,
    user: &AuthUser,
    session_id: Uuid,
) -> AppResult<ApiResponse<SummaryList>> {
    ensure_admin(user)?;

    let session = Sessions::find_by_id(session_id).one(&state.orm).await?;
    if session.is_none() {
        return Err(AppError::NotFound);
    }

    let catalog: Vec<CatalogEntry> = Products::find()
        .filter(ProdCol::SessionId.eq(session_id))
        .order_by_asc(ProdCol::SortOrder)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|p| CatalogEntry {
            product_id: p.id,
            name: p.name,
            price: p.price,
            sort_order: p.sort_order,
        })
        .collect();

    let live_order_ids: Vec<Uuid> = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::SessionId.eq(session_id))
                .add(OrderCol::DeletedAt.is_null()),
        )
        .select_only()
        .column(OrderCol::Id)
        .into_tuple()
        .all(&state.orm)
        .await?;

    let sold_lines: Vec<(Uuid, i64, i64)> = if live_order_ids.is_empty() {
        Vec::new()
    } else {
        OrderLines::find()
            .filter(LineCol::OrderId.is_in(live_order_ids))
            .all(&state.orm)
            .await?
            .into_iter()
            .map(|l| (l.product_id, l.qty as i64, l.amount))
            .collect()
    };

    let rows = settlement::summarize(catalog, &sold_lines);
    let meta = Meta::total_only(rows.len() as i64);
    Ok(ApiResponse::success(
        "Session summary",
        SummaryList { rows },
        Some(meta),
    ))
}
