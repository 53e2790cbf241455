use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::shipping::ShippingMethod;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Session {
    pub id: Uuid,
    pub title: String,
    pub is_closed: bool,
    pub ship_threshold: i64,
    pub ship_fee_normal: i64,
    pub ship_fee_jeju: i64,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub session_id: Uuid,
    pub name: String,
    pub price: i64,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub is_soldout: bool,
    pub sort_order: i32,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub session_id: Uuid,
    pub nickname: String,
    pub phone: Option<String>,
    pub shipping: ShippingMethod,
    pub postal_code: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub edit_token: String,
    pub total_qty: i64,
    pub total_amount: i64,
    pub is_manual: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderLine {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub qty: i32,
    /// Product price captured when the line was accepted. Later price
    /// edits never change this.
    pub unit_price: i64,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

/// One coalesced line on a rendered receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReceiptLine {
    pub product_id: Uuid,
    pub name: String,
    pub qty: i64,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Receipt {
    pub session_id: Uuid,
    pub nickname: String,
    pub shipping: ShippingMethod,
    pub phone: String,
    pub address: String,
    pub goods_total: i64,
    pub shipping_fee: i64,
    pub final_total: i64,
    pub lines: Vec<ReceiptLine>,
}

/// Per-product sales aggregate across a session's non-deleted orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SummaryRow {
    pub product_id: Uuid,
    pub name: String,
    pub price: i64,
    pub sold_qty: i64,
    pub revenue: i64,
}
