use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Order, OrderLine, Receipt, SummaryRow};

/// One raw {product, qty} entry as submitted. The aggregator normalizes
/// these: non-positive qty entries are dropped, duplicates are summed.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LineInput {
    pub product_id: Uuid,
    pub qty: i32,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BuyerInfo {
    pub nickname: String,
    /// Accepts both the customer and the admin shipping vocabulary.
    pub shipping: String,
    pub phone: Option<String>,
    pub postal_code: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub session_id: Uuid,
    #[serde(flatten)]
    pub buyer: BuyerInfo,
    pub lines: Vec<LineInput>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderRequest {
    #[serde(flatten)]
    pub buyer: BuyerInfo,
    pub lines: Vec<LineInput>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithLines {
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

/// Receipt plus the session's free-text notice, as one document.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReceiptView {
    pub receipt: Receipt,
    pub notice: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SummaryList {
    pub rows: Vec<SummaryRow>,
}
