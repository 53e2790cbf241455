use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Product, Session};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    pub title: String,
    pub ship_threshold: Option<i64>,
    pub ship_fee_normal: Option<i64>,
    pub ship_fee_jeju: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ToggleClosedRequest {
    pub is_closed: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SaveNoticeRequest {
    pub notice: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionList {
    pub items: Vec<Session>,
}

/// Customer view of one session: header plus the orderable catalog.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionWithCatalog {
    pub session: Session,
    pub products: Vec<Product>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderCount {
    pub count: i64,
}
