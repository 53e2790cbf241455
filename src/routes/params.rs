use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(50).clamp(1, 500);
        let offset = (page - 1) * per_page;
        (page, per_page, offset)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SessionListQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    /// Admin opt-in: soft-deleted sessions are hidden by default.
    pub include_deleted: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderListQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    pub include_deleted: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductListQuery {
    pub include_deleted: Option<bool>,
}
