use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse},
        orders::{
            BuyerInfo, CreateOrderRequest, LineInput, OrderList, OrderWithLines, ReceiptView,
            SummaryList, UpdateOrderRequest,
        },
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
        sessions::{
            CreateSessionRequest, OrderCount, SaveNoticeRequest, SessionList, SessionWithCatalog,
            ToggleClosedRequest,
        },
    },
    models::{Order, OrderLine, Product, Receipt, ReceiptLine, Session, SummaryRow},
    response::{ApiResponse, Meta},
    routes::{admin, auth, health, orders, params, receipt, sessions},
    shipping::ShippingMethod,
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        sessions::get_session,
        orders::create_order,
        orders::get_order,
        orders::update_order,
        receipt::receipt_by_token,
        admin::create_session,
        admin::list_sessions,
        admin::toggle_closed,
        admin::delete_session,
        admin::restore_session,
        admin::save_notice,
        admin::list_session_orders,
        admin::order_count,
        admin::session_summary,
        admin::list_products,
        admin::create_product,
        admin::update_product,
        admin::toggle_active,
        admin::toggle_soldout,
        admin::delete_product,
        admin::create_manual_order,
        admin::toggle_paid,
        admin::toggle_shipped,
        admin::delete_order
    ),
    components(
        schemas(
            Session,
            Product,
            Order,
            OrderLine,
            Receipt,
            ReceiptLine,
            SummaryRow,
            ShippingMethod,
            LoginRequest,
            LoginResponse,
            CreateSessionRequest,
            ToggleClosedRequest,
            SaveNoticeRequest,
            SessionList,
            SessionWithCatalog,
            OrderCount,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            LineInput,
            BuyerInfo,
            CreateOrderRequest,
            UpdateOrderRequest,
            OrderWithLines,
            OrderList,
            ReceiptView,
            SummaryList,
            params::Pagination,
            params::SessionListQuery,
            params::OrderListQuery,
            params::ProductListQuery,
            Meta,
            ApiResponse<Session>,
            ApiResponse<SessionList>,
            ApiResponse<SessionWithCatalog>,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<OrderWithLines>,
            ApiResponse<ReceiptView>,
            ApiResponse<SummaryList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Seller authentication"),
        (name = "Sessions", description = "Public live-session endpoints"),
        (name = "Orders", description = "Customer order intake and edit-by-token"),
        (name = "Receipt", description = "Settlement receipt by token"),
        (name = "Admin", description = "Seller console endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
