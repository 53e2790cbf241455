pub mod audit_logs;
pub mod order_lines;
pub mod orders;
pub mod products;
pub mod session_notices;
pub mod sessions;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use order_lines::Entity as OrderLines;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use session_notices::Entity as SessionNotices;
pub use sessions::Entity as Sessions;
pub use users::Entity as Users;
