pub mod auth;
pub mod catalog;
pub mod inventory;
pub mod order;
pub mod quotation;
pub mod users;

pub use auth::AuthService;
pub use catalog::CatalogService;
pub use inventory::InventoryService;
pub use order::OrderService;
pub use quotation::QuotationService;
pub use users::UserService;
