//! HTTP handlers: thin adapters between axum and the service layer

mod auth;
mod health;
mod inventory;
mod orders;
mod products;
mod quotations;
mod users;

pub use auth::*;
pub use health::*;
pub use inventory::*;
pub use orders::*;
pub use products::*;
pub use quotations::*;
pub use users::*;
