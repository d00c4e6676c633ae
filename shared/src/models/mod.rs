//! Domain models for the Procurement Platform

mod inventory;
mod order;
mod product;
mod quotation;
mod user;

pub use inventory::*;
pub use order::*;
pub use product::*;
pub use quotation::*;
pub use user::*;
