//! Shared types and models for the Procurement Platform
//!
//! This crate contains the pure domain layer shared between the backend and
//! any other components: entity models, the quotation/order state machines,
//! stock arithmetic, and input validation. No IO happens here.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
