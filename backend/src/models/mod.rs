//! Database models for the procurement platform
//!
//! Re-exports models from the shared crate; the backend adds only
//! service-level view types on top of these.

pub use shared::models::*;
