//! Route definitions for the procurement platform

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (register/login public, profile protected)
        .nest("/auth", auth_routes())
        // Protected routes - product catalog
        .nest("/products", product_routes())
        // Protected routes - inventory ledger
        .nest("/inventory", inventory_routes())
        // Protected routes - quotation workflow
        .nest("/quotations", quotation_routes())
        // Protected routes - order workflow
        .nest("/orders", order_routes())
        // Protected routes - admin user management
        .nest("/users", user_routes())
}

/// Authentication routes
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route(
            "/me",
            get(handlers::me).route_layer(middleware::from_fn(auth_middleware)),
        )
}

/// Product catalog routes (protected)
fn product_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route(
            "/:product_id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Inventory ledger routes (protected, scoped to the caller)
fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_inventory))
        .route("/add", post(handlers::add_stock))
        .route("/remove", post(handlers::remove_stock))
        .route("/update", put(handlers::set_stock))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Quotation workflow routes (protected)
fn quotation_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_quotations).post(handlers::propose_quotation),
        )
        .route(
            "/:quotation_id",
            get(handlers::get_quotation)
                .put(handlers::revise_quotation)
                .delete(handlers::delete_quotation),
        )
        .route("/:quotation_id/decision", post(handlers::decide_quotation))
        .route("/:quotation_id/approve", post(handlers::approve_quotation))
        .route("/:quotation_id/reject", post(handlers::reject_quotation))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Order workflow routes (protected)
fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_orders).post(handlers::create_order))
        .route(
            "/:order_id",
            get(handlers::get_order).delete(handlers::delete_order),
        )
        .route("/:order_id/status", put(handlers::update_order_status))
        .route_layer(middleware::from_fn(auth_middleware))
}

/// Admin user management routes (protected)
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/suppliers", get(handlers::list_suppliers))
        .route("/:user_id/block", post(handlers::block_user))
        .route("/:user_id/unblock", post(handlers::unblock_user))
        .route_layer(middleware::from_fn(auth_middleware))
}
