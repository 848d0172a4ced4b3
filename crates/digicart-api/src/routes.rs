//! # Routes
//!
//! Axum router configuration for the storefront and admin surfaces.

use crate::state::AppState;
use crate::{admin, handlers};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - Storefront API:
///   - GET  /api/products - Public product list
///   - POST /api/order - Create a gateway order
///   - POST /api/verify - Verify payment, issue download link
///
/// - Download:
///   - GET /download?token= - Redirect to the purchased resource
///
/// - Admin (session cookie):
///   - GET/POST /admin/login, GET/POST /admin/logout
///   - GET /admin, GET /catalog
///   - POST /update-price, POST /add-product
///
/// Anything else is served from `STATIC_DIR`.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/products", get(handlers::list_products))
        .route("/order", post(handlers::create_order))
        .route("/verify", post(handlers::verify_payment));

    let admin_routes = Router::new()
        .route("/admin", get(admin::dashboard))
        .route("/admin/login", get(admin::login_page).post(admin::login))
        .route("/admin/logout", get(admin::logout).post(admin::logout))
        .route("/catalog", get(admin::catalog))
        .route("/update-price", post(admin::update_price))
        .route("/add-product", post(admin::add_product));

    let static_files = ServeDir::new(&state.config.static_dir);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/download", get(handlers::download))
        .nest("/api", api_routes)
        .merge(admin_routes)
        .fallback_service(static_files)
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
