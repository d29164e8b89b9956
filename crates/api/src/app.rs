use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sqlx::PgPool;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::jobs::JobStatusMap;
use crate::middleware::trace_id;
use crate::routes::{
    admin, ai_products, courses, entitlement_rules, error_logs, health, order_import, orders,
    user_entitlements,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub job_status: JobStatusMap,
}

/// Process-wide Prometheus recorder. Installed once; test apps share it.
fn metrics_handle() -> &'static PrometheusHandle {
    static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
    HANDLE.get_or_init(|| {
        PrometheusBuilder::new()
            .install_recorder()
            .expect("failed to install Prometheus recorder")
    })
}

pub fn create_app(config: Config, pool: PgPool, job_status: JobStatusMap) -> Router {
    let config = Arc::new(config);

    let state = AppState {
        pool,
        config: config.clone(),
        job_status,
    };

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let api_routes = Router::new()
        // Course catalog
        .route("/api/v1/courses", post(courses::create_course))
        .route("/api/v1/courses", get(courses::list_courses))
        .route("/api/v1/courses/search", get(courses::search_courses))
        .route("/api/v1/courses/lookup", post(courses::lookup_course))
        .route("/api/v1/courses/:course_id", get(courses::get_course))
        .route("/api/v1/courses/:course_id", put(courses::update_course))
        .route("/api/v1/courses/:course_id", delete(courses::delete_course))
        .route(
            "/api/v1/courses/:course_id/permanent",
            delete(courses::delete_course_permanently),
        )
        // AI product catalog
        .route("/api/v1/ai-products", post(ai_products::create_ai_product))
        .route("/api/v1/ai-products", get(ai_products::list_ai_products))
        .route(
            "/api/v1/ai-products/search",
            get(ai_products::search_ai_products),
        )
        .route(
            "/api/v1/ai-products/lookup",
            post(ai_products::lookup_ai_product),
        )
        .route(
            "/api/v1/ai-products/:ai_product_id",
            get(ai_products::get_ai_product),
        )
        .route(
            "/api/v1/ai-products/:ai_product_id",
            put(ai_products::update_ai_product),
        )
        .route(
            "/api/v1/ai-products/:ai_product_id",
            delete(ai_products::delete_ai_product),
        )
        .route(
            "/api/v1/ai-products/:ai_product_id/permanent",
            delete(ai_products::delete_ai_product_permanently),
        )
        // Entitlement rules
        .route(
            "/api/v1/entitlement-rules",
            post(entitlement_rules::create_rule),
        )
        .route(
            "/api/v1/entitlement-rules",
            get(entitlement_rules::list_rules),
        )
        .route(
            "/api/v1/entitlement-rules/filter",
            post(entitlement_rules::filter_rules),
        )
        .route(
            "/api/v1/entitlement-rules/:rule_id",
            get(entitlement_rules::get_rule),
        )
        .route(
            "/api/v1/entitlement-rules/:rule_id",
            put(entitlement_rules::update_rule),
        )
        .route(
            "/api/v1/entitlement-rules/:rule_id",
            delete(entitlement_rules::delete_rule),
        )
        // Orders
        .route("/api/v1/orders", post(orders::create_order))
        .route("/api/v1/orders", get(orders::list_orders))
        .route("/api/v1/orders/filter", post(orders::filter_orders))
        .route("/api/v1/orders/import", post(order_import::import_orders))
        .route("/api/v1/orders/:order_id", get(orders::get_order))
        .route("/api/v1/orders/:order_id", put(orders::update_order))
        .route("/api/v1/orders/:order_id", delete(orders::delete_order))
        .route(
            "/api/v1/orders/:order_id/generate-entitlement",
            post(user_entitlements::generate_from_order),
        )
        // User entitlements
        .route(
            "/api/v1/user-entitlements",
            post(user_entitlements::create_entitlement),
        )
        .route(
            "/api/v1/user-entitlements",
            get(user_entitlements::list_entitlements),
        )
        .route(
            "/api/v1/user-entitlements/filter",
            post(user_entitlements::filter_entitlements),
        )
        .route(
            "/api/v1/user-entitlements/batch-generate",
            post(user_entitlements::batch_generate),
        )
        .route(
            "/api/v1/user-entitlements/:entitlement_id",
            get(user_entitlements::get_entitlement),
        )
        .route(
            "/api/v1/user-entitlements/:entitlement_id",
            put(user_entitlements::update_entitlement),
        )
        .route(
            "/api/v1/user-entitlements/:entitlement_id",
            delete(user_entitlements::delete_entitlement),
        )
        // Audit logs
        .route(
            "/api/v1/order-upload-errors",
            get(error_logs::list_upload_errors),
        )
        .route(
            "/api/v1/batch-generate-errors",
            get(error_logs::list_batch_errors),
        )
        // Admin
        .route("/api/v1/admin/stats", get(admin::get_stats))
        .route("/api/v1/admin/jobs", get(admin::list_jobs))
        .route(
            "/api/v1/admin/jobs/order-sync/run",
            post(admin::run_order_sync),
        )
        .route(
            "/api/v1/admin/jobs/quota-reset/run",
            post(admin::run_quota_reset),
        );

    let metrics = metrics_handle();

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::ready))
        .route("/metrics", get(move || async move { metrics.render() }))
        .merge(api_routes)
        .layer(middleware::from_fn(trace_id))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}
