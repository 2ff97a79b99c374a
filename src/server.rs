use axum::{
    extract::Request,
    middleware as axum_mw,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::handlers::items::{self, Catalog};
use crate::middleware::{track_requests, RouteParams};
use crate::monitoring::{stream, Monitor};

/// Shared application state: the monitor and the demo catalog it watches.
#[derive(Clone)]
pub struct AppState {
    pub monitor: Arc<Monitor>,
    pub catalog: Arc<Catalog>,
}

/// Builds the full Axum `Router`: instrumented catalog routes, a health
/// check behind the router-wide tracker, and the diagnostics endpoints.
pub fn create_router(state: AppState) -> Router {
    let AppState { monitor, catalog } = state;

    let catalog_routes = Router::new()
        // ── Item endpoints (each handler wrapped once) ──────────
        .route(
            "/api/items",
            get(monitor.instrument(with_catalog(&catalog, items::list_items)))
                .post(monitor.instrument(with_catalog(&catalog, items::create_item))),
        )
        .route(
            "/api/items/:id",
            get(monitor.instrument(with_catalog(&catalog, items::get_item))),
        )
        .route(
            "/api/items/:id/report",
            get(monitor.instrument(with_catalog(&catalog, items::item_report))),
        );

    // ── Health check, instrumented by middleware instead ────────
    let health_routes = Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route_layer(axum_mw::from_fn_with_state(
            Arc::clone(&monitor),
            track_requests,
        ));

    Router::new()
        .merge(catalog_routes)
        .merge(health_routes)
        // ── Diagnostics (read-only) ─────────────────────────────
        .merge(stream::router(monitor))
        .layer(CorsLayer::permissive())
}

/// Bind the shared catalog into a handler so it fits the
/// `(Request, RouteParams)` shape `Monitor::instrument` expects.
fn with_catalog<F, Fut>(
    catalog: &Arc<Catalog>,
    handler: F,
) -> impl Fn(Request, RouteParams) -> Fut + Clone + Send + Sync + 'static
where
    F: Fn(Arc<Catalog>, Request, RouteParams) -> Fut + Clone + Send + Sync + 'static,
{
    let catalog = Arc::clone(catalog);
    move |req, params| handler(Arc::clone(&catalog), req, params)
}
