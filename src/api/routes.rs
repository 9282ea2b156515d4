use axum::{
    extract::Request,
    middleware::{self, Next},
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::countries::CountryIndex;
use crate::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::stats::VisitStats;
use crate::storage::KvBackend;

use super::countries::{get_country, list_countries, popular_countries};
use super::handlers::{
    get_country_stats, get_stats, get_top_countries, get_total, health_check, readiness_check,
    reset_stats, track_visit, AppState,
};

pub fn create_api_router(
    store: Arc<VisitStats>,
    countries: Arc<CountryIndex>,
    backend: Arc<dyn KvBackend>,
    rate_limiter: Option<Arc<RateLimiter>>,
) -> Router {
    let state = Arc::new(AppState {
        store,
        countries,
        backend,
    });

    let mut api_routes = Router::new()
        .route("/visit", post(track_visit))
        .route("/stats", get(get_stats))
        .route("/stats", delete(reset_stats))
        .route("/stats/top", get(get_top_countries))
        .route("/stats/total", get(get_total))
        .route("/stats/{country}", get(get_country_stats))
        .route("/countries", get(list_countries))
        .route("/countries/popular", get(popular_countries))
        .route("/countries/{code}", get(get_country));

    // The limiter guards /api only; health probes must stay unthrottled.
    if let Some(limiter) = rate_limiter {
        api_routes = api_routes.route_layer(middleware::from_fn(
            move |request: Request, next: Next| {
                rate_limit_middleware(Arc::clone(&limiter), request, next)
            },
        ));
    }

    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(health_check))
        .route("/health/ready", get(readiness_check))
        .nest("/api", api_routes)
        .with_state(state)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
