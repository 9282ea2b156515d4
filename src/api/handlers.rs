use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::countries::CountryIndex;
use crate::models::{CountryCount, TrackVisitRequest};
use crate::stats::{StatsError, VisitStats};
use crate::storage::KvBackend;

pub struct AppState {
    pub store: Arc<VisitStats>,
    pub countries: Arc<CountryIndex>,
    pub backend: Arc<dyn KvBackend>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub stats: HashMap<String, u64>,
    pub total: u64,
}

#[derive(Serialize)]
pub struct TopCountriesResponse {
    pub countries: Vec<TopCountryEntry>,
}

#[derive(Serialize)]
pub struct TopCountryEntry {
    pub country: String,
    pub name: Option<String>,
    pub count: u64,
}

#[derive(Serialize)]
pub struct TotalResponse {
    pub total: u64,
}

#[derive(Serialize)]
pub struct CountryStatsResponse {
    pub country: String,
    pub name: Option<String>,
    pub count: u64,
}

#[derive(Serialize)]
pub struct ResetResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub backend: String,
}

#[derive(Deserialize)]
pub struct TopQuery {
    pub limit: Option<usize>,
}

fn stats_error_response(err: StatsError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        StatsError::InvalidCountryCode { .. } => StatusCode::BAD_REQUEST,
        StatsError::CorruptCount { .. } => {
            tracing::error!("Corrupt counter state: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
        StatsError::Backend(source) => {
            tracing::error!("Key-value backend failure: {source}");
            StatusCode::SERVICE_UNAVAILABLE
        }
    };

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

/// Record one visit for the submitted country code
pub async fn track_visit(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TrackVisitRequest>,
) -> Result<Json<CountryCount>, (StatusCode, Json<ErrorResponse>)> {
    match state.store.track_visit(&payload.country).await {
        Ok(visit) => Ok(Json(visit)),
        Err(e) => Err(stats_error_response(e)),
    }
}

/// Full per-country table plus the aggregate total
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatsResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.store.statistics().await {
        Ok(stats) => {
            // Summed from the same read so the two fields cannot disagree.
            let total = stats.values().sum();
            Ok(Json(StatsResponse { stats, total }))
        }
        Err(e) => Err(stats_error_response(e)),
    }
}

/// Highest-counting countries, name-enriched, count descending
pub async fn get_top_countries(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TopQuery>,
) -> Result<Json<TopCountriesResponse>, (StatusCode, Json<ErrorResponse>)> {
    if let Some(limit) = query.limit {
        if !(1..=100).contains(&limit) {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "limit must be between 1 and 100".to_string(),
                }),
            ));
        }
    }

    match state.store.top_countries(query.limit).await {
        Ok(top) => {
            let countries = top
                .into_iter()
                .map(|entry| TopCountryEntry {
                    name: state.countries.name(&entry.country).map(str::to_string),
                    country: entry.country,
                    count: entry.count,
                })
                .collect();
            Ok(Json(TopCountriesResponse { countries }))
        }
        Err(e) => Err(stats_error_response(e)),
    }
}

/// Aggregate visit count across every country
pub async fn get_total(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TotalResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.store.total_visits().await {
        Ok(total) => Ok(Json(TotalResponse { total })),
        Err(e) => Err(stats_error_response(e)),
    }
}

/// One country's count; never-visited countries read as zero
pub async fn get_country_stats(
    State(state): State<Arc<AppState>>,
    Path(country): Path<String>,
) -> Result<Json<CountryStatsResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.store.country_stats(&country).await {
        Ok(count) => {
            let code = country.to_ascii_lowercase();
            Ok(Json(CountryStatsResponse {
                name: state.countries.name(&code).map(str::to_string),
                country: code,
                count,
            }))
        }
        Err(e) => Err(stats_error_response(e)),
    }
}

/// Clear every counter
pub async fn reset_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ResetResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.store.reset().await {
        Ok(()) => Ok(Json(ResetResponse {
            success: true,
            message: "All visit statistics cleared".to_string(),
        })),
        Err(e) => Err(stats_error_response(e)),
    }
}

/// Liveness probe, touches no dependencies
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness probe, requires a responsive backend
pub async fn readiness_check(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReadyResponse>, (StatusCode, Json<ReadyResponse>)> {
    match state.backend.ping().await {
        Ok(()) => Ok(Json(ReadyResponse {
            status: "ready".to_string(),
            backend: "connected".to_string(),
        })),
        Err(e) => {
            tracing::warn!("Readiness probe failed: {e}");
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadyResponse {
                    status: "not_ready".to_string(),
                    backend: "disconnected".to_string(),
                }),
            ))
        }
    }
}
