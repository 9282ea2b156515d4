use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::countries::is_alpha2;
use crate::models::CountryInfo;

use super::handlers::{AppState, ErrorResponse};

#[derive(Serialize)]
pub struct CountryListResponse {
    pub countries: Vec<CountryInfo>,
    pub total: usize,
}

#[derive(Deserialize)]
pub struct CountryQuery {
    pub q: Option<String>,
}

/// List every known country, optionally narrowed by a substring query
pub async fn list_countries(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CountryQuery>,
) -> Json<CountryListResponse> {
    let countries = match query.q.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => state.countries.search(q),
        _ => state.countries.all(),
    };

    let total = countries.len();
    Json(CountryListResponse { countries, total })
}

/// Curated shortlist of commonly requested countries
pub async fn popular_countries(State(state): State<Arc<AppState>>) -> Json<CountryListResponse> {
    let countries = state.countries.popular();
    let total = countries.len();
    Json(CountryListResponse { countries, total })
}

/// Look up a single country by its two-letter code
pub async fn get_country(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<CountryInfo>, (StatusCode, Json<ErrorResponse>)> {
    if !is_alpha2(&code) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Country code must be two ASCII letters".to_string(),
            }),
        ));
    }

    let code = code.to_ascii_lowercase();
    match state.countries.name(&code) {
        Some(name) => Ok(Json(CountryInfo {
            code,
            name: name.to_string(),
        })),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Unknown country code: {code}"),
            }),
        )),
    }
}
