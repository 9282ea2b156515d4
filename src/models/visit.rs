use serde::{Deserialize, Serialize};

/// One country's cumulative visit count.
///
/// `country` is the lowercase alpha-2 code; `count` only grows (there is no
/// decrement, only the bulk reset).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryCount {
    pub country: String,
    pub count: u64,
}

#[derive(Debug, Deserialize)]
pub struct TrackVisitRequest {
    pub country: String,
}
