//! The visit counter store.
//!
//! A thin domain object over one remote hash record: field per country,
//! atomic field increments, whole-record reads. The store holds no mutable
//! state of its own and takes no locks; serialization of concurrent writes
//! is entirely the backend's atomic-increment guarantee. Reads concurrent
//! with in-flight increments may see any subset applied: the counters are
//! approximate analytics, not a transactional ledger.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::countries::CountryIndex;
use crate::models::CountryCount;
use crate::storage::{BackendError, KvBackend};

/// The single hash record every per-country counter lives in.
pub const VISIT_STATS_KEY: &str = "visit_stats";

/// Entries returned by `top_countries` when the caller gives no limit.
pub const DEFAULT_TOP_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum StatsError {
    /// The submitted code fails format or membership validation. Carries
    /// the original un-normalized input for diagnostics.
    #[error("invalid country code: {input:?}")]
    InvalidCountryCode { input: String },

    /// A stored value did not parse as a non-negative integer. Counters are
    /// only ever written through atomic increments, so this means the
    /// persisted record was corrupted out-of-band.
    #[error("stored count for {country:?} is not a non-negative integer: {value:?}")]
    CorruptCount { country: String, value: String },

    /// The key-value backend failed. Propagated unchanged with the original
    /// cause attached; never retried here (a blind retry could apply an
    /// increment twice).
    #[error(transparent)]
    Backend(#[from] BackendError),
}

pub type StatsResult<T> = Result<T, StatsError>;

pub struct VisitStats {
    backend: Arc<dyn KvBackend>,
    countries: Arc<CountryIndex>,
}

impl VisitStats {
    pub fn new(backend: Arc<dyn KvBackend>, countries: Arc<CountryIndex>) -> Self {
        Self { backend, countries }
    }

    /// Validate a caller-supplied code and normalize it to the stored
    /// lowercase identity. Runs before any backend call, so invalid input
    /// never mutates anything.
    fn normalize(&self, code: &str) -> StatsResult<String> {
        let normalized = code.to_ascii_lowercase();
        if !self.countries.is_valid(&normalized) {
            return Err(StatsError::InvalidCountryCode {
                input: code.to_string(),
            });
        }
        Ok(normalized)
    }

    /// Record one visit. Returns the post-increment count straight from the
    /// backend's atomic increment; no re-read.
    pub async fn track_visit(&self, country_code: &str) -> StatsResult<CountryCount> {
        let country = self.normalize(country_code)?;

        let raw = self
            .backend
            .hash_incr_by(VISIT_STATS_KEY, &country, 1)
            .await?;

        let count = u64::try_from(raw).map_err(|_| StatsError::CorruptCount {
            country: country.clone(),
            value: raw.to_string(),
        })?;

        Ok(CountryCount { country, count })
    }

    /// The full table in one backend read. Empty map when nothing was ever
    /// tracked.
    pub async fn statistics(&self) -> StatsResult<HashMap<String, u64>> {
        let fields = self.backend.hash_get_all(VISIT_STATS_KEY).await?;

        let mut stats = HashMap::with_capacity(fields.len());
        for (country, value) in fields {
            let count = parse_count(&country, &value)?;
            stats.insert(country, count);
        }

        Ok(stats)
    }

    /// One country's count from a single field read. An absent field is a
    /// valid state and reads as 0.
    pub async fn country_stats(&self, country_code: &str) -> StatsResult<u64> {
        let country = self.normalize(country_code)?;

        match self.backend.hash_get(VISIT_STATS_KEY, &country).await? {
            Some(value) => parse_count(&country, &value),
            None => Ok(0),
        }
    }

    /// Sum over `statistics`. Either the whole total or an error, never a
    /// partial sum.
    pub async fn total_visits(&self) -> StatsResult<u64> {
        Ok(self.statistics().await?.values().sum())
    }

    /// The `limit` highest counters, count descending with country code
    /// ascending on ties (backend field order is not stable, output must
    /// be). `None` means `DEFAULT_TOP_LIMIT`; a zero limit returns nothing;
    /// a limit past the table size returns what exists.
    pub async fn top_countries(&self, limit: Option<usize>) -> StatsResult<Vec<CountryCount>> {
        let limit = limit.unwrap_or(DEFAULT_TOP_LIMIT);
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut entries: Vec<CountryCount> = self
            .statistics()
            .await?
            .into_iter()
            .map(|(country, count)| CountryCount { country, count })
            .collect();

        entries.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.country.cmp(&b.country))
        });
        entries.truncate(limit);

        Ok(entries)
    }

    /// Drop the whole table in one operation. Idempotent: deleting an
    /// absent key succeeds.
    pub async fn reset(&self) -> StatsResult<()> {
        self.backend.delete(VISIT_STATS_KEY).await?;
        Ok(())
    }
}

fn parse_count(country: &str, value: &str) -> StatsResult<u64> {
    value.parse::<u64>().map_err(|_| StatsError::CorruptCount {
        country: country.to_string(),
        value: value.to_string(),
    })
}
