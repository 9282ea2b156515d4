pub mod store;

pub use store::{StatsError, StatsResult, VisitStats, DEFAULT_TOP_LIMIT, VISIT_STATS_KEY};
