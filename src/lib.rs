pub mod api;
pub mod config;
pub mod countries;
pub mod models;
pub mod rate_limit;
pub mod stats;
pub mod storage;
