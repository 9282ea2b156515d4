use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub backend: BackendConfig,
    pub api_server: ServerConfig,
    pub cache: CacheConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub redis_url: String,
    pub connect_timeout_ms: u64,
    pub response_timeout_ms: u64,
    pub max_retries: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Redis,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub max_requests: u64,
    pub window_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let backend_str = std::env::var("STATS_BACKEND").unwrap_or_else(|_| "redis".to_string());

        let kind = match backend_str.to_lowercase().as_str() {
            "memory" => BackendKind::Memory,
            "redis" => BackendKind::Redis,
            other => {
                tracing::warn!(
                    "Unknown STATS_BACKEND '{other}', falling back to 'redis'. Supported values: redis, memory"
                );
                BackendKind::Redis
            }
        };

        let redis_url = std::env::var("REDIS_URL")
            .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        let api_host = std::env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let api_port = std::env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        Ok(Config {
            backend: BackendConfig {
                kind,
                redis_url,
                connect_timeout_ms: env_u64("REDIS_CONNECT_TIMEOUT_MS", 5000),
                response_timeout_ms: env_u64("REDIS_RESPONSE_TIMEOUT_MS", 2000),
                max_retries: env_u64("REDIS_MAX_RETRIES", 6) as usize,
            },
            api_server: ServerConfig {
                host: api_host,
                port: api_port,
            },
            cache: CacheConfig {
                enabled: env_flag("CACHE_ENABLED", false),
                ttl_secs: env_u64("CACHE_TTL_SECS", 30),
            },
            rate_limit: RateLimitConfig {
                enabled: env_flag("RATE_LIMIT_ENABLED", true),
                max_requests: env_u64("RATE_LIMIT_MAX_REQUESTS", 100),
                window_secs: env_u64("RATE_LIMIT_WINDOW_SECS", 60),
            },
        })
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}
