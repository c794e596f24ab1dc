use std::path::PathBuf;
use std::time::Duration;

/// CLI configuration, loaded from environment variables.
pub struct Config {
    /// Root of the recognition service API (default: http://localhost:5000/api).
    pub api_url: String,
    /// Path to the SQLite local cache.
    pub cache_path: PathBuf,
    /// Per-request timeout for remote calls.
    pub http_timeout: Duration,
    /// Interval between visibility refreshes in `watch` mode.
    pub refresh_interval: Duration,
    /// Skip confirmation prompts.
    pub assume_yes: bool,
}

impl Config {
    /// Load configuration from `FACEDEX_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let data_dir = std::env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
                PathBuf::from(home).join(".local/share")
            })
            .join("facedex");

        let cache_path = std::env::var("FACEDEX_CACHE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("cache.db"));

        Self {
            api_url: std::env::var("FACEDEX_API_URL")
                .unwrap_or_else(|_| "http://localhost:5000/api".to_string()),
            cache_path,
            http_timeout: Duration::from_secs(env_u64("FACEDEX_HTTP_TIMEOUT_SECS", 30)),
            refresh_interval: Duration::from_secs(env_u64("FACEDEX_REFRESH_SECS", 30).max(1)),
            assume_yes: std::env::var("FACEDEX_ASSUME_YES")
                .map(|v| v == "1")
                .unwrap_or(false),
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
