//! Runtime configuration. Nothing below this module reads `std::env`
//! directly — only `main.rs` does, and it hands the parsed [`Config`] down.

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub vector_search_url: String,
    pub request_timeout_ms: u64,
    pub rate_limit_default: u32,
    pub log_format: LogFormat,
    pub graph_data_dir: std::path::PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Human,
    Json,
}

impl Config {
    /// Reads the recognized `ENGRAM_*` environment variables, falling back
    /// to sane defaults for local development.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("ENGRAM_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("ENGRAM_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8080),
            vector_search_url: std::env::var("ENGRAM_VECTOR_SEARCH_URL")
                .unwrap_or_else(|_| "http://localhost:6333".to_string()),
            request_timeout_ms: std::env::var("ENGRAM_REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10_000),
            rate_limit_default: std::env::var("ENGRAM_RATE_LIMIT_DEFAULT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
            log_format: match std::env::var("ENGRAM_LOG_FORMAT").as_deref() {
                Ok("json") => LogFormat::Json,
                _ => LogFormat::Human,
            },
            graph_data_dir: std::env::var("ENGRAM_GRAPH_DATA_DIR")
                .map(std::path::PathBuf::from)
                .unwrap_or_else(|_| std::path::PathBuf::from("./data/graphs")),
        }
    }
}
