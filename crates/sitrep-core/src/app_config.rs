use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// News index listing URL; the page number is appended verbatim.
    pub news_index_url: String,
    pub ingest_index_pages: u32,
    pub ingest_request_timeout_secs: u64,
    pub ingest_user_agent: String,
    pub ingest_max_retries: u32,
    pub ingest_retry_backoff_base_ms: u64,
    pub classifier_url: String,
    pub classifier_api_token: Option<String>,
    pub llm_base_url: String,
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    pub llm_fallback_models: Vec<String>,
    pub geocoder_url: String,
    pub weather_url: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("news_index_url", &self.news_index_url)
            .field("ingest_index_pages", &self.ingest_index_pages)
            .field(
                "ingest_request_timeout_secs",
                &self.ingest_request_timeout_secs,
            )
            .field("ingest_user_agent", &self.ingest_user_agent)
            .field("ingest_max_retries", &self.ingest_max_retries)
            .field(
                "ingest_retry_backoff_base_ms",
                &self.ingest_retry_backoff_base_ms,
            )
            .field("classifier_url", &self.classifier_url)
            .field(
                "classifier_api_token",
                &self.classifier_api_token.as_ref().map(|_| "[redacted]"),
            )
            .field("llm_base_url", &self.llm_base_url)
            .field(
                "llm_api_key",
                &self.llm_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("llm_model", &self.llm_model)
            .field("llm_fallback_models", &self.llm_fallback_models)
            .field("geocoder_url", &self.geocoder_url)
            .field("weather_url", &self.weather_url)
            .finish()
    }
}
