/// Server configuration loaded from environment variables.
///
/// All tunables have defaults suitable for local development; the
/// provider credentials and webhook secret must be set explicitly and
/// fail fast at startup when missing.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8003`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Base URL of the generation provider API.
    pub provider_api_url: String,
    /// Bearer token for the generation provider API.
    pub provider_api_key: String,
    /// Pre-shared secret for webhook signature verification.
    pub webhook_secret: String,
    /// Interval between status poll cycles in seconds (default: `2`).
    pub poll_interval_secs: u64,
    /// Maximum age before a non-terminal job is expired (default: `3600`).
    pub max_job_age_secs: i64,
    /// Consecutive poll failures before a job is marked failed
    /// (default: `5`).
    pub poll_failure_cap: u32,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var              | Default                 |
    /// |----------------------|-------------------------|
    /// | `HOST`               | `0.0.0.0`               |
    /// | `PORT`               | `8003`                  |
    /// | `CORS_ORIGINS`       | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                  |
    /// | `PROVIDER_API_URL`   | (required)              |
    /// | `PROVIDER_API_KEY`   | (required)              |
    /// | `WEBHOOK_SECRET`     | (required)              |
    /// | `POLL_INTERVAL_SECS` | `2`                     |
    /// | `MAX_JOB_AGE_SECS`   | `3600`                  |
    /// | `POLL_FAILURE_CAP`   | `5`                     |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8003".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let provider_api_url =
            std::env::var("PROVIDER_API_URL").expect("PROVIDER_API_URL must be set");
        let provider_api_key =
            std::env::var("PROVIDER_API_KEY").expect("PROVIDER_API_KEY must be set");
        let webhook_secret = std::env::var("WEBHOOK_SECRET").expect("WEBHOOK_SECRET must be set");

        let poll_interval_secs: u64 = std::env::var("POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| "2".into())
            .parse()
            .expect("POLL_INTERVAL_SECS must be a valid u64");

        let max_job_age_secs: i64 = std::env::var("MAX_JOB_AGE_SECS")
            .unwrap_or_else(|_| "3600".into())
            .parse()
            .expect("MAX_JOB_AGE_SECS must be a valid i64");

        let poll_failure_cap: u32 = std::env::var("POLL_FAILURE_CAP")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("POLL_FAILURE_CAP must be a valid u32");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            provider_api_url,
            provider_api_key,
            webhook_secret,
            poll_interval_secs,
            max_job_age_secs,
            poll_failure_cap,
        }
    }
}
