use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/embeddings";
pub const DEFAULT_MODEL: &str = "text-embedding-3-small";

/// Connection settings for the embedding provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl ProviderConfig {
    /// Resolve from the environment: `SEMDEX_ENDPOINT`, `SEMDEX_MODEL`,
    /// `SEMDEX_API_KEY`. Unset values fall back to the OpenAI defaults; a
    /// missing key is left empty and surfaces as an auth error on first use.
    pub fn from_env() -> Self {
        Self {
            endpoint: std::env::var("SEMDEX_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
            model: std::env::var("SEMDEX_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            api_key: std::env::var("SEMDEX_API_KEY").unwrap_or_default(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Tunables for the embedding scheduler and the search controller.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Documents embedded concurrently per batch.
    pub batch_size: usize,
    /// Pause between batches, bounding provider request rate.
    pub batch_pause: Duration,
    /// Quiet window before a query change is evaluated.
    pub quiet_window: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size: 6,
            batch_pause: Duration::from_millis(200),
            quiet_window: Duration::from_millis(300),
        }
    }
}
