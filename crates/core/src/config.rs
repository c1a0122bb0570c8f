use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `ADSERVE__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

/// Which backend the `AdStore` seam talks to.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// `memory` (demo/testing) or `rest` (PostgREST-style backend).
    #[serde(default = "default_store_backend")]
    pub backend: String,
    #[serde(default = "default_store_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Per-request timeout on backend reads/writes.
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryConfig {
    /// Max allowed |slot width - asset width| for a creative to fit.
    #[serde(default = "default_width_tolerance_px")]
    pub width_tolerance_px: u32,
    #[serde(default = "default_height_tolerance_px")]
    pub height_tolerance_px: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackingConfig {
    /// `utm_source` value stamped on outbound click URLs.
    #[serde(default = "default_utm_source")]
    pub utm_source: String,
    /// How long cached global settings (and thus the click throttle value)
    /// may lag behind the backend.
    #[serde(default = "default_settings_cache_ttl_ms")]
    pub settings_cache_ttl_ms: u64,
    /// Impression dedup entries older than this are pruned.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

// Default functions
fn default_node_id() -> String {
    "adserve-01".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_metrics_port() -> u16 {
    9091
}
fn default_store_backend() -> String {
    "memory".to_string()
}
fn default_store_base_url() -> String {
    "http://localhost:3000".to_string()
}
fn default_fetch_timeout_ms() -> u64 {
    3_000
}
fn default_width_tolerance_px() -> u32 {
    100
}
fn default_height_tolerance_px() -> u32 {
    200
}
fn default_utm_source() -> String {
    "adserve".to_string()
}
fn default_settings_cache_ttl_ms() -> u64 {
    30_000
}
fn default_session_ttl_secs() -> u64 {
    1_800
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            port: default_metrics_port(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            base_url: default_store_base_url(),
            api_key: None,
            fetch_timeout_ms: default_fetch_timeout_ms(),
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            width_tolerance_px: default_width_tolerance_px(),
            height_tolerance_px: default_height_tolerance_px(),
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            utm_source: default_utm_source(),
            settings_cache_ttl_ms: default_settings_cache_ttl_ms(),
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            store: StoreConfig::default(),
            delivery: DeliveryConfig::default(),
            tracking: TrackingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("ADSERVE")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tolerances_and_timeout() {
        let config = AppConfig::default();
        assert_eq!(config.delivery.width_tolerance_px, 100);
        assert_eq!(config.delivery.height_tolerance_px, 200);
        assert_eq!(config.store.fetch_timeout_ms, 3_000);
    }
}
