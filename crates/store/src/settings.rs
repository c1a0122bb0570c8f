//! Read-through cache for the global settings record.
//!
//! The click throttle value is consulted on every click; re-fetching the
//! settings row each time is wasteful, so reads go through a TTL cache. A
//! settings change can therefore lag by up to one TTL. Absence of the record
//! and read failures both resolve to the fail-open default.

use crate::AdStore;
use adserve_core::types::GlobalAdSettings;
use adserve_core::Clock;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

pub struct SettingsCache {
    store: Arc<dyn AdStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    cached: RwLock<Option<(DateTime<Utc>, GlobalAdSettings)>>,
}

impl SettingsCache {
    pub fn new(store: Arc<dyn AdStore>, clock: Arc<dyn Clock>, ttl_ms: u64) -> Self {
        Self {
            store,
            clock,
            ttl: Duration::milliseconds(ttl_ms as i64),
            cached: RwLock::new(None),
        }
    }

    /// Current settings, at most one TTL stale. Never fails: an unreadable or
    /// missing record yields the default.
    pub async fn get(&self) -> GlobalAdSettings {
        let now = self.clock.now();
        if let Some((fetched_at, settings)) = self.cached.read().await.as_ref() {
            if now - *fetched_at < self.ttl {
                return settings.clone();
            }
        }

        let settings = match self.store.global_settings().await {
            Ok(Some(settings)) => settings,
            Ok(None) => {
                warn!("no global ad settings record, using defaults");
                GlobalAdSettings::default()
            }
            Err(e) => {
                warn!(error = %e, "global ad settings read failed, using defaults");
                metrics::counter!("store.settings_errors").increment(1);
                GlobalAdSettings::default()
            }
        };

        *self.cached.write().await = Some((now, settings.clone()));
        settings
    }
}
