//! Click tracking: per-creative throttle, best-effort metric write, and the
//! UTM-augmented redirect URL. A throttled click is suppressed entirely —
//! no metric row and no navigation — which absorbs double-clicks and
//! hammering bots.

use std::sync::Arc;

use adserve_core::types::{MetricEvent, MetricKind};
use adserve_core::Clock;
use adserve_store::{AdStore, SettingsCache};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Deserialize;
use tracing::{debug, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::utm::append_utm;

/// A user click on a served creative, as reported by the page.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ClickRegistration {
    pub slot_id: Uuid,
    pub campaign_id: Uuid,
    pub asset_id: Uuid,
    pub target_url: String,
    pub page_url: Option<String>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Within the throttle window of the previous click on this creative.
    Suppressed,
    /// Click recorded; navigate to this augmented URL.
    Redirect { url: String },
}

pub struct ClickTracker {
    store: Arc<dyn AdStore>,
    settings: Arc<SettingsCache>,
    clock: Arc<dyn Clock>,
    last_click: DashMap<Uuid, DateTime<Utc>>,
    utm_source: String,
}

impl ClickTracker {
    pub fn new(
        store: Arc<dyn AdStore>,
        settings: Arc<SettingsCache>,
        clock: Arc<dyn Clock>,
        utm_source: String,
    ) -> Self {
        Self {
            store,
            settings,
            clock,
            last_click: DashMap::new(),
            utm_source,
        }
    }

    /// Register a click. The throttle window comes from global settings
    /// (read through the TTL cache).
    pub async fn record(&self, click: &ClickRegistration) -> ClickOutcome {
        let throttle = Duration::milliseconds(
            self.settings.get().await.click_throttle_ms as i64,
        );
        let now = self.clock.now();

        // A timestamp older than the window can never suppress again.
        self.last_click
            .retain(|_, last| now - *last < throttle);

        if let Some(last) = self.last_click.get(&click.asset_id) {
            if now - *last < throttle {
                debug!(asset_id = %click.asset_id, "click inside throttle window, suppressed");
                metrics::counter!("clicks.throttled").increment(1);
                return ClickOutcome::Suppressed;
            }
        }
        self.last_click.insert(click.asset_id, now);

        let event = MetricEvent {
            id: Uuid::new_v4(),
            campaign_id: click.campaign_id,
            asset_id: click.asset_id,
            slot_id: Some(click.slot_id),
            kind: MetricKind::Click,
            page_url: click.page_url.clone(),
            referrer: click.referrer.clone(),
            user_agent: click.user_agent.clone(),
            timestamp: now,
        };

        match self.store.write_metric(&event).await {
            Ok(()) => {
                metrics::counter!("clicks.recorded").increment(1);
            }
            Err(e) => {
                // Navigation proceeds regardless; the row is lost.
                warn!(asset_id = %click.asset_id, error = %e, "click write failed, dropped");
                metrics::counter!("clicks.dropped").increment(1);
            }
        }

        ClickOutcome::Redirect {
            url: append_utm(
                &click.target_url,
                &self.utm_source,
                click.campaign_id,
                click.asset_id,
                click.slot_id,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adserve_core::clock::test_support::FixedClock;
    use adserve_core::types::GlobalAdSettings;
    use adserve_store::MemoryStore;

    fn click(asset_id: Uuid) -> ClickRegistration {
        ClickRegistration {
            slot_id: Uuid::new_v4(),
            campaign_id: Uuid::new_v4(),
            asset_id,
            target_url: "https://example.com/landing".to_string(),
            page_url: Some("https://example.com/venues".to_string()),
            referrer: None,
            user_agent: Some("test-agent".to_string()),
        }
    }

    fn tracker(
        store: Arc<MemoryStore>,
        clock: Arc<FixedClock>,
        throttle_ms: u64,
    ) -> ClickTracker {
        store.set_settings(Some(GlobalAdSettings {
            enabled: true,
            click_throttle_ms: throttle_ms,
        }));
        let settings = Arc::new(SettingsCache::new(store.clone(), clock.clone(), 30_000));
        ClickTracker::new(store, settings, clock, "adserve".to_string())
    }

    #[tokio::test]
    async fn double_click_inside_window_suppressed() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::at(Utc::now()));
        let tracker = tracker(store.clone(), clock.clone(), 1_000);

        let registration = click(Uuid::new_v4());
        assert!(matches!(
            tracker.record(&registration).await,
            ClickOutcome::Redirect { .. }
        ));

        clock.advance(chrono::Duration::milliseconds(200));
        assert_eq!(tracker.record(&registration).await, ClickOutcome::Suppressed);

        assert_eq!(store.written_metrics().len(), 1);
        assert_eq!(store.written_metrics()[0].kind, MetricKind::Click);
    }

    #[tokio::test]
    async fn clicks_beyond_window_each_succeed() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::at(Utc::now()));
        let tracker = tracker(store.clone(), clock.clone(), 1_000);

        let registration = click(Uuid::new_v4());
        assert!(matches!(
            tracker.record(&registration).await,
            ClickOutcome::Redirect { .. }
        ));
        clock.advance(chrono::Duration::milliseconds(1_500));
        assert!(matches!(
            tracker.record(&registration).await,
            ClickOutcome::Redirect { .. }
        ));
        assert_eq!(store.written_metrics().len(), 2);
    }

    #[tokio::test]
    async fn different_creatives_throttle_independently() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::at(Utc::now()));
        let tracker = tracker(store.clone(), clock, 1_000);

        assert!(matches!(
            tracker.record(&click(Uuid::new_v4())).await,
            ClickOutcome::Redirect { .. }
        ));
        assert!(matches!(
            tracker.record(&click(Uuid::new_v4())).await,
            ClickOutcome::Redirect { .. }
        ));
        assert_eq!(store.written_metrics().len(), 2);
    }

    #[tokio::test]
    async fn stale_throttle_entries_are_pruned() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::at(Utc::now()));
        let tracker = tracker(store, clock.clone(), 1_000);

        for _ in 0..5 {
            tracker.record(&click(Uuid::new_v4())).await;
        }
        assert_eq!(tracker.last_click.len(), 5);

        clock.advance(chrono::Duration::milliseconds(2_000));
        tracker.record(&click(Uuid::new_v4())).await;
        // Only the fresh entry survives.
        assert_eq!(tracker.last_click.len(), 1);
    }

    #[tokio::test]
    async fn redirect_url_is_utm_tagged() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::at(Utc::now()));
        let tracker = tracker(store, clock, 1_000);

        let registration = click(Uuid::new_v4());
        match tracker.record(&registration).await {
            ClickOutcome::Redirect { url } => {
                assert!(url.contains("utm_source=adserve"));
                assert!(url.contains("utm_medium=banner"));
                assert!(url.contains(&format!("utm_campaign={}", registration.campaign_id)));
                assert!(url.contains(&format!("utm_content={}", registration.asset_id)));
                assert!(url.contains(&format!("utm_slot={}", registration.slot_id)));
            }
            ClickOutcome::Suppressed => panic!("first click must not be suppressed"),
        }
    }
}
