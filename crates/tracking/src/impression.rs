//! Impression tracking: at most one impression row per (session, creative).
//!
//! The dedup state is an explicit in-memory seen-set keyed by
//! (session id, asset id) with an injected clock, scoped to this tracker's
//! lifetime. Entries past the session TTL are pruned opportunistically on
//! insert, so a long-running instance does not accumulate dead sessions.

use std::sync::Arc;

use adserve_core::types::{MetricEvent, MetricKind};
use adserve_core::Clock;
use adserve_store::AdStore;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Deserialize;
use tracing::{debug, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// A creative must be at least half visible before a beacon counts.
pub const VISIBILITY_THRESHOLD: f64 = 0.5;

/// Visibility report sent by the page once a creative has been observed
/// sufficiently on-screen.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ImpressionBeacon {
    /// Opaque per-tab session identifier minted by the page.
    pub session_id: String,
    pub campaign_id: Uuid,
    pub asset_id: Uuid,
    pub slot_id: Option<Uuid>,
    /// Fraction of the creative that was visible, 0.0..=1.0.
    pub visible_ratio: f64,
    pub page_url: Option<String>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
}

pub struct ImpressionTracker {
    store: Arc<dyn AdStore>,
    clock: Arc<dyn Clock>,
    seen: DashMap<(String, Uuid), DateTime<Utc>>,
    session_ttl: Duration,
}

impl ImpressionTracker {
    pub fn new(store: Arc<dyn AdStore>, clock: Arc<dyn Clock>, session_ttl_secs: u64) -> Self {
        Self {
            store,
            clock,
            seen: DashMap::new(),
            session_ttl: Duration::seconds(session_ttl_secs as i64),
        }
    }

    /// Record an impression unless this (session, creative) has already been
    /// counted. Returns whether a metric row was written.
    ///
    /// The sighting is marked seen even when the backend write fails:
    /// metrics are best-effort and a retry on the next beacon would
    /// double-count against a backend that did persist the row.
    pub async fn record(&self, beacon: &ImpressionBeacon) -> bool {
        if beacon.visible_ratio < VISIBILITY_THRESHOLD {
            debug!(
                asset_id = %beacon.asset_id,
                visible_ratio = beacon.visible_ratio,
                "beacon below visibility threshold, ignored"
            );
            return false;
        }

        let now = self.clock.now();
        self.prune(now);

        let key = (beacon.session_id.clone(), beacon.asset_id);
        let mut first_sighting = false;
        self.seen.entry(key).or_insert_with(|| {
            first_sighting = true;
            now
        });

        if !first_sighting {
            metrics::counter!("impressions.deduped").increment(1);
            return false;
        }

        let event = MetricEvent {
            id: Uuid::new_v4(),
            campaign_id: beacon.campaign_id,
            asset_id: beacon.asset_id,
            slot_id: beacon.slot_id,
            kind: MetricKind::Impression,
            page_url: beacon.page_url.clone(),
            referrer: beacon.referrer.clone(),
            user_agent: beacon.user_agent.clone(),
            timestamp: now,
        };

        match self.store.write_metric(&event).await {
            Ok(()) => {
                metrics::counter!("impressions.recorded").increment(1);
            }
            Err(e) => {
                warn!(asset_id = %beacon.asset_id, error = %e, "impression write failed, dropped");
                metrics::counter!("impressions.dropped").increment(1);
            }
        }
        true
    }

    fn prune(&self, now: DateTime<Utc>) {
        self.seen
            .retain(|_, first_seen| now - *first_seen < self.session_ttl);
    }
}
