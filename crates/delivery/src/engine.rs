//! Placement resolution engine. Fetches slot configuration, global settings,
//! and campaign bindings from the backend, filters and selects, and degrades
//! every failure to the empty placement state — a broken ad pipeline must
//! never break the hosting page.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use adserve_core::types::{
    PlacementDecision, PlacementRequest, ServedCreative, Slot, DEFAULT_PLACEHOLDER_HEIGHT,
    DEFAULT_PLACEHOLDER_WIDTH,
};
use adserve_core::{AdResult, AdServeError, Clock};
use adserve_store::{AdStore, SettingsCache};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::eligibility::{eligible_creatives, EligibilityPolicy};
use crate::selection::select_weighted;

pub struct DeliveryEngine {
    store: Arc<dyn AdStore>,
    settings: Arc<SettingsCache>,
    clock: Arc<dyn Clock>,
    policy: EligibilityPolicy,
    fetch_timeout: Duration,
}

impl DeliveryEngine {
    pub fn new(
        store: Arc<dyn AdStore>,
        settings: Arc<SettingsCache>,
        clock: Arc<dyn Clock>,
        policy: EligibilityPolicy,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            store,
            settings,
            clock,
            policy,
            fetch_timeout,
        }
    }

    /// Resolve a placement with a fresh entropy-seeded RNG.
    pub async fn resolve(&self, request: &PlacementRequest) -> PlacementDecision {
        let mut rng = StdRng::from_entropy();
        self.resolve_with_rng(request, &mut rng).await
    }

    /// Resolve a placement with an injected RNG (reproducible selection).
    pub async fn resolve_with_rng<R: Rng>(
        &self,
        request: &PlacementRequest,
        rng: &mut R,
    ) -> PlacementDecision {
        metrics::counter!("placement.requests").increment(1);
        match self.try_resolve(request, rng).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!(slot_code = %request.slot_code, error = %e, "placement resolution failed, serving empty");
                metrics::counter!("placement.errors").increment(1);
                self.empty_decision(request, None)
            }
        }
    }

    async fn try_resolve<R: Rng>(
        &self,
        request: &PlacementRequest,
        rng: &mut R,
    ) -> AdResult<PlacementDecision> {
        let slot = self
            .with_timeout("slot_by_code", self.store.slot_by_code(&request.slot_code))
            .await?;

        let slot = match slot {
            Some(slot) if slot.is_enabled => slot,
            Some(_) => {
                debug!(slot_code = %request.slot_code, "slot disabled");
                return Ok(self.empty_decision(request, None));
            }
            None => {
                debug!(slot_code = %request.slot_code, "slot not found");
                return Ok(self.empty_decision(request, None));
            }
        };

        // Kill switch is honored fail-open: a disabled reading is logged on
        // every placement but does not suppress serving.
        let settings = self.settings.get().await;
        if !settings.enabled {
            warn!(slot_code = %request.slot_code, "ad serving flagged disabled; continuing fail-open");
        }

        let bindings = self
            .with_timeout("bindings_for_slot", self.store.bindings_for_slot(slot.id))
            .await?;

        // Slot dims are the fit constraint; a slot without configured dims
        // falls back to the requested render dims.
        let candidates = eligible_creatives(
            &bindings,
            self.clock.today(),
            slot.width.or(request.width),
            slot.height.or(request.height),
            self.policy,
        );

        let Some(picked) = select_weighted(&candidates, rng) else {
            metrics::counter!("placement.empty").increment(1);
            debug!(slot_code = %request.slot_code, bindings = bindings.len(), "no eligible creative");
            return Ok(self.empty_decision(request, Some(&slot)));
        };

        metrics::counter!("placement.served").increment(1);
        info!(
            slot_code = %request.slot_code,
            campaign_id = %picked.campaign_id,
            asset_id = %picked.asset_id,
            candidates = candidates.len(),
            "creative selected"
        );

        Ok(PlacementDecision::Creative(ServedCreative {
            slot_id: slot.id,
            slot_code: slot.code.clone(),
            campaign_id: picked.campaign_id,
            asset_id: picked.asset_id,
            file_url: picked.file_url.clone(),
            alt_text: picked.alt_text.clone(),
            target_url: picked.target_url.clone(),
            width: request
                .width
                .or(slot.width)
                .or(picked.width)
                .unwrap_or(DEFAULT_PLACEHOLDER_WIDTH),
            height: request
                .height
                .or(slot.height)
                .or(picked.height)
                .unwrap_or(DEFAULT_PLACEHOLDER_HEIGHT),
        }))
    }

    fn empty_decision(&self, request: &PlacementRequest, slot: Option<&Slot>) -> PlacementDecision {
        if request.hide_if_empty {
            return PlacementDecision::Hidden;
        }
        PlacementDecision::Placeholder {
            width: request
                .width
                .or(slot.and_then(|s| s.width))
                .unwrap_or(DEFAULT_PLACEHOLDER_WIDTH),
            height: request
                .height
                .or(slot.and_then(|s| s.height))
                .unwrap_or(DEFAULT_PLACEHOLDER_HEIGHT),
        }
    }

    async fn with_timeout<T>(
        &self,
        what: &'static str,
        fut: impl Future<Output = AdResult<T>>,
    ) -> AdResult<T> {
        match tokio::time::timeout(self.fetch_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                metrics::counter!("store.timeouts").increment(1);
                Err(AdServeError::Timeout(what.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adserve_core::clock::test_support::FixedClock;
    use adserve_core::types::{Asset, Campaign, GlobalAdSettings, SlotBinding};
    use adserve_store::MemoryStore;
    use chrono::Utc;
    use uuid::Uuid;

    fn engine_over(store: Arc<MemoryStore>) -> DeliveryEngine {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::at(Utc::now()));
        let settings = Arc::new(SettingsCache::new(store.clone(), clock.clone(), 30_000));
        DeliveryEngine::new(
            store,
            settings,
            clock,
            EligibilityPolicy::default(),
            Duration::from_secs(3),
        )
    }

    fn request(code: &str, hide_if_empty: bool) -> PlacementRequest {
        PlacementRequest {
            slot_code: code.to_string(),
            width: None,
            height: None,
            hide_if_empty,
        }
    }

    #[tokio::test]
    async fn missing_slot_hides_or_renders_placeholder() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine_over(store);

        let decision = engine.resolve(&request("nope", true)).await;
        assert!(matches!(decision, PlacementDecision::Hidden));

        let decision = engine.resolve(&request("nope", false)).await;
        assert!(matches!(
            decision,
            PlacementDecision::Placeholder {
                width: DEFAULT_PLACEHOLDER_WIDTH,
                height: DEFAULT_PLACEHOLDER_HEIGHT,
            }
        ));
    }

    #[tokio::test]
    async fn disabled_slot_serves_nothing() {
        let store = Arc::new(MemoryStore::new());
        store.insert_slot(Slot {
            id: Uuid::new_v4(),
            code: "off".to_string(),
            name: "disabled".to_string(),
            is_enabled: false,
            width: Some(728),
            height: Some(90),
        });
        let engine = engine_over(store);

        let decision = engine.resolve(&request("off", true)).await;
        assert!(matches!(decision, PlacementDecision::Hidden));
    }

    #[tokio::test]
    async fn placeholder_takes_requested_dims_over_defaults() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine_over(store);

        let decision = engine
            .resolve(&PlacementRequest {
                slot_code: "nope".to_string(),
                width: Some(160),
                height: Some(600),
                hide_if_empty: false,
            })
            .await;
        assert!(matches!(
            decision,
            PlacementDecision::Placeholder {
                width: 160,
                height: 600
            }
        ));
    }

    #[tokio::test]
    async fn disabled_kill_switch_still_serves() {
        let store = Arc::new(MemoryStore::new());
        store.seed_demo();
        store.set_settings(Some(GlobalAdSettings {
            enabled: false,
            click_throttle_ms: 1_000,
        }));
        let engine = engine_over(store);

        let decision = engine.resolve(&request("home_banner", true)).await;
        assert!(matches!(decision, PlacementDecision::Creative(_)));
    }

    #[tokio::test]
    async fn served_creative_carries_slot_and_campaign_identity() {
        let store = Arc::new(MemoryStore::new());
        let slot_id = Uuid::new_v4();
        let campaign_id = Uuid::new_v4();
        let asset_id = Uuid::new_v4();
        store.insert_slot(Slot {
            id: slot_id,
            code: "side".to_string(),
            name: "sidebar".to_string(),
            is_enabled: true,
            width: Some(300),
            height: Some(250),
        });
        store.insert_bindings(
            slot_id,
            vec![SlotBinding {
                id: Uuid::new_v4(),
                slot_id,
                weight: 1,
                priority: 1,
                is_enabled: true,
                campaign: Campaign {
                    id: campaign_id,
                    name: "only".to_string(),
                    is_active: true,
                    start_date: None,
                    end_date: None,
                    target_url: "https://example.com/landing".to_string(),
                    assets: vec![Asset {
                        id: asset_id,
                        file_url: "https://cdn.example.com/side.png".to_string(),
                        alt_text: Some("Sidebar".to_string()),
                        width: Some(300),
                        height: Some(250),
                    }],
                },
            }],
        );
        let engine = engine_over(store);

        match engine.resolve(&request("side", true)).await {
            PlacementDecision::Creative(served) => {
                assert_eq!(served.slot_id, slot_id);
                assert_eq!(served.campaign_id, campaign_id);
                assert_eq!(served.asset_id, asset_id);
                assert_eq!((served.width, served.height), (300, 250));
            }
            other => panic!("expected creative, got {other:?}"),
        }
    }
}
