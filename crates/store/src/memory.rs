//! In-memory backend for development and tests.

use crate::AdStore;
use adserve_core::types::{
    Asset, Campaign, GlobalAdSettings, MetricEvent, Slot, SlotBinding,
};
use adserve_core::AdResult;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use std::sync::Mutex;
use tracing::info;
use uuid::Uuid;

/// Dashmap-backed store. Written metrics are retained so tests can assert
/// exactly what was recorded.
#[derive(Default)]
pub struct MemoryStore {
    slots: DashMap<String, Slot>,
    bindings: DashMap<Uuid, Vec<SlotBinding>>,
    settings: Mutex<Option<GlobalAdSettings>>,
    metrics: Mutex<Vec<MetricEvent>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_slot(&self, slot: Slot) {
        self.slots.insert(slot.code.clone(), slot);
    }

    pub fn insert_bindings(&self, slot_id: Uuid, bindings: Vec<SlotBinding>) {
        self.bindings.insert(slot_id, bindings);
    }

    pub fn set_settings(&self, settings: Option<GlobalAdSettings>) {
        *self.settings.lock().unwrap() = settings;
    }

    /// Snapshot of every metric row written so far.
    pub fn written_metrics(&self) -> Vec<MetricEvent> {
        self.metrics.lock().unwrap().clone()
    }

    /// Seed one banner slot bound to two currently-running campaigns, so the
    /// server has something to serve out of the box.
    pub fn seed_demo(&self) {
        let today = Utc::now().date_naive();
        let slot_id = Uuid::new_v4();
        let slot = Slot {
            id: slot_id,
            code: "home_banner".to_string(),
            name: "Homepage banner".to_string(),
            is_enabled: true,
            width: Some(728),
            height: Some(90),
        };

        let mut bindings = Vec::new();
        for (name, weight, priority, file) in [
            ("Summer Tour Promo", 3, 1, "https://cdn.example.com/summer-728x90.png"),
            ("Venue Spotlight", 1, 1, "https://cdn.example.com/venue-728x90.png"),
        ] {
            let campaign_id = Uuid::new_v4();
            bindings.push(SlotBinding {
                id: Uuid::new_v4(),
                slot_id,
                weight,
                priority,
                is_enabled: true,
                campaign: Campaign {
                    id: campaign_id,
                    name: name.to_string(),
                    is_active: true,
                    start_date: Some(today - Duration::days(7)),
                    end_date: Some(today + Duration::days(30)),
                    target_url: "https://example.com/promo".to_string(),
                    assets: vec![Asset {
                        id: Uuid::new_v4(),
                        file_url: file.to_string(),
                        alt_text: Some(name.to_string()),
                        width: Some(728),
                        height: Some(90),
                    }],
                },
            });
        }

        self.insert_slot(slot);
        self.insert_bindings(slot_id, bindings);
        self.set_settings(Some(GlobalAdSettings::default()));
        info!(slot_code = "home_banner", "seeded demo slot");
    }
}

#[async_trait]
impl AdStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn slot_by_code(&self, code: &str) -> AdResult<Option<Slot>> {
        Ok(self.slots.get(code).map(|entry| entry.clone()))
    }

    async fn global_settings(&self) -> AdResult<Option<GlobalAdSettings>> {
        Ok(self.settings.lock().unwrap().clone())
    }

    async fn bindings_for_slot(&self, slot_id: Uuid) -> AdResult<Vec<SlotBinding>> {
        Ok(self
            .bindings
            .get(&slot_id)
            .map(|entry| entry.clone())
            .unwrap_or_default())
    }

    async fn write_metric(&self, event: &MetricEvent) -> AdResult<()> {
        self.metrics.lock().unwrap().push(event.clone());
        Ok(())
    }
}
