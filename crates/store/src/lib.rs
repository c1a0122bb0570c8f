//! Backend store seam. The platform backend owns all persistence (slots,
//! campaigns, settings, metric rows); this crate defines the async trait the
//! delivery and tracking layers consume, plus the available backends.

pub mod memory;
pub mod rest;
pub mod settings;

pub use memory::MemoryStore;
pub use rest::RestStore;
pub use settings::SettingsCache;

use adserve_core::types::{GlobalAdSettings, MetricEvent, Slot, SlotBinding};
use adserve_core::AdResult;
use async_trait::async_trait;
use uuid::Uuid;

/// Read/write surface of the external backend.
///
/// All calls are best-effort from the caller's point of view: the delivery
/// engine degrades read failures to the empty placement state and trackers
/// drop failed metric writes after logging.
#[async_trait]
pub trait AdStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    /// Look up a slot by its placement code.
    async fn slot_by_code(&self, code: &str) -> AdResult<Option<Slot>>;

    /// The single global settings record, if present.
    async fn global_settings(&self) -> AdResult<Option<GlobalAdSettings>>;

    /// All campaign bindings for a slot, campaigns and assets embedded.
    async fn bindings_for_slot(&self, slot_id: Uuid) -> AdResult<Vec<SlotBinding>>;

    /// Append one impression/click row. Write-once; no update or delete.
    async fn write_metric(&self, event: &MetricEvent) -> AdResult<()>;
}
