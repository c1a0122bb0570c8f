use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Fallback render dimensions when neither the request, the slot, nor the
/// asset specifies a size (standard medium rectangle).
pub const DEFAULT_PLACEHOLDER_WIDTH: u32 = 300;
pub const DEFAULT_PLACEHOLDER_HEIGHT: u32 = 250;

/// A named advertising placement location on a page.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Slot {
    pub id: Uuid,
    /// Stable placement code referenced by pages, e.g. `home_banner`.
    pub code: String,
    pub name: String,
    pub is_enabled: bool,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Platform-wide serving settings, a single keyed record in the backend.
///
/// A missing record or a failed read resolves to the default. The `enabled`
/// flag is honored fail-open: a `false` reading is logged but does not
/// suppress serving (see `DeliveryEngine`).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GlobalAdSettings {
    pub enabled: bool,
    /// Minimum interval between recorded clicks on the same creative.
    pub click_throttle_ms: u64,
}

impl Default for GlobalAdSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            click_throttle_ms: 1_000,
        }
    }
}

/// A campaign bound to a slot, with its selection weight and priority tier.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SlotBinding {
    pub id: Uuid,
    pub slot_id: Uuid,
    /// Relative probability mass within the winning priority tier.
    pub weight: u32,
    /// Higher tiers strictly dominate lower ones.
    pub priority: i32,
    pub is_enabled: bool,
    pub campaign: Campaign,
}

/// An advertiser's bounded-time initiative owning one or more creatives.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Campaign {
    pub id: Uuid,
    pub name: String,
    pub is_active: bool,
    /// Inclusive window bounds, date-only. `None` means unbounded.
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub target_url: String,
    pub assets: Vec<Asset>,
}

/// An individual creative (image unit) belonging to a campaign.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Asset {
    pub id: Uuid,
    pub file_url: String,
    pub alt_text: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// A (campaign, asset) pair that passed all placement-time filters.
/// Derived fresh on every placement resolution, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibleCreative {
    pub asset_id: Uuid,
    pub campaign_id: Uuid,
    pub file_url: String,
    pub alt_text: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub target_url: String,
    pub weight: u32,
    pub priority: i32,
}

/// Append-only impression/click row written through the backend store.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MetricEvent {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub asset_id: Uuid,
    pub slot_id: Option<Uuid>,
    pub kind: MetricKind,
    pub page_url: Option<String>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Impression,
    Click,
}

/// A page's request for one slot instance.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlacementRequest {
    pub slot_code: String,
    /// Requested render width; overrides the slot's configured width.
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// When nothing is eligible: render nothing instead of a placeholder.
    #[serde(default)]
    pub hide_if_empty: bool,
}

/// What a slot instance should render. Exactly one creative, a placeholder
/// box, or nothing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlacementDecision {
    Creative(ServedCreative),
    Placeholder { width: u32, height: u32 },
    Hidden,
}

/// The creative chosen for a slot instance, with resolved render dimensions.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServedCreative {
    pub slot_id: Uuid,
    pub slot_code: String,
    pub campaign_id: Uuid,
    pub asset_id: Uuid,
    pub file_url: String,
    pub alt_text: Option<String>,
    pub target_url: String,
    pub width: u32,
    pub height: u32,
}
