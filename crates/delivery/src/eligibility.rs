//! Eligibility filter: flattens a slot's campaign bindings into the
//! (campaign, asset) pairs that may be served right now.

use adserve_core::config::DeliveryConfig;
use adserve_core::types::{EligibleCreative, SlotBinding};
use chrono::NaiveDate;

/// Dimension-fit tolerances. An asset fits a slot when each dimension
/// differs by no more than the tolerance; an unset dimension on either side
/// always fits.
#[derive(Debug, Clone, Copy)]
pub struct EligibilityPolicy {
    pub width_tolerance_px: u32,
    pub height_tolerance_px: u32,
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self {
            width_tolerance_px: 100,
            height_tolerance_px: 200,
        }
    }
}

impl From<&DeliveryConfig> for EligibilityPolicy {
    fn from(config: &DeliveryConfig) -> Self {
        Self {
            width_tolerance_px: config.width_tolerance_px,
            height_tolerance_px: config.height_tolerance_px,
        }
    }
}

/// Produce every (campaign, asset) pair satisfying all of:
/// binding enabled, campaign active, `today` inside the inclusive date
/// window, and asset dimensions within tolerance of the slot dimensions.
///
/// Campaigns without assets contribute nothing. Unbounded window sides and
/// unset dimensions pass their respective checks.
pub fn eligible_creatives(
    bindings: &[SlotBinding],
    today: NaiveDate,
    slot_width: Option<u32>,
    slot_height: Option<u32>,
    policy: EligibilityPolicy,
) -> Vec<EligibleCreative> {
    let mut out = Vec::new();

    for binding in bindings {
        if !binding.is_enabled {
            continue;
        }
        let campaign = &binding.campaign;
        if !campaign.is_active {
            continue;
        }
        if !date_in_window(today, campaign.start_date, campaign.end_date) {
            continue;
        }

        for asset in &campaign.assets {
            if !dimension_fits(slot_width, asset.width, policy.width_tolerance_px) {
                continue;
            }
            if !dimension_fits(slot_height, asset.height, policy.height_tolerance_px) {
                continue;
            }
            out.push(EligibleCreative {
                asset_id: asset.id,
                campaign_id: campaign.id,
                file_url: asset.file_url.clone(),
                alt_text: asset.alt_text.clone(),
                width: asset.width,
                height: asset.height,
                target_url: campaign.target_url.clone(),
                weight: binding.weight,
                priority: binding.priority,
            });
        }
    }

    out
}

/// Inclusive on both bounds; comparison is by calendar day.
fn date_in_window(today: NaiveDate, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    if let Some(start) = start {
        if today < start {
            return false;
        }
    }
    if let Some(end) = end {
        if today > end {
            return false;
        }
    }
    true
}

fn dimension_fits(slot: Option<u32>, asset: Option<u32>, tolerance: u32) -> bool {
    match (slot, asset) {
        (Some(slot), Some(asset)) => slot.abs_diff(asset) <= tolerance,
        // Missing constraint on either side always satisfies.
        _ => true,
    }
}
