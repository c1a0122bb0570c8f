//! Placement delivery — decides which creative (if any) a slot instance
//! shows: eligibility filtering, priority-tiered weighted selection, and the
//! resolution engine tying them to the backend store.

pub mod eligibility;
pub mod engine;
pub mod selection;

pub use eligibility::{eligible_creatives, EligibilityPolicy};
pub use engine::DeliveryEngine;
pub use selection::select_weighted;
