//! Impression and click tracking — session-deduped impression writes,
//! per-creative click throttling, and UTM augmentation of outbound URLs.
//! All metric writes are best-effort: failures are logged and dropped,
//! never surfaced to the page.

pub mod click;
pub mod impression;
pub mod utm;

pub use click::{ClickOutcome, ClickRegistration, ClickTracker};
pub use impression::{ImpressionBeacon, ImpressionTracker};
pub use utm::append_utm;
