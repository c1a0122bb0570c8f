//! HTML fragment rendering for placements: an anchor-wrapped image for a
//! served creative, a dashed box for the placeholder state, nothing when
//! hidden. Pages that cannot run the JSON client embed these directly.

use adserve_core::types::{PlacementDecision, ServedCreative};
use url::form_urlencoded;

/// Render a placement decision as an embeddable HTML fragment.
///
/// The anchor href routes through the click-redirect endpoint so throttling
/// and UTM tagging always apply; the native link action on the target URL is
/// never exposed.
pub fn render_placement(decision: &PlacementDecision) -> String {
    match decision {
        PlacementDecision::Creative(served) => render_creative(served),
        PlacementDecision::Placeholder { width, height } => format!(
            "<div style=\"width:{width}px;height:{height}px;border:2px dashed #cbd5e1;\
display:flex;align-items:center;justify-content:center;\
color:#94a3b8;font:12px sans-serif;\">Ad space</div>"
        ),
        PlacementDecision::Hidden => String::new(),
    }
}

fn render_creative(served: &ServedCreative) -> String {
    let query: String = form_urlencoded::Serializer::new(String::new())
        .append_pair("slot_id", &served.slot_id.to_string())
        .append_pair("campaign_id", &served.campaign_id.to_string())
        .append_pair("asset_id", &served.asset_id.to_string())
        .append_pair("to", &served.target_url)
        .finish();

    let alt = escape(served.alt_text.as_deref().unwrap_or("Advertisement"));
    let src = escape(&served.file_url);
    let (width, height) = (served.width, served.height);

    format!(
        "<a href=\"/v1/clicks/go?{query}\" target=\"_blank\" rel=\"noopener sponsored\">\
<img src=\"{src}\" alt=\"{alt}\" width=\"{width}\" height=\"{height}\" \
style=\"display:block;width:{width}px;height:{height}px;object-fit:cover;\"></a>"
    )
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
