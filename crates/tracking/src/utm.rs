//! Attribution query parameters appended to outbound click URLs.

use tracing::warn;
use url::Url;
use uuid::Uuid;

/// Append the standard UTM set to a campaign's target URL. Existing query
/// parameters are preserved. An unparseable target is returned unchanged —
/// navigation still has to happen.
pub fn append_utm(
    target: &str,
    source: &str,
    campaign_id: Uuid,
    asset_id: Uuid,
    slot_id: Uuid,
) -> String {
    let mut url = match Url::parse(target) {
        Ok(url) => url,
        Err(e) => {
            warn!(target, error = %e, "target url unparseable, passing through untagged");
            return target.to_string();
        }
    };

    url.query_pairs_mut()
        .append_pair("utm_source", source)
        .append_pair("utm_medium", "banner")
        .append_pair("utm_campaign", &campaign_id.to_string())
        .append_pair("utm_content", &asset_id.to_string())
        .append_pair("utm_slot", &slot_id.to_string());

    url.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_five_parameters_present() {
        let campaign = Uuid::new_v4();
        let asset = Uuid::new_v4();
        let slot = Uuid::new_v4();

        let tagged = append_utm("https://example.com/landing", "adserve", campaign, asset, slot);
        let url = Url::parse(&tagged).unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert!(pairs.contains(&("utm_source".into(), "adserve".into())));
        assert!(pairs.contains(&("utm_medium".into(), "banner".into())));
        assert!(pairs.contains(&("utm_campaign".into(), campaign.to_string())));
        assert!(pairs.contains(&("utm_content".into(), asset.to_string())));
        assert!(pairs.contains(&("utm_slot".into(), slot.to_string())));
    }

    #[test]
    fn existing_query_parameters_survive() {
        let tagged = append_utm(
            "https://example.com/landing?ref=newsletter&x=1",
            "adserve",
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
        );
        let url = Url::parse(&tagged).unwrap();
        let mut pairs = url.query_pairs();
        assert!(pairs.any(|(k, v)| k == "ref" && v == "newsletter"));
        let mut pairs = url.query_pairs();
        assert!(pairs.any(|(k, _)| k == "utm_source"));
    }

    #[test]
    fn garbage_target_passes_through() {
        let out = append_utm(
            "not a url",
            "adserve",
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
        );
        assert_eq!(out, "not a url");
    }
}
