//! OpenAPI specification and Swagger UI configuration.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "adserve API",
        version = "0.1.0",
        description = "Ad slot delivery: eligibility-filtered, priority-tiered weighted creative selection with session-deduped impression tracking and throttled, UTM-tagged click-through.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Placements", description = "Slot placement resolution and rendering"),
        (name = "Tracking", description = "Impression beacons and click-through"),
        (name = "Operations", description = "Health, readiness, and liveness probes"),
    ),
    paths(
        crate::rest::handle_placement,
        crate::rest::handle_placement_render,
        crate::rest::handle_impression,
        crate::rest::handle_click,
        crate::rest::handle_click_go,
        crate::rest::health_check,
        crate::rest::readiness,
        crate::rest::liveness,
    ),
    components(schemas(
        adserve_core::types::PlacementDecision,
        adserve_core::types::ServedCreative,
        adserve_core::types::MetricKind,
        adserve_tracking::ImpressionBeacon,
        adserve_tracking::ClickRegistration,
        crate::rest::ImpressionResponse,
        crate::rest::ClickResponse,
        crate::rest::HealthResponse,
        crate::rest::ErrorResponse,
    ))
)]
pub struct ApiDoc;
