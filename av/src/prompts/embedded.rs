//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Irrigation prediction prompt
pub const IRRIGATION: &str = include_str!("../../prompts/irrigation.pmt");

/// Crop yield estimation prompt
pub const YIELD_ESTIMATE: &str = include_str!("../../prompts/yield-estimate.pmt");

/// NDVI analysis and intervention prompt
pub const NDVI_INTERVENTION: &str = include_str!("../../prompts/ndvi-intervention.pmt");

/// Pest outbreak forecast prompt
pub const PEST_FORECAST: &str = include_str!("../../prompts/pest-forecast.pmt");

/// Dashboard summary prompt
pub const DASHBOARD_SUMMARY: &str = include_str!("../../prompts/dashboard-summary.pmt");

/// Avatar image prompt
pub const AVATAR: &str = include_str!("../../prompts/avatar.pmt");

/// Assistant question prompt
pub const CROP_QA: &str = include_str!("../../prompts/crop-qa.pmt");

/// Names of every embedded template
pub const NAMES: [&str; 7] = [
    "irrigation",
    "yield-estimate",
    "ndvi-intervention",
    "pest-forecast",
    "dashboard-summary",
    "avatar",
    "crop-qa",
];

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    let found = match name {
        "irrigation" => Some(IRRIGATION),
        "yield-estimate" => Some(YIELD_ESTIMATE),
        "ndvi-intervention" => Some(NDVI_INTERVENTION),
        "pest-forecast" => Some(PEST_FORECAST),
        "dashboard-summary" => Some(DASHBOARD_SUMMARY),
        "avatar" => Some(AVATAR),
        "crop-qa" => Some(CROP_QA),
        _ => None,
    };
    if found.is_none() {
        debug!("get_embedded: no match found");
    }
    found
}
