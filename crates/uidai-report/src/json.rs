//! JSON rendering of [`DashboardViews`].

use uidai_core::error::Result;
use uidai_data::analysis::DashboardViews;

/// Pretty-printed JSON document of every view.
pub fn render_json(views: &DashboardViews) -> Result<String> {
    Ok(serde_json::to_string_pretty(views)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_views;
    use uidai_core::models::Filter;

    #[test]
    fn test_render_json_round_trips_as_value() {
        let json = render_json(&sample_views(Filter::all_india())).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["headline"]["enrolment_total"], 30);
        assert_eq!(value["state_options"][0], "All India");
        assert_eq!(value["recommendations"]["security"]["kind"], "no_anomalies");
        assert_eq!(value["health"][0]["pressure_index"], 0.48);
        assert!(value["metadata"]["filter"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_render_json_includes_pincode_result() {
        let views = sample_views(Filter::from_selection("Maharashtra").with_pincode(Some(999999)));
        let value: serde_json::Value = serde_json::from_str(&render_json(&views).unwrap()).unwrap();
        assert_eq!(value["pincode"]["status"], "no_data");
        assert_eq!(value["metadata"]["filter"]["state"], "Maharashtra");
    }
}
