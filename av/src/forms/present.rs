//! Text rendering and failure wording per capability

use std::fmt::Write;

use crate::flows::{
    AnalyzeNdvi, AskCropQuestion, Capability, EstimateYield, ForecastPests, GenerateAvatar, PredictIrrigation,
    SummarizeDashboard,
};
use crate::schema::{
    AvatarOutput, CropAnswer, DashboardSummary, IrrigationOutput, NdviOutput, PestOutput, YieldOutput,
};

/// A capability that can be shown to an operator
pub trait Presentable: Capability {
    /// Shown for any failure, whatever the cause
    const FAILURE: &'static str;

    fn render(output: &Self::Output) -> String;
}

impl Presentable for PredictIrrigation {
    const FAILURE: &'static str = "An error occurred while making a prediction. Please try again.";

    fn render(output: &IrrigationOutput) -> String {
        let verdict = if output.irrigation_needed {
            "Irrigation Recommended"
        } else {
            "No Immediate Irrigation Needed"
        };
        format!(
            "AI Recommendation\n{}\n\nRecommendation Details\n{}\n\nConfidence Level: {}",
            verdict,
            output.recommendation,
            percent(output.confidence_level)
        )
    }
}

impl Presentable for EstimateYield {
    const FAILURE: &'static str = "An error occurred during estimation. Please try again.";

    fn render(output: &YieldOutput) -> String {
        format!(
            "AI Yield Advisory\nEstimated Yield: {}\n\nProductivity Recommendations\n{}",
            output.estimated_yield, output.recommendations
        )
    }
}

impl Presentable for AnalyzeNdvi {
    const FAILURE: &'static str = "An error occurred during analysis. Please try again.";

    fn render(output: &NdviOutput) -> String {
        let mut text = format!(
            "AI Analysis Result\n\nAnalysis Summary\n{}\n\nSuggested Interventions",
            output.analysis_summary
        );
        for intervention in &output.suggested_interventions {
            let _ = write!(text, "\n  • {}", intervention);
        }
        text
    }
}

impl Presentable for ForecastPests {
    const FAILURE: &'static str = "An error occurred during forecasting. Please try again.";

    fn render(output: &PestOutput) -> String {
        let mut text = String::from("AI Forecast\n");
        if output.alert {
            text.push_str(
                "High Risk Alert!\nConditions are favorable for a pest outbreak. Please review recommendations.\n",
            );
        }
        let _ = write!(
            text,
            "\nRisk Assessment\n{}\n\nRecommended Actions\n{}",
            output.risk_assessment, output.recommended_actions
        );
        text
    }
}

impl Presentable for SummarizeDashboard {
    const FAILURE: &'static str = "Unable to load the farm summary. Please try again.";

    fn render(output: &DashboardSummary) -> String {
        let mut text = format!(
            "Crop Health: {}% ({})\nSoil Moisture: {}% ({})\nPest Risk: {} ({})\nYield Forecast: {} ({})",
            output.crop_health,
            output.crop_health_trend,
            output.soil_moisture,
            output.soil_moisture_range,
            output.pest_risk,
            output.pest_risk_details,
            output.yield_forecast,
            output.yield_forecast_details,
        );
        if !output.alerts.is_empty() {
            text.push_str("\n\nRecent Alerts");
            for alert in &output.alerts {
                let _ = write!(
                    text,
                    "\n  [{}] {}: {} ({})",
                    alert.severity, alert.area, alert.issue, alert.time
                );
            }
        }
        text
    }
}

impl Presentable for GenerateAvatar {
    const FAILURE: &'static str = "Failed to generate avatar. Please try again.";

    fn render(output: &AvatarOutput) -> String {
        let uri = &output.avatar_data_uri;
        let mime = uri
            .strip_prefix("data:")
            .and_then(|rest| rest.split(';').next())
            .unwrap_or("image");
        format!("Generated avatar ({}, {} bytes encoded)", mime, uri.len())
    }
}

impl Presentable for AskCropQuestion {
    const FAILURE: &'static str = "I'm sorry, I couldn't process that request. Please try again.";

    fn render(output: &CropAnswer) -> String {
        output.answer.clone()
    }
}

/// Whole-number percentage of a 0-1 value
pub(crate) fn percent(fraction: f64) -> String {
    format!("{:.0}%", fraction * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Alert, Severity};

    #[test]
    fn test_irrigation_render() {
        let text = PredictIrrigation::render(&IrrigationOutput {
            irrigation_needed: true,
            recommendation: "Apply 25mm every 3 days".to_string(),
            confidence_level: 0.8,
        });
        assert!(text.contains("Irrigation Recommended"));
        assert!(text.contains("80%"));

        let text = PredictIrrigation::render(&IrrigationOutput {
            irrigation_needed: false,
            recommendation: "Wait for rain".to_string(),
            confidence_level: 0.556,
        });
        assert!(text.contains("No Immediate Irrigation Needed"));
        assert!(text.contains("56%"));
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0.0), "0%");
        assert_eq!(percent(1.0), "100%");
        assert_eq!(percent(0.8), "80%");
    }

    #[test]
    fn test_pest_banner_only_on_alert() {
        let mut output = PestOutput {
            risk_assessment: "Moderate aphid pressure".to_string(),
            recommended_actions: "Scout twice weekly".to_string(),
            alert: false,
        };
        assert!(!ForecastPests::render(&output).contains("High Risk Alert!"));

        output.alert = true;
        assert!(ForecastPests::render(&output).contains("High Risk Alert!"));
    }

    #[test]
    fn test_ndvi_bullets() {
        let text = AnalyzeNdvi::render(&NdviOutput {
            analysis_summary: "Stress in the north-east corner".to_string(),
            suggested_interventions: vec!["Increase irrigation".to_string(), "Test soil nitrogen".to_string()],
        });
        assert!(text.contains("  • Increase irrigation"));
        assert!(text.contains("  • Test soil nitrogen"));
    }

    #[test]
    fn test_dashboard_render_verbatim() {
        let text = SummarizeDashboard::render(&DashboardSummary {
            crop_health: 82.0,
            crop_health_trend: "+2% from last week".to_string(),
            soil_moisture: 45.5,
            soil_moisture_range: "Optimal: 40-60%".to_string(),
            pest_risk: "Low".to_string(),
            pest_risk_details: "Minimal activity".to_string(),
            yield_forecast: "+5%".to_string(),
            yield_forecast_details: "vs. last season".to_string(),
            alerts: vec![Alert {
                id: 1,
                area: "Ludhiana".to_string(),
                issue: "Yellow rust reported in wheat".to_string(),
                severity: Severity::High,
                time: "2 hours ago".to_string(),
            }],
        });
        assert!(text.contains("Crop Health: 82%"));
        assert!(text.contains("Soil Moisture: 45.5%"));
        assert!(text.contains("Pest Risk: Low"));
        assert!(text.contains("[High] Ludhiana: Yellow rust reported in wheat (2 hours ago)"));
    }

    #[test]
    fn test_avatar_render_names_mime() {
        let text = GenerateAvatar::render(&AvatarOutput {
            avatar_data_uri: "data:image/png;base64,cG5n".to_string(),
        });
        assert!(text.contains("image/png"));
    }
}
