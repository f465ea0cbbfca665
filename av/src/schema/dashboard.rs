//! Dashboard summary records

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{Contract, Language, OutputContract, ValidationError, Validator};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardInput {
    /// A state in India
    pub location: String,
    pub language: Language,
}

impl Default for DashboardInput {
    fn default() -> Self {
        Self {
            location: "Punjab, India".to_string(),
            language: Language::En,
        }
    }
}

impl Contract for DashboardInput {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new().min_chars("location", &self.location, 3).finish()
    }
}

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A state-wide agricultural alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: i64,

    /// District or region within the state
    pub area: String,
    pub issue: String,
    pub severity: Severity,

    /// How long ago, e.g. "1 day ago"
    pub time: String,
}

impl Contract for Alert {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .required("area", &self.area)
            .required("issue", &self.issue)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    /// 0-100
    pub crop_health: f64,

    /// Change from last week
    pub crop_health_trend: String,

    /// 0-100
    pub soil_moisture: f64,
    pub soil_moisture_range: String,

    /// Low, Medium, High (possibly translated)
    pub pest_risk: String,
    pub pest_risk_details: String,

    /// Against the previous season, e.g. "+5%"
    pub yield_forecast: String,
    pub yield_forecast_details: String,

    pub alerts: Vec<Alert>,
}

impl Contract for DashboardSummary {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut v = Validator::new()
            .range("cropHealth", self.crop_health, 0.0, 100.0)
            .range("soilMoisture", self.soil_moisture, 0.0, 100.0)
            .required("pestRisk", &self.pest_risk);
        for (i, alert) in self.alerts.iter().enumerate() {
            v = v.nested(&format!("alerts[{}].", i), alert.validate());
        }
        v.finish()
    }
}

impl OutputContract for DashboardSummary {
    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "cropHealth": {
                    "type": "number",
                    "minimum": 0,
                    "maximum": 100,
                    "description": "The overall crop health as a percentage (0-100)."
                },
                "cropHealthTrend": {
                    "type": "string",
                    "description": "The percentage change in crop health from the last week."
                },
                "soilMoisture": {
                    "type": "number",
                    "minimum": 0,
                    "maximum": 100,
                    "description": "The average soil moisture as a percentage."
                },
                "soilMoistureRange": {
                    "type": "string",
                    "description": "The optimal range for soil moisture."
                },
                "pestRisk": {
                    "type": "string",
                    "description": "The current pest risk level (e.g., Low, Medium, High)."
                },
                "pestRiskDetails": {
                    "type": "string",
                    "description": "Brief details about pest risks."
                },
                "yieldForecast": {
                    "type": "string",
                    "description": "The yield forecast compared to the previous season (e.g., +5%)."
                },
                "yieldForecastDetails": {
                    "type": "string",
                    "description": "Brief details about the yield forecast."
                },
                "alerts": {
                    "type": "array",
                    "description": "A list of critical, state-wide agricultural alerts based on recent news and events for the specified state.",
                    "items": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer" },
                            "area": {
                                "type": "string",
                                "description": "The district or region within the state with the alert."
                            },
                            "issue": {
                                "type": "string",
                                "description": "The issue detected based on current news or events."
                            },
                            "severity": { "type": "string", "enum": ["High", "Medium", "Low"] },
                            "time": {
                                "type": "string",
                                "description": "How long ago the alert was reported (e.g., \"1 day ago\")."
                            }
                        },
                        "required": ["id", "area", "issue", "severity", "time"]
                    }
                }
            },
            "required": [
                "cropHealth",
                "cropHealthTrend",
                "soilMoisture",
                "soilMoistureRange",
                "pestRisk",
                "pestRiskDetails",
                "yieldForecast",
                "yieldForecastDetails",
                "alerts"
            ]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::validate_output;

    fn summary_json(severity: &str) -> Value {
        json!({
            "cropHealth": 82,
            "cropHealthTrend": "+2%",
            "soilMoisture": 41,
            "soilMoistureRange": "35-45%",
            "pestRisk": "Low",
            "pestRiskDetails": "Minor aphid activity",
            "yieldForecast": "+5%",
            "yieldForecastDetails": "Above last season",
            "alerts": [
                { "id": 1, "area": "Ludhiana", "issue": "Stubble burning advisory", "severity": severity, "time": "2 hours ago" }
            ]
        })
    }

    #[test]
    fn test_valid_summary() {
        let summary = validate_output::<DashboardSummary>(summary_json("High")).unwrap();
        assert_eq!(summary.crop_health, 82.0);
        assert_eq!(summary.alerts[0].severity, Severity::High);
    }

    #[test]
    fn test_unknown_severity_rejected() {
        assert!(validate_output::<DashboardSummary>(summary_json("Severe")).is_err());
    }

    #[test]
    fn test_crop_health_bounds() {
        let mut raw = summary_json("Low");
        raw["cropHealth"] = json!(120);
        let err = validate_output::<DashboardSummary>(raw).unwrap_err();
        assert_eq!(err.field, "cropHealth");
    }

    #[test]
    fn test_blank_alert_area_is_prefixed() {
        let mut raw = summary_json("Low");
        raw["alerts"][0]["area"] = json!("");
        let err = validate_output::<DashboardSummary>(raw).unwrap_err();
        assert_eq!(err.field, "alerts[0].area");
    }

    #[test]
    fn test_input_serializes_language_code() {
        let input = DashboardInput {
            location: "Punjab, India".to_string(),
            language: Language::Hi,
        };
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value["language"], "hi");
    }
}
