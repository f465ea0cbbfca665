//! Pest outbreak forecast records

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{Contract, OutputContract, ValidationError, Validator};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PestInput {
    /// Temperature, rainfall, humidity
    pub historical_weather_data: String,

    /// Crop type and growth stage
    pub crop_data: String,

    /// Historical pest data for the region
    pub pest_data: String,

    pub location: String,
}

impl Default for PestInput {
    fn default() -> Self {
        Self {
            historical_weather_data: "Last 30 days: Temp avg 28°C, high humidity, intermittent heavy rainfall."
                .to_string(),
            crop_data: "Corn, late vegetative stage, dense canopy.".to_string(),
            pest_data: "History of corn borers and aphids in the region, especially after heavy rain.".to_string(),
            location: "India".to_string(),
        }
    }
}

impl Contract for PestInput {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .min_chars("historicalWeatherData", &self.historical_weather_data, 10)
            .min_chars("cropData", &self.crop_data, 10)
            .min_chars("pestData", &self.pest_data, 10)
            .min_chars("location", &self.location, 3)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PestOutput {
    pub risk_assessment: String,
    pub recommended_actions: String,

    /// Whether the farmer should be alerted
    pub alert: bool,
}

impl Contract for PestOutput {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

impl OutputContract for PestOutput {
    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "riskAssessment": {
                    "type": "string",
                    "description": "The risk assessment of pest outbreak."
                },
                "recommendedActions": {
                    "type": "string",
                    "description": "Recommended actions to prevent pest outbreak."
                },
                "alert": {
                    "type": "boolean",
                    "description": "Whether to send an alert to the farmer."
                }
            },
            "required": ["riskAssessment", "recommendedActions", "alert"]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(PestInput::default().validate().is_ok());
    }

    #[test]
    fn test_location_too_short() {
        let input = PestInput {
            location: "IN".to_string(),
            ..Default::default()
        };
        assert_eq!(input.validate().unwrap_err().field_name(), "location");
    }
}
