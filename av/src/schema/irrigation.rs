//! Irrigation prediction records

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{Contract, OutputContract, ValidationError, Validator, coerce};

/// Field readings for an irrigation prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrrigationInput {
    pub crop_type: String,

    /// Percent
    #[serde(deserialize_with = "coerce::number")]
    pub soil_moisture: f64,

    /// Degrees Celsius
    #[serde(deserialize_with = "coerce::number")]
    pub temperature: f64,

    /// Percent
    #[serde(deserialize_with = "coerce::number")]
    pub humidity: f64,

    /// Short forecast for the next 7 days
    pub weather_forecast: String,

    /// e.g. seedling, vegetative, flowering
    pub growth_stage: String,

    pub location: String,
}

impl Default for IrrigationInput {
    fn default() -> Self {
        Self {
            crop_type: "Corn".to_string(),
            soil_moisture: 65.0,
            temperature: 25.0,
            humidity: 70.0,
            weather_forecast: "Sunny with light clouds for the next 3 days, potential rain on the 4th day.".to_string(),
            growth_stage: "Vegetative".to_string(),
            location: "Punjab, India".to_string(),
        }
    }
}

impl Contract for IrrigationInput {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .required("cropType", &self.crop_type)
            .range("soilMoisture", self.soil_moisture, 0.0, 100.0)
            .finite("temperature", self.temperature)
            .range("humidity", self.humidity, 0.0, 100.0)
            .required("weatherForecast", &self.weather_forecast)
            .required("growthStage", &self.growth_stage)
            .required("location", &self.location)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IrrigationOutput {
    pub irrigation_needed: bool,

    /// Amount of water and frequency
    pub recommendation: String,

    /// 0-1
    pub confidence_level: f64,
}

impl Contract for IrrigationOutput {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .range("confidenceLevel", self.confidence_level, 0.0, 1.0)
            .finish()
    }
}

impl OutputContract for IrrigationOutput {
    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "irrigationNeeded": {
                    "type": "boolean",
                    "description": "Whether irrigation is needed."
                },
                "recommendation": {
                    "type": "string",
                    "description": "A recommendation for irrigation, including the amount of water and frequency."
                },
                "confidenceLevel": {
                    "type": "number",
                    "minimum": 0,
                    "maximum": 1,
                    "description": "The confidence level of the prediction (0-1)."
                }
            },
            "required": ["irrigationNeeded", "recommendation", "confidenceLevel"]
        })
    }
}
