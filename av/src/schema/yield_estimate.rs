//! Yield estimation records

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{Contract, OutputContract, ValidationError, Validator, coerce};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YieldInput {
    pub crop_type: String,

    /// Acres
    #[serde(deserialize_with = "coerce::number")]
    pub farm_size: f64,

    /// Moisture, temperature, pH and nutrient levels
    pub soil_conditions: String,

    /// Weather patterns, historical rainfall and temperature
    pub environmental_data: String,

    pub growth_patterns: String,
}

impl Default for YieldInput {
    fn default() -> Self {
        Self {
            crop_type: "Soybean".to_string(),
            farm_size: 500.0,
            soil_conditions: "Silty clay loam, pH 6.8, good moisture retention, medium nitrogen levels.".to_string(),
            environmental_data: "Consistent rainfall over the last month, temperatures slightly above average."
                .to_string(),
            growth_patterns: "Vigorous growth observed, canopy closure is ahead of schedule.".to_string(),
        }
    }
}

impl Contract for YieldInput {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .min_chars("cropType", &self.crop_type, 3)
            .positive("farmSize", self.farm_size)
            .min_chars("soilConditions", &self.soil_conditions, 10)
            .min_chars("environmentalData", &self.environmental_data, 10)
            .min_chars("growthPatterns", &self.growth_patterns, 10)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YieldOutput {
    pub estimated_yield: String,
    pub recommendations: String,
}

impl Contract for YieldOutput {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

impl OutputContract for YieldOutput {
    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "estimatedYield": {
                    "type": "string",
                    "description": "The estimated crop yield."
                },
                "recommendations": {
                    "type": "string",
                    "description": "Personalized recommendations for improving productivity, including irrigation schedules, fertilizer requirements, and pest control measures."
                }
            },
            "required": ["estimatedYield", "recommendations"]
        })
    }
}
