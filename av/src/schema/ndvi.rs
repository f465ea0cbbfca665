//! NDVI analysis records

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{Contract, DataUri, OutputContract, ValidationError, Validator};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NdviInput {
    /// NDVI image as `data:image/...;base64,...`
    pub ndvi_data: String,

    /// Crop type, soil type and known issues
    pub field_description: String,

    pub historical_weather_data: String,
}

impl NdviInput {
    /// The NDVI image, `None` until the record validates
    pub fn image(&self) -> Option<DataUri> {
        DataUri::parse(&self.ndvi_data).ok().filter(DataUri::is_image)
    }
}

impl Contract for NdviInput {
    fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .data_uri("ndviData", &self.ndvi_data, "image/")
            .min_chars("fieldDescription", &self.field_description, 10)
            .min_chars("historicalWeatherData", &self.historical_weather_data, 10)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NdviOutput {
    pub analysis_summary: String,
    pub suggested_interventions: Vec<String>,
}

impl Contract for NdviOutput {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

impl OutputContract for NdviOutput {
    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "analysisSummary": {
                    "type": "string",
                    "description": "A summary of the NDVI analysis."
                },
                "suggestedInterventions": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Specific interventions suggested to address plant stress."
                }
            },
            "required": ["analysisSummary", "suggestedInterventions"]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(ndvi_data: &str) -> NdviInput {
        NdviInput {
            ndvi_data: ndvi_data.to_string(),
            field_description: "Wheat on sandy loam, patchy yellowing in the north corner".to_string(),
            historical_weather_data: "Dry spell for three weeks, 34C highs".to_string(),
        }
    }

    #[test]
    fn test_image_uri_accepted() {
        let input = input("data:image/png;base64,iVBORw==");
        assert!(input.validate().is_ok());
        assert_eq!(input.image().unwrap().mime(), "image/png");
    }

    #[test]
    fn test_non_image_uri_rejected() {
        let err = input("data:application/pdf;base64,iVBORw==").validate().unwrap_err();
        assert_eq!(err.field_name(), "ndviData");
    }

    #[test]
    fn test_empty_uri_rejected() {
        let err = input("").validate().unwrap_err();
        assert_eq!(err.field_name(), "ndviData");
        assert!(input("").image().is_none());
    }
}
