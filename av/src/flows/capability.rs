//! Capability bindings
//!
//! Each advisory capability is a zero-sized type tying its input and output
//! records to a template, an output request, and the way its result is pulled
//! out of a backend response.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::GenerationError;
use crate::llm::{GenerateResponse, ModelConfig, OutputSpec};
use crate::schema::{
    AvatarInput, AvatarOutput, Contract, CropAnswer, CropQuestion, DashboardInput, DashboardSummary, DataUri,
    IrrigationInput, IrrigationOutput, NdviInput, NdviOutput, OutputContract, PestInput, PestOutput, YieldInput,
    ValidationError, YieldOutput, validate_input, validate_output,
};

/// A single-purpose request/response operation
pub trait Capability: Send + Sync + 'static {
    type Input: Contract + Serialize + DeserializeOwned + Clone + Send + Sync + 'static;
    type Output: OutputContract + Serialize + DeserializeOwned + Clone + Send + Sync + 'static;

    /// Template name, also used as the structured-output name
    const NAME: &'static str;

    /// Runtime name; invocations are tagged with it
    const KIND: CapabilityKind;

    /// What the backend is asked to produce
    fn output_spec() -> OutputSpec {
        OutputSpec::json(Self::NAME, Self::Output::json_schema())
    }

    /// Images attached to the request
    fn media(_input: &Self::Input) -> Vec<DataUri> {
        vec![]
    }

    fn model_config() -> ModelConfig {
        ModelConfig::default()
    }

    /// Pull the output record out of a backend response
    fn extract(response: GenerateResponse) -> Result<Self::Output, GenerationError> {
        let raw = response.output.ok_or(GenerationError::NoOutput)?;
        Ok(validate_output::<Self::Output>(raw)?)
    }
}

pub struct PredictIrrigation;

impl Capability for PredictIrrigation {
    type Input = IrrigationInput;
    type Output = IrrigationOutput;
    const NAME: &'static str = "irrigation";
    const KIND: CapabilityKind = CapabilityKind::Irrigation;
}

pub struct EstimateYield;

impl Capability for EstimateYield {
    type Input = YieldInput;
    type Output = YieldOutput;
    const NAME: &'static str = "yield-estimate";
    const KIND: CapabilityKind = CapabilityKind::Yield;
}

pub struct AnalyzeNdvi;

impl Capability for AnalyzeNdvi {
    type Input = NdviInput;
    type Output = NdviOutput;
    const NAME: &'static str = "ndvi-intervention";
    const KIND: CapabilityKind = CapabilityKind::Ndvi;

    fn media(input: &NdviInput) -> Vec<DataUri> {
        input.image().into_iter().collect()
    }
}

pub struct ForecastPests;

impl Capability for ForecastPests {
    type Input = PestInput;
    type Output = PestOutput;
    const NAME: &'static str = "pest-forecast";
    const KIND: CapabilityKind = CapabilityKind::Pest;
}

pub struct SummarizeDashboard;

impl Capability for SummarizeDashboard {
    type Input = DashboardInput;
    type Output = DashboardSummary;
    const NAME: &'static str = "dashboard-summary";
    const KIND: CapabilityKind = CapabilityKind::Dashboard;
}

/// Avatar generation asks for an image, not JSON
pub struct GenerateAvatar;

impl Capability for GenerateAvatar {
    type Input = AvatarInput;
    type Output = AvatarOutput;
    const NAME: &'static str = "avatar";
    const KIND: CapabilityKind = CapabilityKind::Avatar;

    fn output_spec() -> OutputSpec {
        OutputSpec::Image
    }

    fn model_config() -> ModelConfig {
        ModelConfig::with_aspect_ratio("1:1")
    }

    fn extract(response: GenerateResponse) -> Result<AvatarOutput, GenerationError> {
        let media = response.media.ok_or(GenerationError::NoMedia)?;
        if !media.is_image() {
            return Err(GenerationError::NoMedia);
        }
        let output = AvatarOutput {
            avatar_data_uri: media.to_string(),
        };
        output.validate().map_err(|e| GenerationError::Schema(e.into()))?;
        Ok(output)
    }
}

pub struct AskCropQuestion;

impl Capability for AskCropQuestion {
    type Input = CropQuestion;
    type Output = CropAnswer;
    const NAME: &'static str = "crop-qa";
    const KIND: CapabilityKind = CapabilityKind::Ask;
}

/// Capability selected by name at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityKind {
    Irrigation,
    Yield,
    Ndvi,
    Pest,
    Dashboard,
    Avatar,
    Ask,
}

impl CapabilityKind {
    pub const ALL: [CapabilityKind; 7] = [
        Self::Irrigation,
        Self::Yield,
        Self::Ndvi,
        Self::Pest,
        Self::Dashboard,
        Self::Avatar,
        Self::Ask,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Irrigation => "irrigation",
            Self::Yield => "yield",
            Self::Ndvi => "ndvi",
            Self::Pest => "pest",
            Self::Dashboard => "dashboard",
            Self::Avatar => "avatar",
            Self::Ask => "ask",
        }
    }

    /// Template backing this capability
    pub fn template(&self) -> &'static str {
        match self {
            Self::Irrigation => PredictIrrigation::NAME,
            Self::Yield => EstimateYield::NAME,
            Self::Ndvi => AnalyzeNdvi::NAME,
            Self::Pest => ForecastPests::NAME,
            Self::Dashboard => SummarizeDashboard::NAME,
            Self::Avatar => GenerateAvatar::NAME,
            Self::Ask => AskCropQuestion::NAME,
        }
    }

    /// Check a raw input object against this capability's input record
    pub fn validate(&self, raw: Value) -> Result<(), ValidationError> {
        fn check<C: Capability>(raw: Value) -> Result<(), ValidationError> {
            validate_input::<C::Input>(raw).map(|_| ())
        }

        match self {
            Self::Irrigation => check::<PredictIrrigation>(raw),
            Self::Yield => check::<EstimateYield>(raw),
            Self::Ndvi => check::<AnalyzeNdvi>(raw),
            Self::Pest => check::<ForecastPests>(raw),
            Self::Dashboard => check::<SummarizeDashboard>(raw),
            Self::Avatar => check::<GenerateAvatar>(raw),
            Self::Ask => check::<AskCropQuestion>(raw),
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CapabilityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s || k.template() == s)
            .ok_or_else(|| {
                format!(
                    "Unknown capability: {}. Use one of: irrigation, yield, ndvi, pest, dashboard, avatar, ask",
                    s
                )
            })
    }
}
