//! FlowRunner - validate, render, dispatch once, validate output

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use super::invocation::{Invocation, InvocationState};
use super::{
    AnalyzeNdvi, AskCropQuestion, Capability, CapabilityKind, EstimateYield, FlowError, ForecastPests, GenerateAvatar,
    GenerationError, PredictIrrigation, SummarizeDashboard,
};
use crate::config::Config;
use crate::llm::{GenerateRequest, LlmClient, LlmError, create_client};
use crate::prompts::{ContractError, PromptLoader};
use crate::schema::{Contract, SchemaError, ValidationError, validate_input};

/// Default deadline for one backend dispatch
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(120);

/// Entry point for every capability
///
/// Holds no per-request state; clones share the client and templates and can
/// run unrelated invocations concurrently.
#[derive(Clone)]
pub struct FlowRunner {
    client: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
    deadline: Duration,
}

impl FlowRunner {
    pub fn new(client: Arc<dyn LlmClient>, prompts: PromptLoader) -> Self {
        debug!(provider = %client.provider(), "FlowRunner::new: called");
        Self {
            client,
            prompts: Arc::new(prompts),
            deadline: DEFAULT_DEADLINE,
        }
    }

    /// Build the backend client and template loader from configuration
    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        debug!("FlowRunner::from_config: called");
        let client = create_client(&config.llm)?;
        let prompts = PromptLoader::new(&config.prompts.dir);
        Ok(Self::new(client, prompts).with_deadline(config.flows.deadline()))
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Run a capability on an already-typed input record
    pub async fn run<C: Capability>(&self, input: &C::Input) -> Result<C::Output, FlowError> {
        let mut invocation = Invocation::new(C::KIND);
        debug!(id = %invocation.id(), capability = %C::KIND, "FlowRunner::run: called");
        invocation.transition(InvocationState::Validating);

        if let Err(e) = input.validate() {
            return Err(Self::reject(&mut invocation, e));
        }
        self.dispatch::<C>(&mut invocation, input).await
    }

    /// Run a capability on a raw input object
    pub async fn invoke<C: Capability>(&self, raw: Value) -> Result<C::Output, FlowError> {
        let mut invocation = Invocation::new(C::KIND);
        debug!(id = %invocation.id(), capability = %C::KIND, "FlowRunner::invoke: called");
        invocation.transition(InvocationState::Validating);

        let input = match validate_input::<C::Input>(raw) {
            Ok(input) => input,
            Err(e) => return Err(Self::reject(&mut invocation, e)),
        };
        self.dispatch::<C>(&mut invocation, &input).await
    }

    /// Run a capability chosen at runtime; the output comes back as JSON
    pub async fn invoke_kind(&self, kind: CapabilityKind, raw: Value) -> Result<Value, FlowError> {
        debug!(%kind, "FlowRunner::invoke_kind: called");
        match kind {
            CapabilityKind::Irrigation => to_value(self.invoke::<PredictIrrigation>(raw).await?),
            CapabilityKind::Yield => to_value(self.invoke::<EstimateYield>(raw).await?),
            CapabilityKind::Ndvi => to_value(self.invoke::<AnalyzeNdvi>(raw).await?),
            CapabilityKind::Pest => to_value(self.invoke::<ForecastPests>(raw).await?),
            CapabilityKind::Dashboard => to_value(self.invoke::<SummarizeDashboard>(raw).await?),
            CapabilityKind::Avatar => to_value(self.invoke::<GenerateAvatar>(raw).await?),
            CapabilityKind::Ask => to_value(self.invoke::<AskCropQuestion>(raw).await?),
        }
    }

    fn reject(invocation: &mut Invocation, e: ValidationError) -> FlowError {
        debug!(id = %invocation.id(), field = %e.field_name(), "FlowRunner::reject: input invalid");
        invocation.transition(InvocationState::ValidationFailed);
        e.into()
    }

    async fn dispatch<C: Capability>(&self, invocation: &mut Invocation, input: &C::Input) -> Result<C::Output, FlowError> {
        // A template failure is a defect, not a generation failure: it leaves
        // the invocation in Validating and passes through untouched.
        let prompt = match self.render::<C>(input) {
            Ok(prompt) => prompt,
            Err(e) => {
                error!(id = %invocation.id(), capability = C::NAME, error = %e, "template contract violated");
                return Err(e.into());
            }
        };

        let request = GenerateRequest {
            prompt,
            output: C::output_spec(),
            media: C::media(input),
            config: C::model_config(),
        };

        invocation.transition(InvocationState::Dispatched);
        let outcome = match tokio::time::timeout(self.deadline, self.client.generate(request)).await {
            Err(_) => Err(GenerationError::Timeout(self.deadline)),
            Ok(Err(e)) => Err(GenerationError::Backend(e)),
            Ok(Ok(response)) => {
                debug!(
                    id = %invocation.id(),
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    "FlowRunner::dispatch: response received"
                );
                C::extract(response)
            }
        };

        match outcome {
            Ok(output) => {
                invocation.transition(InvocationState::Succeeded);
                Ok(output)
            }
            Err(e) => {
                warn!(id = %invocation.id(), capability = C::NAME, error = %e, "generation failed");
                invocation.transition(InvocationState::GenerationFailed);
                Err(e.into())
            }
        }
    }

    fn render<C: Capability>(&self, input: &C::Input) -> Result<String, ContractError> {
        let context = serde_json::to_value(input).map_err(|e| ContractError::Render {
            template: C::NAME.to_string(),
            message: e.to_string(),
        })?;
        self.prompts.render(C::NAME, &tidy_numbers(context))
    }
}

fn to_value<O: Serialize>(output: O) -> Result<Value, FlowError> {
    serde_json::to_value(output).map_err(|e| SchemaError::new("output", e.to_string()).into())
}

/// Print whole floats without a trailing `.0` ("65" rather than "65.0")
fn tidy_numbers(value: Value) -> Value {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => Value::from(f as i64),
            _ => Value::Number(n),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(tidy_numbers).collect()),
        Value::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, tidy_numbers(v))).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{StubClient, StubReply};
    use crate::schema::{CropQuestion, IrrigationInput};
    use serde_json::json;

    fn runner(stub: &Arc<StubClient>) -> FlowRunner {
        FlowRunner::new(stub.clone(), PromptLoader::embedded_only())
    }

    fn irrigation_output() -> Value {
        json!({
            "irrigationNeeded": true,
            "recommendation": "Apply 25mm of water every 3 days.",
            "confidenceLevel": 0.8
        })
    }

    #[tokio::test]
    async fn test_run_success() {
        let stub = Arc::new(StubClient::with_output(irrigation_output()));
        let output = runner(&stub)
            .run::<PredictIrrigation>(&IrrigationInput::default())
            .await
            .unwrap();

        assert!(output.irrigation_needed);
        assert_eq!(stub.call_count(), 1);
    }

    #[tokio::test]
    async fn test_prompt_renders_whole_numbers() {
        let stub = Arc::new(StubClient::with_output(irrigation_output()));
        runner(&stub)
            .run::<PredictIrrigation>(&IrrigationInput::default())
            .await
            .unwrap();

        let prompt = stub.last_request().unwrap().prompt;
        assert!(prompt.contains("Soil Moisture: 65%"), "{}", prompt);
        assert!(prompt.contains("Crop Type: Corn"));
    }

    #[tokio::test]
    async fn test_invalid_input_not_dispatched() {
        let stub = Arc::new(StubClient::with_output(irrigation_output()));
        let err = runner(&stub)
            .invoke::<PredictIrrigation>(json!({
                "cropType": "Corn",
                "soilMoisture": 150,
                "temperature": 25,
                "humidity": 70,
                "weatherForecast": "Sunny",
                "growthStage": "Vegetative",
                "location": "Punjab, India"
            }))
            .await
            .unwrap_err();

        assert_eq!(err.as_validation().unwrap().field_name(), "soilMoisture");
        assert_eq!(stub.call_count(), 0);
    }

    #[tokio::test]
    async fn test_backend_failure_is_generation_error() {
        let stub = Arc::new(StubClient::always(StubReply::Fail("overloaded".to_string())));
        let err = runner(&stub)
            .run::<AskCropQuestion>(&CropQuestion::new("When should I sow wheat?"))
            .await
            .unwrap_err();

        assert!(matches!(err.as_generation(), Some(GenerationError::Backend(_))));
        assert_eq!(stub.call_count(), 1);
    }

    #[tokio::test]
    async fn test_invoke_kind_returns_json() {
        let stub = Arc::new(StubClient::with_output(json!({ "answer": "Late October to mid November." })));
        let value = runner(&stub)
            .invoke_kind(CapabilityKind::Ask, json!({ "question": "When should I sow wheat?" }))
            .await
            .unwrap();

        assert_eq!(value, json!({ "answer": "Late October to mid November." }));
    }

    #[tokio::test]
    async fn test_deadline() {
        let stub = Arc::new(
            StubClient::new().then_after(Duration::from_millis(200), StubReply::Output(json!({ "answer": "late" }))),
        );
        let err = runner(&stub)
            .with_deadline(Duration::from_millis(20))
            .run::<AskCropQuestion>(&CropQuestion::new("When should I sow wheat?"))
            .await
            .unwrap_err();

        assert!(matches!(err.as_generation(), Some(GenerationError::Timeout(_))));
    }

    #[test]
    fn test_tidy_numbers() {
        let value = tidy_numbers(json!({ "a": 65.0, "b": 0.8, "c": [2.0, "x"], "d": 7 }));
        assert_eq!(value, json!({ "a": 65, "b": 0.8, "c": [2, "x"], "d": 7 }));
    }
}
