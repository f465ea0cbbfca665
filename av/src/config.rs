//! AgriVision configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::llm::LlmError;
use crate::schema::{Contract, FarmSettings, Language, UserProfile};

/// Main AgriVision configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Generation backend configuration
    pub llm: LlmConfig,

    /// Flow invocation settings
    pub flows: FlowsConfig,

    /// Prompt template overrides
    pub prompts: PromptsConfig,

    /// Session defaults
    pub session: SessionConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks that the API key environment variable is set and that the session
    /// defaults satisfy their own constraints. Call this before constructing a
    /// backend client to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        debug!("Config::validate: called");
        self.llm.get_api_key()?;
        self.session.validate()
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        debug!(?config_path, "Config::load: called");
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .agrivision.yml
        let local_config = PathBuf::from(".agrivision.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/agrivision/agrivision.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("agrivision").join("agrivision.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Generation backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name ("anthropic" or "openai")
    pub provider: String,

    /// Model for structured output
    pub model: String,

    /// Model for image generation (providers that support it)
    #[serde(rename = "image-model")]
    pub image_model: String,

    /// Environment variable containing the API key (provider default when unset)
    #[serde(rename = "api-key-env", skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// API base URL (provider default when unset)
    #[serde(rename = "base-url", skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// HTTP request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl LlmConfig {
    /// Environment variable holding the API key
    pub fn api_key_env(&self) -> &str {
        match (&self.api_key_env, self.provider.as_str()) {
            (Some(var), _) => var,
            (None, "openai") => "OPENAI_API_KEY",
            (None, _) => "ANTHROPIC_API_KEY",
        }
    }

    /// API base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        match (&self.base_url, self.provider.as_str()) {
            (Some(url), _) => url.trim_end_matches('/'),
            (None, "openai") => "https://api.openai.com",
            (None, _) => "https://api.anthropic.com",
        }
    }

    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String, LlmError> {
        let var = self.api_key_env();
        debug!(api_key_env = %var, "LlmConfig::get_api_key: called");
        match std::env::var(var) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(LlmError::MissingApiKey(var.to_string())),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            image_model: "gpt-image-1".to_string(),
            api_key_env: None,
            base_url: None,
            max_tokens: 4096,
            timeout_ms: 120_000,
        }
    }
}

/// Flow invocation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowsConfig {
    /// Deadline for one backend dispatch in milliseconds
    #[serde(rename = "deadline-ms")]
    pub deadline_ms: u64,
}

impl FlowsConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}

impl Default for FlowsConfig {
    fn default() -> Self {
        Self { deadline_ms: 120_000 }
    }
}

/// Prompt template configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// Directory searched for `<name>.pmt` overrides
    pub dir: PathBuf,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".agrivision/prompts"),
        }
    }
}

/// Session defaults applied when a session starts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub language: Language,
    pub farm: FarmSettings,
    pub user: UserProfile,
}

impl SessionConfig {
    fn validate(&self) -> Result<()> {
        self.farm.validate().context("Invalid session.farm defaults")?;
        self.user.validate().context("Invalid session.user defaults")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.llm.provider, "anthropic");
        assert_eq!(config.llm.max_tokens, 4096);
        assert_eq!(config.flows.deadline_ms, 120_000);
        assert_eq!(config.prompts.dir, PathBuf::from(".agrivision/prompts"));
        assert_eq!(config.session.language, Language::En);
    }

    #[test]
    fn test_parse_yaml_config() {
        let yaml = r#"
llm:
  provider: openai
  model: gpt-4o
  api-key-env: OPENAI_API_KEY
  base-url: https://api.openai.com
  max-tokens: 2048
  timeout-ms: 60000
flows:
  deadline-ms: 30000
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.max_tokens, 2048);
        assert_eq!(config.llm.timeout(), Duration::from_secs(60));
        assert_eq!(config.flows.deadline(), Duration::from_secs(30));
        // unspecified field keeps its default
        assert_eq!(config.llm.image_model, "gpt-image-1");
    }

    #[test]
    fn test_provider_defaults() {
        let mut config = LlmConfig::default();
        assert_eq!(config.api_key_env(), "ANTHROPIC_API_KEY");
        assert_eq!(config.base_url(), "https://api.anthropic.com");

        config.provider = "openai".to_string();
        assert_eq!(config.api_key_env(), "OPENAI_API_KEY");
        assert_eq!(config.base_url(), "https://api.openai.com");

        config.base_url = Some("http://localhost:8080/".to_string());
        assert_eq!(config.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
prompts:
  dir: /tmp/agrivision-prompts
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.prompts.dir, PathBuf::from("/tmp/agrivision-prompts"));
        assert_eq!(config.llm.provider, "anthropic");
        assert_eq!(config.flows.deadline_ms, 120_000);
    }

    #[test]
    fn test_session_defaults_from_yaml() {
        let yaml = r#"
session:
  language: hi
  farm:
    farmName: Green Acres
    farmLocation: Haryana, India
    farmSize: 120
  user:
    fullName: Gurpreet Kaur
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.session.language, Language::Hi);
        assert_eq!(config.session.farm.farm_name, "Green Acres");
        assert_eq!(config.session.farm.farm_size, 120.0);
        assert_eq!(config.session.user.full_name, "Gurpreet Kaur");
        assert_eq!(config.session.user.email, "farmer@agrivision.io");
    }

    #[test]
    fn test_invalid_session_defaults_rejected() {
        let mut session = SessionConfig::default();
        assert!(session.validate().is_ok());

        session.farm.farm_name = "AB".to_string();
        assert!(session.validate().is_err());
    }

    #[test]
    fn test_missing_api_key() {
        let config = LlmConfig {
            api_key_env: Some("AGRIVISION_TEST_KEY_THAT_IS_NEVER_SET".to_string()),
            ..Default::default()
        };
        let err = config.get_api_key().unwrap_err();
        assert!(matches!(err, LlmError::MissingApiKey(ref var) if var == "AGRIVISION_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    #[serial_test::serial]
    fn test_api_key_from_env() {
        let llm = LlmConfig {
            api_key_env: Some("AGRIVISION_TEST_API_KEY".to_string()),
            ..Default::default()
        };
        // SAFETY: tests that touch the process environment run serially
        unsafe { std::env::set_var("AGRIVISION_TEST_API_KEY", "sk-test") };

        assert_eq!(llm.get_api_key().unwrap(), "sk-test");
        let config = Config {
            llm,
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        unsafe { std::env::remove_var("AGRIVISION_TEST_API_KEY") };
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agrivision.yml");
        std::fs::write(&path, "flows:\n  deadline-ms: 5000\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.flows.deadline_ms, 5000);
    }

    #[test]
    fn test_load_explicit_path_missing_file() {
        let path = PathBuf::from("/nonexistent/agrivision.yml");
        assert!(Config::load(Some(&path)).is_err());
    }
}
