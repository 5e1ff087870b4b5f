use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::core::keywords::KeywordTables;
use crate::models::ScoringWeights;

/// Engine configuration. Read-only after load; every evaluation worker shares
/// the same snapshot.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub openai: OpenAiSettings,
    pub ollama: OllamaSettings,
    pub classifier: ClassifierSettings,
    pub scoring: ScoringSettings,
    pub batch: BatchSettings,
    pub keywords: KeywordTables,
    pub logging: LoggingSettings,
}

/// Primary AI provider. Configured when an API key is present.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OpenAiSettings {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
}

impl OpenAiSettings {
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| !key.trim().is_empty())
    }
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-4-turbo-preview".to_string(),
        }
    }
}

/// Secondary AI provider. Configured when an endpoint is present.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OllamaSettings {
    pub endpoint: Option<String>,
    pub model: String,
}

impl OllamaSettings {
    pub fn is_configured(&self) -> bool {
        self.endpoint.as_deref().is_some_and(|url| !url.trim().is_empty())
    }
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: "llama2".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    /// Budget for one provider attempt, in seconds.
    pub timeout_secs: u64,
    /// Description length cap for provider prompts.
    pub max_description_chars: usize,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_description_chars: 2000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringSettings {
    pub weights: WeightsConfig,
    pub strategic_baseline: f64,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            weights: WeightsConfig::default(),
            strategic_baseline: default_strategic_baseline(),
        }
    }
}

/// Criterion weights as loaded from configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_domain_weight")]
    pub domain: f64,
    #[serde(default = "default_code_weight")]
    pub code: f64,
    #[serde(default = "default_skill_weight")]
    pub skill: f64,
    #[serde(default = "default_agency_weight")]
    pub agency: f64,
    #[serde(default = "default_contract_type_weight")]
    pub contract_type: f64,
    #[serde(default = "default_strategic_weight")]
    pub strategic: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            domain: default_domain_weight(),
            code: default_code_weight(),
            skill: default_skill_weight(),
            agency: default_agency_weight(),
            contract_type: default_contract_type_weight(),
            strategic: default_strategic_weight(),
        }
    }
}

impl From<&WeightsConfig> for ScoringWeights {
    fn from(config: &WeightsConfig) -> Self {
        ScoringWeights {
            domain: config.domain,
            code: config.code,
            skill: config.skill,
            agency: config.agency,
            contract_type: config.contract_type,
            strategic: config.strategic,
        }
    }
}

fn default_domain_weight() -> f64 { 0.30 }
fn default_code_weight() -> f64 { 0.20 }
fn default_skill_weight() -> f64 { 0.20 }
fn default_agency_weight() -> f64 { 0.10 }
fn default_contract_type_weight() -> f64 { 0.10 }
fn default_strategic_weight() -> f64 { 0.10 }
fn default_strategic_baseline() -> f64 { 70.0 }

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    /// Concurrent evaluations per batch. Bounded to respect provider rate
    /// limits.
    pub concurrency: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

/// A settings tree the engine cannot run with. Construction-time only; the
/// running pipeline never raises configuration errors.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("scoring weights must sum to 1.0, got {0}")]
    InvalidWeights(f64),

    #[error("strategic baseline must be within 0-100, got {0}")]
    InvalidStrategicBaseline(f64),

    #[error("classifier timeout must be non-zero")]
    InvalidTimeout,

    #[error("batch concurrency must be at least 1")]
    InvalidConcurrency,

    #[error("domain keyword tables are empty; the rule evaluator needs at least one")]
    EmptyKeywordTables,
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Environment variables (prefixed with BIDFIT_)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            // Add default config file
            .add_source(File::with_name("config/default").required(false))
            // Add local config file (for development overrides)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (prefixed with BIDFIT_)
            // e.g., BIDFIT_BATCH__CONCURRENCY -> batch.concurrency
            .add_source(
                Environment::with_prefix("BIDFIT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = apply_provider_env_overrides(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("BIDFIT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Fail fast on a tree the engine cannot run with. The rule evaluator is
    /// always constructible, so a providerless tree is still valid.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let weights_sum = ScoringWeights::from(&self.scoring.weights).sum();
        if (weights_sum - 1.0).abs() > 1e-6 {
            return Err(ConfigurationError::InvalidWeights(weights_sum));
        }
        let baseline = self.scoring.strategic_baseline;
        if !(0.0..=100.0).contains(&baseline) {
            return Err(ConfigurationError::InvalidStrategicBaseline(baseline));
        }
        if self.classifier.timeout_secs == 0 {
            return Err(ConfigurationError::InvalidTimeout);
        }
        if self.batch.concurrency == 0 {
            return Err(ConfigurationError::InvalidConcurrency);
        }
        if self.keywords.domains.is_empty() {
            return Err(ConfigurationError::EmptyKeywordTables);
        }
        Ok(())
    }
}

/// Honor the provider environment variables the rest of the tooling already
/// uses (OPENAI_API_KEY, OLLAMA_BASE_URL, ...), without requiring the BIDFIT
/// prefix for them.
fn apply_provider_env_overrides(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(api_key) = env::var("OPENAI_API_KEY") {
        builder = builder.set_override("openai.api_key", api_key)?;
    }
    if let Ok(model) = env::var("OPENAI_MODEL") {
        builder = builder.set_override("openai.model", model)?;
    }
    if let Ok(endpoint) = env::var("OLLAMA_BASE_URL") {
        builder = builder.set_override("ollama.endpoint", endpoint)?;
    }
    if let Ok(model) = env::var("OLLAMA_MODEL") {
        builder = builder.set_override("ollama.model", model)?;
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let weights = WeightsConfig::default();
        assert_eq!(weights.domain, 0.30);
        assert_eq!(weights.code, 0.20);
        assert_eq!(weights.skill, 0.20);
        assert_eq!(weights.agency, 0.10);
        assert_eq!(weights.contract_type, 0.10);
        assert_eq!(weights.strategic, 0.10);
    }

    #[test]
    fn test_default_settings_validate() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert!(!settings.openai.is_configured());
        assert!(!settings.ollama.is_configured());
    }

    #[test]
    fn test_blank_api_key_is_not_configured() {
        let mut settings = Settings::default();
        settings.openai.api_key = Some("  ".to_string());
        assert!(!settings.openai.is_configured());

        settings.openai.api_key = Some("sk-test".to_string());
        assert!(settings.openai.is_configured());
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let mut settings = Settings::default();
        settings.scoring.weights.domain = 0.50;
        assert!(matches!(
            settings.validate(),
            Err(ConfigurationError::InvalidWeights(_))
        ));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut settings = Settings::default();
        settings.batch.concurrency = 0;
        assert!(matches!(
            settings.validate(),
            Err(ConfigurationError::InvalidConcurrency)
        ));
    }

    #[test]
    fn test_out_of_range_baseline_rejected() {
        let mut settings = Settings::default();
        settings.scoring.strategic_baseline = 120.0;
        assert!(matches!(
            settings.validate(),
            Err(ConfigurationError::InvalidStrategicBaseline(_))
        ));
    }

    #[test]
    fn test_empty_keyword_tables_rejected() {
        let mut settings = Settings::default();
        settings.keywords.domains = crate::core::keywords::DomainKeywords {
            ai: vec![],
            data: vec![],
            cloud: vec![],
            cybersecurity: vec![],
            it_operations: vec![],
            software: vec![],
            modernization: vec![],
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigurationError::EmptyKeywordTables)
        ));
    }

    #[test]
    fn test_default_logging() {
        let logging = LoggingSettings::default();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, "json");
    }
}
