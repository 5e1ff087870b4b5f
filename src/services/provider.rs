use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::core::text::truncate_chars;
use crate::models::{Classification, Complexity, Domain, Opportunity, ProjectType, Provenance};

/// Errors an AI classification call can produce. Every variant is recoverable
/// by falling back to the next evaluator; none of them reaches the caller of
/// the pipeline.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider rejected the configured credentials")]
    Unauthorized,

    #[error("provider rate limit exceeded")]
    RateLimited,

    #[error("provider call timed out")]
    Timeout,

    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("provider returned an unusable response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::Unavailable(err.to_string())
        }
    }
}

impl ProviderError {
    /// Map a non-success HTTP status to the matching error.
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        match status.as_u16() {
            401 | 403 => ProviderError::Unauthorized,
            429 => ProviderError::RateLimited,
            _ => ProviderError::Unavailable(format!("HTTP {}", status)),
        }
    }
}

/// A provider's validated judgment, before the pipeline stamps provenance on
/// it. Adapters do not know whether they are the primary or secondary slot.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderClassification {
    pub primary_domain: Domain,
    pub secondary_domains: Vec<Domain>,
    pub complexity: Complexity,
    pub project_type: ProjectType,
    pub strategic_value: Option<f64>,
}

impl ProviderClassification {
    pub fn into_classification(self, provenance: Provenance) -> Classification {
        Classification {
            primary_domain: self.primary_domain,
            secondary_domains: self.secondary_domains,
            complexity: self.complexity,
            project_type: self.project_type,
            provenance,
            strategic_value: self.strategic_value,
        }
    }
}

/// One AI classification backend.
///
/// Implementations issue exactly one request per call. Retrying is the
/// pipeline's decision, never the adapter's; `timeout` is the whole budget
/// for the single attempt.
#[async_trait]
pub trait ClassificationProvider: Send + Sync {
    /// Short identifier used in logs ("openai", "ollama").
    fn name(&self) -> &str;

    async fn classify(
        &self,
        opportunity: &Opportunity,
        timeout: Duration,
    ) -> Result<ProviderClassification, ProviderError>;
}

pub(crate) const SYSTEM_PROMPT: &str =
    "You are a federal IT contracting expert. Return only valid JSON.";

/// Build the classification prompt shared by both adapters. The description
/// is truncated to keep request sizes bounded.
pub(crate) fn build_classification_prompt(
    opportunity: &Opportunity,
    max_description_chars: usize,
) -> String {
    let naics = if opportunity.naics.is_empty() {
        "N/A".to_string()
    } else {
        opportunity.naics.join(", ")
    };

    format!(
        "You are an expert federal IT contracting analyst. Classify the following \
         contracting opportunity.\n\n\
         OPPORTUNITY TITLE: {title}\n\n\
         DESCRIPTION:\n{description}\n\n\
         NAICS: {naics}\n\
         AGENCY: {agency}\n\n\
         Classify this opportunity and return ONLY a valid JSON object with the \
         following structure:\n\
         {{\n\
         \x20   \"primary_domain\": \"AI\" | \"Data\" | \"Cloud\" | \"Cybersecurity\" | \
         \"IT Operations\" | \"Software\" | \"Modernization\" | \"Other\",\n\
         \x20   \"secondary_domains\": [\"list\", \"of\", \"secondary\", \"domains\"],\n\
         \x20   \"complexity\": \"Low\" | \"Medium\" | \"High\",\n\
         \x20   \"project_type\": \"Modernization\" | \"Operations\" | \"Greenfield\" | \"Legacy\",\n\
         \x20   \"strategic_value\": 0-100\n\
         }}\n\n\
         Focus on:\n\
         - AI: artificial intelligence, machine learning, LLMs, RAG, NLP, computer vision\n\
         - Data: data engineering, analytics, BI, data warehousing\n\
         - Cloud: AWS, Azure, GCP, migration, containers, serverless\n\
         - Cybersecurity: zero trust, FedRAMP, FISMA, RMF, IAM, SIEM\n\
         - IT Operations: IT consulting, operations, support, PMO, ITSM\n\
         - Software: development, APIs, microservices, DevOps, CI/CD\n\
         - Modernization: legacy system modernization, mainframe migration\n\n\
         strategic_value is your 0-100 judgment of how strategically attractive this \
         opportunity is for a federal IT services firm.\n\n\
         Return ONLY the JSON object, no other text.",
        title = opportunity.title,
        description = truncate_chars(&opportunity.description, max_description_chars),
        naics = naics,
        agency = opportunity.agency,
    )
}

#[derive(Debug, Deserialize)]
struct RawClassification {
    primary_domain: String,
    #[serde(default)]
    secondary_domains: Vec<String>,
    #[serde(default)]
    complexity: Option<String>,
    #[serde(default)]
    project_type: Option<String>,
    #[serde(default)]
    strategic_value: Option<f64>,
}

/// Parse and validate the model's reply. The primary domain and complexity
/// must map onto known enum values; anything else is a malformed response,
/// never coerced into a default.
pub(crate) fn parse_classification_content(
    content: &str,
) -> Result<ProviderClassification, ProviderError> {
    let json = strip_code_fences(content);

    let raw: RawClassification = serde_json::from_str(json)
        .map_err(|err| ProviderError::MalformedResponse(format!("invalid JSON: {}", err)))?;

    let primary_domain = Domain::parse(&raw.primary_domain).ok_or_else(|| {
        ProviderError::MalformedResponse(format!("unknown primary domain {:?}", raw.primary_domain))
    })?;

    let complexity = match raw.complexity.as_deref() {
        None => Complexity::Medium,
        Some(value) => Complexity::parse(value).ok_or_else(|| {
            ProviderError::MalformedResponse(format!("unknown complexity {:?}", value))
        })?,
    };

    let project_type = raw
        .project_type
        .as_deref()
        .and_then(ProjectType::parse)
        .unwrap_or(ProjectType::Operations);

    // Unrecognized secondary labels are dropped rather than failing the whole
    // response; the primary judgment is still usable.
    let mut secondary_domains: Vec<Domain> = Vec::new();
    for label in &raw.secondary_domains {
        if let Some(domain) = Domain::parse(label) {
            if domain != primary_domain && !secondary_domains.contains(&domain) {
                secondary_domains.push(domain);
            }
        }
    }
    secondary_domains.truncate(3);

    Ok(ProviderClassification {
        primary_domain,
        secondary_domains,
        complexity,
        project_type,
        strategic_value: raw.strategic_value.map(|value| value.clamp(0.0, 100.0)),
    })
}

/// Models often wrap JSON in markdown code fences despite instructions.
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    for fence in ["```json", "```"] {
        if let Some(rest) = trimmed.strip_prefix(fence) {
            if let Some(end) = rest.find("```") {
                return rest[..end].trim();
            }
            return rest.trim();
        }
    }
    trimmed
}
