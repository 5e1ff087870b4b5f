use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::models::Opportunity;
use crate::services::provider::{
    build_classification_prompt, parse_classification_content, ClassificationProvider,
    ProviderClassification, ProviderError, SYSTEM_PROMPT,
};

/// OpenAI chat-completions classification adapter. Works against any endpoint
/// speaking the same protocol.
pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_description_chars: usize,
}

impl OpenAiProvider {
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        max_description_chars: usize,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
            model,
            max_description_chars,
        }
    }
}

#[async_trait]
impl ClassificationProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn classify(
        &self,
        opportunity: &Opportunity,
        timeout: Duration,
    ) -> Result<ProviderClassification, ProviderError> {
        let url = format!(
            "{}/chat/completions",
            self.base_url.trim_end_matches('/')
        );

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                {
                    "role": "user",
                    "content": build_classification_prompt(opportunity, self.max_description_chars),
                },
            ],
            "temperature": 0.3,
            "max_tokens": 500,
        });

        tracing::debug!("Classifying {} via {}", opportunity.notice_id, url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(timeout)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::from_status(response.status()));
        }

        let payload: Value = response.json().await.map_err(|err| {
            ProviderError::MalformedResponse(format!("unreadable response body: {}", err))
        })?;

        let content = payload
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .ok_or_else(|| {
                ProviderError::MalformedResponse("missing message content".to_string())
            })?;

        parse_classification_content(content)
    }
}
