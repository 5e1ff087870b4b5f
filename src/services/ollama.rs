use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::models::Opportunity;
use crate::services::provider::{
    build_classification_prompt, parse_classification_content, ClassificationProvider,
    ProviderClassification, ProviderError, SYSTEM_PROMPT,
};

/// Ollama classification adapter for locally hosted models, speaking the
/// native `/api/chat` protocol. No credentials involved.
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
    max_description_chars: usize,
}

impl OllamaProvider {
    pub fn new(base_url: String, model: String, max_description_chars: usize) -> Self {
        Self {
            client: Client::new(),
            base_url,
            model,
            max_description_chars,
        }
    }
}

#[async_trait]
impl ClassificationProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn classify(
        &self,
        opportunity: &Opportunity,
        timeout: Duration,
    ) -> Result<ProviderClassification, ProviderError> {
        let url = format!("{}/api/chat", self.base_url.trim_end_matches('/'));

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                {
                    "role": "user",
                    "content": build_classification_prompt(opportunity, self.max_description_chars),
                },
            ],
            "stream": false,
            "format": "json",
            "options": { "temperature": 0.3 },
        });

        tracing::debug!("Classifying {} via {}", opportunity.notice_id, url);

        let response = self
            .client
            .post(&url)
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
            .get("message")
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .ok_or_else(|| {
                ProviderError::MalformedResponse("missing message content".to_string())
            })?;

        parse_classification_content(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Domain, ProjectType};

    fn opportunity() -> Opportunity {
        Opportunity {
            notice_id: "N0002".to_string(),
            title: "Help desk services".to_string(),
            description: "Tier 1 and 2 help desk support for the bureau.".to_string(),
            agency: "DHS".to_string(),
            naics: vec![],
            set_aside: None,
            contract_type: None,
            posted_date: None,
            due_date: None,
        }
    }

    fn provider(base_url: String) -> OllamaProvider {
        OllamaProvider::new(base_url, "llama2".to_string(), 2000)
    }

    fn chat_body(content: &str) -> String {
        serde_json::to_string(&serde_json::json!({
            "model": "llama2",
            "message": { "role": "assistant", "content": content },
            "done": true
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_classify_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/chat")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(chat_body(
                r#"{"primary_domain": "IT Operations", "complexity": "Low", "project_type": "Operations"}"#,
            ))
            .create_async()
            .await;

        let result = provider(server.url())
            .classify(&opportunity(), Duration::from_secs(5))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result.primary_domain, Domain::ItOperations);
        assert_eq!(result.project_type, ProjectType::Operations);
        assert_eq!(result.strategic_value, None);
    }

    #[tokio::test]
    async fn test_classify_unreachable_model_is_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/chat")
            .with_status(404)
            .create_async()
            .await;

        let err = provider(server.url())
            .classify(&opportunity(), Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_classify_malformed_content() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/chat")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(chat_body("not json at all"))
            .create_async()
            .await;

        let err = provider(server.url())
            .classify(&opportunity(), Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::MalformedResponse(_)));
    }
}
