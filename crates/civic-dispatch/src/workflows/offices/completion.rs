//! OpenAI-compatible chat-completion backend for contact enrichment.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::domain::EnrichedContact;
use super::enrichment::{
    parse_enriched_contact, ContactEnricher, EnrichmentError, EnrichmentRequest,
};
use crate::config::CompletionConfig;

const SYSTEM_PROMPT: &str = "You look up official contact details for Sri Lankan government offices. Answer with a single JSON object and nothing else.";

pub struct ChatCompletionEnricher {
    endpoint: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl ChatCompletionEnricher {
    pub fn new(config: &CompletionConfig) -> Self {
        Self {
            endpoint: format!("{}/chat/completions", config.endpoint.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            client: reqwest::Client::new(),
        }
    }
}

impl std::fmt::Debug for ChatCompletionEnricher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionEnricher")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [CompletionMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct CompletionMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionReply,
}

#[derive(Deserialize)]
struct CompletionReply {
    content: Option<String>,
}

#[async_trait]
impl ContactEnricher for ChatCompletionEnricher {
    async fn enrich(
        &self,
        request: &EnrichmentRequest,
    ) -> Result<EnrichedContact, EnrichmentError> {
        let prompt = request.prompt();
        let body = CompletionRequest {
            model: &self.model,
            messages: [
                CompletionMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                CompletionMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: 0.0,
            max_tokens: 256,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| EnrichmentError::Unavailable(err.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| EnrichmentError::Unavailable(err.to_string()))?;

        if !status.is_success() {
            return Err(EnrichmentError::Unavailable(format!("HTTP {status}: {text}")));
        }

        let parsed: CompletionResponse = serde_json::from_str(&text)
            .map_err(|err| EnrichmentError::Malformed(err.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| EnrichmentError::Malformed("no completion choices".to_string()))?;

        parse_enriched_contact(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_is_normalized() {
        let enricher = ChatCompletionEnricher::new(&CompletionConfig {
            endpoint: "https://llm.internal/v1/".to_string(),
            api_key: "secret".to_string(),
            model: "gpt-4o-mini".to_string(),
        });
        assert_eq!(enricher.endpoint, "https://llm.internal/v1/chat/completions");
        assert!(!format!("{enricher:?}").contains("secret"));
    }
}
