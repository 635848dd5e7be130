use super::{assistant_reply, LLMError, LLMProvider, Message, MessageRole};
use crate::config::GeminiConfig;
use crate::secrets::SecretString;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct GeminiProvider {
    config: GeminiConfig,
    api_key: SecretString,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(
        config: GeminiConfig,
        api_key: SecretString,
        timeout: Duration,
    ) -> super::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LLMError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    fn build_request(&self, system_instruction: &str, history: &[Message]) -> GeminiRequest {
        let mut system_parts = vec![GeminiPart {
            text: system_instruction.to_string(),
        }];
        let mut contents = Vec::with_capacity(history.len());

        for msg in history {
            match msg.role {
                // Gemini only takes one system instruction; fold extras into it
                MessageRole::System => system_parts.push(GeminiPart {
                    text: msg.content.clone(),
                }),
                MessageRole::Human | MessageRole::Assistant => contents.push(GeminiContent {
                    role: if msg.role == MessageRole::Assistant {
                        "model"
                    } else {
                        "user"
                    }
                    .to_string(),
                    parts: vec![GeminiPart {
                        text: msg.content.clone(),
                    }],
                }),
            }
        }

        GeminiRequest {
            system_instruction: GeminiSystemInstruction {
                parts: system_parts,
            },
            contents,
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
            },
        }
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn is_local(&self) -> bool {
        false
    }

    async fn check_health(&self) -> bool {
        let url = format!(
            "{}/models/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );
        matches!(
            self.client
                .get(&url)
                .header("x-goog-api-key", self.api_key.unsecure())
                .send()
                .await,
            Ok(resp) if resp.status().is_success()
        )
    }

    async fn generate(&self, system_instruction: &str, history: &[Message]) -> super::Result<Message> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );

        let payload = self.build_request(system_instruction, history);

        tracing::debug!(
            "Gemini request: model={}, contents={}",
            self.config.model,
            payload.contents.len()
        );

        let start = std::time::Instant::now();
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.unsecure())
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LLMError::Timeout
                } else if e.is_connect() {
                    LLMError::ProviderUnavailable(format!(
                        "Cannot connect to Gemini at {}",
                        self.config.base_url
                    ))
                } else {
                    LLMError::NetworkError(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                400 | 404 => LLMError::InvalidRequest(text),
                429 => LLMError::RateLimitExceeded,
                401 | 403 => LLMError::AuthenticationFailed(text),
                _ => LLMError::ProviderUnavailable(format!(
                    "Gemini API error ({}): {}",
                    status, text
                )),
            });
        }

        let data: GeminiResponse = response
            .json()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LLMError::Timeout
                } else {
                    LLMError::ParseError(e.to_string())
                }
            })?;

        tracing::info!(
            "Gemini response received in {:.1}s",
            start.elapsed().as_secs_f64()
        );

        let candidate = data
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::ParseError("No candidates in response".to_string()))?;

        let content = candidate
            .content
            .ok_or_else(|| LLMError::ParseError("No content in candidate".to_string()))?;

        let full_text: String = content
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect();

        assistant_reply(full_text)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    system_instruction: GeminiSystemInstruction,
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResContent {
    #[serde(default)]
    parts: Vec<GeminiResPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResPart {
    text: Option<String>,
}
