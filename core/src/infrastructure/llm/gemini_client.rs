use std::time::Duration;

use base64::{Engine as _, engine::general_purpose};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, instrument};

use crate::domain::{
    advisory::ports::LLMClient,
    common::{LLMConfig, entities::app_errors::CoreError},
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ERROR_BODY: usize = 512;

/// `generateContent` client constrained to JSON output.
#[derive(Debug, Clone)]
pub struct GeminiLLMClient {
    api_key: String,
    endpoint: String,
    client: Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart {
    Text {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    Image { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateResponse {
    /// Text of the first candidate, with its parts joined.
    fn into_text(self) -> Result<String, CoreError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(CoreError::ExternalServiceError(format!(
                "LLM blocked the prompt: {}",
                reason
            )));
        }

        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(CoreError::ExternalServiceError(
                "LLM returned no content".to_string(),
            ));
        }
        Ok(text)
    }
}

impl GeminiLLMClient {
    pub fn new(config: &LLMConfig) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                error!("failed to build LLM HTTP client, using defaults: {}", e);
                Client::new()
            });

        Self {
            api_key: config.gemini_api_key.clone(),
            endpoint: format!(
                "{}/models/{}:generateContent",
                config.gemini_base_url.trim_end_matches('/'),
                config.gemini_model
            ),
            client,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn request(parts: Vec<RequestPart>, response_schema: Value) -> GenerateRequest {
        GenerateRequest {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema,
            },
        }
    }

    #[instrument(skip_all, fields(endpoint = %self.endpoint))]
    async fn generate(&self, request: GenerateRequest) -> Result<String, CoreError> {
        if !self.is_configured() {
            return Err(CoreError::ExternalServiceError(
                "LLM API key is not configured".to_string(),
            ));
        }

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("LLM request failed: {}", e);
                CoreError::ExternalServiceError(format!("LLM request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|i| body.is_char_boundary(*i))
                    .unwrap_or(0);
                body.truncate(cut);
            }
            error!(%status, "LLM returned an error: {}", body);
            return Err(CoreError::ExternalServiceError(format!(
                "LLM returned {}: {}",
                status, body
            )));
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            error!("failed to decode LLM response: {}", e);
            CoreError::ExternalServiceError(format!("failed to decode LLM response: {}", e))
        })?;
        let text = parsed.into_text()?;
        debug!(chars = text.len(), "LLM response received");

        Ok(text)
    }
}

impl LLMClient for GeminiLLMClient {
    async fn generate_with_image(
        &self,
        prompt: String,
        image_data: Vec<u8>,
        response_schema: Value,
    ) -> Result<String, CoreError> {
        let image = RequestPart::Image {
            inline_data: InlineData {
                mime_type: sniff_image_mime(&image_data),
                data: general_purpose::STANDARD.encode(&image_data),
            },
        };
        let request = Self::request(vec![RequestPart::Text { text: prompt }, image], response_schema);

        self.generate(request).await
    }

    async fn generate_with_text(
        &self,
        prompt: String,
        response_schema: Value,
    ) -> Result<String, CoreError> {
        let request = Self::request(vec![RequestPart::Text { text: prompt }], response_schema);

        self.generate(request).await
    }
}

/// Image type from the leading magic bytes; JPEG when unknown.
fn sniff_image_mime(data: &[u8]) -> &'static str {
    match data {
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "image/jpeg",
    }
}
