use futures::future::BoxFuture;
use serde::Deserialize;

use crate::domain::{
    advisory::ports::LLMClient,
    common::entities::app_errors::CoreError,
    recognition::{
        entities::{BackendId, ImageInput, RecognitionCandidate, RegionLocator},
        ports::Recognizer,
        schema::get_label_recognition_schema,
    },
};

const LABEL_PROMPT: &str = "Read the food label or menu in this image. For every food item \
    list its name exactly as printed and its energy value exactly as printed, including the \
    unit (for example \"52 kcal\" or \"218 kJ\"). Give a confidence between 0 and 1 per item.";

#[derive(Debug, Deserialize)]
struct LabelResponse {
    #[serde(default)]
    items: Vec<LabelItem>,
}

#[derive(Debug, Deserialize)]
struct LabelItem {
    food_name: String,
    calories_text: String,
    #[serde(default)]
    confidence: f64,
}

/// Vision-capable LLM used as one more label reader.
///
/// It returns text in the same shape as an OCR line, so the shared normalizer parses it.
pub struct VisionLLMRecognizer<L: LLMClient> {
    id: BackendId,
    llm_client: L,
}

impl<L: LLMClient> VisionLLMRecognizer<L> {
    pub fn new(id: impl Into<String>, llm_client: L) -> Self {
        Self {
            id: BackendId::new(id),
            llm_client,
        }
    }
}

fn candidates_from_text(backend: &BackendId, raw: &str) -> Result<Vec<RecognitionCandidate>, CoreError> {
    let response: LabelResponse = serde_json::from_str(raw.trim()).map_err(|e| {
        tracing::error!(backend = %backend, "Failed to parse label response: {}", e);
        CoreError::BackendFailure {
            backend: backend.to_string(),
            reason: format!("invalid response: {}", e),
        }
    })?;

    Ok(response
        .items
        .into_iter()
        .filter(|item| !item.food_name.trim().is_empty())
        .map(|item| {
            RecognitionCandidate::raw(
                backend.clone(),
                format!("{} {}", item.food_name.trim(), item.calories_text.trim()),
                RegionLocator::whole_image(),
                item.confidence,
            )
        })
        .collect())
}

impl<L: LLMClient> Recognizer for VisionLLMRecognizer<L> {
    fn id(&self) -> BackendId {
        self.id.clone()
    }

    fn recognize<'a>(
        &'a self,
        image: &'a ImageInput,
    ) -> BoxFuture<'a, Result<Vec<RecognitionCandidate>, CoreError>> {
        Box::pin(async move {
            let raw = self
                .llm_client
                .generate_with_image(
                    LABEL_PROMPT.to_string(),
                    image.bytes.to_vec(),
                    get_label_recognition_schema(),
                )
                .await
                .map_err(|e| CoreError::BackendFailure {
                    backend: self.id.to_string(),
                    reason: e.to_string(),
                })?;
            candidates_from_text(&self.id, &raw)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedLLM(&'static str);

    impl LLMClient for CannedLLM {
        async fn generate_with_image(
            &self,
            _prompt: String,
            _image_data: Vec<u8>,
            _response_schema: serde_json::Value,
        ) -> Result<String, CoreError> {
            Ok(self.0.to_string())
        }

        async fn generate_with_text(
            &self,
            _prompt: String,
            _response_schema: serde_json::Value,
        ) -> Result<String, CoreError> {
            Err(CoreError::InternalServerError)
        }
    }

    #[tokio::test]
    async fn test_items_become_label_lines() {
        let recognizer = VisionLLMRecognizer::new(
            "vision",
            CannedLLM(r#"{"items": [{"food_name": "Apple", "calories_text": "52 kcal", "confidence": 0.8}]}"#),
        );
        let image = ImageInput::new(vec![0xFF, 0xD8, 0xFF]);

        let candidates = recognizer.recognize(&image).await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].raw_text, "Apple 52 kcal");
        assert_eq!(candidates[0].backend, BackendId::new("vision"));
        assert_eq!(candidates[0].confidence, 0.8);
    }

    #[tokio::test]
    async fn test_malformed_response_is_a_backend_failure() {
        let recognizer = VisionLLMRecognizer::new("vision", CannedLLM("sorry, I cannot"));
        let image = ImageInput::new(vec![1, 2, 3]);

        let result = recognizer.recognize(&image).await;
        assert!(matches!(result, Err(CoreError::BackendFailure { .. })));
    }
}
