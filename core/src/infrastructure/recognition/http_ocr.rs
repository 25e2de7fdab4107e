use base64::{Engine as _, engine::general_purpose};
use futures::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::domain::{
    common::entities::app_errors::CoreError,
    recognition::{
        entities::{BackendId, ImageInput, RecognitionCandidate, RegionLocator},
        ports::Recognizer,
    },
};

const DEFAULT_LINE_CONFIDENCE: f64 = 0.5;

/// OCR service reached over HTTP.
///
/// Posts `{"image": <base64>}` and expects `{"lines": [{"text", "confidence", "box"}]}`
/// where `box` is `[x, y, width, height]` relative to the image size.
#[derive(Debug, Clone)]
pub struct HttpOcrRecognizer {
    id: BackendId,
    endpoint: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct OcrRequest {
    image: String,
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    #[serde(default)]
    lines: Vec<OcrLine>,
}

#[derive(Debug, Deserialize)]
struct OcrLine {
    text: String,
    confidence: Option<f64>,
    #[serde(rename = "box")]
    bounding_box: Option<[f64; 4]>,
}

impl HttpOcrRecognizer {
    pub fn new(id: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            id: BackendId::new(id),
            endpoint: endpoint.into(),
            client: Client::new(),
        }
    }

    fn failure(&self, reason: String) -> CoreError {
        tracing::error!(backend = %self.id, "OCR request failed: {}", reason);
        CoreError::BackendFailure {
            backend: self.id.to_string(),
            reason,
        }
    }

    async fn call_ocr_service(&self, image: &ImageInput) -> Result<OcrResponse, CoreError> {
        let request = OcrRequest {
            image: general_purpose::STANDARD.encode(&image.bytes),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.failure(format!("request error: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(self.failure(format!("{} - {}", status, error_text)));
        }

        response
            .json()
            .await
            .map_err(|e| self.failure(format!("invalid response: {}", e)))
    }
}

fn candidates_from_response(backend: &BackendId, response: OcrResponse) -> Vec<RecognitionCandidate> {
    response
        .lines
        .into_iter()
        .filter(|line| !line.text.trim().is_empty())
        .map(|line| {
            let confidence = match line.confidence {
                // some engines report percentages
                Some(c) if c > 1.0 => c / 100.0,
                Some(c) => c,
                None => DEFAULT_LINE_CONFIDENCE,
            };
            let region = line
                .bounding_box
                .map(|[x, y, w, h]| RegionLocator::new(x, y, w, h))
                .unwrap_or_else(RegionLocator::whole_image);
            RecognitionCandidate::raw(backend.clone(), line.text, region, confidence)
        })
        .collect()
}

impl Recognizer for HttpOcrRecognizer {
    fn id(&self) -> BackendId {
        self.id.clone()
    }

    fn recognize<'a>(
        &'a self,
        image: &'a ImageInput,
    ) -> BoxFuture<'a, Result<Vec<RecognitionCandidate>, CoreError>> {
        Box::pin(async move {
            let response = self.call_ocr_service(image).await?;
            Ok(candidates_from_response(&self.id, response))
        })
    }
}
