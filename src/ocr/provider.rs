//! OCR Providers
//!
//! Defines the provider trait and the hosted OCR backends.

use async_trait::async_trait;
use serde::Deserialize;

use super::types::{
    ImageInput, OcrError, OcrMethod, OcrResult, AZURE_VISION_CONFIDENCE, OCR_SPACE_CONFIDENCE,
};

/// OCR provider trait
#[async_trait]
pub trait OcrProviderTrait: Send + Sync {
    /// Method label reported for results from this provider
    fn method(&self) -> OcrMethod;

    /// Human-readable name for logs
    fn name(&self) -> &'static str;

    /// Perform OCR on an image
    async fn recognize(&self, image: &ImageInput<'_>) -> Result<OcrResult, OcrError>;
}

// ============================================================================
// OCR.space
// ============================================================================

/// OCR.space hosted API
pub struct OcrSpaceProvider {
    client: reqwest::Client,
    api_key: String,
    url: String,
    language: String,
}

impl OcrSpaceProvider {
    pub fn new(client: reqwest::Client, api_key: &str, url: &str, language: &str) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
            url: url.to_string(),
            language: language.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcrSpaceResponse {
    #[serde(default)]
    parsed_results: Option<Vec<OcrSpaceParsedResult>>,
    #[serde(default)]
    is_errored_on_processing: bool,
    #[serde(default)]
    error_message: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcrSpaceParsedResult {
    #[serde(default)]
    parsed_text: Option<String>,
}

/// Pull the recognized text out of an OCR.space response body
fn ocr_space_text(response: OcrSpaceResponse) -> Result<String, OcrError> {
    if response.is_errored_on_processing {
        let message = match response.error_message {
            Some(serde_json::Value::String(s)) => s,
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join("; "),
            _ => "processing failed".to_string(),
        };
        return Err(OcrError::Api(message));
    }

    let text = response
        .parsed_results
        .and_then(|results| results.into_iter().next())
        .and_then(|first| first.parsed_text)
        .map(|t| t.trim().to_string())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(OcrError::EmptyResult);
    }

    Ok(text)
}

#[async_trait]
impl OcrProviderTrait for OcrSpaceProvider {
    fn method(&self) -> OcrMethod {
        OcrMethod::OcrSpace
    }

    fn name(&self) -> &'static str {
        "OCR.space"
    }

    async fn recognize(&self, image: &ImageInput<'_>) -> Result<OcrResult, OcrError> {
        let data_url = image.data_url();

        let form = [
            ("base64Image", data_url.as_str()),
            ("language", self.language.as_str()),
            ("isOverlayRequired", "false"),
            ("detectOrientation", "false"),
            ("scale", "true"),
            ("OCREngine", "2"),
        ];

        let response = self
            .client
            .post(&self.url)
            .header("apikey", &self.api_key)
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::Api(format!("OCR.space returned {}: {}", status, body)));
        }

        let body: OcrSpaceResponse = response.json().await?;
        let text = ocr_space_text(body)?;

        Ok(OcrResult::recognized(text, OCR_SPACE_CONFIDENCE, OcrMethod::OcrSpace))
    }
}

// ============================================================================
// Azure Computer Vision
// ============================================================================

/// Azure Computer Vision v3.2 OCR
pub struct AzureVisionProvider {
    client: reqwest::Client,
    key: String,
    endpoint: String,
}

impl AzureVisionProvider {
    pub fn new(client: reqwest::Client, key: &str, endpoint: &str) -> Self {
        Self {
            client,
            key: key.to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/vision/v3.2/ocr?language=en&detectOrientation=true",
            self.endpoint
        )
    }
}

#[derive(Debug, Deserialize)]
struct AzureOcrResponse {
    #[serde(default)]
    regions: Vec<AzureRegion>,
}

#[derive(Debug, Deserialize)]
struct AzureRegion {
    #[serde(default)]
    lines: Vec<AzureLine>,
}

#[derive(Debug, Deserialize)]
struct AzureLine {
    #[serde(default)]
    words: Vec<AzureWord>,
}

#[derive(Debug, Deserialize)]
struct AzureWord {
    text: String,
}

/// Words joined by spaces, lines and regions by newlines, in document order
fn azure_text(response: &AzureOcrResponse) -> Result<String, OcrError> {
    if response.regions.is_empty() {
        return Err(OcrError::EmptyResult);
    }

    let text = response
        .regions
        .iter()
        .map(|region| {
            region
                .lines
                .iter()
                .map(|line| {
                    line.words
                        .iter()
                        .map(|word| word.text.as_str())
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n");

    if text.trim().is_empty() {
        return Err(OcrError::EmptyResult);
    }

    Ok(text)
}

#[async_trait]
impl OcrProviderTrait for AzureVisionProvider {
    fn method(&self) -> OcrMethod {
        OcrMethod::AzureVision
    }

    fn name(&self) -> &'static str {
        "Azure Computer Vision"
    }

    async fn recognize(&self, image: &ImageInput<'_>) -> Result<OcrResult, OcrError> {
        let response = self
            .client
            .post(self.url())
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image.data.to_vec())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::Api(format!(
                "Azure Vision returned {}: {}",
                status, body
            )));
        }

        let body: AzureOcrResponse = response.json().await?;
        let text = azure_text(&body)?;

        Ok(OcrResult::recognized(text, AZURE_VISION_CONFIDENCE, OcrMethod::AzureVision))
    }
}

/// Mock provider for testing
#[cfg(test)]
pub struct MockProvider {
    pub method: OcrMethod,
    pub response: Result<String, fn() -> OcrError>,
    pub calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockProvider {
    pub fn succeeding(method: OcrMethod, text: &str) -> Self {
        Self {
            method,
            response: Ok(text.to_string()),
            calls: Default::default(),
        }
    }

    pub fn failing(method: OcrMethod, error: fn() -> OcrError) -> Self {
        Self {
            method,
            response: Err(error),
            calls: Default::default(),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl OcrProviderTrait for MockProvider {
    fn method(&self) -> OcrMethod {
        self.method
    }

    fn name(&self) -> &'static str {
        "mock"
    }

    async fn recognize(&self, _image: &ImageInput<'_>) -> Result<OcrResult, OcrError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        match &self.response {
            Ok(text) => Ok(OcrResult::recognized(text.clone(), 0.5, self.method)),
            Err(make_error) => Err(make_error()),
        }
    }
}
