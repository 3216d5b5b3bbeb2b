//! OCR Service
//!
//! Runs the configured providers in priority order and falls back to
//! client-side recognition when none of them produces text.

use std::sync::Arc;

use crate::config::OcrConfig;

use super::{
    provider::{AzureVisionProvider, OcrProviderTrait, OcrSpaceProvider},
    types::{ImageInput, OcrError, OcrMethod, OcrResult},
};

/// OCR service for prescription uploads
pub struct OcrService {
    providers: Vec<Arc<dyn OcrProviderTrait>>,
    max_image_bytes: usize,
}

impl OcrService {
    /// Create a service with an explicit provider chain
    pub fn new(providers: Vec<Arc<dyn OcrProviderTrait>>, max_image_bytes: usize) -> Self {
        Self {
            providers,
            max_image_bytes,
        }
    }

    /// Build the provider chain from configuration
    ///
    /// OCR.space is tried first, then Azure Computer Vision. Providers without
    /// credentials are left out entirely.
    pub fn from_config(config: &OcrConfig, max_image_bytes: usize) -> Result<Self, OcrError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| OcrError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        let mut providers: Vec<Arc<dyn OcrProviderTrait>> = Vec::new();

        if let Some(api_key) = &config.ocr_space_api_key {
            providers.push(Arc::new(OcrSpaceProvider::new(
                client.clone(),
                api_key,
                &config.ocr_space_url,
                &config.language,
            )));
        }

        if let (Some(key), Some(endpoint)) = (&config.azure_vision_key, &config.azure_vision_endpoint) {
            providers.push(Arc::new(AzureVisionProvider::new(client, key, endpoint)));
        }

        Ok(Self::new(providers, max_image_bytes))
    }

    /// Methods of the configured providers, in priority order
    pub fn configured_methods(&self) -> Vec<OcrMethod> {
        self.providers.iter().map(|p| p.method()).collect()
    }

    pub fn max_image_bytes(&self) -> usize {
        self.max_image_bytes
    }

    /// Extract text from an uploaded image
    ///
    /// Fails only on invalid input. Provider failures are logged and the next
    /// provider is tried; when every provider fails the result asks the
    /// client to recognize the image itself.
    pub async fn extract_text(&self, image_data: &[u8], mime_type: &str) -> Result<OcrResult, OcrError> {
        let image = ImageInput::validate(image_data, mime_type, self.max_image_bytes)?;

        let mut failures: Vec<(&'static str, OcrError)> = Vec::new();

        for provider in &self.providers {
            match provider.recognize(&image).await {
                Ok(result) if !result.text.trim().is_empty() => {
                    tracing::info!(
                        provider = provider.name(),
                        chars = result.text.len(),
                        "OCR text extracted"
                    );
                    return Ok(result);
                }
                Ok(_) => {
                    tracing::warn!(provider = provider.name(), "OCR provider returned no text, trying next");
                    failures.push((provider.name(), OcrError::EmptyResult));
                }
                Err(e) => {
                    tracing::warn!(
                        provider = provider.name(),
                        error = %e,
                        "OCR provider failed, trying next"
                    );
                    failures.push((provider.name(), e));
                }
            }
        }

        if failures.is_empty() {
            tracing::info!("No OCR provider configured, falling back to client-side OCR");
        } else {
            tracing::info!(
                failed = failures.len(),
                "All OCR providers failed, falling back to client-side OCR"
            );
        }

        Ok(OcrResult::client_side(&image))
    }
}
