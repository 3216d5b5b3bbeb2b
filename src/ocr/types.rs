//! OCR Types
//!
//! Defines the normalized result shared by every OCR backend.

use serde::{Deserialize, Serialize};

/// Confidence estimate attached to OCR.space results (the API reports none)
pub const OCR_SPACE_CONFIDENCE: f64 = 0.85;

/// Confidence attached to Azure Computer Vision results ("High")
pub const AZURE_VISION_CONFIDENCE: f64 = 0.9;

/// Text stored for a prescription whose OCR produced nothing server-side
pub const FAILED_OCR_SENTINEL: &str = "OCR processing failed";

/// How the text of an upload was (or will be) recognized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OcrMethod {
    /// OCR.space API
    OcrSpace,
    /// Azure Computer Vision
    AzureVision,
    /// Recognition deferred to the browser
    ClientSide,
}

impl OcrMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OcrSpace => "ocr-space",
            Self::AzureVision => "azure-vision",
            Self::ClientSide => "client-side",
        }
    }
}

impl std::fmt::Display for OcrMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated image payload
#[derive(Debug, Clone, Copy)]
pub struct ImageInput<'a> {
    pub data: &'a [u8],
    pub mime_type: &'a str,
}

impl<'a> ImageInput<'a> {
    /// Check MIME type and size before any provider sees the bytes
    pub fn validate(data: &'a [u8], mime_type: &'a str, max_bytes: usize) -> Result<Self, OcrError> {
        if !mime_type.starts_with("image/") {
            return Err(OcrError::InvalidInput(format!(
                "Only image files are allowed (got {})",
                mime_type
            )));
        }

        if data.is_empty() {
            return Err(OcrError::InvalidInput("Image file is empty".to_string()));
        }

        if data.len() > max_bytes {
            return Err(OcrError::PayloadTooLarge {
                size: data.len(),
                max: max_bytes,
            });
        }

        Ok(Self { data, mime_type })
    }

    /// Encode as a `data:` URL
    pub fn data_url(&self) -> String {
        use base64::Engine;

        let encoded = base64::engine::general_purpose::STANDARD.encode(self.data);
        format!("data:{};base64,{}", self.mime_type, encoded)
    }
}

/// OCR result
#[derive(Debug, Clone, Serialize)]
pub struct OcrResult {
    /// Recognized text (empty for client-side)
    pub text: String,
    /// Confidence score (0-1)
    pub confidence: f64,
    /// Method used
    pub method: OcrMethod,
    /// Original bytes, returned only when recognition is deferred to the client
    #[serde(skip)]
    pub raw_image: Option<Vec<u8>>,
}

impl OcrResult {
    pub fn recognized(text: String, confidence: f64, method: OcrMethod) -> Self {
        Self {
            text,
            confidence,
            method,
            raw_image: None,
        }
    }

    pub fn client_side(image: &ImageInput<'_>) -> Self {
        Self {
            text: String::new(),
            confidence: 0.0,
            method: OcrMethod::ClientSide,
            raw_image: Some(image.data.to_vec()),
        }
    }

    pub fn is_client_side(&self) -> bool {
        self.method == OcrMethod::ClientSide
    }
}

/// OCR error types
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Image too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Request timed out")]
    Timeout,

    #[error("API error: {0}")]
    Api(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("No text found in response")]
    EmptyResult,
}

impl From<reqwest::Error> for OcrError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            OcrError::Timeout
        } else if err.is_decode() {
            OcrError::MalformedResponse(err.to_string())
        } else {
            OcrError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_non_images() {
        let result = ImageInput::validate(b"%PDF-1.7", "application/pdf", 1024);
        assert!(matches!(result, Err(OcrError::InvalidInput(_))));
    }

    #[test]
    fn test_validate_rejects_empty() {
        let result = ImageInput::validate(b"", "image/png", 1024);
        assert!(matches!(result, Err(OcrError::InvalidInput(_))));
    }

    #[test]
    fn test_validate_enforces_limit() {
        let data = vec![0u8; 2048];
        let result = ImageInput::validate(&data, "image/jpeg", 1024);
        assert!(matches!(
            result,
            Err(OcrError::PayloadTooLarge { size: 2048, max: 1024 })
        ));

        assert!(ImageInput::validate(&data, "image/jpeg", 2048).is_ok());
    }

    #[test]
    fn test_data_url() {
        let image = ImageInput::validate(b"abc", "image/png", 1024).unwrap();
        assert_eq!(image.data_url(), "data:image/png;base64,YWJj");
    }

    #[test]
    fn test_method_labels() {
        assert_eq!(OcrMethod::ClientSide.to_string(), "client-side");
        assert_eq!(
            serde_json::to_value(OcrMethod::AzureVision).unwrap(),
            serde_json::json!("azure-vision")
        );
    }
}
