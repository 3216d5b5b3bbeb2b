//! OCR Module
//!
//! Turns an uploaded prescription photo into text.
//!
//! Supports multiple backends, tried in order:
//! - OCR.space (hosted API, `OCR_SPACE_API_KEY`)
//! - Azure Computer Vision (hosted API, `AZURE_VISION_KEY` + `AZURE_VISION_ENDPOINT`)
//! - Client-side recognition (the browser receives the image back)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pharmacy_assistant_server::ocr::OcrService;
//!
//! let service = OcrService::from_config(&config.ocr, config.uploads.max_bytes)?;
//! let result = service.extract_text(&bytes, "image/jpeg").await?;
//! if result.is_client_side() {
//!     // hand result.raw_image back to the browser
//! }
//! ```

mod provider;
mod service;
mod types;

pub use provider::{AzureVisionProvider, OcrProviderTrait, OcrSpaceProvider};
pub use service::OcrService;
pub use types::{
    ImageInput, OcrError, OcrMethod, OcrResult, AZURE_VISION_CONFIDENCE, FAILED_OCR_SENTINEL,
    OCR_SPACE_CONFIDENCE,
};

#[cfg(test)]
pub(crate) use provider::MockProvider;
