//! Configuration management for the Pharmacy Assistant server

use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::orders::TransitionPolicy;

/// Default upload limit: 10MB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub uploads: UploadConfig,
    pub ocr: OcrConfig,
    pub orders: OrderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub max_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    pub ocr_space_api_key: Option<String>,
    pub ocr_space_url: String,
    pub azure_vision_key: Option<String>,
    pub azure_vision_endpoint: Option<String>,
    pub language: String,
    pub timeout_secs: u64,
}

impl OcrConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn ocr_space_configured(&self) -> bool {
        self.ocr_space_api_key.is_some()
    }

    pub fn azure_vision_configured(&self) -> bool {
        self.azure_vision_key.is_some() && self.azure_vision_endpoint.is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderConfig {
    pub transition_policy: TransitionPolicy,
}

/// Errors raised while reading configuration from the environment
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            database: DatabaseConfig {
                url: "sqlite:./pharmacy.db".to_string(),
            },
            uploads: UploadConfig {
                dir: PathBuf::from("./uploads"),
                max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            },
            ocr: OcrConfig {
                ocr_space_api_key: None,
                ocr_space_url: "https://api.ocr.space/parse/image".to_string(),
                azure_vision_key: None,
                azure_vision_endpoint: None,
                language: "eng".to_string(),
                timeout_secs: 30,
            },
            orders: OrderConfig {
                transition_policy: TransitionPolicy::Strict,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_var("SERVER_PORT", defaults.server.port)?,
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(defaults.database.url),
            },
            uploads: UploadConfig {
                dir: env::var("UPLOAD_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.uploads.dir),
                max_bytes: parse_var("MAX_UPLOAD_BYTES", defaults.uploads.max_bytes)?,
            },
            ocr: OcrConfig {
                ocr_space_api_key: non_empty_var("OCR_SPACE_API_KEY"),
                ocr_space_url: env::var("OCR_SPACE_URL").unwrap_or(defaults.ocr.ocr_space_url),
                azure_vision_key: non_empty_var("AZURE_VISION_KEY"),
                azure_vision_endpoint: non_empty_var("AZURE_VISION_ENDPOINT"),
                language: env::var("OCR_LANGUAGE").unwrap_or(defaults.ocr.language),
                timeout_secs: parse_var("OCR_TIMEOUT_SECS", defaults.ocr.timeout_secs)?,
            },
            orders: OrderConfig {
                transition_policy: parse_var(
                    "ORDER_TRANSITION_POLICY",
                    defaults.orders.transition_policy,
                )?,
            },
        })
    }
}

/// Read an optional variable, treating blank values as unset
fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        Err(_) => Ok(default),
    }
}
