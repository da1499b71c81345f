// Daemon Configuration
// Environment-variable driven, with local-development defaults. Backend
// selection (mock vs real) is resolved HERE, once, and nowhere else.

use anyhow::{Context, Result};

const DEFAULT_DB_PATH: &str = "carelens.db";
const DEFAULT_TOPIC: &str = "doc.jobs";
const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.6;
const DEFAULT_SALIENCE_THRESHOLD: f64 = 0.2;

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub queue_topic: String,
    /// Select the deterministic mock extraction/recognition backends
    pub use_mock_backends: bool,
    pub confidence_threshold: f64,
    pub include_umls: bool,

    // Real backend endpoints (required only when mocks are off)
    pub document_ai_endpoint: Option<String>,
    pub document_ai_form_parser: String,
    pub document_ai_ocr: String,
    pub document_ai_processor_override: Option<String>,
    pub healthcare_nl_endpoint: Option<String>,
    pub salience_threshold: f64,
}

impl Config {
    /// Load configuration from `CARELENS_*` environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            db_path: env_or("CARELENS_DB_PATH", DEFAULT_DB_PATH),
            queue_topic: env_or("CARELENS_QUEUE_TOPIC", DEFAULT_TOPIC),
            use_mock_backends: env_flag("CARELENS_USE_MOCK_BACKENDS", true),
            confidence_threshold: env_parsed(
                "CARELENS_CONFIDENCE_THRESHOLD",
                DEFAULT_CONFIDENCE_THRESHOLD,
            )?,
            include_umls: env_flag("CARELENS_INCLUDE_UMLS", false),
            document_ai_endpoint: std::env::var("CARELENS_DOCUMENT_AI_ENDPOINT").ok(),
            document_ai_form_parser: env_or("CARELENS_DOCUMENT_AI_FORM_PARSER", "form-parser"),
            document_ai_ocr: env_or("CARELENS_DOCUMENT_AI_OCR", "ocr"),
            document_ai_processor_override: std::env::var("CARELENS_DOCUMENT_AI_PROCESSOR").ok(),
            healthcare_nl_endpoint: std::env::var("CARELENS_HEALTHCARE_NL_ENDPOINT").ok(),
            salience_threshold: env_parsed(
                "CARELENS_SALIENCE_THRESHOLD",
                DEFAULT_SALIENCE_THRESHOLD,
            )?,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_flag(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(value) => matches!(value.as_str(), "1" | "true" | "yes"),
        Err(_) => default,
    }
}

fn env_parsed(key: &str, default: f64) -> Result<f64> {
    match std::env::var(key) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("invalid value for {key}: {value}")),
        Err(_) => Ok(default),
    }
}
