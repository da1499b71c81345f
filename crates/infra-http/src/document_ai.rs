// Document-AI Extraction Backend Client
// Resolves document bytes through the blob store, submits them to a
// processor selected by mime type, and averages per-page layout confidence
// into a single extraction score.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use carelens_core::port::{BlobStore, DocumentExtractor, ExtractedText, ExtractionError};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Confidence reported when the backend returns zero pages
const EMPTY_DOCUMENT_CONFIDENCE: f64 = 0.75;

#[derive(Debug, Clone)]
pub struct DocumentAiConfig {
    /// Base endpoint, e.g. `https://docai.internal/v1`
    pub endpoint: String,
    /// Processor used for PDF form parsing
    pub form_parser_processor: String,
    /// Processor used for generic OCR
    pub ocr_processor: String,
    /// When set, overrides mime-based processor selection entirely
    pub processor_override: Option<String>,
}

pub struct DocumentAiExtractor {
    client: Client,
    blob_store: Arc<dyn BlobStore>,
    config: DocumentAiConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProcessRequest {
    raw_document: RawDocument,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    content: String,
    mime_type: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProcessResponse {
    document: Option<ProcessedDocument>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ProcessedDocument {
    #[serde(default)]
    text: String,
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page {
    layout: Option<Layout>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Layout {
    confidence: Option<f64>,
}

impl DocumentAiExtractor {
    pub fn new(
        blob_store: Arc<dyn BlobStore>,
        config: DocumentAiConfig,
    ) -> Result<Self, ExtractionError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ExtractionError::BackendUnreachable(e.to_string()))?;
        Ok(Self {
            client,
            blob_store,
            config,
        })
    }

    fn select_processor(&self, document_type: &str) -> &str {
        if let Some(processor) = &self.config.processor_override {
            return processor;
        }
        if document_type == "application/pdf" {
            &self.config.form_parser_processor
        } else {
            &self.config.ocr_processor
        }
    }
}

/// Arithmetic mean of per-page layout confidence; never divides by zero
fn overall_confidence(pages: &[Page]) -> f64 {
    let confidences: Vec<f64> = pages
        .iter()
        .filter_map(|p| p.layout.as_ref().and_then(|l| l.confidence))
        .collect();

    if confidences.is_empty() {
        return EMPTY_DOCUMENT_CONFIDENCE;
    }
    confidences.iter().sum::<f64>() / confidences.len() as f64
}

#[async_trait]
impl DocumentExtractor for DocumentAiExtractor {
    async fn extract(
        &self,
        document_uri: &str,
        document_type: &str,
    ) -> Result<ExtractedText, ExtractionError> {
        let bytes = self
            .blob_store
            .fetch(document_uri)
            .await
            .map_err(|e| ExtractionError::DocumentFetch(e.to_string()))?;

        let processor = self.select_processor(document_type);
        let url = format!("{}/processors/{}:process", self.config.endpoint, processor);
        debug!(
            uri = %document_uri,
            processor = %processor,
            size = bytes.len(),
            "Submitting document for extraction"
        );

        let request = ProcessRequest {
            raw_document: RawDocument {
                content: BASE64.encode(&bytes),
                mime_type: document_type.to_string(),
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ExtractionError::BackendUnreachable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNSUPPORTED_MEDIA_TYPE || status == StatusCode::BAD_REQUEST {
            return Err(ExtractionError::UnsupportedDocumentType(
                document_type.to_string(),
            ));
        }
        if !status.is_success() {
            return Err(ExtractionError::Backend(format!("status {status}")));
        }

        let parsed: ProcessResponse = response
            .json()
            .await
            .map_err(|e| ExtractionError::MalformedResponse(e.to_string()))?;
        let document = parsed.document.unwrap_or_default();

        let confidence = overall_confidence(&document.pages);
        info!(
            uri = %document_uri,
            pages = document.pages.len(),
            confidence,
            "Document extracted"
        );

        Ok(ExtractedText {
            text: document.text,
            confidence,
        })
    }
}
