// Stateless Analysis Service
// Synchronous entity recognition and domain mapping, usable without a job.

use crate::application::mapping;
use crate::domain::{DomainSuggestion, ExtractedEntity};
use crate::error::Result;
use crate::port::EntityRecognizer;
use std::sync::Arc;
use tracing::debug;

/// Analysis Service
pub struct AnalysisService {
    recognizer: Arc<dyn EntityRecognizer>,
    default_threshold: f64,
    include_umls: bool,
}

impl AnalysisService {
    pub fn new(
        recognizer: Arc<dyn EntityRecognizer>,
        default_threshold: f64,
        include_umls: bool,
    ) -> Self {
        Self {
            recognizer,
            default_threshold,
            include_umls,
        }
    }

    /// Recognize entities in free text, filtered by confidence threshold
    pub async fn recognize_entities(
        &self,
        text: &str,
        threshold: Option<f64>,
    ) -> Result<Vec<ExtractedEntity>> {
        let threshold = threshold.unwrap_or(self.default_threshold);
        let mut entities = self.recognizer.recognize(text, self.include_umls).await?;

        let before = entities.len();
        entities.retain(|e| e.confidence >= threshold);
        debug!(
            recognized = before,
            kept = entities.len(),
            threshold,
            "Recognized entities"
        );

        Ok(entities)
    }

    /// Map entities onto care-assessment domains (pure, no I/O)
    pub fn map_domains(&self, entities: &[ExtractedEntity]) -> Vec<DomainSuggestion> {
        mapping::map_to_domains(entities)
    }
}
