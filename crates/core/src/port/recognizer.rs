// Entity Recognition Port
// Abstraction over clinical NLP backends: deterministic keyword matcher or a
// Healthcare-NL-style service selected once at composition time.

use crate::domain::{EntityType, ExtractedEntity};
use async_trait::async_trait;
use thiserror::Error;

/// Recognition failures
#[derive(Error, Debug)]
pub enum RecognitionError {
    #[error("Recognition backend unreachable: {0}")]
    BackendUnreachable(String),

    #[error("Recognition backend rejected request: {0}")]
    Backend(String),

    #[error("Malformed backend response: {0}")]
    MalformedResponse(String),
}

/// Entity Recognizer trait
///
/// Implementations:
/// - `KeywordRecognizer`: deterministic keyword matcher (local/dev/test)
/// - `HealthcareNlRecognizer` (infra-http): real clinical NLP backend
///
/// Callers filter the returned list by a confidence threshold before
/// using it further; recognizers themselves do not apply the threshold.
#[async_trait]
pub trait EntityRecognizer: Send + Sync {
    async fn recognize(
        &self,
        text: &str,
        include_umls: bool,
    ) -> Result<Vec<ExtractedEntity>, RecognitionError>;
}

/// Deterministic keyword matcher used when no NLP backend is configured.
///
/// Scans lowercase text for fixed keyword sets per entity category and emits
/// one entity per matched category with a fixed, hardcoded confidence.
/// Identical text always yields the identical entity list. If any diagnosis
/// matched, a fixed medication entity is appended as well; with no matches at
/// all a single low-confidence Note entity is emitted, so this path never
/// returns an empty list.
pub struct KeywordRecognizer;

fn matches_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

#[async_trait]
impl EntityRecognizer for KeywordRecognizer {
    async fn recognize(
        &self,
        text: &str,
        _include_umls: bool,
    ) -> Result<Vec<ExtractedEntity>, RecognitionError> {
        let lower = text.to_lowercase();
        let mut entities = Vec::new();

        if lower.contains("depress") {
            entities.push(
                ExtractedEntity::new(EntityType::Diagnosis, "Major Depressive Disorder", 0.92)
                    .with_codes(Some("370143000"), Some("F32.9")),
            );
        }

        if matches_any(&lower, &["anxiet", "anxious", "worry"]) {
            entities.push(
                ExtractedEntity::new(EntityType::Diagnosis, "Generalized Anxiety Disorder", 0.89)
                    .with_codes(Some("48694002"), Some("F41.1")),
            );
        }

        if matches_any(&lower, &["sleep", "insomnia"]) {
            entities.push(
                ExtractedEntity::new(EntityType::Symptom, "Insomnia", 0.87)
                    .with_codes(Some("193462001"), None),
            );
        }

        if matches_any(&lower, &["alcohol", "drink", "substance", "drug"]) {
            entities.push(ExtractedEntity::new(
                EntityType::RiskBehavior,
                "Substance use",
                0.82,
            ));
        }

        if matches_any(&lower, &["home", "house", "housing", "homeless"]) {
            entities.push(ExtractedEntity::new(
                EntityType::SocialContext,
                "Housing instability",
                0.85,
            ));
        }

        if matches_any(&lower, &["trauma", "abuse", "neglect"]) {
            entities.push(ExtractedEntity::new(
                EntityType::TraumaEvent,
                "History of trauma",
                0.79,
            ));
        }

        if matches_any(&lower, &["suicid", "harm", "ideation"]) {
            entities.push(ExtractedEntity::new(
                EntityType::RiskBehavior,
                "Suicidal ideation",
                0.78,
            ));
        }

        // Fixed mock heuristic, preserved verbatim for test reproducibility:
        // any diagnosis implies one medication entity.
        if entities
            .iter()
            .any(|e| e.entity_type == EntityType::Diagnosis)
        {
            entities.push(ExtractedEntity::new(
                EntityType::Medication,
                "Sertraline 50mg daily",
                0.92,
            ));
        }

        if entities.is_empty() {
            entities.push(ExtractedEntity::new(
                EntityType::Note,
                "No specific entities detected",
                0.7,
            ));
        }

        Ok(entities)
    }
}

pub mod mocks {
    use super::*;

    /// Recognizer that always fails (failure-path tests)
    pub struct FailingRecognizer;

    #[async_trait]
    impl EntityRecognizer for FailingRecognizer {
        async fn recognize(
            &self,
            _text: &str,
            _include_umls: bool,
        ) -> Result<Vec<ExtractedEntity>, RecognitionError> {
            Err(RecognitionError::BackendUnreachable(
                "mock backend down".to_string(),
            ))
        }
    }

    /// Recognizer that returns a caller-supplied entity list
    pub struct StaticRecognizer {
        entities: Vec<ExtractedEntity>,
    }

    impl StaticRecognizer {
        pub fn new(entities: Vec<ExtractedEntity>) -> Self {
            Self { entities }
        }
    }

    #[async_trait]
    impl EntityRecognizer for StaticRecognizer {
        async fn recognize(
            &self,
            _text: &str,
            _include_umls: bool,
        ) -> Result<Vec<ExtractedEntity>, RecognitionError> {
            Ok(self.entities.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn identical_text_yields_identical_entities() {
        let recognizer = KeywordRecognizer;
        let text = "Reports depression, poor sleep, and housing concerns.";

        let first = recognizer.recognize(text, false).await.unwrap();
        let second = recognizer.recognize(text, false).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn scenario_text_yields_expected_categories() {
        let recognizer = KeywordRecognizer;
        let entities = recognizer
            .recognize(
                "Patient reports depression and anxiety with ongoing insomnia.",
                false,
            )
            .await
            .unwrap();

        let types: Vec<EntityType> = entities.iter().map(|e| e.entity_type).collect();
        assert_eq!(
            types,
            vec![
                EntityType::Diagnosis,
                EntityType::Diagnosis,
                EntityType::Symptom,
                EntityType::Medication,
            ]
        );
        assert_eq!(entities[0].text, "Major Depressive Disorder");
        assert_eq!(entities[0].confidence, 0.92);
        assert_eq!(entities[1].text, "Generalized Anxiety Disorder");
        assert_eq!(entities[1].confidence, 0.89);
        assert_eq!(entities[2].text, "Insomnia");
        assert_eq!(entities[3].text, "Sertraline 50mg daily");
        assert_eq!(entities[3].confidence, 0.92);
    }

    #[tokio::test]
    async fn medication_requires_a_diagnosis_match() {
        let recognizer = KeywordRecognizer;
        let entities = recognizer
            .recognize("Patient lost housing last month.", false)
            .await
            .unwrap();

        assert!(entities
            .iter()
            .all(|e| e.entity_type != EntityType::Medication));
    }

    #[tokio::test]
    async fn empty_text_yields_single_note_entity() {
        let recognizer = KeywordRecognizer;
        let entities = recognizer.recognize("", false).await.unwrap();

        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].entity_type, EntityType::Note);
        assert_eq!(entities[0].text, "No specific entities detected");
        assert_eq!(entities[0].confidence, 0.7);
    }

    #[tokio::test]
    async fn matching_is_case_insensitive() {
        let recognizer = KeywordRecognizer;
        let entities = recognizer
            .recognize("DEPRESSION with SUICIDAL ideation", false)
            .await
            .unwrap();

        assert!(entities.iter().any(|e| e.text == "Major Depressive Disorder"));
        assert!(entities.iter().any(|e| e.text == "Suicidal ideation"));
    }
}
