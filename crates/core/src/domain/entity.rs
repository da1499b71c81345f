// Clinical Entity Domain Model

use serde::{Deserialize, Serialize};

/// Closed enumeration of clinical entity categories.
///
/// Wire names match the upstream assessment vocabulary, including the
/// underscored multi-word categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Diagnosis,
    Symptom,
    Medication,
    #[serde(rename = "Risk_Behavior")]
    RiskBehavior,
    #[serde(rename = "Social_Context")]
    SocialContext,
    #[serde(rename = "Trauma_Event")]
    TraumaEvent,
    Strength,
    Procedure,
    Note,
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityType::Diagnosis => write!(f, "Diagnosis"),
            EntityType::Symptom => write!(f, "Symptom"),
            EntityType::Medication => write!(f, "Medication"),
            EntityType::RiskBehavior => write!(f, "Risk_Behavior"),
            EntityType::SocialContext => write!(f, "Social_Context"),
            EntityType::TraumaEvent => write!(f, "Trauma_Event"),
            EntityType::Strength => write!(f, "Strength"),
            EntityType::Procedure => write!(f, "Procedure"),
            EntityType::Note => write!(f, "Note"),
        }
    }
}

/// Character span of an entity within the source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityPosition {
    pub start: usize,
    pub end: usize,
}

/// A typed, confidence-scored span of clinical meaning extracted from
/// document text. Immutable once produced by a recognizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedEntity {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub text: String,
    /// Confidence in [0, 1]
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snomed_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icd10_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub umls_cui: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<EntityPosition>,
}

impl ExtractedEntity {
    pub fn new(entity_type: EntityType, text: impl Into<String>, confidence: f64) -> Self {
        Self {
            entity_type,
            text: text.into(),
            confidence,
            snomed_code: None,
            icd10_code: None,
            umls_cui: None,
            position: None,
        }
    }

    /// Attach clinical coding metadata where the recognizer supplied it
    pub fn with_codes(mut self, snomed: Option<&str>, icd10: Option<&str>) -> Self {
        self.snomed_code = snomed.map(str::to_string);
        self.icd10_code = icd10.map(str::to_string);
        self
    }
}
