// Healthcare-NL Recognition Backend Client
// Maps the backend's native entity categories onto the closed EntityType
// enumeration, filters by salience, and attaches clinical codes.

use async_trait::async_trait;
use carelens_core::domain::{EntityPosition, EntityType, ExtractedEntity};
use carelens_core::port::{EntityRecognizer, RecognitionError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct HealthcareNlConfig {
    /// Base endpoint, e.g. `https://healthcare-nl.internal/v1`
    pub endpoint: String,
    /// Mentions whose reported salience falls below this are dropped
    pub salience_threshold: f64,
}

pub struct HealthcareNlRecognizer {
    client: Client,
    config: HealthcareNlConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest<'a> {
    document_content: &'a str,
    licensed_vocabularies: Vec<&'static str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeResponse {
    #[serde(default)]
    entity_mentions: Vec<EntityMention>,
}

// Coding metadata keys arrive snake_cased from the backend
#[derive(Deserialize)]
struct EntityMention {
    #[serde(rename = "type")]
    category: Option<String>,
    text: Option<MentionText>,
    confidence: Option<f64>,
    salience: Option<f64>,
    snomed_ct_concept_id: Option<String>,
    icd10_code: Option<String>,
    umls_cui: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MentionText {
    content: Option<String>,
    begin_offset: Option<usize>,
}

/// Fixed lookup from backend categories to the closed enumeration.
/// Unmapped categories are dropped.
fn map_category(category: &str) -> Option<EntityType> {
    match category {
        "PROBLEM" | "CONDITION" | "DIAGNOSIS" => Some(EntityType::Diagnosis),
        "SIGN_SYMPTOM" | "SYMPTOM" => Some(EntityType::Symptom),
        "MEDICINE" | "MEDICATION" => Some(EntityType::Medication),
        "RISK_BEHAVIOR" | "SUBSTANCE_ABUSE" => Some(EntityType::RiskBehavior),
        "SOCIAL_CONTEXT" | "SOCIAL_HISTORY" => Some(EntityType::SocialContext),
        "TRAUMA_EVENT" | "TRAUMA" => Some(EntityType::TraumaEvent),
        "STRENGTH" | "PROTECTIVE_FACTOR" => Some(EntityType::Strength),
        "PROCEDURE" => Some(EntityType::Procedure),
        _ => None,
    }
}

fn convert_mentions(
    mentions: Vec<EntityMention>,
    include_umls: bool,
    salience_threshold: f64,
) -> Vec<ExtractedEntity> {
    let mut entities = Vec::new();

    for mention in mentions {
        let Some(entity_type) = mention.category.as_deref().and_then(map_category) else {
            continue;
        };
        if mention
            .salience
            .is_some_and(|salience| salience < salience_threshold)
        {
            continue;
        }
        let Some(text) = mention.text else {
            continue;
        };
        let Some(content) = text.content else {
            continue;
        };

        let mut entity =
            ExtractedEntity::new(entity_type, &content, mention.confidence.unwrap_or(0.0))
                .with_codes(
                    mention.snomed_ct_concept_id.as_deref(),
                    mention.icd10_code.as_deref(),
                );
        if include_umls {
            entity.umls_cui = mention.umls_cui;
        }
        entity.position = text.begin_offset.map(|start| EntityPosition {
            start,
            end: start + content.len(),
        });

        entities.push(entity);
    }

    entities
}

impl HealthcareNlRecognizer {
    pub fn new(config: HealthcareNlConfig) -> Result<Self, RecognitionError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RecognitionError::BackendUnreachable(e.to_string()))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl EntityRecognizer for HealthcareNlRecognizer {
    async fn recognize(
        &self,
        text: &str,
        include_umls: bool,
    ) -> Result<Vec<ExtractedEntity>, RecognitionError> {
        let url = format!("{}/nlp:analyzeEntities", self.config.endpoint);
        let request = AnalyzeRequest {
            document_content: text,
            licensed_vocabularies: vec!["SNOMEDCT_US", "ICD10CM"],
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RecognitionError::BackendUnreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RecognitionError::Backend(format!("status {status}")));
        }

        let parsed: AnalyzeResponse = response
            .json()
            .await
            .map_err(|e| RecognitionError::MalformedResponse(e.to_string()))?;

        let entities = convert_mentions(
            parsed.entity_mentions,
            include_umls,
            self.config.salience_threshold,
        );
        debug!(count = entities.len(), "Recognized entities from backend");

        Ok(entities)
    }
}
