// Domain Mapping Engine
// Pure function: typed entities -> ordered care-assessment domain
// suggestions with synthesized content and count-boosted confidence.

use crate::application::mapping::confidence::{aggregate_with_count_boost, default_weights};
use crate::domain::{DomainSuggestion, DomainType, EntityType, ExtractedEntity, Severity};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

/// Confidence of the fallback suggestion emitted when nothing matched
const FALLBACK_CONFIDENCE: f64 = 0.5;

/// Diagnosis qualifiers that force SEVERE regardless of other signal
const SEVERE_QUALIFIERS: [&str; 3] = ["severe", "major", "acute"];

/// Map a flat entity set onto the assessment domains.
///
/// Output order is fixed and caller-observable (display priority):
/// PRESENTING_PROBLEM, BEHAVIORAL_HEALTH_HISTORY, RISK_ASSESSMENT,
/// SOCIAL_DETERMINANTS, TRAUMA, STRENGTHS. A domain is present only when at
/// least one qualifying entity type is; when nothing qualifies at all, a
/// single fallback PRESENTING_PROBLEM suggestion is emitted instead, so the
/// result is never empty.
pub fn map_to_domains(entities: &[ExtractedEntity]) -> Vec<DomainSuggestion> {
    let weights = default_weights();

    let diagnoses = of_type(entities, EntityType::Diagnosis);
    let symptoms = of_type(entities, EntityType::Symptom);
    let medications = of_type(entities, EntityType::Medication);
    let risk_behaviors = of_type(entities, EntityType::RiskBehavior);
    let social_contexts = of_type(entities, EntityType::SocialContext);
    let trauma_events = of_type(entities, EntityType::TraumaEvent);
    let strengths = of_type(entities, EntityType::Strength);

    let mut domains = Vec::new();

    if !diagnoses.is_empty() || !symptoms.is_empty() {
        let mut content = Map::new();
        content.insert(
            "description".to_string(),
            json!(describe_presentation(&diagnoses, &symptoms)),
        );
        content.insert(
            "severity".to_string(),
            json!(determine_severity(entities).as_str()),
        );
        content.insert("duration".to_string(), json!("Unknown"));
        content.insert("impact".to_string(), json!("Impacts daily functioning"));

        let mut triggering = diagnoses.clone();
        triggering.extend(symptoms.clone());
        domains.push(suggestion(
            DomainType::PresentingProblem,
            content,
            triggering,
            &weights,
        ));
    }

    if !medications.is_empty() {
        let mut content = Map::new();
        content.insert("previousTreatment".to_string(), json!("Unknown"));
        content.insert(
            "medications".to_string(),
            json!(texts_of(&medications)),
        );
        content.insert("hospitalizations".to_string(), json!("None documented"));

        domains.push(suggestion(
            DomainType::BehavioralHealthHistory,
            content,
            medications,
            &weights,
        ));
    }

    if !risk_behaviors.is_empty() {
        let mut content = Map::new();
        content.insert(
            "suicideRisk".to_string(),
            presence(any_text_contains(&risk_behaviors, "suicid")),
        );
        content.insert("homicideRisk".to_string(), json!("Not documented"));
        content.insert(
            "selfHarmHistory".to_string(),
            presence(any_text_contains(&risk_behaviors, "harm")),
        );
        content.insert(
            "substanceUse".to_string(),
            presence(any_text_contains(&risk_behaviors, "substance")),
        );

        domains.push(suggestion(
            DomainType::RiskAssessment,
            content,
            risk_behaviors,
            &weights,
        ));
    }

    if !social_contexts.is_empty() {
        let housing = if any_text_contains(&social_contexts, "housing") {
            "Unstable"
        } else {
            "Unknown"
        };

        let mut content = Map::new();
        content.insert("housing".to_string(), json!(housing));
        content.insert("employment".to_string(), json!("Unknown"));
        content.insert("education".to_string(), json!("Unknown"));
        content.insert("transportation".to_string(), json!("Unknown"));
        content.insert("socialSupport".to_string(), json!("Unknown"));

        domains.push(suggestion(
            DomainType::SocialDeterminants,
            content,
            social_contexts,
            &weights,
        ));
    }

    if !trauma_events.is_empty() {
        // Presence-only signal, no sub-classification
        let mut content = Map::new();
        content.insert("traumaHistory".to_string(), json!("Present"));
        content.insert("traumaType".to_string(), json!("Unspecified"));
        content.insert(
            "traumaImpact".to_string(),
            json!("Impacts current functioning"),
        );

        domains.push(suggestion(
            DomainType::Trauma,
            content,
            trauma_events,
            &weights,
        ));
    }

    if !strengths.is_empty() {
        let mut content = Map::new();
        content.insert(
            "personalStrengths".to_string(),
            json!(texts_of(&strengths)),
        );
        content.insert("supportSystems".to_string(), json!("Unknown"));
        content.insert("coping".to_string(), json!("Unknown"));

        domains.push(suggestion(
            DomainType::Strengths,
            content,
            strengths,
            &weights,
        ));
    }

    if domains.is_empty() {
        domains.push(fallback_suggestion());
    }

    domains
}

/// Derive the presenting-problem severity from the full entity set, not
/// just the diagnoses and symptoms that triggered the domain.
pub fn determine_severity(entities: &[ExtractedEntity]) -> Severity {
    let high_confidence_count = entities.iter().filter(|e| e.confidence > 0.9).count();

    let has_severe_diagnosis = entities.iter().any(|e| {
        e.entity_type == EntityType::Diagnosis && {
            let text = e.text.to_lowercase();
            SEVERE_QUALIFIERS.iter().any(|q| text.contains(q))
        }
    });

    let has_risk_behavior = entities
        .iter()
        .any(|e| e.entity_type == EntityType::RiskBehavior);

    if has_severe_diagnosis || (high_confidence_count >= 3 && has_risk_behavior) {
        Severity::Severe
    } else if high_confidence_count >= 2 || has_risk_behavior {
        Severity::Moderate
    } else {
        Severity::Mild
    }
}

fn of_type(entities: &[ExtractedEntity], entity_type: EntityType) -> Vec<ExtractedEntity> {
    entities
        .iter()
        .filter(|e| e.entity_type == entity_type)
        .cloned()
        .collect()
}

fn texts_of(entities: &[ExtractedEntity]) -> Vec<String> {
    entities.iter().map(|e| e.text.clone()).collect()
}

fn any_text_contains(entities: &[ExtractedEntity], needle: &str) -> bool {
    entities
        .iter()
        .any(|e| e.text.to_lowercase().contains(needle))
}

fn presence(present: bool) -> Value {
    if present {
        json!("Present")
    } else {
        json!("Not documented")
    }
}

fn describe_presentation(
    diagnoses: &[ExtractedEntity],
    symptoms: &[ExtractedEntity],
) -> String {
    let diagnosis_list = texts_of(diagnoses).join(", ");
    let symptom_list = texts_of(symptoms).join(", ");

    match (diagnoses.is_empty(), symptoms.is_empty()) {
        (false, false) => format!(
            "Patient presents with {diagnosis_list}, with symptoms including {symptom_list}."
        ),
        (false, true) => format!("Patient presents with {diagnosis_list}."),
        (true, false) => format!("Patient presents with symptoms including {symptom_list}."),
        (true, true) => "Patient presents with unspecified concerns.".to_string(),
    }
}

fn suggestion(
    domain_type: DomainType,
    content: Map<String, Value>,
    triggering: Vec<ExtractedEntity>,
    weights: &HashMap<EntityType, f64>,
) -> DomainSuggestion {
    let confidence = aggregate_with_count_boost(&triggering, weights);
    DomainSuggestion {
        domain_type,
        content,
        confidence,
        sources: None,
        entities: Some(triggering),
    }
}

fn fallback_suggestion() -> DomainSuggestion {
    let mut content = Map::new();
    content.insert(
        "description".to_string(),
        json!("Insufficient information to determine presenting problem"),
    );
    content.insert("severity".to_string(), json!("Unknown"));
    content.insert("duration".to_string(), json!("Unknown"));
    content.insert("impact".to_string(), json!("Unknown"));

    DomainSuggestion {
        domain_type: DomainType::PresentingProblem,
        content,
        confidence: FALLBACK_CONFIDENCE,
        sources: None,
        entities: Some(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::mapping::CONFIDENCE_CAP;

    fn entity(entity_type: EntityType, text: &str, confidence: f64) -> ExtractedEntity {
        ExtractedEntity::new(entity_type, text, confidence)
    }

    /// The mock recognizer's output for "depression and anxiety... insomnia"
    fn scenario_a_entities() -> Vec<ExtractedEntity> {
        vec![
            entity(EntityType::Diagnosis, "Major Depressive Disorder", 0.92),
            entity(EntityType::Diagnosis, "Generalized Anxiety Disorder", 0.89),
            entity(EntityType::Symptom, "Insomnia", 0.87),
            entity(EntityType::Medication, "Sertraline 50mg daily", 0.92),
        ]
    }

    #[test]
    fn never_returns_an_empty_list() {
        assert!(!map_to_domains(&[]).is_empty());

        let unmatched = vec![entity(EntityType::Note, "No specific entities detected", 0.7)];
        assert!(!map_to_domains(&unmatched).is_empty());
    }

    #[test]
    fn scenario_a_produces_presenting_problem_and_history() {
        let domains = map_to_domains(&scenario_a_entities());

        let types: Vec<DomainType> = domains.iter().map(|d| d.domain_type).collect();
        assert_eq!(
            types,
            vec![
                DomainType::PresentingProblem,
                DomainType::BehavioralHealthHistory,
            ]
        );

        let presenting = &domains[0];
        assert_eq!(
            presenting.content["description"],
            "Patient presents with Major Depressive Disorder, Generalized Anxiety Disorder, \
             with symptoms including Insomnia."
        );
        // "Major Depressive Disorder" carries a severe qualifier
        assert_eq!(presenting.content["severity"], "SEVERE");
        assert_eq!(presenting.entities.as_ref().unwrap().len(), 3);

        let history = &domains[1];
        assert_eq!(
            history.content["medications"],
            json!(["Sertraline 50mg daily"])
        );
        assert_eq!(history.entities.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn scenario_b_note_only_yields_the_fallback() {
        let note = vec![entity(EntityType::Note, "No specific entities detected", 0.7)];
        let domains = map_to_domains(&note);

        assert_eq!(domains.len(), 1);
        assert_eq!(domains[0].domain_type, DomainType::PresentingProblem);
        assert_eq!(domains[0].confidence, 0.5);
        assert_eq!(
            domains[0].content["description"],
            "Insufficient information to determine presenting problem"
        );
        assert_eq!(domains[0].entities.as_ref().unwrap().len(), 0);
    }

    #[test]
    fn domains_appear_in_fixed_display_order() {
        let entities = vec![
            entity(EntityType::Strength, "Strong family support", 0.8),
            entity(EntityType::TraumaEvent, "History of trauma", 0.79),
            entity(EntityType::SocialContext, "Housing instability", 0.85),
            entity(EntityType::RiskBehavior, "Substance use", 0.82),
            entity(EntityType::Medication, "Sertraline 50mg daily", 0.92),
            entity(EntityType::Symptom, "Insomnia", 0.87),
        ];

        let types: Vec<DomainType> = map_to_domains(&entities)
            .iter()
            .map(|d| d.domain_type)
            .collect();
        assert_eq!(
            types,
            vec![
                DomainType::PresentingProblem,
                DomainType::BehavioralHealthHistory,
                DomainType::RiskAssessment,
                DomainType::SocialDeterminants,
                DomainType::Trauma,
                DomainType::Strengths,
            ]
        );
    }

    #[test]
    fn risk_assessment_flags_follow_entity_texts() {
        let entities = vec![
            entity(EntityType::RiskBehavior, "Suicidal ideation", 0.78),
            entity(EntityType::RiskBehavior, "Substance use", 0.82),
        ];

        let domains = map_to_domains(&entities);
        assert_eq!(domains.len(), 1);

        let risk = &domains[0];
        assert_eq!(risk.domain_type, DomainType::RiskAssessment);
        assert_eq!(risk.content["suicideRisk"], "Present");
        assert_eq!(risk.content["substanceUse"], "Present");
        assert_eq!(risk.content["selfHarmHistory"], "Not documented");
        assert_eq!(risk.content["homicideRisk"], "Not documented");
    }

    #[test]
    fn housing_mention_marks_housing_unstable() {
        let entities = vec![entity(EntityType::SocialContext, "Housing instability", 0.85)];
        let domains = map_to_domains(&entities);
        assert_eq!(domains[0].content["housing"], "Unstable");

        let entities = vec![entity(EntityType::SocialContext, "Limited social support", 0.8)];
        let domains = map_to_domains(&entities);
        assert_eq!(domains[0].content["housing"], "Unknown");
    }

    #[test]
    fn symptoms_only_phrasing() {
        let entities = vec![entity(EntityType::Symptom, "Insomnia", 0.87)];
        let domains = map_to_domains(&entities);
        assert_eq!(
            domains[0].content["description"],
            "Patient presents with symptoms including Insomnia."
        );
    }

    #[test]
    fn domain_confidence_stays_within_bounds() {
        let entities: Vec<_> = (0..12)
            .map(|i| entity(EntityType::Diagnosis, &format!("Condition {i}"), 1.0))
            .collect();

        for domain in map_to_domains(&entities) {
            assert!(domain.confidence >= 0.0);
            assert!(domain.confidence <= CONFIDENCE_CAP);
        }
    }

    #[test]
    fn severity_severe_on_qualifier_or_corroborated_risk() {
        // Qualifier in a diagnosis text
        let severe = vec![entity(EntityType::Diagnosis, "Acute stress disorder", 0.6)];
        assert_eq!(determine_severity(&severe), Severity::Severe);

        // Three high-confidence entities plus a risk behavior
        let corroborated = vec![
            entity(EntityType::Diagnosis, "Panic disorder", 0.95),
            entity(EntityType::Symptom, "Chest pain", 0.93),
            entity(EntityType::Medication, "Propranolol", 0.92),
            entity(EntityType::RiskBehavior, "Substance use", 0.82),
        ];
        assert_eq!(determine_severity(&corroborated), Severity::Severe);
    }

    #[test]
    fn severity_moderate_on_high_confidence_or_risk() {
        let two_high = vec![
            entity(EntityType::Diagnosis, "Panic disorder", 0.95),
            entity(EntityType::Symptom, "Chest pain", 0.93),
        ];
        assert_eq!(determine_severity(&two_high), Severity::Moderate);

        let risk_only = vec![entity(EntityType::RiskBehavior, "Substance use", 0.82)];
        assert_eq!(determine_severity(&risk_only), Severity::Moderate);
    }

    #[test]
    fn severity_mild_otherwise() {
        let entities = vec![entity(EntityType::Symptom, "Fatigue", 0.7)];
        assert_eq!(determine_severity(&entities), Severity::Mild);

        assert_eq!(determine_severity(&[]), Severity::Mild);
    }
}
