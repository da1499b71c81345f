// Care-Assessment Domain Suggestions

use crate::domain::ExtractedEntity;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The fixed care-assessment domains an entity set can map onto.
///
/// Six of the seven-domain assessment model are populated by the mapping
/// engine; the seventh is reserved. Declaration order is the display
/// priority order callers observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DomainType {
    PresentingProblem,
    BehavioralHealthHistory,
    RiskAssessment,
    SocialDeterminants,
    Trauma,
    Strengths,
}

impl std::fmt::Display for DomainType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DomainType::PresentingProblem => write!(f, "PRESENTING_PROBLEM"),
            DomainType::BehavioralHealthHistory => write!(f, "BEHAVIORAL_HEALTH_HISTORY"),
            DomainType::RiskAssessment => write!(f, "RISK_ASSESSMENT"),
            DomainType::SocialDeterminants => write!(f, "SOCIAL_DETERMINANTS"),
            DomainType::Trauma => write!(f, "TRAUMA"),
            DomainType::Strengths => write!(f, "STRENGTHS"),
        }
    }
}

/// Severity of the presenting problem, derived from the full entity set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Severe,
    Moderate,
    Mild,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Severe => "SEVERE",
            Severity::Moderate => "MODERATE",
            Severity::Mild => "MILD",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A weighted, structured suggestion for a single assessment domain.
///
/// Produced only by the domain mapping engine and never mutated afterward.
/// `entities` preserves the exact triggering subset for auditability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainSuggestion {
    pub domain_type: DomainType,
    pub content: Map<String, Value>,
    /// Confidence in [0, 0.98]
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<ExtractedEntity>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_type_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&DomainType::BehavioralHealthHistory).unwrap();
        assert_eq!(json, "\"BEHAVIORAL_HEALTH_HISTORY\"");
    }

    #[test]
    fn suggestion_omits_absent_optional_fields() {
        let suggestion = DomainSuggestion {
            domain_type: DomainType::Trauma,
            content: Map::new(),
            confidence: 0.7,
            sources: None,
            entities: None,
        };

        let value = serde_json::to_value(&suggestion).unwrap();
        assert_eq!(value["domainType"], "TRAUMA");
        assert!(value.get("sources").is_none());
        assert!(value.get("entities").is_none());
    }
}
