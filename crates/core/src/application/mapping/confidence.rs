// Confidence Aggregation
// Weighted-average scoring, plus an evidence count boost for per-domain
// confidence: more corroborating entities raise confidence, capped so no
// domain reports near-certainty from mock-only signal.

use crate::domain::{EntityType, ExtractedEntity};
use std::collections::HashMap;

/// Weight applied to entity types absent from the weight table
pub const DEFAULT_TYPE_WEIGHT: f64 = 0.7;

/// Upper bound for count-boosted per-domain confidence
pub const CONFIDENCE_CAP: f64 = 0.98;

/// Boost contributed by each corroborating entity
const COUNT_BOOST_PER_ENTITY: f64 = 0.02;

/// Maximum total count boost
const COUNT_BOOST_MAX: f64 = 0.10;

/// Default entity-type weights for confidence aggregation
pub fn default_weights() -> HashMap<EntityType, f64> {
    HashMap::from([
        (EntityType::Diagnosis, 1.00),
        (EntityType::RiskBehavior, 0.95),
        (EntityType::Symptom, 0.90),
        (EntityType::TraumaEvent, 0.90),
        (EntityType::Medication, 0.85),
        (EntityType::SocialContext, 0.80),
        (EntityType::Strength, 0.70),
    ])
}

/// Arithmetic mean of type-weighted entity confidences.
///
/// Returns 0.0 for an empty list; order of entities does not matter.
pub fn aggregate(entities: &[ExtractedEntity], weights: &HashMap<EntityType, f64>) -> f64 {
    if entities.is_empty() {
        return 0.0;
    }

    let weighted_sum: f64 = entities
        .iter()
        .map(|entity| {
            let weight = weights
                .get(&entity.entity_type)
                .copied()
                .unwrap_or(DEFAULT_TYPE_WEIGHT);
            entity.confidence * weight
        })
        .sum();

    weighted_sum / entities.len() as f64
}

/// Per-domain variant of [`aggregate`]: the weighted mean plus a capped
/// boost proportional to the number of corroborating entities.
pub fn aggregate_with_count_boost(
    entities: &[ExtractedEntity],
    weights: &HashMap<EntityType, f64>,
) -> f64 {
    if entities.is_empty() {
        return 0.0;
    }

    let mean = aggregate(entities, weights);
    let boost = (COUNT_BOOST_PER_ENTITY * entities.len() as f64).min(COUNT_BOOST_MAX);
    (mean + boost).min(CONFIDENCE_CAP)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(entity_type: EntityType, confidence: f64) -> ExtractedEntity {
        ExtractedEntity::new(entity_type, "test", confidence)
    }

    #[test]
    fn empty_list_aggregates_to_zero() {
        let weights = default_weights();
        assert_eq!(aggregate(&[], &weights), 0.0);
        assert_eq!(aggregate_with_count_boost(&[], &weights), 0.0);
    }

    #[test]
    fn aggregate_is_invariant_under_reordering() {
        let weights = default_weights();
        let forward = vec![
            entity(EntityType::Diagnosis, 0.92),
            entity(EntityType::Symptom, 0.87),
            entity(EntityType::RiskBehavior, 0.78),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        assert_eq!(aggregate(&forward, &weights), aggregate(&reversed, &weights));
    }

    #[test]
    fn unlisted_types_use_the_default_weight() {
        let weights = default_weights();
        let entities = vec![entity(EntityType::Note, 1.0)];
        assert!((aggregate(&entities, &weights) - DEFAULT_TYPE_WEIGHT).abs() < 1e-9);

        let entities = vec![entity(EntityType::Procedure, 1.0)];
        assert!((aggregate(&entities, &weights) - DEFAULT_TYPE_WEIGHT).abs() < 1e-9);
    }

    #[test]
    fn weighted_mean_matches_hand_computation() {
        let weights = default_weights();
        let entities = vec![
            entity(EntityType::Diagnosis, 0.9), // 0.9 * 1.00
            entity(EntityType::Medication, 0.8), // 0.8 * 0.85
        ];

        let expected = (0.9 + 0.8 * 0.85) / 2.0;
        assert!((aggregate(&entities, &weights) - expected).abs() < 1e-9);
    }

    #[test]
    fn count_boost_adds_two_percent_per_entity() {
        let weights = default_weights();
        let entities = vec![
            entity(EntityType::Diagnosis, 0.5),
            entity(EntityType::Diagnosis, 0.5),
        ];

        let mean = aggregate(&entities, &weights);
        let boosted = aggregate_with_count_boost(&entities, &weights);
        assert!((boosted - (mean + 0.04)).abs() < 1e-9);
    }

    #[test]
    fn count_boost_is_capped_at_ten_percent() {
        let weights = default_weights();
        let entities: Vec<_> = (0..8)
            .map(|_| entity(EntityType::Medication, 0.5))
            .collect();

        let mean = aggregate(&entities, &weights);
        let boosted = aggregate_with_count_boost(&entities, &weights);
        assert!((boosted - (mean + 0.10)).abs() < 1e-9);
    }

    #[test]
    fn boosted_confidence_never_exceeds_the_cap() {
        let weights = default_weights();
        let entities: Vec<_> = (0..20)
            .map(|_| entity(EntityType::Diagnosis, 1.0))
            .collect();

        let boosted = aggregate_with_count_boost(&entities, &weights);
        assert!(boosted <= CONFIDENCE_CAP);
        assert_eq!(boosted, CONFIDENCE_CAP);
    }
}
