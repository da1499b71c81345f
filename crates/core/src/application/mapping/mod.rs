// Domain Mapping - pure rules over extracted entities
// No I/O and no locks anywhere in this module.

pub mod confidence;
pub mod engine;

// Re-exports
pub use confidence::{aggregate, aggregate_with_count_boost, default_weights, CONFIDENCE_CAP};
pub use engine::{determine_severity, map_to_domains};
