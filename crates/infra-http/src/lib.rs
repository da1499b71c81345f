// Carelens Infra - HTTP Adapters
// reqwest-backed implementations of the outward-facing ports: callback
// delivery, blob retrieval, and the real extraction/recognition backends.

pub mod blob_store;
pub mod document_ai;
pub mod healthcare_nl;
pub mod notifier;

pub use blob_store::HttpBlobStore;
pub use document_ai::{DocumentAiConfig, DocumentAiExtractor};
pub use healthcare_nl::{HealthcareNlConfig, HealthcareNlRecognizer};
pub use notifier::HttpCallbackNotifier;
