// Port Layer - Interfaces for external dependencies

pub mod blob_store;
pub mod extractor;
pub mod id_provider; // For deterministic testing
pub mod job_store;
pub mod notifier;
pub mod queue;
pub mod recognizer;
pub mod time_provider;

// Re-exports
pub use blob_store::{BlobError, BlobStore};
pub use extractor::{DocumentExtractor, ExtractedText, ExtractionError, MockDocumentExtractor};
pub use id_provider::IdProvider;
pub use job_store::JobStore;
pub use notifier::{CallbackError, CallbackNotifier};
pub use queue::{Delivery, InMemoryQueue, MessageQueue};
pub use recognizer::{EntityRecognizer, KeywordRecognizer, RecognitionError};
pub use time_provider::TimeProvider;
