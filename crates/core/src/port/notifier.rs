// Callback Notifier Port

use async_trait::async_trait;
use thiserror::Error;

/// Callback delivery failures
#[derive(Error, Debug)]
pub enum CallbackError {
    #[error("Invalid callback URL: {0}")]
    InvalidUrl(String),

    #[error("Callback request failed: {0}")]
    Delivery(String),

    #[error("Callback endpoint returned status {0}")]
    Rejected(u16),

    #[error("Callback timed out")]
    Timeout,
}

/// Best-effort delivery of terminal job state to a caller-supplied endpoint.
///
/// The orchestrator treats delivery as fire-and-forget: a returned error is
/// logged and never alters job state or propagates to the submitter.
/// Completion state is already durable by the time a callback is attempted.
#[async_trait]
pub trait CallbackNotifier: Send + Sync {
    async fn notify(&self, url: &str, payload: &serde_json::Value) -> Result<(), CallbackError>;
}

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Notifier that records every delivery attempt (tests)
    pub struct RecordingNotifier {
        deliveries: Mutex<Vec<(String, serde_json::Value)>>,
        fail: bool,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self {
                deliveries: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        /// Recording notifier whose deliveries always fail
        pub fn new_failing() -> Self {
            Self {
                deliveries: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        pub fn deliveries(&self) -> Vec<(String, serde_json::Value)> {
            self.deliveries.lock().unwrap().clone()
        }
    }

    impl Default for RecordingNotifier {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl CallbackNotifier for RecordingNotifier {
        async fn notify(
            &self,
            url: &str,
            payload: &serde_json::Value,
        ) -> Result<(), CallbackError> {
            self.deliveries
                .lock()
                .unwrap()
                .push((url.to_string(), payload.clone()));

            if self.fail {
                return Err(CallbackError::Delivery(
                    "mock endpoint refused connection".to_string(),
                ));
            }
            Ok(())
        }
    }
}
