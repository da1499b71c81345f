// HTTP Callback Notifier

use async_trait::async_trait;
use carelens_core::port::{CallbackError, CallbackNotifier};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Bounded end-to-end delivery timeout; callbacks are never retried here
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Delivers terminal job state to a caller-supplied endpoint via HTTP POST.
///
/// The contract is best-effort: the orchestrator logs a returned error and
/// moves on, so this client keeps its timeout short and never retries.
pub struct HttpCallbackNotifier {
    client: Client,
}

impl HttpCallbackNotifier {
    pub fn new() -> Result<Self, CallbackError> {
        let client = Client::builder()
            .timeout(DELIVERY_TIMEOUT)
            .build()
            .map_err(|e| CallbackError::Delivery(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CallbackNotifier for HttpCallbackNotifier {
    async fn notify(&self, url: &str, payload: &serde_json::Value) -> Result<(), CallbackError> {
        let parsed = Url::parse(url).map_err(|e| CallbackError::InvalidUrl(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CallbackError::InvalidUrl(format!(
                "unsupported scheme: {}",
                parsed.scheme()
            )));
        }

        let response = self
            .client
            .post(parsed)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CallbackError::Timeout
                } else {
                    CallbackError::Delivery(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CallbackError::Rejected(status.as_u16()));
        }

        debug!(url = %url, status = %status, "Callback delivered");
        Ok(())
    }
}
