// Queue Listener - long-lived job dispatch loop
// Pulls job messages, invokes the orchestrator, and acknowledges only after
// process() returns. Faults raised before that point produce a negative
// acknowledgement so the queue redelivers (at-least-once; process() is
// idempotent for terminal jobs).

pub mod constants;
mod shutdown;

use constants::*;
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use crate::application::orchestrator::{DocumentJobService, JobMessage};
use crate::error::Result;
use crate::port::MessageQueue;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Listener dispatching job messages from one topic
pub struct QueueListener {
    topic: String,
    queue: Arc<dyn MessageQueue>,
    orchestrator: Arc<DocumentJobService>,
}

impl QueueListener {
    pub fn new(
        topic: impl Into<String>,
        queue: Arc<dyn MessageQueue>,
        orchestrator: Arc<DocumentJobService>,
    ) -> Self {
        Self {
            topic: topic.into(),
            queue,
            orchestrator,
        }
    }

    /// Run the listener loop with graceful shutdown support
    pub async fn run(&self, mut shutdown: ShutdownToken) -> Result<()> {
        info!("Queue listener started for topic: {}", self.topic);
        loop {
            if shutdown.is_shutdown() {
                info!("Queue listener shutting down for topic: {}", self.topic);
                break;
            }
            match self.handle_next_message().await {
                Ok(handled) => {
                    if !handled {
                        // No message available, sleep briefly (or wait for shutdown)
                        tokio::select! {
                            _ = sleep(IDLE_SLEEP_DURATION) => {},
                            _ = shutdown.wait() => {
                                info!("Queue listener interrupted during idle");
                                break;
                            }
                        }
                    }
                }
                Err(e) => {
                    error!("Queue listener error: {}", e);
                    tokio::select! {
                        _ = sleep(ERROR_RECOVERY_SLEEP_DURATION) => {},
                        _ = shutdown.wait() => {
                            info!("Queue listener interrupted during error recovery");
                            break;
                        }
                    }
                }
            }
        }
        info!("Queue listener stopped for topic: {}", self.topic);
        Ok(())
    }

    /// Pull one message and dispatch it (returns true if a message was handled)
    pub async fn handle_next_message(&self) -> Result<bool> {
        let Some(delivery) = self.queue.pull(&self.topic).await? else {
            return Ok(false);
        };

        let message: JobMessage = match serde_json::from_slice(&delivery.payload) {
            Ok(message) => message,
            Err(e) => {
                // A malformed payload can never succeed on redelivery; drop it
                error!(error = %e, "Discarding malformed job message");
                self.queue.ack(&self.topic, delivery.receipt).await?;
                return Ok(true);
            }
        };

        match self.orchestrator.process(&message.job_id).await {
            Ok(()) => {
                self.queue.ack(&self.topic, delivery.receipt).await?;
            }
            Err(e) => {
                warn!(
                    job_id = %message.job_id,
                    attempt = delivery.attempt,
                    error = %e,
                    "Job dispatch fault, requeuing message"
                );
                self.queue.nack(&self.topic, delivery.receipt).await?;
            }
        }
        Ok(true)
    }
}
