// Message Queue Port (Interface)
// At-least-once delivery with explicit ack/nack; redelivered messages carry
// an incremented attempt counter.

use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// A message pulled from a topic, awaiting ack or nack
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Opaque handle identifying this delivery for ack/nack
    pub receipt: u64,
    pub payload: Vec<u8>,
    /// 1 on first delivery, incremented on every redelivery
    pub attempt: u32,
}

/// Message queue abstraction.
///
/// Delivery semantics are at-least-once: a pulled message stays in flight
/// until acknowledged; a negative acknowledgement puts it back for
/// redelivery. Handlers must therefore be idempotent.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Publish a payload to a topic
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()>;

    /// Pull the next available message, if any
    async fn pull(&self, topic: &str) -> Result<Option<Delivery>>;

    /// Acknowledge successful handling; the message is not redelivered
    async fn ack(&self, topic: &str, receipt: u64) -> Result<()>;

    /// Negatively acknowledge; the message is requeued for redelivery
    async fn nack(&self, topic: &str, receipt: u64) -> Result<()>;
}

#[derive(Debug, Clone)]
struct QueuedMessage {
    payload: Vec<u8>,
    attempt: u32,
}

#[derive(Default)]
struct TopicState {
    ready: VecDeque<QueuedMessage>,
    in_flight: HashMap<u64, QueuedMessage>,
    next_receipt: u64,
}

/// In-process queue with redelivery (local deployments and tests).
///
/// Nacked messages go to the back of the ready queue, so redelivery waits
/// behind whatever else is pending; a dedicated broker transport can slot in
/// behind the same port without touching callers.
pub struct InMemoryQueue {
    topics: Mutex<HashMap<String, TopicState>>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self {
            topics: Mutex::new(HashMap::new()),
        }
    }

    /// Number of messages currently awaiting delivery on a topic
    pub fn ready_len(&self, topic: &str) -> usize {
        self.topics
            .lock()
            .unwrap()
            .get(topic)
            .map_or(0, |t| t.ready.len())
    }
}

impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageQueue for InMemoryQueue {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()> {
        let mut topics = self.topics.lock().unwrap();
        let state = topics.entry(topic.to_string()).or_default();
        state.ready.push_back(QueuedMessage {
            payload,
            attempt: 0,
        });
        Ok(())
    }

    async fn pull(&self, topic: &str) -> Result<Option<Delivery>> {
        let mut topics = self.topics.lock().unwrap();
        let state = topics.entry(topic.to_string()).or_default();

        let Some(mut message) = state.ready.pop_front() else {
            return Ok(None);
        };
        message.attempt += 1;

        state.next_receipt += 1;
        let receipt = state.next_receipt;

        let delivery = Delivery {
            receipt,
            payload: message.payload.clone(),
            attempt: message.attempt,
        };
        state.in_flight.insert(receipt, message);

        Ok(Some(delivery))
    }

    async fn ack(&self, topic: &str, receipt: u64) -> Result<()> {
        let mut topics = self.topics.lock().unwrap();
        let state = topics.entry(topic.to_string()).or_default();

        state.in_flight.remove(&receipt).ok_or_else(|| {
            AppError::Queue(format!("ack for unknown receipt {receipt} on {topic}"))
        })?;
        Ok(())
    }

    async fn nack(&self, topic: &str, receipt: u64) -> Result<()> {
        let mut topics = self.topics.lock().unwrap();
        let state = topics.entry(topic.to_string()).or_default();

        let message = state.in_flight.remove(&receipt).ok_or_else(|| {
            AppError::Queue(format!("nack for unknown receipt {receipt} on {topic}"))
        })?;
        state.ready.push_back(message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_then_pull_round_trips_payload() {
        let queue = InMemoryQueue::new();
        queue.publish("jobs", b"hello".to_vec()).await.unwrap();

        let delivery = queue.pull("jobs").await.unwrap().unwrap();
        assert_eq!(delivery.payload, b"hello");
        assert_eq!(delivery.attempt, 1);

        // In flight, not ready
        assert!(queue.pull("jobs").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn ack_removes_message_for_good() {
        let queue = InMemoryQueue::new();
        queue.publish("jobs", b"m".to_vec()).await.unwrap();

        let delivery = queue.pull("jobs").await.unwrap().unwrap();
        queue.ack("jobs", delivery.receipt).await.unwrap();

        assert!(queue.pull("jobs").await.unwrap().is_none());
        assert_eq!(queue.ready_len("jobs"), 0);
    }

    #[tokio::test]
    async fn nack_requeues_with_incremented_attempt() {
        let queue = InMemoryQueue::new();
        queue.publish("jobs", b"m".to_vec()).await.unwrap();

        let first = queue.pull("jobs").await.unwrap().unwrap();
        queue.nack("jobs", first.receipt).await.unwrap();

        let second = queue.pull("jobs").await.unwrap().unwrap();
        assert_eq!(second.payload, b"m");
        assert_eq!(second.attempt, 2);
    }

    #[tokio::test]
    async fn ack_with_unknown_receipt_is_an_error() {
        let queue = InMemoryQueue::new();
        assert!(queue.ack("jobs", 42).await.is_err());
    }

    #[tokio::test]
    async fn topics_are_independent() {
        let queue = InMemoryQueue::new();
        queue.publish("a", b"1".to_vec()).await.unwrap();

        assert!(queue.pull("b").await.unwrap().is_none());
        assert!(queue.pull("a").await.unwrap().is_some());
    }
}
