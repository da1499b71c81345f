// Job Store Port (Interface)

use crate::domain::{Job, JobId};
use crate::error::Result;
use async_trait::async_trait;

/// Persistence interface for processing jobs.
///
/// `put` is an upsert keyed by `job_id` and must be safe under concurrent
/// callers working on distinct jobs. Jobs are never deleted by the core;
/// retention is a store concern.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert or replace a job record
    async fn put(&self, job: &Job) -> Result<()>;

    /// Find a job by ID
    async fn get(&self, job_id: &JobId) -> Result<Option<Job>>;
}

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory job store (tests and local development)
    pub struct InMemoryJobStore {
        jobs: Mutex<HashMap<JobId, Job>>,
    }

    impl InMemoryJobStore {
        pub fn new() -> Self {
            Self {
                jobs: Mutex::new(HashMap::new()),
            }
        }

        pub fn len(&self) -> usize {
            self.jobs.lock().unwrap().len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }
    }

    impl Default for InMemoryJobStore {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl JobStore for InMemoryJobStore {
        async fn put(&self, job: &Job) -> Result<()> {
            self.jobs
                .lock()
                .unwrap()
                .insert(job.job_id.clone(), job.clone());
            Ok(())
        }

        async fn get(&self, job_id: &JobId) -> Result<Option<Job>> {
            Ok(self.jobs.lock().unwrap().get(job_id).cloned())
        }
    }
}
