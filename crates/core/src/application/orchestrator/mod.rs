// Document Job Orchestrator
// Owns job identity and lifecycle: consumes intake requests, drives
// extraction -> recognition -> domain mapping, persists status transitions,
// and triggers best-effort callback delivery.

use crate::application::mapping;
use crate::domain::{Job, JobId, JobPriority, JobResults, JobStatus};
use crate::error::{AppError, Result};
use crate::port::{
    CallbackNotifier, DocumentExtractor, EntityRecognizer, IdProvider, JobStore, MessageQueue,
    TimeProvider,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};
use url::Url;

/// Progress milestones recorded while a job is PROCESSING
const PROGRESS_EXTRACTED: f64 = 0.4;
const PROGRESS_RECOGNIZED: f64 = 0.7;
const PROGRESS_MAPPED: f64 = 0.9;

/// Intake request for asynchronous document processing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub document_id: String,
    pub document_uri: String,
    pub document_type: String,
    pub patient_id: String,
    pub referral_id: String,

    #[serde(default)]
    pub priority: JobPriority,

    #[serde(default)]
    pub callback_url: Option<String>,
}

/// Queue payload dispatching one job to a listener
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMessage {
    pub job_id: JobId,
}

/// Pipeline tuning knobs resolved once at composition time
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Topic the orchestrator publishes job messages to
    pub topic: String,
    /// Entities below this confidence are dropped after recognition
    pub confidence_threshold: f64,
    /// Ask the recognizer to attach UMLS concept IDs
    pub include_umls: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            topic: "doc.jobs".to_string(),
            confidence_threshold: 0.6,
            include_umls: false,
        }
    }
}

/// Document Job Service
///
/// Constructed once with all collaborator ports; mock-vs-real backend
/// selection happens at the composition root, never inside the pipeline.
pub struct DocumentJobService {
    extractor: Arc<dyn DocumentExtractor>,
    recognizer: Arc<dyn EntityRecognizer>,
    job_store: Arc<dyn JobStore>,
    queue: Arc<dyn MessageQueue>,
    notifier: Arc<dyn CallbackNotifier>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    settings: PipelineSettings,
}

impl DocumentJobService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        extractor: Arc<dyn DocumentExtractor>,
        recognizer: Arc<dyn EntityRecognizer>,
        job_store: Arc<dyn JobStore>,
        queue: Arc<dyn MessageQueue>,
        notifier: Arc<dyn CallbackNotifier>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            extractor,
            recognizer,
            job_store,
            queue,
            notifier,
            id_provider,
            time_provider,
            settings,
        }
    }

    /// Accept a document-processing request.
    ///
    /// Validates the request, persists a PENDING job, publishes a job
    /// message, and returns the fresh job ID immediately. Never blocks on
    /// extraction or recognition.
    pub async fn submit(&self, request: SubmitRequest) -> Result<JobId> {
        validate_request(&request)?;

        let job_id = self.id_provider.generate_id();
        let created_at = self.time_provider.now_millis();

        let mut job = Job::new(
            job_id.clone(),
            created_at,
            request.document_id.clone(),
            request.document_uri,
            request.document_type,
            request.patient_id,
            request.referral_id,
        );
        job.priority = request.priority;
        job.callback_url = request.callback_url;

        self.job_store.put(&job).await?;

        let payload = serde_json::to_vec(&JobMessage {
            job_id: job_id.clone(),
        })?;
        self.queue.publish(&self.settings.topic, payload).await?;

        info!(
            job_id = %job_id,
            document_id = %request.document_id,
            "Job submitted"
        );
        Ok(job_id)
    }

    /// Run the processing pipeline for one job.
    ///
    /// Safe to re-run: a redelivered message for a job already in a terminal
    /// state is a no-op. Pipeline failures are captured into job state and a
    /// failure callback; they are not returned to the caller. The returned
    /// error covers only infrastructure faults (store/lookup), which the
    /// queue listener answers with a nack.
    pub async fn process(&self, job_id: &JobId) -> Result<()> {
        let mut job = self
            .job_store
            .get(job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("job {job_id}")))?;

        if job.status.is_terminal() {
            info!(
                job_id = %job.job_id,
                status = %job.status,
                "Skipping redelivered job already in terminal state"
            );
            return Ok(());
        }

        if job.status == JobStatus::Pending {
            let now = self.time_provider.now_millis();
            job.start(now)?;
            self.job_store.put(&job).await?;
        } else {
            // A prior attempt died mid-pipeline; rerun from the top
            warn!(
                job_id = %job.job_id,
                "Resuming job left in PROCESSING by an earlier attempt"
            );
        }

        match self.run_pipeline(&mut job).await {
            Ok(results) => {
                let now = self.time_provider.now_millis();
                let entities_count = results.entities.len();
                let domains_count = results.domains.len();
                let confidence_score = results.confidence_score;

                job.complete(now, results)?;
                self.job_store.put(&job).await?;

                info!(
                    job_id = %job.job_id,
                    entities = entities_count,
                    domains = domains_count,
                    confidence = confidence_score,
                    "Job completed"
                );
                self.notify_completion(&job, confidence_score, entities_count, domains_count)
                    .await;
            }
            Err(e) => {
                let now = self.time_provider.now_millis();
                error!(job_id = %job.job_id, error = %e, "Job pipeline failed");

                job.fail(now, e.to_string());
                self.job_store.put(&job).await?;
                self.notify_failure(&job).await;
            }
        }

        Ok(())
    }

    /// Read-only job lookup
    pub async fn get_status(&self, job_id: &JobId) -> Result<Job> {
        self.job_store
            .get(job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("job {job_id}")))
    }

    /// Results of a COMPLETED job
    pub async fn get_results(&self, job_id: &JobId) -> Result<JobResults> {
        let job = self.get_status(job_id).await?;
        match (job.status, job.results) {
            (JobStatus::Completed, Some(results)) => Ok(results),
            (status, _) => Err(AppError::InvalidState(format!(
                "job {job_id} has no results (status {status})"
            ))),
        }
    }

    async fn run_pipeline(&self, job: &mut Job) -> Result<JobResults> {
        let extracted = self
            .extractor
            .extract(&job.document_uri, &job.document_type)
            .await?;
        self.record_progress(job, PROGRESS_EXTRACTED).await;

        let mut entities = self
            .recognizer
            .recognize(&extracted.text, self.settings.include_umls)
            .await?;
        entities.retain(|e| e.confidence >= self.settings.confidence_threshold);
        self.record_progress(job, PROGRESS_RECOGNIZED).await;

        let domains = mapping::map_to_domains(&entities);
        self.record_progress(job, PROGRESS_MAPPED).await;

        let weights = mapping::default_weights();
        let confidence_score = mapping::aggregate(&entities, &weights);

        Ok(JobResults {
            entities,
            domains,
            confidence_score,
        })
    }

    /// Progress is advisory; a failed write must not abort the pipeline
    async fn record_progress(&self, job: &mut Job, fraction: f64) {
        job.set_progress(fraction);
        if let Err(e) = self.job_store.put(job).await {
            warn!(job_id = %job.job_id, error = %e, "Failed to persist job progress");
        }
    }

    async fn notify_completion(
        &self,
        job: &Job,
        confidence_score: f64,
        entities_count: usize,
        domains_count: usize,
    ) {
        let Some(url) = &job.callback_url else {
            return;
        };
        let payload = json!({
            "jobId": job.job_id,
            "status": job.status,
            "documentId": job.document_id,
            "confidenceScore": confidence_score,
            "entitiesCount": entities_count,
            "domainsCount": domains_count,
        });
        self.deliver(url, payload).await;
    }

    async fn notify_failure(&self, job: &Job) {
        let Some(url) = &job.callback_url else {
            return;
        };
        let payload = json!({
            "jobId": job.job_id,
            "status": job.status,
            "documentId": job.document_id,
            "error": job.message.clone().unwrap_or_else(|| "unknown error".to_string()),
        });
        self.deliver(url, payload).await;
    }

    /// Best-effort delivery: failures are logged and never propagated,
    /// since the job's terminal state is already durable.
    async fn deliver(&self, url: &str, payload: serde_json::Value) {
        if let Err(e) = self.notifier.notify(url, &payload).await {
            warn!(url = %url, error = %e, "Callback delivery failed");
        }
    }
}

fn validate_request(request: &SubmitRequest) -> Result<()> {
    require_field("documentId", &request.document_id)?;
    require_field("documentUri", &request.document_uri)?;
    require_field("documentType", &request.document_type)?;
    require_field("patientId", &request.patient_id)?;
    require_field("referralId", &request.referral_id)?;

    if let Some(callback_url) = &request.callback_url {
        let parsed = Url::parse(callback_url)
            .map_err(|e| AppError::Validation(format!("invalid callbackUrl: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::Validation(format!(
                "callbackUrl must be http or https, got {}",
                parsed.scheme()
            )));
        }
    }

    Ok(())
}

fn require_field(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!(
            "missing required field: {name}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::extractor::mocks::FailingExtractor;
    use crate::port::extractor::MockDocumentExtractor;
    use crate::port::id_provider::mocks::SequentialIdProvider;
    use crate::port::job_store::mocks::InMemoryJobStore;
    use crate::port::notifier::mocks::RecordingNotifier;
    use crate::port::recognizer::KeywordRecognizer;
    use crate::port::time_provider::mocks::FixedTimeProvider;
    use crate::port::InMemoryQueue;

    struct Harness {
        service: DocumentJobService,
        job_store: Arc<InMemoryJobStore>,
        queue: Arc<InMemoryQueue>,
        notifier: Arc<RecordingNotifier>,
    }

    fn harness_with(extractor: Arc<dyn DocumentExtractor>) -> Harness {
        let job_store = Arc::new(InMemoryJobStore::new());
        let queue = Arc::new(InMemoryQueue::new());
        let notifier = Arc::new(RecordingNotifier::new());

        let service = DocumentJobService::new(
            extractor,
            Arc::new(KeywordRecognizer),
            job_store.clone(),
            queue.clone(),
            notifier.clone(),
            Arc::new(SequentialIdProvider::new()),
            Arc::new(FixedTimeProvider::new(1_000)),
            PipelineSettings::default(),
        );

        Harness {
            service,
            job_store,
            queue,
            notifier,
        }
    }

    fn harness() -> Harness {
        harness_with(Arc::new(MockDocumentExtractor))
    }

    fn sample_request() -> SubmitRequest {
        SubmitRequest {
            document_id: "doc-1".to_string(),
            document_uri: "blob://referrals/doc-1.pdf".to_string(),
            document_type: "application/pdf".to_string(),
            patient_id: "patient-1".to_string(),
            referral_id: "referral-1".to_string(),
            priority: JobPriority::Normal,
            callback_url: Some("http://localhost:9000/callbacks".to_string()),
        }
    }

    #[tokio::test]
    async fn submit_persists_pending_job_and_publishes_message() {
        let h = harness();
        let job_id = h.service.submit(sample_request()).await.unwrap();

        let job = h.service.get_status(&job_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.created_at, 1_000);
        assert_eq!(h.queue.ready_len("doc.jobs"), 1);
        // Callback only fires on terminal states
        assert!(h.notifier.deliveries().is_empty());
    }

    #[tokio::test]
    async fn submit_rejects_missing_fields() {
        let h = harness();
        let mut request = sample_request();
        request.patient_id = "  ".to_string();

        let err = h.service.submit(request).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(err.to_string().contains("patientId"));
        assert!(h.job_store.is_empty());
    }

    #[tokio::test]
    async fn submit_rejects_non_http_callback_url() {
        let h = harness();
        let mut request = sample_request();
        request.callback_url = Some("ftp://example.com/hook".to_string());

        let err = h.service.submit(request).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn process_completes_job_and_notifies() {
        let h = harness();
        let job_id = h.service.submit(sample_request()).await.unwrap();

        h.service.process(&job_id).await.unwrap();

        let job = h.service.get_status(&job_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, Some(1.0));
        assert!(job.completed_at.is_some());

        let results = h.service.get_results(&job_id).await.unwrap();
        assert!(!results.entities.is_empty());
        assert!(!results.domains.is_empty());
        assert!(results.confidence_score > 0.0);

        let deliveries = h.notifier.deliveries();
        assert_eq!(deliveries.len(), 1);
        let (url, payload) = &deliveries[0];
        assert_eq!(url, "http://localhost:9000/callbacks");
        assert_eq!(payload["status"], "COMPLETED");
        assert_eq!(payload["documentId"], "doc-1");
        assert!(payload["entitiesCount"].as_u64().unwrap() > 0);
        assert!(payload["domainsCount"].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn extraction_failure_marks_job_failed_with_error_callback() {
        let h = harness_with(Arc::new(FailingExtractor));
        let job_id = h.service.submit(sample_request()).await.unwrap();

        // Pipeline failure is captured, not returned
        h.service.process(&job_id).await.unwrap();

        let job = h.service.get_status(&job_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.progress, None);
        assert!(job.completed_at.is_some());
        assert!(job.message.as_ref().unwrap().contains("unreachable"));

        let deliveries = h.notifier.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].1["status"], "FAILED");
        assert!(deliveries[0].1["error"].as_str().unwrap().contains("unreachable"));

        // Results are unavailable for failed jobs
        assert!(matches!(
            h.service.get_results(&job_id).await.unwrap_err(),
            AppError::InvalidState(_)
        ));
    }

    #[tokio::test]
    async fn recognition_failure_marks_job_failed() {
        let job_store = Arc::new(InMemoryJobStore::new());
        let queue = Arc::new(InMemoryQueue::new());
        let notifier = Arc::new(RecordingNotifier::new());

        let service = DocumentJobService::new(
            Arc::new(MockDocumentExtractor),
            Arc::new(crate::port::recognizer::mocks::FailingRecognizer),
            job_store,
            queue,
            notifier.clone(),
            Arc::new(SequentialIdProvider::new()),
            Arc::new(FixedTimeProvider::new(1_000)),
            PipelineSettings::default(),
        );

        let job_id = service.submit(sample_request()).await.unwrap();
        service.process(&job_id).await.unwrap();

        let job = service.get_status(&job_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.message.as_ref().unwrap().contains("Recognition"));
        assert_eq!(notifier.deliveries().len(), 1);
    }

    #[tokio::test]
    async fn empty_document_text_yields_the_fallback_domain() {
        use crate::domain::DomainType;
        use crate::port::extractor::mocks::StaticExtractor;

        let h = harness_with(Arc::new(StaticExtractor::new("", 0.8)));
        let job_id = h.service.submit(sample_request()).await.unwrap();
        h.service.process(&job_id).await.unwrap();

        let results = h.service.get_results(&job_id).await.unwrap();
        // Empty text gives the single Note entity, which triggers no domain
        assert_eq!(results.entities.len(), 1);
        assert_eq!(results.domains.len(), 1);
        assert_eq!(results.domains[0].domain_type, DomainType::PresentingProblem);
        assert_eq!(results.domains[0].confidence, 0.5);
    }

    #[tokio::test]
    async fn redelivered_terminal_job_is_a_no_op() {
        let h = harness();
        let job_id = h.service.submit(sample_request()).await.unwrap();

        h.service.process(&job_id).await.unwrap();
        h.service.process(&job_id).await.unwrap();

        // Exactly one callback despite the duplicate delivery
        assert_eq!(h.notifier.deliveries().len(), 1);
    }

    #[tokio::test]
    async fn process_unknown_job_is_not_found() {
        let h = harness();
        let err = h.service.process(&"missing".to_string()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn callback_failure_does_not_change_terminal_state() {
        let job_store = Arc::new(InMemoryJobStore::new());
        let queue = Arc::new(InMemoryQueue::new());
        let notifier = Arc::new(RecordingNotifier::new_failing());

        let service = DocumentJobService::new(
            Arc::new(MockDocumentExtractor),
            Arc::new(KeywordRecognizer),
            job_store.clone(),
            queue,
            notifier.clone(),
            Arc::new(SequentialIdProvider::new()),
            Arc::new(FixedTimeProvider::new(1_000)),
            PipelineSettings::default(),
        );

        let job_id = service.submit(sample_request()).await.unwrap();
        service.process(&job_id).await.unwrap();

        let job = service.get_status(&job_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(notifier.deliveries().len(), 1);
    }

    #[tokio::test]
    async fn jobs_without_callback_url_skip_notification() {
        let h = harness();
        let mut request = sample_request();
        request.callback_url = None;

        let job_id = h.service.submit(request).await.unwrap();
        h.service.process(&job_id).await.unwrap();

        assert!(h.notifier.deliveries().is_empty());
        let job = h.service.get_status(&job_id).await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn threshold_filters_low_confidence_entities() {
        let job_store = Arc::new(InMemoryJobStore::new());
        let queue = Arc::new(InMemoryQueue::new());
        let notifier = Arc::new(RecordingNotifier::new());

        let settings = PipelineSettings {
            confidence_threshold: 0.9,
            ..PipelineSettings::default()
        };
        let service = DocumentJobService::new(
            Arc::new(MockDocumentExtractor),
            Arc::new(KeywordRecognizer),
            job_store,
            queue,
            notifier,
            Arc::new(SequentialIdProvider::new()),
            Arc::new(FixedTimeProvider::new(1_000)),
            settings,
        );

        let job_id = service.submit(sample_request()).await.unwrap();
        service.process(&job_id).await.unwrap();

        let results = service.get_results(&job_id).await.unwrap();
        assert!(results.entities.iter().all(|e| e.confidence >= 0.9));
    }
}
