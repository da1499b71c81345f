// Processing Job Domain Model

use crate::domain::{DomainSuggestion, ExtractedEntity};
use serde::{Deserialize, Serialize};

/// Job ID (UUID v4, allocated at submission, never reused)
pub type JobId = String;

/// Job lifecycle status.
///
/// `PENDING -> PROCESSING -> {COMPLETED, FAILED}`; both terminal states
/// absorb, no transition ever leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "PENDING"),
            JobStatus::Processing => write!(f, "PROCESSING"),
            JobStatus::Completed => write!(f, "COMPLETED"),
            JobStatus::Failed => write!(f, "FAILED"),
        }
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(JobStatus::Pending),
            "PROCESSING" => Ok(JobStatus::Processing),
            "COMPLETED" => Ok(JobStatus::Completed),
            "FAILED" => Ok(JobStatus::Failed),
            other => Err(format!("unknown job status: {other}")),
        }
    }
}

/// Processing priority hint carried through from intake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobPriority {
    High,
    #[default]
    Normal,
    Low,
}

impl std::fmt::Display for JobPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobPriority::High => write!(f, "high"),
            JobPriority::Normal => write!(f, "normal"),
            JobPriority::Low => write!(f, "low"),
        }
    }
}

impl std::str::FromStr for JobPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(JobPriority::High),
            "normal" => Ok(JobPriority::Normal),
            "low" => Ok(JobPriority::Low),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

/// Pipeline output persisted on a COMPLETED job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResults {
    pub entities: Vec<ExtractedEntity>,
    pub domains: Vec<DomainSuggestion>,
    pub confidence_score: f64,
}

/// A unit of asynchronous document-processing work.
///
/// Owned exclusively by the job orchestrator and persisted through the
/// `JobStore` port. Timestamps are epoch milliseconds from the injected
/// `TimeProvider`.
///
/// Invariants: `completed_at` is set iff the status is terminal;
/// `progress` is `None` once the status is FAILED.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub job_id: JobId,
    pub document_id: String,
    pub document_uri: String,
    pub document_type: String,
    pub patient_id: String,
    pub referral_id: String,
    pub priority: JobPriority,
    pub callback_url: Option<String>,

    pub status: JobStatus,
    pub progress: Option<f64>,
    pub message: Option<String>,

    pub created_at: i64,
    pub started_at: Option<i64>,
    pub completed_at: Option<i64>,

    pub results: Option<JobResults>,
}

impl Job {
    /// Create a new PENDING job
    ///
    /// # Arguments
    ///
    /// * `job_id` - Unique job ID (injected, not generated)
    /// * `created_at` - Submission timestamp in epoch ms (injected, not system time)
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        job_id: impl Into<String>,
        created_at: i64,
        document_id: impl Into<String>,
        document_uri: impl Into<String>,
        document_type: impl Into<String>,
        patient_id: impl Into<String>,
        referral_id: impl Into<String>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            document_id: document_id.into(),
            document_uri: document_uri.into(),
            document_type: document_type.into(),
            patient_id: patient_id.into(),
            referral_id: referral_id.into(),
            priority: JobPriority::Normal,
            callback_url: None,
            status: JobStatus::Pending,
            progress: Some(0.0),
            message: Some("Document queued for processing".to_string()),
            created_at,
            started_at: None,
            completed_at: None,
            results: None,
        }
    }

    /// Transition to PROCESSING with explicit timestamp
    pub fn start(&mut self, now_millis: i64) -> crate::domain::error::Result<()> {
        if self.status != JobStatus::Pending {
            return Err(crate::domain::DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: "PROCESSING".to_string(),
            });
        }
        self.status = JobStatus::Processing;
        self.started_at = Some(now_millis);
        self.message = Some("Processing document".to_string());
        Ok(())
    }

    /// Transition to COMPLETED with explicit timestamp, persisting results
    pub fn complete(
        &mut self,
        now_millis: i64,
        results: JobResults,
    ) -> crate::domain::error::Result<()> {
        if self.status != JobStatus::Processing {
            return Err(crate::domain::DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: "COMPLETED".to_string(),
            });
        }
        self.status = JobStatus::Completed;
        self.completed_at = Some(now_millis);
        self.progress = Some(1.0);
        self.message = Some("Document processed successfully".to_string());
        self.results = Some(results);
        Ok(())
    }

    /// Transition to FAILED with explicit timestamp and error message.
    ///
    /// A no-op when the job is already terminal: terminal states absorb.
    pub fn fail(&mut self, now_millis: i64, message: impl Into<String>) {
        if self.status.is_terminal() {
            return;
        }
        self.status = JobStatus::Failed;
        self.completed_at = Some(now_millis);
        self.progress = None;
        self.message = Some(message.into());
    }

    /// Record pipeline progress; only meaningful while PROCESSING
    pub fn set_progress(&mut self, fraction: f64) {
        if self.status == JobStatus::Processing {
            self.progress = Some(fraction.clamp(0.0, 1.0));
        }
    }
}
