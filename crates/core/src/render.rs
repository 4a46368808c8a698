//! Render job status records.
//!
//! The backend owns the status vocabulary. The client treats a status as
//! an opaque string and only distinguishes the two terminal values,
//! [`STATUS_COMPLETED`] and [`STATUS_FAILED`].

use serde::{Deserialize, Serialize};

use crate::types::JobId;

// ---------------------------------------------------------------------------
// Status vocabulary
// ---------------------------------------------------------------------------

/// Job accepted by the backend, waiting for a render worker.
pub const STATUS_QUEUED: &str = "queued";

/// Job is being rendered.
pub const STATUS_PROCESSING: &str = "processing";

/// Job finished and the artifact is (or will be) downloadable.
pub const STATUS_COMPLETED: &str = "completed";

/// Job failed on the backend.
pub const STATUS_FAILED: &str = "failed";

/// Message shown for a freshly submitted job until the first update lands.
pub const QUEUED_PLACEHOLDER_MESSAGE: &str = "Queued for rendering";

/// Backend-reported status string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenderStatus(String);

impl RenderStatus {
    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }

    pub fn queued() -> Self {
        Self::new(STATUS_QUEUED)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_completed(&self) -> bool {
        self.0 == STATUS_COMPLETED
    }

    pub fn is_failed(&self) -> bool {
        self.0 == STATUS_FAILED
    }

    /// `completed` and `failed` end tracking; every other value keeps it going.
    pub fn is_terminal(&self) -> bool {
        self.is_completed() || self.is_failed()
    }
}

impl std::fmt::Display for RenderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RenderStatus {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ---------------------------------------------------------------------------
// StatusUpdate
// ---------------------------------------------------------------------------

/// A status payload delivered by either transport.
///
/// Pushed messages omit `job_id`; the polling response carries one. It is
/// accepted and ignored since the tracker already knows which job it
/// asked about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: RenderStatus,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub ready_for_download: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
}

impl StatusUpdate {
    pub fn new(status: impl Into<RenderStatus>, progress: f64) -> Self {
        Self {
            status: status.into(),
            progress,
            message: String::new(),
            ready_for_download: false,
            job_id: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_ready_for_download(mut self, ready: bool) -> Self {
        self.ready_for_download = ready;
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// ---------------------------------------------------------------------------
// RenderJob
// ---------------------------------------------------------------------------

/// Latest known state of one asynchronous render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderJob {
    pub job_id: JobId,
    pub status: RenderStatus,
    /// Percentage as reported by the backend. Not clamped or checked for
    /// monotonicity; see [`progress_percent`](Self::progress_percent).
    pub progress: f64,
    pub message: String,
    pub ready_for_download: bool,
}

impl RenderJob {
    /// The record inserted right after a successful submission.
    pub fn queued(job_id: impl Into<JobId>) -> Self {
        Self {
            job_id: job_id.into(),
            status: RenderStatus::queued(),
            progress: 0.0,
            message: QUEUED_PLACEHOLDER_MESSAGE.to_string(),
            ready_for_download: false,
        }
    }

    /// Build the wholesale replacement for a tracked job from an update.
    pub fn from_update(job_id: impl Into<JobId>, update: StatusUpdate) -> Self {
        Self {
            job_id: job_id.into(),
            status: update.status,
            progress: update.progress,
            message: update.message,
            ready_for_download: update.ready_for_download,
        }
    }

    /// Progress clamped to `0..=100` for progress bars.
    pub fn progress_percent(&self) -> f64 {
        if self.progress.is_nan() {
            return 0.0;
        }
        self.progress.clamp(0.0, 100.0)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
