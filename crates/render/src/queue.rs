//! Render submission and tracker orchestration.
//!
//! [`RenderQueue`] submits renders, seeds the [`StatusStore`] with the
//! queued record, and spawns one [`Tracker`] per job. Every tracker runs
//! under a child of the queue's cancellation token, so
//! [`RenderQueue::shutdown`] (or dropping the queue) tears all of them
//! down.
//!
//! There is no per-render cancel. Submitting a new render for a clip
//! replaces the tracker that was following the clip's previous job.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use clipwise_core::error::CoreError;
use clipwise_core::render::RenderJob;
use clipwise_core::segments::{ClipRanges, RenderRequest, Segment};
use clipwise_core::types::{ClipId, JobId};
use tokio::sync::{broadcast, Mutex};
use tokio_util::sync::CancellationToken;

use crate::backend::RenderBackend;
use crate::config::{RenderConfig, DEFAULT_POLL_INTERVAL};
use crate::events::RenderEvent;
use crate::store::StatusStore;
use crate::tracker::{Tracker, TrackingOutcome};

/// How long [`RenderQueue::shutdown`] waits for each tracker to exit.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Settings for submissions and trackers.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub poll_interval: Duration,
    pub prefer_oauth: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            prefer_oauth: true,
        }
    }
}

impl From<&RenderConfig> for QueueConfig {
    fn from(config: &RenderConfig) -> Self {
        Self {
            poll_interval: config.poll_interval,
            prefer_oauth: config.prefer_oauth,
        }
    }
}

/// Bookkeeping for one running tracker.
struct ManagedTracker {
    job_id: JobId,
    cancel: CancellationToken,
    task_handle: tokio::task::JoinHandle<TrackingOutcome>,
}

/// Submits renders and tracks them until they finish.
///
/// Create once per session and share via `Arc`.
pub struct RenderQueue {
    backend: Arc<dyn RenderBackend>,
    store: Arc<StatusStore>,
    trackers: Mutex<HashMap<ClipId, ManagedTracker>>,
    config: QueueConfig,
    /// Master cancellation token, cancelled on shutdown or drop.
    cancel: CancellationToken,
}

/// Errors returned by [`RenderQueue`] actions.
#[derive(Debug, thiserror::Error)]
pub enum RenderQueueError {
    /// The clip has no hook, body, or loop range selected. Nothing was sent.
    #[error("Clip {0} has no segments to render")]
    NoSegments(ClipId),

    /// The request failed local validation. Nothing was sent.
    #[error(transparent)]
    Invalid(#[from] CoreError),

    /// The backend rejected the submission or could not be reached.
    #[error("Failed to submit render: {0}")]
    SubmitFailed(String),
}

impl RenderQueue {
    pub fn new(backend: Arc<dyn RenderBackend>, config: QueueConfig) -> Self {
        Self {
            backend,
            store: Arc::new(StatusStore::new()),
            trackers: Mutex::new(HashMap::new()),
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// The status store UIs read from.
    pub fn store(&self) -> &Arc<StatusStore> {
        &self.store
    }

    /// Subscribe to render status events.
    pub fn subscribe(&self) -> broadcast::Receiver<RenderEvent> {
        self.store.subscribe()
    }

    /// Submit a render of a clip's hook/body/loop ranges.
    ///
    /// Fails locally with [`RenderQueueError::NoSegments`] when none of
    /// the ranges is set.
    pub async fn submit_render(
        &self,
        clip_id: &str,
        video_id: &str,
        ranges: &ClipRanges,
        title: &str,
    ) -> Result<JobId, RenderQueueError> {
        let segments = ranges.segments();
        if segments.is_empty() {
            tracing::warn!(clip_id, "No segments selected, render not submitted");
            return Err(RenderQueueError::NoSegments(clip_id.to_string()));
        }
        self.submit_segments(clip_id, video_id, segments, title).await
    }

    /// Submit a render of an explicit segment list and start tracking it.
    ///
    /// On success the clip's entry is reset to `queued` before tracking
    /// begins. On failure the store is left untouched and nothing is
    /// retried.
    pub async fn submit_segments(
        &self,
        clip_id: &str,
        video_id: &str,
        segments: Vec<Segment>,
        title: &str,
    ) -> Result<JobId, RenderQueueError> {
        if segments.is_empty() {
            return Err(RenderQueueError::NoSegments(clip_id.to_string()));
        }

        let request = RenderRequest {
            video_id: video_id.to_string(),
            clip_id: clip_id.to_string(),
            segments,
            title: title.to_string(),
            prefer_oauth: self.config.prefer_oauth,
        };
        request.validate()?;

        let job_id = self.backend.submit(&request).await.map_err(|e| {
            tracing::error!(clip_id, video_id, error = %e, "Render submission failed");
            RenderQueueError::SubmitFailed(e.to_string())
        })?;

        tracing::info!(
            clip_id,
            video_id,
            job_id = %job_id,
            segments = request.segments.len(),
            "Render submitted",
        );

        self.store.insert_queued(clip_id, &job_id).await;
        self.spawn_tracker(clip_id, &job_id).await;

        Ok(job_id)
    }

    /// Latest known job for a clip.
    pub async fn job(&self, clip_id: &str) -> Option<RenderJob> {
        self.store.get(clip_id).await
    }

    /// Snapshot of every tracked job.
    pub async fn jobs(&self) -> HashMap<ClipId, RenderJob> {
        self.store.snapshot().await
    }

    /// Download URL for a clip, once its render is ready for download.
    pub async fn download_url(&self, clip_id: &str) -> Option<String> {
        let job = self.store.get(clip_id).await?;
        job.ready_for_download
            .then(|| self.backend.download_url(&job.job_id))
    }

    /// Discard all tracked jobs.
    ///
    /// Trackers still running keep going until their job finishes, but
    /// their updates no longer reach the store.
    pub async fn clear_jobs(&self) {
        self.store.clear().await;
        tracing::info!("Render jobs cleared");
    }

    /// Number of trackers that have not exited yet.
    pub async fn active_trackers(&self) -> usize {
        self.trackers
            .lock()
            .await
            .values()
            .filter(|t| !t.task_handle.is_finished())
            .count()
    }

    /// Stop every tracker.
    ///
    /// Cancels the master token, then waits up to 5 seconds per tracker
    /// for a clean exit.
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down render queue");
        self.cancel.cancel();

        let mut trackers = self.trackers.lock().await;
        for (clip_id, managed) in trackers.drain() {
            managed.cancel.cancel();
            if tokio::time::timeout(SHUTDOWN_GRACE, managed.task_handle)
                .await
                .is_err()
            {
                tracing::warn!(clip_id = %clip_id, job_id = %managed.job_id, "Tracker did not stop in time");
            }
        }

        tracing::info!("Render queue shut down complete");
    }

    // ---- private helpers ----

    async fn spawn_tracker(&self, clip_id: &str, job_id: &str) {
        let cancel = self.cancel.child_token();
        let tracker = Tracker::new(
            Arc::clone(&self.backend),
            Arc::clone(&self.store),
            clip_id,
            job_id,
            self.config.poll_interval,
            cancel.clone(),
        );

        let task_handle = tokio::spawn(tracker.run());

        let previous = self.trackers.lock().await.insert(
            clip_id.to_string(),
            ManagedTracker {
                job_id: job_id.to_string(),
                cancel,
                task_handle,
            },
        );

        if let Some(previous) = previous {
            if !previous.task_handle.is_finished() {
                tracing::info!(
                    clip_id,
                    job_id = %previous.job_id,
                    "Replacing tracker for superseded render",
                );
            }
            previous.cancel.cancel();
        }
    }
}

impl Drop for RenderQueue {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
