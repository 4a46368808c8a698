//! In-memory render status store.
//!
//! Maps each clip to the latest known [`RenderJob`] for it. Submission
//! inserts the queued record; trackers replace it on every update. A
//! clip → job correlation table routes updates, so a tracker whose job
//! was cleared or superseded can no longer write.
//!
//! Every mutation is published as a [`RenderEvent`] on a broadcast
//! channel. Call [`StatusStore::subscribe`] to receive them.

use std::collections::HashMap;

use clipwise_core::render::{RenderJob, StatusUpdate};
use clipwise_core::types::{ClipId, JobId};
use tokio::sync::{broadcast, RwLock};

use crate::events::RenderEvent;

/// Broadcast channel capacity for store events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Default)]
struct StoreInner {
    jobs: HashMap<ClipId, RenderJob>,
    /// Which job currently owns each clip's entry.
    correlation: HashMap<ClipId, JobId>,
}

/// Shared per-clip render status, designed to be wrapped in `Arc`.
pub struct StatusStore {
    inner: RwLock<StoreInner>,
    event_tx: broadcast::Sender<RenderEvent>,
}

impl StatusStore {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: RwLock::new(StoreInner::default()),
            event_tx,
        }
    }

    /// Subscribe to store mutations.
    pub fn subscribe(&self) -> broadcast::Receiver<RenderEvent> {
        self.event_tx.subscribe()
    }

    /// Latest known job for a clip.
    pub async fn get(&self, clip_id: &str) -> Option<RenderJob> {
        self.inner.read().await.jobs.get(clip_id).cloned()
    }

    /// Job id currently routed to a clip.
    pub async fn job_id_for(&self, clip_id: &str) -> Option<JobId> {
        self.inner.read().await.correlation.get(clip_id).cloned()
    }

    /// Copy of every tracked clip's job.
    pub async fn snapshot(&self) -> HashMap<ClipId, RenderJob> {
        self.inner.read().await.jobs.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.jobs.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.jobs.is_empty()
    }

    /// Insert the queued record for a freshly submitted job.
    ///
    /// Overwrites whatever the clip held before, including its job
    /// correlation.
    pub async fn insert_queued(&self, clip_id: &str, job_id: &str) {
        {
            let mut inner = self.inner.write().await;
            inner
                .jobs
                .insert(clip_id.to_string(), RenderJob::queued(job_id));
            inner
                .correlation
                .insert(clip_id.to_string(), job_id.to_string());
        }

        self.publish(RenderEvent::JobQueued {
            clip_id: clip_id.to_string(),
            job_id: job_id.to_string(),
        });
    }

    /// Replace a clip's job with `update`.
    ///
    /// Only applied while `clip_id` is still routed to `job_id`. Returns
    /// whether the update was written.
    pub async fn apply(&self, clip_id: &str, job_id: &str, update: StatusUpdate) -> bool {
        let job = RenderJob::from_update(job_id, update);

        {
            let mut inner = self.inner.write().await;
            if inner.correlation.get(clip_id).map(String::as_str) != Some(job_id) {
                tracing::debug!(clip_id, job_id, "Dropping update for untracked job");
                return false;
            }
            inner.jobs.insert(clip_id.to_string(), job.clone());
        }

        let clip_id = clip_id.to_string();
        if job.is_terminal() {
            self.publish(RenderEvent::JobFinished { clip_id, job });
        } else {
            self.publish(RenderEvent::JobUpdated { clip_id, job });
        }
        true
    }

    /// Publish an event that does not mutate the store.
    pub(crate) fn notify(&self, event: RenderEvent) {
        self.publish(event);
    }

    /// Discard every job and the correlation table.
    pub async fn clear(&self) {
        {
            let mut inner = self.inner.write().await;
            inner.jobs.clear();
            inner.correlation.clear();
        }
        self.publish(RenderEvent::JobsCleared);
    }

    fn publish(&self, event: RenderEvent) {
        // A send error only means nobody is subscribed.
        let _ = self.event_tx.send(event);
    }
}

impl Default for StatusStore {
    fn default() -> Self {
        Self::new()
    }
}
