//! Events published by the status store.
//!
//! UIs subscribe through [`StatusStore::subscribe`](crate::store::StatusStore::subscribe)
//! and re-render from these instead of polling the store.

use clipwise_core::render::RenderJob;
use clipwise_core::types::{ClipId, JobId};
use serde::Serialize;

/// A change to the tracked render state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderEvent {
    /// A render was submitted and its queued record inserted.
    JobQueued { clip_id: ClipId, job_id: JobId },

    /// A non-terminal status update was applied.
    JobUpdated { clip_id: ClipId, job: RenderJob },

    /// A terminal status (`completed` or `failed`) was applied.
    JobFinished { clip_id: ClipId, job: RenderJob },

    /// The push channel failed and the tracker switched to polling.
    FallbackToPolling { clip_id: ClipId, job_id: JobId },

    /// The push channel closed cleanly before a terminal status. The
    /// job keeps its last known status and is no longer tracked.
    ChannelClosed { clip_id: ClipId, job_id: JobId },

    /// All tracked jobs were discarded.
    JobsCleared,
}
