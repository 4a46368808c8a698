//! Per-job render status tracking.
//!
//! A [`Tracker`] follows one job until it reaches a terminal status. It
//! tries the push channel first and drops to fixed-interval polling if
//! the channel cannot be opened or errors before the job finishes. Both
//! transports write through the same path: [`StatusStore::apply`].
//!
//! ```text
//! Connecting ──open ok──▶ Live ──terminal──▶ Done
//!     │                    │ └──clean close──▶ Done (ChannelClosed)
//!  open failed          error
//!     └──────▶ Polling ◀───┘
//!                 └──terminal──▶ Done
//! ```
//!
//! Cancellation is checked at every suspension point; once the token
//! fires no further requests are issued for the job.

use std::sync::Arc;
use std::time::Duration;

use clipwise_core::render::{RenderStatus, StatusUpdate};
use clipwise_core::types::{ClipId, JobId};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::backend::{ChannelFrame, RenderBackend, StatusChannel};
use crate::events::RenderEvent;
use crate::messages::parse_status_message;
use crate::store::StatusStore;

/// How tracking of a job ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackingOutcome {
    /// A terminal status was observed on either transport.
    Finished(RenderStatus),
    /// The push channel closed cleanly before a terminal status. The
    /// last known status is left as-is.
    ChannelClosed,
    /// Tracking was torn down.
    Cancelled,
}

/// Tracking state machine.
pub enum TrackingState {
    Connecting,
    Live(Box<dyn StatusChannel>),
    Polling,
    Done(TrackingOutcome),
}

impl TrackingState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Live(_) => "live",
            Self::Polling => "polling",
            Self::Done(_) => "done",
        }
    }
}

/// Follows one render job, writing every update into the status store.
pub struct Tracker {
    backend: Arc<dyn RenderBackend>,
    store: Arc<StatusStore>,
    clip_id: ClipId,
    job_id: JobId,
    poll_interval: Duration,
    cancel: CancellationToken,
}

impl Tracker {
    pub fn new(
        backend: Arc<dyn RenderBackend>,
        store: Arc<StatusStore>,
        clip_id: impl Into<ClipId>,
        job_id: impl Into<JobId>,
        poll_interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            backend,
            store,
            clip_id: clip_id.into(),
            job_id: job_id.into(),
            poll_interval,
            cancel,
        }
    }

    /// Drive the state machine to completion.
    pub async fn run(self) -> TrackingOutcome {
        let mut state = TrackingState::Connecting;

        loop {
            tracing::debug!(
                clip_id = %self.clip_id,
                job_id = %self.job_id,
                state = state.name(),
                "Render tracker state",
            );

            state = match state {
                TrackingState::Connecting => self.connect().await,
                TrackingState::Live(channel) => self.listen(channel).await,
                TrackingState::Polling => self.poll().await,
                TrackingState::Done(outcome) => {
                    tracing::info!(
                        clip_id = %self.clip_id,
                        job_id = %self.job_id,
                        ?outcome,
                        "Render tracking finished",
                    );
                    return outcome;
                }
            };
        }
    }

    // ---- states ----

    async fn connect(&self) -> TrackingState {
        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return TrackingState::Done(TrackingOutcome::Cancelled),
            result = self.backend.open_channel(&self.job_id) => result,
        };

        match result {
            Ok(channel) => {
                tracing::info!(
                    clip_id = %self.clip_id,
                    job_id = %self.job_id,
                    "Status channel connected",
                );
                TrackingState::Live(channel)
            }
            Err(e) => {
                tracing::warn!(
                    clip_id = %self.clip_id,
                    job_id = %self.job_id,
                    error = %e,
                    "Status channel unavailable, falling back to polling",
                );
                self.fall_back()
            }
        }
    }

    async fn listen(&self, mut channel: Box<dyn StatusChannel>) -> TrackingState {
        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                frame = channel.next_frame() => Some(frame),
            };
            let Some(frame) = next else {
                channel.close().await;
                return TrackingState::Done(TrackingOutcome::Cancelled);
            };

            match frame {
                Some(Ok(ChannelFrame::Text(text))) => match parse_status_message(&text) {
                    Ok(update) => {
                        if let Some(status) = self.apply(update).await {
                            channel.close().await;
                            return TrackingState::Done(TrackingOutcome::Finished(status));
                        }
                    }
                    Err(e) => {
                        tracing::warn!(
                            job_id = %self.job_id,
                            error = %e,
                            raw_message = %text,
                            "Failed to parse status message",
                        );
                    }
                },
                Some(Ok(ChannelFrame::Closed)) | None => {
                    tracing::info!(
                        clip_id = %self.clip_id,
                        job_id = %self.job_id,
                        "Status channel closed before a terminal status",
                    );
                    self.store.notify(RenderEvent::ChannelClosed {
                        clip_id: self.clip_id.clone(),
                        job_id: self.job_id.clone(),
                    });
                    return TrackingState::Done(TrackingOutcome::ChannelClosed);
                }
                Some(Err(e)) => {
                    tracing::warn!(
                        clip_id = %self.clip_id,
                        job_id = %self.job_id,
                        error = %e,
                        "Status channel error, falling back to polling",
                    );
                    channel.close().await;
                    return self.fall_back();
                }
            }
        }
    }

    /// Poll every `poll_interval` until a terminal status. The first
    /// request goes out immediately. Failures are logged and retried on
    /// the next tick.
    async fn poll(&self) -> TrackingState {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return TrackingState::Done(TrackingOutcome::Cancelled),
                _ = ticker.tick() => {}
            }

            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return TrackingState::Done(TrackingOutcome::Cancelled),
                result = self.backend.fetch_status(&self.job_id) => result,
            };

            match result {
                Ok(update) => {
                    if let Some(status) = self.apply(update).await {
                        return TrackingState::Done(TrackingOutcome::Finished(status));
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        clip_id = %self.clip_id,
                        job_id = %self.job_id,
                        error = %e,
                        "Status poll failed",
                    );
                }
            }
        }
    }

    // ---- helpers ----

    fn fall_back(&self) -> TrackingState {
        self.store.notify(RenderEvent::FallbackToPolling {
            clip_id: self.clip_id.clone(),
            job_id: self.job_id.clone(),
        });
        TrackingState::Polling
    }

    /// Write an update to the store. Returns the status if it is terminal.
    async fn apply(&self, update: StatusUpdate) -> Option<RenderStatus> {
        let terminal = update.is_terminal().then(|| update.status.clone());

        tracing::debug!(
            clip_id = %self.clip_id,
            job_id = %self.job_id,
            status = %update.status,
            progress = update.progress,
            "Render status update",
        );
        self.store.apply(&self.clip_id, &self.job_id, update).await;

        terminal
    }
}
