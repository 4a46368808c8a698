//! The seam between render orchestration and the network.
//!
//! [`RenderBackend`] covers the three backend calls the client makes
//! (submit, fetch status, open push channel). [`HttpBackend`] is the
//! production implementation over [`RenderApi`] and the WebSocket client;
//! tests substitute scripted backends.

use async_trait::async_trait;
use clipwise_core::render::StatusUpdate;
use clipwise_core::segments::RenderRequest;
use clipwise_core::types::JobId;

use crate::api::{RenderApi, RenderApiError};
use crate::client::{connect_status_channel, ChannelError};

/// A frame delivered by a push channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelFrame {
    /// A text message, expected to hold a JSON status payload.
    Text(String),
    /// The backend closed the channel cleanly.
    Closed,
}

/// An open push-update channel for one job.
#[async_trait]
pub trait StatusChannel: Send {
    /// Wait for the next frame.
    ///
    /// `None` means the stream ended without a close frame, which the
    /// tracker treats the same as [`ChannelFrame::Closed`].
    async fn next_frame(&mut self) -> Option<Result<ChannelFrame, ChannelError>>;

    /// Close the channel. Safe to call more than once.
    async fn close(&mut self);
}

/// Errors surfaced by a [`RenderBackend`].
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error(transparent)]
    Api(#[from] RenderApiError),

    #[error(transparent)]
    Channel(#[from] ChannelError),
}

/// Backend operations used by the render queue and trackers.
#[async_trait]
pub trait RenderBackend: Send + Sync {
    /// Start a render and return its job id.
    async fn submit(&self, request: &RenderRequest) -> Result<JobId, BackendError>;

    /// Pull the current status of a job.
    async fn fetch_status(&self, job_id: &str) -> Result<StatusUpdate, BackendError>;

    /// Open the push channel for a job.
    async fn open_channel(&self, job_id: &str) -> Result<Box<dyn StatusChannel>, BackendError>;

    /// URL the rendered artifact is downloaded from.
    fn download_url(&self, job_id: &str) -> String;
}

/// [`RenderBackend`] over HTTP and WebSocket.
#[derive(Clone)]
pub struct HttpBackend {
    api: RenderApi,
    ws_url: String,
}

impl HttpBackend {
    /// * `api`    - REST client for the backend.
    /// * `ws_url` - WebSocket base URL, e.g. `ws://host:8000`.
    pub fn new(api: RenderApi, ws_url: impl Into<String>) -> Self {
        Self {
            api,
            ws_url: ws_url.into(),
        }
    }

    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }
}

#[async_trait]
impl RenderBackend for HttpBackend {
    async fn submit(&self, request: &RenderRequest) -> Result<JobId, BackendError> {
        Ok(self.api.submit_render(request).await?.job_id)
    }

    async fn fetch_status(&self, job_id: &str) -> Result<StatusUpdate, BackendError> {
        Ok(self.api.fetch_status(job_id).await?)
    }

    async fn open_channel(&self, job_id: &str) -> Result<Box<dyn StatusChannel>, BackendError> {
        let channel = connect_status_channel(&self.ws_url, job_id).await?;
        Ok(Box::new(channel))
    }

    fn download_url(&self, job_id: &str) -> String {
        self.api.download_url(job_id)
    }
}
