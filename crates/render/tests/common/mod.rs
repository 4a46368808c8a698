//! Scripted render backend shared by the integration tests.
//!
//! Each test queues up what the backend should do (submission result,
//! channel behaviour, poll responses) and inspects the recorded calls
//! afterwards. Poll times are recorded with `tokio::time::Instant`, so
//! tests running with paused time see exact virtual offsets.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use clipwise_core::render::StatusUpdate;
use clipwise_core::segments::RenderRequest;
use clipwise_core::types::JobId;
use clipwise_render::api::RenderApiError;
use clipwise_render::backend::{BackendError, ChannelFrame, RenderBackend, StatusChannel};
use clipwise_render::client::ChannelError;
use clipwise_render::events::RenderEvent;
use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;

pub type FrameSender = mpsc::UnboundedSender<Result<ChannelFrame, ChannelError>>;

/// What `open_channel` should do on its next call.
pub enum ChannelPlan {
    Refuse,
    Accept(mpsc::UnboundedReceiver<Result<ChannelFrame, ChannelError>>, Arc<AtomicBool>),
}

/// Handle for driving an accepted channel from a test.
pub struct ChannelHandle {
    pub frames: FrameSender,
    pub closed: Arc<AtomicBool>,
}

impl ChannelHandle {
    pub fn send_text(&self, text: &str) {
        let _ = self.frames.send(Ok(ChannelFrame::Text(text.to_string())));
    }

    pub fn send_error(&self) {
        let _ = self
            .frames
            .send(Err(ChannelError::Protocol("connection reset".to_string())));
    }

    pub fn send_close(&self) {
        let _ = self.frames.send(Ok(ChannelFrame::Closed));
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct Script {
    submit_results: VecDeque<Result<JobId, u16>>,
    channel_plans: VecDeque<ChannelPlan>,
    poll_results: VecDeque<Result<StatusUpdate, u16>>,
    submitted: Vec<RenderRequest>,
    channel_opens: Vec<JobId>,
    poll_calls: Vec<(JobId, Instant)>,
}

#[derive(Default)]
pub struct ScriptedBackend {
    script: Mutex<Script>,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn submit_ok(&self, job_id: &str) {
        self.script
            .lock()
            .unwrap()
            .submit_results
            .push_back(Ok(job_id.to_string()));
    }

    pub fn submit_err(&self, status: u16) {
        self.script
            .lock()
            .unwrap()
            .submit_results
            .push_back(Err(status));
    }

    pub fn refuse_channel(&self) {
        self.script
            .lock()
            .unwrap()
            .channel_plans
            .push_back(ChannelPlan::Refuse);
    }

    pub fn accept_channel(&self) -> ChannelHandle {
        let (frames, rx) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));
        self.script
            .lock()
            .unwrap()
            .channel_plans
            .push_back(ChannelPlan::Accept(rx, Arc::clone(&closed)));
        ChannelHandle { frames, closed }
    }

    pub fn poll_ok(&self, update: StatusUpdate) {
        self.script
            .lock()
            .unwrap()
            .poll_results
            .push_back(Ok(update));
    }

    pub fn poll_err(&self, status: u16) {
        self.script
            .lock()
            .unwrap()
            .poll_results
            .push_back(Err(status));
    }

    pub fn submitted(&self) -> Vec<RenderRequest> {
        self.script.lock().unwrap().submitted.clone()
    }

    pub fn channel_opens(&self) -> usize {
        self.script.lock().unwrap().channel_opens.len()
    }

    pub fn poll_count(&self) -> usize {
        self.script.lock().unwrap().poll_calls.len()
    }

    pub fn poll_times(&self) -> Vec<Instant> {
        self.script
            .lock()
            .unwrap()
            .poll_calls
            .iter()
            .map(|(_, at)| *at)
            .collect()
    }
}

fn api_error(status: u16) -> BackendError {
    BackendError::Api(RenderApiError::ApiError {
        status,
        body: "scripted failure".to_string(),
    })
}

#[async_trait]
impl RenderBackend for ScriptedBackend {
    async fn submit(&self, request: &RenderRequest) -> Result<JobId, BackendError> {
        let mut script = self.script.lock().unwrap();
        script.submitted.push(request.clone());
        match script.submit_results.pop_front() {
            Some(Ok(job_id)) => Ok(job_id),
            Some(Err(status)) => Err(api_error(status)),
            None => Err(api_error(500)),
        }
    }

    async fn fetch_status(&self, job_id: &str) -> Result<StatusUpdate, BackendError> {
        let mut script = self.script.lock().unwrap();
        script.poll_calls.push((job_id.to_string(), Instant::now()));
        match script.poll_results.pop_front() {
            Some(Ok(update)) => Ok(update),
            Some(Err(status)) => Err(api_error(status)),
            // Unscripted polls keep reporting an in-progress job.
            None => Ok(StatusUpdate::new("processing", 50.0)),
        }
    }

    async fn open_channel(&self, job_id: &str) -> Result<Box<dyn StatusChannel>, BackendError> {
        let plan = {
            let mut script = self.script.lock().unwrap();
            script.channel_opens.push(job_id.to_string());
            script.channel_plans.pop_front()
        };
        match plan {
            Some(ChannelPlan::Accept(frames, closed)) => {
                Ok(Box::new(ScriptedChannel { frames, closed }))
            }
            Some(ChannelPlan::Refuse) | None => Err(BackendError::Channel(
                ChannelError::Connection("connection refused".to_string()),
            )),
        }
    }

    fn download_url(&self, job_id: &str) -> String {
        format!("http://backend.test/api/clips/{job_id}/download")
    }
}

struct ScriptedChannel {
    frames: mpsc::UnboundedReceiver<Result<ChannelFrame, ChannelError>>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl StatusChannel for ScriptedChannel {
    async fn next_frame(&mut self) -> Option<Result<ChannelFrame, ChannelError>> {
        if self.closed.load(Ordering::SeqCst) {
            return None;
        }
        self.frames.recv().await
    }

    async fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Receive events until one matches, skipping the rest.
pub async fn wait_for<F>(rx: &mut broadcast::Receiver<RenderEvent>, mut matches: F) -> RenderEvent
where
    F: FnMut(&RenderEvent) -> bool,
{
    loop {
        let event = rx.recv().await.expect("event channel closed");
        if matches(&event) {
            return event;
        }
    }
}

pub fn processing(progress: f64) -> StatusUpdate {
    StatusUpdate::new("processing", progress)
}

pub fn completed() -> StatusUpdate {
    StatusUpdate::new("completed", 100.0).with_ready_for_download(true)
}

pub fn failed() -> StatusUpdate {
    StatusUpdate::new("failed", 30.0).with_message("Encoder crashed")
}
