//! One-line progress rendering of [`RenderEvent`]s.

use clipwise_core::render::RenderJob;
use clipwise_render::events::RenderEvent;

/// Format an event for the terminal, or `None` if it is not worth printing.
pub fn describe(event: &RenderEvent) -> Option<String> {
    match event {
        RenderEvent::JobQueued { clip_id, job_id } => {
            Some(format!("[{clip_id}] queued as {job_id}"))
        }
        RenderEvent::JobUpdated { clip_id, job } | RenderEvent::JobFinished { clip_id, job } => {
            Some(format!("[{clip_id}] {}", status_line(job)))
        }
        RenderEvent::FallbackToPolling { clip_id, .. } => {
            Some(format!("[{clip_id}] live updates unavailable, polling"))
        }
        RenderEvent::ChannelClosed { clip_id, .. } => Some(format!(
            "[{clip_id}] live updates ended before the render finished"
        )),
        RenderEvent::JobsCleared => None,
    }
}

fn status_line(job: &RenderJob) -> String {
    let mut line = format!("{:<10} {:>3.0}%", job.status.as_str(), job.progress_percent());
    if !job.message.is_empty() {
        line.push_str("  ");
        line.push_str(&job.message);
    }
    line
}
