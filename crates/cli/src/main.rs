//! `clipwise-render` -- submit one clip render and follow it to the end.
//!
//! Prints a line per status update. Exits 0 with the download URL once
//! the render completes, 1 if it fails or tracking stops early, 2 on bad
//! arguments.
//!
//! # Environment variables
//!
//! | Variable                  | Required | Default                 | Description                     |
//! |---------------------------|----------|-------------------------|---------------------------------|
//! | `CLIPWISE_API_URL`        | no       | `http://localhost:8000` | Backend HTTP base URL           |
//! | `CLIPWISE_WS_URL`         | no       | derived from API URL    | Backend WebSocket base URL      |
//! | `CLIPWISE_API_TOKEN`      | no       | --                      | Bearer token for HTTP requests  |
//! | `RENDER_POLL_INTERVAL_MS` | no       | `2000`                  | Polling fallback interval       |
//! | `RENDER_PREFER_OAUTH`     | no       | `true`                  | Fetch source with creator OAuth |

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clipwise_cli::args::{RenderArgs, USAGE};
use clipwise_cli::progress;
use clipwise_render::api::RenderApi;
use clipwise_render::backend::HttpBackend;
use clipwise_render::config::RenderConfig;
use clipwise_render::events::RenderEvent;
use clipwise_render::queue::{QueueConfig, RenderQueue};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clipwise_cli=info,clipwise_render=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = match RenderArgs::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}\n{USAGE}");
            return Ok(ExitCode::from(2));
        }
    };

    let config = RenderConfig::from_env().context("Invalid render configuration")?;

    tracing::info!(
        api_url = %config.api_url,
        ws_url = %config.ws_url,
        poll_interval_ms = config.poll_interval.as_millis() as u64,
        "Starting clipwise-render",
    );

    let api = RenderApi::new(config.api_url.clone()).with_token(config.api_token.clone());
    let backend = HttpBackend::new(api, config.ws_url.clone());
    let queue = RenderQueue::new(Arc::new(backend), QueueConfig::from(&config));
    let mut events = queue.subscribe();

    if let Err(e) = queue
        .submit_segments(&args.clip_id, &args.video_id, args.segments, &args.title)
        .await
    {
        eprintln!("Render not started: {e}");
        return Ok(ExitCode::FAILURE);
    }

    let code = tokio::select! {
        code = follow(&queue, &mut events, &args.clip_id) => code,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, stopping render tracking");
            ExitCode::from(130)
        }
    };

    queue.shutdown().await;
    Ok(code)
}

/// Print events for `clip_id` until its render finishes or tracking stops.
async fn follow(
    queue: &RenderQueue,
    events: &mut broadcast::Receiver<RenderEvent>,
    clip_id: &str,
) -> ExitCode {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Progress output fell behind");
                continue;
            }
            Err(RecvError::Closed) => return ExitCode::FAILURE,
        };

        if let Some(line) = progress::describe(&event) {
            println!("{line}");
        }

        match event {
            RenderEvent::JobFinished { clip_id: id, job } if id == clip_id => {
                if !job.status.is_completed() {
                    return ExitCode::FAILURE;
                }
                match queue.download_url(clip_id).await {
                    Some(url) => println!("Download: {url}"),
                    None => println!("Render completed; download not ready yet"),
                }
                return ExitCode::SUCCESS;
            }
            RenderEvent::ChannelClosed { clip_id: id, .. } if id == clip_id => {
                return ExitCode::FAILURE;
            }
            _ => {}
        }
    }
}
