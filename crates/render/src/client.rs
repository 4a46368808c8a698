//! WebSocket push channel for render status.
//!
//! Each render job has its own channel at
//! `{ws_url}/api/clips/ws/render/{job_id}`. [`connect_status_channel`]
//! opens it and wraps the stream in a [`WsStatusChannel`], which yields
//! text and close frames to the tracker.

use async_trait::async_trait;
use futures::StreamExt;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::backend::{ChannelFrame, StatusChannel};

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Errors raised by the push channel.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// Failed to establish the WebSocket connection.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A protocol-level error on an already-established connection.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Build the channel URL for a job.
pub fn status_channel_url(ws_url: &str, job_id: &str) -> String {
    format!(
        "{}/api/clips/ws/render/{}",
        ws_url.trim_end_matches('/'),
        job_id
    )
}

/// Open the push channel for `job_id`.
pub async fn connect_status_channel(
    ws_url: &str,
    job_id: &str,
) -> Result<WsStatusChannel, ChannelError> {
    let url = status_channel_url(ws_url, job_id);

    let (stream, _response) = connect_async(url.as_str()).await.map_err(|e| {
        ChannelError::Connection(format!("Failed to open status channel at {url}: {e}"))
    })?;

    tracing::debug!(job_id, url = %url, "Status channel open");

    Ok(WsStatusChannel {
        stream: Some(stream),
    })
}

/// A live push channel for one render job.
///
/// Becomes inert once closed: [`next_frame`](StatusChannel::next_frame)
/// returns `None` and [`close`](StatusChannel::close) is a no-op.
pub struct WsStatusChannel {
    stream: Option<WsStream>,
}

#[async_trait]
impl StatusChannel for WsStatusChannel {
    async fn next_frame(&mut self) -> Option<Result<ChannelFrame, ChannelError>> {
        let stream = self.stream.as_mut()?;

        loop {
            match stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(ChannelFrame::Text(text))),
                Ok(Message::Close(frame)) => {
                    tracing::debug!(?frame, "Status channel closed by backend");
                    return Some(Ok(ChannelFrame::Closed));
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {
                    // Handled automatically by tungstenite.
                }
                Ok(Message::Binary(_) | Message::Frame(_)) => {
                    tracing::trace!("Ignoring non-text status frame");
                }
                Err(e) => return Some(Err(ChannelError::Protocol(e.to_string()))),
            }
        }
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.close(None).await {
                tracing::debug!(error = %e, "Status channel close handshake failed");
            }
        }
    }
}
