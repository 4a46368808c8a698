//! Push channel message parser.
//!
//! The backend pushes JSON text frames shaped like a render job minus
//! its `job_id`: `{"status": "...", "progress": 40, "message": "...",
//! "ready_for_download": false}`.

use clipwise_core::render::StatusUpdate;

/// Parse a push channel text frame into a [`StatusUpdate`].
///
/// Returns `Err` for malformed JSON or a missing `status`. Callers log
/// and keep listening.
pub fn parse_status_message(text: &str) -> Result<StatusUpdate, serde_json::Error> {
    serde_json::from_str(text)
}
