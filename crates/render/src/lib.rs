//! Render submission and status tracking client.
//!
//! Submits clip renders to the backend REST API, follows each job over
//! its WebSocket push channel, falls back to fixed-interval polling when
//! the channel fails, and keeps the latest status per clip in a shared
//! [`store::StatusStore`] that UIs subscribe to.

pub mod api;
pub mod backend;
pub mod client;
pub mod config;
pub mod events;
pub mod messages;
pub mod queue;
pub mod store;
pub mod tracker;
