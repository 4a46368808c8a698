//! `clipwise-cli` library crate.
//!
//! Holds argument parsing and progress formatting for the
//! `clipwise-render` binary so they can be tested. The entrypoint lives
//! in `main.rs`.

pub mod args;
pub mod progress;
