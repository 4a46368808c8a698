//! Domain types for the Clipwise render client.
//!
//! Pure data and validation: render job records, status vocabulary,
//! clip segment ranges, and the render request body. No I/O lives here.

pub mod error;
pub mod render;
pub mod segments;
pub mod types;
