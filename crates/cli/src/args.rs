//! Command-line arguments for `clipwise-render`.
//!
//! ```text
//! clipwise-render <video_id> <clip_id> <title> <start-end>...
//! ```
//!
//! Ranges are seconds of the source video, e.g. `10-40` or `12.5-19.75`,
//! rendered in the order given.

use clipwise_core::segments::Segment;

pub const USAGE: &str = "usage: clipwise-render <video_id> <clip_id> <title> <start-end>...";

/// Parsed invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderArgs {
    pub video_id: String,
    pub clip_id: String,
    pub title: String,
    pub segments: Vec<Segment>,
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ArgsError {
    #[error("missing {0}")]
    Missing(&'static str),

    #[error("invalid range '{0}', expected <start>-<end> in seconds")]
    InvalidRange(String),
}

impl RenderArgs {
    /// Parse arguments, excluding the program name.
    pub fn parse<I>(args: I) -> Result<Self, ArgsError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let video_id = args.next().ok_or(ArgsError::Missing("video_id"))?;
        let clip_id = args.next().ok_or(ArgsError::Missing("clip_id"))?;
        let title = args.next().ok_or(ArgsError::Missing("title"))?;

        let segments = args
            .map(|raw| parse_range(&raw))
            .collect::<Result<Vec<_>, _>>()?;
        if segments.is_empty() {
            return Err(ArgsError::Missing("at least one <start-end> range"));
        }

        Ok(Self {
            video_id,
            clip_id,
            title,
            segments,
        })
    }
}

/// Parse `start-end` into a [`Segment`]. Bounds are checked later by
/// request validation.
pub fn parse_range(raw: &str) -> Result<Segment, ArgsError> {
    let invalid = || ArgsError::InvalidRange(raw.to_string());
    let (start, end) = raw.split_once('-').ok_or_else(invalid)?;
    let start: f64 = start.trim().parse().map_err(|_| invalid())?;
    let end: f64 = end.trim().parse().map_err(|_| invalid())?;
    Ok(Segment::new(start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_range() {
        assert_eq!(parse_range("10-40").unwrap(), Segment::new(10.0, 40.0));
        assert_eq!(parse_range("12.5-19.75").unwrap(), Segment::new(12.5, 19.75));
    }

    #[test]
    fn rejects_malformed_ranges() {
        assert!(parse_range("10").is_err());
        assert!(parse_range("a-b").is_err());
        assert!(parse_range("10-").is_err());
    }
}
