//! Clip time ranges and the render request body (`POST /api/clips/render`).
//!
//! A clip is made of up to three sub-ranges of the source video: a hook,
//! a body, and a loop tail. They are sent to the backend as an ordered
//! segment list.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::ClipId;

// ---------------------------------------------------------------------------
// Segment
// ---------------------------------------------------------------------------

/// A `[start, end)` range in seconds of the source video.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
}

impl Segment {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    fn check(&self, index: usize) -> Result<(), CoreError> {
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(CoreError::Validation(format!(
                "Segment {index} has a non-finite bound"
            )));
        }
        if self.start < 0.0 {
            return Err(CoreError::Validation(format!(
                "Segment {index} starts before 0 ({})",
                self.start
            )));
        }
        if self.end <= self.start {
            return Err(CoreError::Validation(format!(
                "Segment {index} must end after it starts ({} >= {})",
                self.start, self.end
            )));
        }
        Ok(())
    }
}

/// Validate an ordered segment list before submission.
pub fn validate_segments(segments: &[Segment]) -> Result<(), CoreError> {
    if segments.is_empty() {
        return Err(CoreError::Validation(
            "At least one segment is required".to_string(),
        ));
    }
    segments
        .iter()
        .enumerate()
        .try_for_each(|(i, segment)| segment.check(i))
}

// ---------------------------------------------------------------------------
// ClipRanges
// ---------------------------------------------------------------------------

/// The hook/body/loop sub-ranges picked for a clip. Any of them may be unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClipRanges {
    pub hook: Option<Segment>,
    pub body: Option<Segment>,
    pub loop_segment: Option<Segment>,
}

impl ClipRanges {
    /// Present ranges in playback order: hook, body, loop.
    pub fn segments(&self) -> Vec<Segment> {
        [self.hook, self.body, self.loop_segment]
            .into_iter()
            .flatten()
            .collect()
    }
}

// ---------------------------------------------------------------------------
// RenderRequest
// ---------------------------------------------------------------------------

/// JSON body of a render submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub video_id: String,
    pub clip_id: ClipId,
    pub segments: Vec<Segment>,
    pub title: String,
    pub prefer_oauth: bool,
}

impl RenderRequest {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.video_id.trim().is_empty() {
            return Err(CoreError::Validation("video_id must not be empty".to_string()));
        }
        if self.clip_id.trim().is_empty() {
            return Err(CoreError::Validation("clip_id must not be empty".to_string()));
        }
        validate_segments(&self.segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(segments: Vec<Segment>) -> RenderRequest {
        RenderRequest {
            video_id: "vid-1".to_string(),
            clip_id: "clip-1".to_string(),
            segments,
            title: "Best moment".to_string(),
            prefer_oauth: true,
        }
    }

    #[test]
    fn assembles_ranges_in_order() {
        let ranges = ClipRanges {
            hook: Some(Segment::new(5.0, 8.0)),
            body: Some(Segment::new(30.0, 60.0)),
            loop_segment: Some(Segment::new(1.0, 2.0)),
        };
        assert_eq!(
            ranges.segments(),
            vec![
                Segment::new(5.0, 8.0),
                Segment::new(30.0, 60.0),
                Segment::new(1.0, 2.0),
            ]
        );
    }

    #[test]
    fn skips_missing_ranges() {
        let ranges = ClipRanges {
            body: Some(Segment::new(10.0, 40.0)),
            ..Default::default()
        };
        assert_eq!(ranges.segments(), vec![Segment::new(10.0, 40.0)]);
        assert!(ClipRanges::default().segments().is_empty());
    }

    #[test]
    fn accepts_valid_request() {
        assert!(request(vec![Segment::new(10.0, 40.0)]).validate().is_ok());
        assert!(request(vec![Segment::new(0.0, 0.5)]).validate().is_ok());
    }

    #[test]
    fn rejects_empty_segments() {
        let err = request(vec![]).validate().unwrap_err();
        assert!(err.to_string().contains("At least one segment"));
    }

    #[test]
    fn rejects_inverted_and_empty_ranges() {
        assert!(request(vec![Segment::new(40.0, 10.0)]).validate().is_err());
        assert!(request(vec![Segment::new(10.0, 10.0)]).validate().is_err());
    }

    #[test]
    fn rejects_negative_and_non_finite_bounds() {
        assert!(request(vec![Segment::new(-1.0, 3.0)]).validate().is_err());
        assert!(request(vec![Segment::new(0.0, f64::INFINITY)]).validate().is_err());
        assert!(request(vec![Segment::new(f64::NAN, 3.0)]).validate().is_err());
    }

    #[test]
    fn reports_offending_segment_index() {
        let err = request(vec![Segment::new(0.0, 1.0), Segment::new(5.0, 4.0)])
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("Segment 1"));
    }

    #[test]
    fn rejects_blank_identifiers() {
        let mut req = request(vec![Segment::new(0.0, 1.0)]);
        req.video_id = "  ".to_string();
        assert!(req.validate().is_err());

        let mut req = request(vec![Segment::new(0.0, 1.0)]);
        req.clip_id = String::new();
        assert!(req.validate().is_err());
    }

    #[test]
    fn request_body_shape() {
        let value = serde_json::to_value(request(vec![Segment::new(10.0, 40.0)])).unwrap();
        assert_eq!(value["video_id"], "vid-1");
        assert_eq!(value["clip_id"], "clip-1");
        assert_eq!(value["segments"][0]["start"], 10.0);
        assert_eq!(value["segments"][0]["end"], 40.0);
        assert_eq!(value["title"], "Best moment");
        assert_eq!(value["prefer_oauth"], true);
    }
}
