/// Client-side identifier of a clip (the key of the status store).
pub type ClipId = String;

/// Opaque render job identifier assigned by the backend at submission.
pub type JobId = String;
