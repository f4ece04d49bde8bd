use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackError {
    #[error("Failed to read track file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse track definition: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Track definition contains no tracks")]
    EmptyTrackList,
    #[error("Track geometry needs at least 2 points, got {0}")]
    TooFewPoints(usize),
    #[error("Track geometry has zero length")]
    ZeroLengthTrack,
}
