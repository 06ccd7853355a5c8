//! Error types for schedule handling

/// Result type alias for schedule operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading, converting or generating schedules
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A schedule timestamp could not be parsed
    #[error("Invalid schedule time: {0}")]
    InvalidTime(String),

    /// A channel has no items, so nothing can be located on it
    #[error("Channel {0} has an empty timetable")]
    EmptyTimetable(usize),

    /// No stored schedule for the requested day
    #[error("Schedule not found for {0}")]
    ScheduleNotFound(String),

    /// The catalog has no video left that satisfies the exclusion rules
    #[error("Video catalog exhausted")]
    CatalogExhausted,

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a generic error from a string
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}
