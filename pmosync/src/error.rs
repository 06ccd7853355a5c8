//! Error types for the synchronisation layer

/// Result type alias for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors raised while driving players.
///
/// None of them is fatal to a sync loop: the tick is abandoned and the next
/// one starts from a fresh observation.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The player capability reported a failure
    #[error("Player capability error: {0}")]
    Capability(String),

    /// A capability call did not answer in time
    #[error("Player call '{0}' timed out")]
    Timeout(&'static str),

    /// The current snapshot has no timetable for this channel
    #[error("No timetable for channel {0} in the current schedule")]
    ChannelMissing(usize),

    /// Schedule fetch or conversion failed
    #[error("Schedule error: {0}")]
    Schedule(#[from] pmoschedule::Error),
}

impl SyncError {
    pub fn capability(msg: impl Into<String>) -> Self {
        Self::Capability(msg.into())
    }
}
