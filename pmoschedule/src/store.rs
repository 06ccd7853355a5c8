//! Daily schedule storage
//!
//! One JSON file per civil day (`YYYY-MM-DD.json`) in the wire format, so a
//! stored day can be served as-is.

use crate::error::{Error, Result};
use crate::instant::Instant;
use crate::models::WireSchedule;
use crate::timetable::Schedule;
use chrono::FixedOffset;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory of daily schedules
#[derive(Debug, Clone)]
pub struct ScheduleStore {
    directory: PathBuf,
    zone: FixedOffset,
}

impl ScheduleStore {
    /// Open a store; times are written with `zone` as suffix.
    ///
    /// The directory is created on first save if it does not exist.
    pub fn new(directory: impl Into<PathBuf>, zone: FixedOffset) -> Self {
        Self {
            directory: directory.into(),
            zone,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn zone(&self) -> FixedOffset {
        self.zone
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{key}.json"))
    }

    /// True when a schedule is stored for the day containing `day`.
    pub async fn exists(&self, day: Instant) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.path_for(&day.date_key())).await?)
    }

    /// Load the schedule of the day containing `day`.
    pub async fn load(&self, day: Instant) -> Result<Schedule> {
        let key = day.date_key();
        let content = match tokio::fs::read_to_string(self.path_for(&key)).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::ScheduleNotFound(key));
            }
            Err(e) => return Err(e.into()),
        };

        debug!(day = %key, "Loaded stored schedule");
        WireSchedule::parse_schedule(&content)
    }

    /// Store a schedule under the day of its first item.
    ///
    /// Returns the day key used.
    pub async fn save(&self, schedule: &Schedule) -> Result<String> {
        let first = schedule
            .channel(0)
            .and_then(|channel| channel.first())
            .ok_or(Error::EmptyTimetable(0))?;
        let key = first.start_time.date_key();

        tokio::fs::create_dir_all(&self.directory).await?;

        let wire = WireSchedule::from_schedule(schedule, self.zone);
        let json = serde_json::to_string_pretty(&wire)?;
        tokio::fs::write(self.path_for(&key), json).await?;

        info!(day = %key, "Schedule exported");
        Ok(key)
    }
}
