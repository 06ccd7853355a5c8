//! Civil time in the reference zone.
//!
//! Every [`Instant`] is a zone-less wall-clock reading that is *asserted* to
//! be expressed in the broadcast's reference zone (JST by default). Instants
//! are only ever compared or subtracted with other instants of that same
//! zone, so arithmetic happens on the naive timeline and never depends on
//! the host's local zone setting.

use crate::error::{Error, Result};
use chrono::{FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeDelta, Timelike, Utc};
use std::fmt;
use std::sync::Mutex;

/// Signed quantity of seconds (fractional when read from nanosecond durations)
pub type Seconds = f64;

/// Reference zone offset used when nothing else is configured (JST, UTC+9)
pub const DEFAULT_ZONE_OFFSET_MINUTES: i64 = 9 * 60;

const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const SECONDS_PER_DAY: Seconds = 86_400.0;

/// A civil wall-clock point in time in the reference zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Instant(NaiveDateTime);

impl Instant {
    /// Builds an instant from its civil fields.
    pub fn new(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(hour, minute, second))
            .map(Self)
            .ok_or_else(|| {
                Error::InvalidTime(format!(
                    "{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}:{second:02}"
                ))
            })
    }

    pub fn as_naive(&self) -> NaiveDateTime {
        self.0
    }

    /// Parses a schedule timestamp such as `2024-05-01T21:30:00+09:00`.
    ///
    /// The offset suffix (`Z`, `+HH:MM` or `-HH:MM`) is stripped and ignored:
    /// the civil fields are taken as-is in the reference zone. Sub-second
    /// digits are dropped.
    pub fn parse(value: &str) -> Result<Self> {
        let invalid = || Error::InvalidTime(value.to_string());
        let trimmed = value.trim();
        let (date, time) = trimmed.split_once('T').ok_or_else(invalid)?;

        let time = time.strip_suffix('Z').unwrap_or(time);
        let time = match time.find(['+', '-']) {
            Some(pos) => &time[..pos],
            None => time,
        };

        let naive = NaiveDateTime::parse_from_str(&format!("{date}T{time}"), WIRE_FORMAT)
            .map_err(|_| invalid())?;
        let naive = naive.with_nanosecond(0).ok_or_else(invalid)?;
        Ok(Self(naive))
    }

    /// Renders the instant with the reference zone suffix (`...+09:00`).
    pub fn to_wire(&self, zone: FixedOffset) -> String {
        format!("{}{}", self.0.format(WIRE_FORMAT), zone)
    }

    /// `self - earlier`, in seconds.
    ///
    /// Computed on the absolute (naive) timeline, so day, month and year
    /// boundaries are handled correctly.
    pub fn subtract(&self, earlier: Instant) -> Seconds {
        let delta = self.0 - earlier.0;
        delta.num_seconds() as Seconds + Seconds::from(delta.subsec_nanos()) / 1e9
    }

    /// Shifts the instant by a (possibly fractional, possibly negative) number of seconds.
    pub fn add_seconds(&self, seconds: Seconds) -> Self {
        let nanos = (seconds * 1e9).round() as i64;
        Self(self.0 + TimeDelta::nanoseconds(nanos))
    }

    /// Midnight of the same civil day.
    pub fn start_of_day(&self) -> Self {
        Self(self.0.date().and_time(chrono::NaiveTime::MIN))
    }

    /// Midnight of the following civil day.
    pub fn next_day(&self) -> Self {
        self.start_of_day().add_seconds(SECONDS_PER_DAY)
    }

    /// Day key used to name stored schedules (`YYYY-MM-DD`).
    pub fn date_key(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(WIRE_FORMAT))
    }
}

/// `a - b` in seconds.
pub fn subtract(a: Instant, b: Instant) -> Seconds {
    a.subtract(b)
}

/// Builds the reference zone from an offset in minutes east of UTC.
pub fn zone_from_offset_minutes(minutes: i64) -> Result<FixedOffset> {
    i32::try_from(minutes * 60)
        .ok()
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| Error::other(format!("Invalid zone offset: {minutes} minutes")))
}

/// Source of the current instant in the reference zone.
pub trait WallClock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Host clock converted to the reference zone.
///
/// The conversion goes through UTC, so the host's own zone setting has no
/// influence on the result.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    zone: FixedOffset,
}

impl SystemClock {
    pub fn new(zone: FixedOffset) -> Self {
        Self { zone }
    }

    pub fn zone(&self) -> FixedOffset {
        self.zone
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        // L'offset JST est une constante valide
        let zone = FixedOffset::east_opt((DEFAULT_ZONE_OFFSET_MINUTES * 60) as i32)
            .unwrap_or_else(|| Utc.fix());
        Self { zone }
    }
}

impl WallClock for SystemClock {
    fn now(&self) -> Instant {
        let local = Utc::now().with_timezone(&self.zone).naive_local();
        // Whole seconds only, like every parsed schedule time
        Instant(local.with_nanosecond(0).unwrap_or(local))
    }
}

/// Clock that only moves when told to. Used by tests and demos.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new(start: Instant) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, instant: Instant) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = instant;
    }

    pub fn advance(&self, seconds: Seconds) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now = now.add_seconds(seconds);
    }
}

impl WallClock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}
