//! Wire format of published schedules
//!
//! ```json
//! { "Channels": [ { "Items": [
//!     { "Time": "2024-05-01T21:30:00+09:00", "Duration": 312000000000, "VideoID": "abc" }
//! ] } ] }
//! ```
//!
//! `Time` carries an offset suffix that is ignored on input (the civil
//! fields are already in the reference zone). `Duration` is in nanoseconds.

use crate::error::{Error, Result};
use crate::instant::{Instant, Seconds};
use crate::timetable::{Item, Schedule, Timetable};
use chrono::FixedOffset;
use serde::{Deserialize, Deserializer, Serialize};

const NANOS_PER_SECOND: f64 = 1e9;

/// Deserialize `null` as an empty list (publishers emit `null` for empty channels)
fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Whole published document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WireSchedule {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub channels: Vec<WireChannel>,
}

/// One channel of the published document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WireChannel {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub items: Vec<WireItem>,
}

/// One scheduled video as published
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireItem {
    #[serde(rename = "Time")]
    pub time: String,

    /// Nanoseconds
    #[serde(rename = "Duration")]
    pub duration: i64,

    #[serde(rename = "VideoID")]
    pub video_id: String,
}

impl WireItem {
    pub fn duration_secs(&self) -> Seconds {
        self.duration as Seconds / NANOS_PER_SECOND
    }

    fn into_item(self) -> Result<Item> {
        let start_time = Instant::parse(&self.time)?;
        let duration = self.duration_secs();
        Ok(Item::new(self.video_id, start_time, duration))
    }

    fn from_item(item: &Item, zone: FixedOffset) -> Self {
        Self {
            time: item.start_time.to_wire(zone),
            duration: (item.duration * NANOS_PER_SECOND).round() as i64,
            video_id: item.video_id.clone(),
        }
    }
}

impl WireSchedule {
    /// Converts to the in-memory snapshot.
    ///
    /// Fails on the first unparseable `Time`. Empty channels are kept; see
    /// [`Schedule::ensure_playable`] for the check done before playback.
    pub fn into_schedule(self) -> Result<Schedule> {
        let channels = self
            .channels
            .into_iter()
            .map(|channel| {
                channel
                    .items
                    .into_iter()
                    .map(WireItem::into_item)
                    .collect::<Result<Vec<_>>>()
                    .map(Timetable::new)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Schedule::new(channels))
    }

    /// Renders a snapshot, stamping every time with `zone`.
    pub fn from_schedule(schedule: &Schedule, zone: FixedOffset) -> Self {
        let channels = schedule
            .channels()
            .iter()
            .map(|channel| WireChannel {
                items: channel
                    .items()
                    .iter()
                    .map(|item| WireItem::from_item(item, zone))
                    .collect(),
            })
            .collect();
        Self { channels }
    }

    /// Parses a JSON document straight into a snapshot.
    pub fn parse_schedule(json: &str) -> Result<Schedule> {
        let wire: WireSchedule = serde_json::from_str(json)?;
        wire.into_schedule()
    }
}

impl TryFrom<WireSchedule> for Schedule {
    type Error = Error;

    fn try_from(wire: WireSchedule) -> Result<Self> {
        wire.into_schedule()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instant::zone_from_offset_minutes;

    const SAMPLE: &str = r#"{
        "Channels": [
            { "Items": [
                { "Time": "2024-05-01T00:00:00+09:00", "Duration": 600000000000, "VideoID": "A" },
                { "Time": "2024-05-01T00:10:00+09:00", "Duration": 1500000000, "VideoID": "B" }
            ] },
            { "Items": null }
        ]
    }"#;

    #[test]
    fn test_parse_sample() {
        let schedule = WireSchedule::parse_schedule(SAMPLE).unwrap();
        assert_eq!(schedule.channel_count(), 2);

        let first = schedule.channel(0).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first.items()[0].video_id, "A");
        assert_eq!(first.items()[0].duration, 600.0);
        assert_eq!(first.items()[1].duration, 1.5);
        assert_eq!(
            first.items()[1].start_time,
            Instant::new(2024, 5, 1, 0, 10, 0).unwrap()
        );

        assert!(schedule.channel(1).unwrap().is_empty());
    }

    #[test]
    fn test_bad_time_is_rejected() {
        let json = r#"{"Channels":[{"Items":[{"Time":"yesterday","Duration":1,"VideoID":"A"}]}]}"#;
        assert!(matches!(
            WireSchedule::parse_schedule(json),
            Err(Error::InvalidTime(_))
        ));
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let json = r#"{"Channels":[{"Items":[{"Time":"2024-05-01T00:00:00+09:00","VideoID":"A"}]}]}"#;
        assert!(matches!(WireSchedule::parse_schedule(json), Err(Error::Json(_))));
    }

    #[test]
    fn test_from_schedule_writes_nanoseconds_and_zone() {
        let schedule = WireSchedule::parse_schedule(SAMPLE).unwrap();
        let zone = zone_from_offset_minutes(540).unwrap();
        let wire = WireSchedule::from_schedule(&schedule, zone);

        let value = serde_json::to_value(&wire).unwrap();
        let item = &value["Channels"][0]["Items"][1];
        assert_eq!(item["Time"], "2024-05-01T00:10:00+09:00");
        assert_eq!(item["Duration"], 1_500_000_000i64);
        assert_eq!(item["VideoID"], "B");
        assert_eq!(value["Channels"][1]["Items"], serde_json::json!([]));
    }
}
