//! Daily schedule generation
//!
//! Fills each channel of a civil day with random videos from a [`Catalog`]:
//!
//! - a video is used at most once per channel and per day,
//! - a video is never picked while another channel is showing it,
//! - videos of `max_item_secs` or longer are never scheduled.
//!
//! Each channel starts where the previous day's channel finished (or at
//! midnight) and is filled up to the following midnight, so the last item
//! usually spills a little into the next day.

use crate::error::{Error, Result};
use crate::instant::{Instant, Seconds};
use crate::store::ScheduleStore;
use crate::timetable::{Item, Schedule, Timetable};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// Videos longer than this are skipped by default (30 minutes)
pub const DEFAULT_MAX_ITEM_SECS: Seconds = 30.0 * 60.0;

/// Default number of channels per schedule
pub const DEFAULT_CHANNEL_COUNT: usize = 4;

/// One video of the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogVideo {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub duration_secs: Seconds,
}

/// Pool of videos the generator draws from
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    videos: Vec<CatalogVideo>,
}

impl Catalog {
    pub fn from_videos(videos: Vec<CatalogVideo>) -> Self {
        Self { videos }
    }

    /// Load a JSON array of videos
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;
        let videos: Vec<CatalogVideo> = serde_json::from_str(&content)?;
        debug!(
            path = %path.as_ref().display(),
            videos = videos.len(),
            "Catalog loaded"
        );
        Ok(Self { videos })
    }

    pub fn videos(&self) -> &[CatalogVideo] {
        &self.videos
    }

    pub fn len(&self) -> usize {
        self.videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }
}

/// Random schedule builder
pub struct ScheduleGenerator<R: Rng = StdRng> {
    catalog: Catalog,
    rng: R,
    channel_count: usize,
    max_item_secs: Seconds,
}

impl ScheduleGenerator<StdRng> {
    /// Generator seeded from the OS
    pub fn new(catalog: Catalog, channel_count: usize, max_item_secs: Seconds) -> Self {
        Self::with_rng(catalog, channel_count, max_item_secs, StdRng::from_os_rng())
    }
}

impl<R: Rng> ScheduleGenerator<R> {
    pub fn with_rng(catalog: Catalog, channel_count: usize, max_item_secs: Seconds, rng: R) -> Self {
        Self {
            catalog,
            rng,
            channel_count,
            max_item_secs,
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    fn pick(&mut self, excluded: &HashSet<&str>) -> Result<CatalogVideo> {
        let candidates: Vec<&CatalogVideo> = self
            .catalog
            .videos
            .iter()
            .filter(|v| v.duration_secs > 0.0 && v.duration_secs < self.max_item_secs)
            .filter(|v| !excluded.contains(v.id.as_str()))
            .collect();

        if candidates.is_empty() {
            return Err(Error::CatalogExhausted);
        }

        let index = self.rng.random_range(0..candidates.len());
        Ok(candidates[index].clone())
    }

    /// Fill one channel from `start` up to the following midnight.
    ///
    /// `others` are the channels already generated for the same day.
    pub fn create_channel(&mut self, start: Instant, others: &[Timetable]) -> Result<Timetable> {
        let end = start.next_day();
        let mut current = start;
        let mut items: Vec<Item> = Vec::new();

        while current < end {
            let mut excluded: HashSet<&str> =
                items.iter().map(|item| item.video_id.as_str()).collect();
            excluded.extend(
                others
                    .iter()
                    .filter_map(|channel| channel.item_at(current))
                    .map(|item| item.video_id.as_str()),
            );

            let video = self.pick(&excluded)?;
            items.push(Item::new(video.id, current, video.duration_secs));
            current = current.add_seconds(video.duration_secs);
        }

        Ok(Timetable::new(items))
    }

    /// Build the schedule of the civil day starting at `day`.
    ///
    /// With a `previous` schedule, channel `i` starts when the previous
    /// channel `i` finishes, unless that is before `day`.
    pub fn create_schedule(&mut self, previous: Option<&Schedule>, day: Instant) -> Result<Schedule> {
        let day = day.start_of_day();
        let mut channels: Vec<Timetable> = Vec::with_capacity(self.channel_count);

        for index in 0..self.channel_count {
            let start = previous
                .and_then(|schedule| schedule.channel(index))
                .and_then(Timetable::finish_time)
                .filter(|finish| *finish > day)
                .unwrap_or(day);

            let channel = self.create_channel(start, &channels)?;
            debug!(channel = index, items = channel.len(), start = %start, "Channel generated");
            channels.push(channel);
        }

        Ok(Schedule::new(channels))
    }
}

/// What [`export`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// Tomorrow was already stored, nothing written
    AlreadyExported,
    /// Tomorrow written (and today as well when it was missing)
    Exported {
        created_today: bool,
        tomorrow: String,
    },
}

/// Daily export job: make sure today and tomorrow are stored.
///
/// Tomorrow continues each channel of today, so playback stays seamless
/// across midnight.
pub async fn export<R: Rng>(
    store: &ScheduleStore,
    generator: &mut ScheduleGenerator<R>,
    today: Instant,
) -> Result<ExportOutcome> {
    let today = today.start_of_day();
    let tomorrow = today.next_day();

    if store.exists(tomorrow).await? {
        debug!(day = %tomorrow.date_key(), "Tomorrow already exported");
        return Ok(ExportOutcome::AlreadyExported);
    }

    let (today_schedule, created_today) = match store.load(today).await {
        Ok(schedule) => (schedule, false),
        Err(Error::ScheduleNotFound(_)) => {
            info!(day = %today.date_key(), "No schedule for today, generating it");
            let schedule = generator.create_schedule(None, today)?;
            store.save(&schedule).await?;
            (schedule, true)
        }
        Err(e) => return Err(e),
    };

    let next = generator.create_schedule(Some(&today_schedule), tomorrow)?;
    let key = store.save(&next).await?;

    Ok(ExportOutcome::Exported {
        created_today,
        tomorrow: key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(count: usize, duration_secs: Seconds) -> Catalog {
        Catalog::from_videos(
            (0..count)
                .map(|i| CatalogVideo {
                    id: format!("v{i}"),
                    title: format!("Video {i}"),
                    duration_secs,
                })
                .collect(),
        )
    }

    fn generator(catalog: Catalog, channels: usize) -> ScheduleGenerator<StdRng> {
        ScheduleGenerator::with_rng(catalog, channels, DEFAULT_MAX_ITEM_SECS, StdRng::seed_from_u64(7))
    }

    #[test]
    fn test_channel_is_contiguous_until_midnight() {
        let mut generator = generator(catalog(10, 1200.0), 1);
        let start = Instant::new(2024, 5, 1, 22, 0, 0).unwrap();

        let channel = generator.create_channel(start, &[]).unwrap();
        assert_eq!(channel.len(), 6);
        for pair in channel.items().windows(2) {
            assert_eq!(pair[0].end_time(), pair[1].start_time);
        }
        assert_eq!(channel.finish_time(), Some(start.next_day()));

        let ids: HashSet<_> = channel.items().iter().map(|i| i.video_id.clone()).collect();
        assert_eq!(ids.len(), channel.len());
    }

    #[test]
    fn test_long_videos_are_skipped() {
        let mut videos = catalog(3, 600.0).videos().to_vec();
        videos.push(CatalogVideo {
            id: "long".into(),
            title: String::new(),
            duration_secs: DEFAULT_MAX_ITEM_SECS,
        });
        let mut generator = generator(Catalog::from_videos(videos), 1);
        let start = Instant::new(2024, 5, 1, 23, 30, 0).unwrap();

        let channel = generator.create_channel(start, &[]).unwrap();
        assert!(channel.items().iter().all(|i| i.video_id != "long"));
    }

    #[test]
    fn test_exhausted_catalog() {
        let mut generator = generator(catalog(2, 600.0), 1);
        let start = Instant::new(2024, 5, 1, 23, 0, 0).unwrap();
        assert!(matches!(
            generator.create_channel(start, &[]),
            Err(Error::CatalogExhausted)
        ));
    }

    #[test]
    fn test_channels_never_share_a_video_at_the_same_time() {
        let mut generator = generator(catalog(20, 900.0), 3);
        let day = Instant::new(2024, 5, 1, 0, 0, 0).unwrap();
        // La veille déborde jusqu'à 21h, il reste trois heures à remplir
        let previous = Schedule::new(
            (0..3)
                .map(|_| Timetable::new(vec![Item::new("x", day, 21.0 * 3600.0)]))
                .collect(),
        );

        let schedule = generator
            .create_schedule(Some(&previous), day)
            .unwrap();
        assert_eq!(schedule.channel_count(), 3);

        for (index, channel) in schedule.channels().iter().enumerate() {
            for item in channel.items() {
                for (other_index, other) in schedule.channels().iter().enumerate() {
                    if other_index >= index {
                        continue;
                    }
                    if let Some(playing) = other.item_at(item.start_time) {
                        assert_ne!(playing.video_id, item.video_id);
                    }
                }
            }
        }
    }

    #[test]
    fn test_schedule_continues_previous_day() {
        let mut generator = generator(catalog(100, 1500.0), 2);
        let today = Instant::new(2024, 5, 1, 0, 0, 0).unwrap();

        let first = generator.create_schedule(None, today).unwrap();
        let second = generator.create_schedule(Some(&first), today.next_day()).unwrap();

        for index in 0..2 {
            let finish = first.channel(index).unwrap().finish_time().unwrap();
            let start = second.channel(index).unwrap().first().unwrap().start_time;
            assert!(finish >= today.next_day());
            assert_eq!(start, finish);
        }
    }
}
