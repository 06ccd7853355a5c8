//! In-memory schedule model.
//!
//! A [`Schedule`] is one immutable snapshot of every channel's
//! [`Timetable`]. Snapshots are replaced wholesale, never edited in place.

use crate::error::{Error, Result};
use crate::instant::{Instant, Seconds};

/// One scheduled video.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub video_id: String,
    pub start_time: Instant,
    /// Length in seconds, always positive for well-formed schedules
    pub duration: Seconds,
}

impl Item {
    pub fn new(video_id: impl Into<String>, start_time: Instant, duration: Seconds) -> Self {
        Self {
            video_id: video_id.into(),
            start_time,
            duration,
        }
    }

    pub fn end_time(&self) -> Instant {
        self.start_time.add_seconds(self.duration)
    }

    /// True when `t` falls in `[start, end)`.
    pub fn covers(&self, t: Instant) -> bool {
        self.start_time <= t && t < self.end_time()
    }
}

/// Ordered items of one channel.
///
/// Items are expected in non-decreasing start order; nothing here re-sorts
/// or validates gaps and overlaps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timetable {
    items: Vec<Item>,
}

impl Timetable {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn first(&self) -> Option<&Item> {
        self.items.first()
    }

    pub fn push(&mut self, item: Item) {
        self.items.push(item);
    }

    /// End of the last item, if any.
    pub fn finish_time(&self) -> Option<Instant> {
        self.items.last().map(Item::end_time)
    }

    /// Item playing at `t`, if the channel has one.
    pub fn item_at(&self, t: Instant) -> Option<&Item> {
        self.items.iter().find(|item| item.covers(t))
    }
}

/// A full snapshot: one timetable per channel index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schedule {
    channels: Vec<Timetable>,
}

impl Schedule {
    pub fn new(channels: Vec<Timetable>) -> Self {
        Self { channels }
    }

    pub fn channels(&self) -> &[Timetable] {
        &self.channels
    }

    pub fn channel(&self, index: usize) -> Option<&Timetable> {
        self.channels.get(index)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Checks that every channel has at least one item.
    ///
    /// Players locate against these timetables, and the fallback item needs
    /// to exist; an empty channel is a configuration error.
    pub fn ensure_playable(&self) -> Result<()> {
        match self.channels.iter().position(Timetable::is_empty) {
            Some(index) => Err(Error::EmptyTimetable(index)),
            None => Ok(()),
        }
    }

    /// Appends `other`'s items after ours, channel by channel.
    ///
    /// The result has exactly as many channels as `self`; extra channels in
    /// `other` are ignored.
    pub fn merge(&self, other: &Schedule) -> Schedule {
        let channels = self
            .channels
            .iter()
            .enumerate()
            .map(|(index, channel)| {
                let mut items = channel.items.clone();
                if let Some(next) = other.channel(index) {
                    items.extend(next.items.iter().cloned());
                }
                Timetable::new(items)
            })
            .collect();
        Schedule::new(channels)
    }

    /// Keeps, per channel, the items that are still relevant during
    /// `[start, start + span]`.
    ///
    /// Items that finished before `start` are dropped and the scan stops at
    /// the first item starting after the window end.
    pub fn window(&self, start: Instant, span: Seconds) -> Schedule {
        let end = start.add_seconds(span);
        let channels = self
            .channels
            .iter()
            .map(|channel| {
                let items = channel
                    .items
                    .iter()
                    .filter(|item| item.end_time() >= start)
                    .take_while(|item| item.start_time <= end)
                    .cloned()
                    .collect();
                Timetable::new(items)
            })
            .collect();
        Schedule::new(channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32, s: u32) -> Instant {
        Instant::new(2024, 5, 1, h, m, s).unwrap()
    }

    fn channel(ids: &[(&str, Instant, Seconds)]) -> Timetable {
        Timetable::new(
            ids.iter()
                .map(|(id, start, duration)| Item::new(*id, *start, *duration))
                .collect(),
        )
    }

    #[test]
    fn test_finish_time() {
        let tt = channel(&[("a", at(0, 0, 0), 600.0), ("b", at(0, 10, 0), 300.0)]);
        assert_eq!(tt.finish_time(), Some(at(0, 15, 0)));
        assert_eq!(Timetable::default().finish_time(), None);
    }

    #[test]
    fn test_item_at_is_half_open() {
        let tt = channel(&[("a", at(0, 0, 0), 600.0), ("b", at(0, 10, 0), 300.0)]);
        assert_eq!(tt.item_at(at(0, 0, 0)).unwrap().video_id, "a");
        assert_eq!(tt.item_at(at(0, 9, 59)).unwrap().video_id, "a");
        assert_eq!(tt.item_at(at(0, 10, 0)).unwrap().video_id, "b");
        assert!(tt.item_at(at(0, 15, 0)).is_none());
    }

    #[test]
    fn test_merge_keeps_left_channel_count() {
        let today = Schedule::new(vec![
            channel(&[("a", at(0, 0, 0), 60.0)]),
            channel(&[("b", at(0, 0, 0), 60.0)]),
        ]);
        let tomorrow = Schedule::new(vec![
            channel(&[("c", at(0, 1, 0), 60.0)]),
            channel(&[]),
            channel(&[("ignored", at(0, 1, 0), 60.0)]),
        ]);

        let merged = today.merge(&tomorrow);
        assert_eq!(merged.channel_count(), 2);
        let ids: Vec<_> = merged.channels()[0]
            .items()
            .iter()
            .map(|i| i.video_id.as_str())
            .collect();
        assert_eq!(ids, ["a", "c"]);
        assert_eq!(merged.channels()[1].len(), 1);
    }

    #[test]
    fn test_window_bounds() {
        let sched = Schedule::new(vec![channel(&[
            ("past", at(0, 0, 0), 600.0),
            ("current", at(0, 10, 0), 600.0),
            ("soon", at(0, 20, 0), 600.0),
            ("later", at(3, 30, 0), 600.0),
        ])]);

        let part = sched.window(at(0, 12, 0), 3.0 * 3600.0);
        let ids: Vec<_> = part.channels()[0]
            .items()
            .iter()
            .map(|i| i.video_id.as_str())
            .collect();
        assert_eq!(ids, ["current", "soon"]);
    }

    #[test]
    fn test_window_keeps_item_finishing_exactly_at_start() {
        let sched = Schedule::new(vec![channel(&[("edge", at(0, 0, 0), 600.0)])]);
        let part = sched.window(at(0, 10, 0), 60.0);
        assert_eq!(part.channels()[0].len(), 1);
    }

    #[test]
    fn test_ensure_playable() {
        let ok = Schedule::new(vec![channel(&[("a", at(0, 0, 0), 60.0)])]);
        assert!(ok.ensure_playable().is_ok());

        let bad = Schedule::new(vec![channel(&[("a", at(0, 0, 0), 60.0)]), channel(&[])]);
        assert!(matches!(bad.ensure_playable(), Err(Error::EmptyTimetable(1))));
    }
}
