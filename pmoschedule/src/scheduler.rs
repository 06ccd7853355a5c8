//! Live position lookup.
//!
//! [`locate`] answers "what should be on screen right now, and how far into
//! it?" for one channel. It is a pure function of the timetable, the
//! current instant and an optional anchor (the id the player is already
//! showing), so it can be called from any task without coordination.

use crate::instant::{Instant, Seconds};
use crate::timetable::{Item, Timetable};

/// Result of a lookup: the item to show and the offset into it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target<'a> {
    pub item: &'a Item,
    /// Seconds since the item's start, `0 <= offset <= duration` unless this
    /// is the fallback target (then always 0)
    pub offset: Seconds,
}

impl Target<'_> {
    /// Seconds left before the item ends.
    pub fn remaining(&self) -> Seconds {
        self.item.duration - self.offset
    }

    pub fn video_id(&self) -> &str {
        &self.item.video_id
    }
}

/// Finds the item that should be playing at `now`.
///
/// Without an anchor the scan starts at the first item; with one, every
/// item before the anchor is skipped and an anchor that is not in the
/// timetable leaves nothing to scan. The first scanned item with
/// `0 <= now - start <= duration` is returned. Both bounds are inclusive, so
/// at a boundary instant the earlier item wins.
///
/// When nothing qualifies (a gap, before the first item, after the last
/// one, unknown anchor) the first item of the timetable is returned with
/// offset 0. `None` is only returned for an empty timetable.
pub fn locate<'a>(timetable: &'a Timetable, now: Instant, anchor: Option<&str>) -> Option<Target<'a>> {
    let items = timetable.items();

    let start = match anchor {
        Some(id) => items
            .iter()
            .position(|item| item.video_id == id)
            .unwrap_or(items.len()),
        None => 0,
    };

    items[start..]
        .iter()
        .find_map(|item| {
            let offset = now.subtract(item.start_time);
            (offset >= 0.0 && offset <= item.duration).then_some(Target { item, offset })
        })
        .or_else(|| items.first().map(|item| Target { item, offset: 0.0 }))
}
