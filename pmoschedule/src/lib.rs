//! # pmoschedule - Channel timetables for PMOLive
//!
//! `pmoschedule` holds everything PMOLive knows about *what* should be on
//! air:
//!
//! - [`instant`]: civil time in the reference zone (JST by default), the
//!   [`WallClock`] trait and the `subtract` primitive
//! - [`timetable`]: immutable [`Schedule`] snapshots made of per-channel
//!   [`Timetable`]s
//! - [`scheduler`]: [`locate`], the pure "item + offset at this instant"
//!   lookup used by every sync loop
//! - [`models`] and [`client`]: the published JSON format and the HTTP
//!   [`ScheduleSource`]
//! - [`store`] and [`generator`]: daily schedule files and their random
//!   generation from a video catalog
//!
//! ## Quick Start
//!
//! ```no_run
//! use pmoschedule::{locate, ScheduleClient, ScheduleSource, SystemClock, WallClock};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let schedule = ScheduleClient::new()?.fetch().await?;
//!     let now = SystemClock::default().now();
//!
//!     for (index, channel) in schedule.channels().iter().enumerate() {
//!         if let Some(target) = locate(channel, now, None) {
//!             println!("channel {index}: {} at {:.0}s", target.video_id(), target.offset);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config_ext;
pub mod error;
pub mod generator;
pub mod instant;
pub mod models;
pub mod scheduler;
pub mod store;
pub mod timetable;

pub use client::{ClientBuilder, ScheduleClient, ScheduleSource};
pub use config_ext::{ScheduleConfigExt, ScheduleSettings};
pub use error::{Error, Result};
pub use generator::{export, Catalog, CatalogVideo, ExportOutcome, ScheduleGenerator};
pub use instant::{
    subtract, zone_from_offset_minutes, Instant, ManualClock, Seconds, SystemClock, WallClock,
};
pub use models::{WireChannel, WireItem, WireSchedule};
pub use scheduler::{locate, Target};
pub use store::ScheduleStore;
pub use timetable::{Item, Schedule, Timetable};
