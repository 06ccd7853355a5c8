//! Per-channel synchronisation loop.
//!
//! Each displayed channel has one [`SyncLoop`] that owns its player. On
//! every tick it observes the player, asks [`locate`] where the channel
//! should be, and issues corrections:
//!
//! 1. `UNSTARTED`: nothing to do yet.
//! 2. `BUFFERING`: one more stall.
//! 3. No loaded item: nothing to do.
//! 4. Too many stalls, or the wrong item: reload the target item at its
//!    offset, reset the stall counter and the poll interval.
//! 5. Otherwise resume if paused, and seek if the drift exceeds the
//!    tolerance.
//! 6. Poll fast when the item is about to end, at the default pace
//!    otherwise.
//!
//! The decision part ([`SyncState::decide`]) is pure; [`SyncLoop`] only adds
//! the player I/O, timeouts and the sleep between ticks.

use crate::config::SyncSettings;
use crate::coordinator::ScheduleReader;
use crate::error::{Result, SyncError};
use crate::player::{MediaPlayer, PlayerState};
use crate::readiness::ReadySignal;
use pmoschedule::{locate, Instant, Seconds, Timetable, WallClock};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What the loop saw on the player at the start of a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub state: PlayerState,
    pub loaded_id: Option<String>,
    pub position: Seconds,
}

impl Observation {
    pub fn new(state: PlayerState, loaded_id: Option<&str>, position: Seconds) -> Self {
        Self {
            state,
            loaded_id: loaded_id.map(str::to_string),
            position,
        }
    }
}

/// Why a tick issued no command at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Unstarted,
    NothingLoaded,
    EmptyTimetable,
}

/// Why the player is reloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadReason {
    /// Too many consecutive buffering observations
    Stalled,
    /// The schedule says another item should be on screen
    ItemChanged,
}

/// Outcome of one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Skip(SkipReason),
    Reload {
        video_id: String,
        offset: Seconds,
        reason: ReloadReason,
    },
    /// Same item: optional resume and seek (both may be absent)
    Correct {
        resume: bool,
        seek: Option<Seconds>,
        drift: Seconds,
    },
}

impl Decision {
    /// True when the tick sends nothing to the player.
    pub fn is_idle(&self) -> bool {
        matches!(
            self,
            Decision::Skip(_)
                | Decision::Correct {
                    resume: false,
                    seek: None,
                    ..
                }
        )
    }
}

/// Mutable state of one channel, touched only by its loop.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncState {
    /// Last item id seen on (or sent to) the player
    pub anchor: Option<String>,
    pub stall_count: u32,
    pub poll_interval: Duration,
}

impl SyncState {
    pub fn new(settings: &SyncSettings) -> Self {
        Self {
            anchor: None,
            stall_count: 0,
            poll_interval: settings.default_interval(),
        }
    }

    /// Applies one tick of the correction rules.
    pub fn decide(
        &mut self,
        observation: &Observation,
        timetable: &Timetable,
        now: Instant,
        settings: &SyncSettings,
    ) -> Decision {
        if observation.state == PlayerState::Unstarted {
            return Decision::Skip(SkipReason::Unstarted);
        }

        if observation.state == PlayerState::Buffering {
            self.stall_count += 1;
        }

        let Some(loaded) = observation.loaded_id.as_deref() else {
            return Decision::Skip(SkipReason::NothingLoaded);
        };
        self.anchor = Some(loaded.to_string());

        let Some(target) = locate(timetable, now, Some(loaded)) else {
            return Decision::Skip(SkipReason::EmptyTimetable);
        };

        let stalled = u64::from(self.stall_count) >= settings.stall_reload_threshold;
        if stalled || target.video_id() != loaded {
            self.stall_count = 0;
            self.poll_interval = settings.default_interval();
            self.anchor = Some(target.video_id().to_string());
            return Decision::Reload {
                video_id: target.video_id().to_string(),
                offset: target.offset,
                reason: if stalled {
                    ReloadReason::Stalled
                } else {
                    ReloadReason::ItemChanged
                },
            };
        }

        let resume = observation.state == PlayerState::Paused;
        let drift = (observation.position - target.offset).abs();
        let seek = (drift > settings.drift_tolerance()).then_some(target.offset);

        self.poll_interval = if target.remaining() <= settings.near_end() {
            settings.fast_interval()
        } else {
            settings.default_interval()
        };

        Decision::Correct {
            resume,
            seek,
            drift,
        }
    }
}

/// Loop driving one player.
pub struct SyncLoop {
    channel: usize,
    player: Box<dyn MediaPlayer>,
    reader: ScheduleReader,
    clock: Arc<dyn WallClock>,
    settings: SyncSettings,
    state: SyncState,
    /// Absence of the channel already reported at `warn`
    missing_reported: bool,
}

impl SyncLoop {
    pub fn new(
        channel: usize,
        player: Box<dyn MediaPlayer>,
        reader: ScheduleReader,
        clock: Arc<dyn WallClock>,
        settings: SyncSettings,
    ) -> Self {
        let state = SyncState::new(&settings);
        Self {
            channel,
            player,
            reader,
            clock,
            settings,
            state,
            missing_reported: false,
        }
    }

    pub fn channel(&self) -> usize {
        self.channel
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    async fn bounded<T>(&self, call: &'static str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.settings.command_timeout(), fut).await {
            Ok(result) => result,
            Err(_) => Err(SyncError::Timeout(call)),
        }
    }

    async fn observe(&self) -> Result<Observation> {
        let state = self.bounded("state", self.player.state()).await?;
        if state == PlayerState::Unstarted {
            return Ok(Observation::new(state, None, 0.0));
        }

        let loaded_id = self.bounded("loaded_item_id", self.player.loaded_item_id()).await?;
        let position = match loaded_id {
            Some(_) => self.bounded("position", self.player.position()).await?,
            None => 0.0,
        };

        Ok(Observation {
            state,
            loaded_id,
            position,
        })
    }

    /// Loads the item scheduled right now, without anchor.
    pub async fn initial_load(&mut self) -> Result<()> {
        let schedule = self.reader.current();
        let timetable = schedule
            .channel(self.channel)
            .ok_or(SyncError::ChannelMissing(self.channel))?;
        let Some(target) = locate(timetable, self.clock.now(), None) else {
            return Err(SyncError::Schedule(pmoschedule::Error::EmptyTimetable(self.channel)));
        };

        info!(
            channel = self.channel,
            video_id = %target.video_id(),
            offset = target.offset,
            "▶️ Initial load"
        );
        self.bounded("load", self.player.load(target.video_id(), target.offset))
            .await?;
        self.state.anchor = Some(target.video_id().to_string());
        Ok(())
    }

    async fn apply(
        &self,
        decision: &Decision,
        observation: &Observation,
        previous: Option<&str>,
    ) -> Result<()> {
        match decision {
            Decision::Skip(reason) => {
                debug!(channel = self.channel, ?reason, state = %observation.state, "Tick skipped");
            }
            Decision::Reload {
                video_id,
                offset,
                reason,
            } => {
                info!(
                    channel = self.channel,
                    from = ?previous,
                    to = %video_id,
                    offset = *offset,
                    ?reason,
                    "🔄 Reloading player"
                );
                self.bounded("load", self.player.load(video_id, *offset)).await?;
            }
            Decision::Correct {
                resume,
                seek,
                drift,
            } => {
                if *resume {
                    info!(channel = self.channel, "Resuming paused player");
                    self.bounded("resume", self.player.resume()).await?;
                }
                if let Some(offset) = seek {
                    info!(
                        channel = self.channel,
                        drift = *drift,
                        offset = *offset,
                        "⏩ Drift over tolerance, seeking"
                    );
                    self.bounded("seek", self.player.seek(*offset)).await?;
                }
            }
        }
        Ok(())
    }

    /// One observation/correction round.
    ///
    /// When a command fails the channel state is rolled back, so the same
    /// correction is attempted again on the next tick.
    pub async fn tick(&mut self) -> Result<Decision> {
        let observation = self.observe().await?;

        let schedule = self.reader.current();
        let timetable = schedule
            .channel(self.channel)
            .ok_or(SyncError::ChannelMissing(self.channel))?;

        // Rien n'est acquis tant que le lecteur n'a pas accepté les commandes
        let before = self.state.clone();
        let decision = self
            .state
            .decide(&observation, timetable, self.clock.now(), &self.settings);

        let applied = self
            .apply(&decision, &observation, before.anchor.as_deref())
            .await;
        if let Err(err) = applied {
            self.state = before;
            return Err(err);
        }

        Ok(decision)
    }

    /// Logs the outcome of a tick, returns true when it was worth a warning.
    ///
    /// A channel absent from the schedule is reported once at `warn`, then
    /// at `debug` until it shows up again.
    fn report(&mut self, result: Result<Decision>) -> bool {
        match result {
            Ok(_) => {
                self.missing_reported = false;
                false
            }
            Err(SyncError::ChannelMissing(channel)) if !self.missing_reported => {
                self.missing_reported = true;
                warn!(
                    channel,
                    "No timetable for this channel in the current schedule, player stays idle"
                );
                true
            }
            Err(SyncError::ChannelMissing(channel)) => {
                debug!(channel, "Still no timetable for this channel");
                false
            }
            Err(err) => {
                debug!(channel = self.channel, "Tick abandoned: {}", err);
                false
            }
        }
    }

    /// Waits for readiness, loads the current item, then ticks until
    /// `cancel` fires.
    pub async fn run(mut self, ready: ReadySignal, cancel: CancellationToken) {
        tokio::select! {
            _ = cancel.cancelled() => return,
            result = ready.wait() => {
                if let Err(err) = result {
                    warn!(channel = self.channel, "Sync loop not started: {}", err);
                    return;
                }
            }
        }

        match self.initial_load().await {
            Ok(()) => {}
            Err(err @ SyncError::ChannelMissing(_)) => {
                self.report(Err(err));
            }
            Err(err) => warn!(channel = self.channel, "Initial load failed: {}", err),
        }

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.state.poll_interval) => {}
            }

            let result = self.tick().await;
            self.report(result);
        }

        debug!(channel = self.channel, "Sync loop stopped");
    }
}
