//! Schedule snapshot sharing and periodic refresh.
//!
//! The current [`Schedule`] lives in a `watch` channel as an `Arc`. The
//! [`RefreshCoordinator`] is the only writer; every sync loop holds a
//! [`ScheduleReader`] and takes a fresh `Arc` at each tick. Replacing the
//! snapshot is a single pointer swap: a loop in the middle of a tick keeps
//! the snapshot it already holds and sees the new one on its next tick.

use crate::config::SyncSettings;
use crate::error::{Result, SyncError};
use crate::player::MediaPlayer;
use crate::readiness::ReadySignal;
use crate::sync_loop::SyncLoop;
use pmoschedule::{Schedule, ScheduleSource, WallClock};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default refresh cadence (hourly)
pub const DEFAULT_REFRESH_INTERVAL: Duration =
    Duration::from_secs(pmoschedule::config_ext::DEFAULT_REFRESH_INTERVAL_SECS);

/// Read access to the current snapshot.
#[derive(Debug, Clone)]
pub struct ScheduleReader {
    rx: watch::Receiver<Arc<Schedule>>,
}

impl ScheduleReader {
    /// The snapshot in force right now.
    pub fn current(&self) -> Arc<Schedule> {
        self.rx.borrow().clone()
    }

    /// Waits for the next replacement.
    pub async fn changed(&mut self) -> Result<Arc<Schedule>> {
        self.rx
            .changed()
            .await
            .map_err(|_| SyncError::capability("schedule coordinator stopped"))?;
        Ok(self.rx.borrow_and_update().clone())
    }
}

/// Write access to the current snapshot.
#[derive(Debug)]
pub struct ScheduleHandle {
    tx: watch::Sender<Arc<Schedule>>,
}

impl ScheduleHandle {
    pub fn new(initial: Schedule) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(initial));
        Self { tx }
    }

    pub fn reader(&self) -> ScheduleReader {
        ScheduleReader {
            rx: self.tx.subscribe(),
        }
    }

    pub fn current(&self) -> Arc<Schedule> {
        self.tx.borrow().clone()
    }

    /// Swaps in a new snapshot; the previous one is dropped once no loop
    /// holds it anymore.
    pub fn replace(&self, schedule: Schedule) {
        self.tx.send_replace(Arc::new(schedule));
    }
}

/// Fetches a new snapshot on a fixed cadence and publishes it.
pub struct RefreshCoordinator {
    source: Arc<dyn ScheduleSource>,
    handle: ScheduleHandle,
    interval: Duration,
}

impl RefreshCoordinator {
    /// Performs the initial fetch; start-up fails if it does.
    pub async fn start(source: Arc<dyn ScheduleSource>, interval: Duration) -> Result<Self> {
        let initial = source.fetch().await?;
        info!(
            channels = initial.channel_count(),
            "📅 Initial schedule loaded"
        );
        Ok(Self::with_initial(source, initial, interval))
    }

    /// Builds a coordinator around an already known snapshot.
    pub fn with_initial(source: Arc<dyn ScheduleSource>, initial: Schedule, interval: Duration) -> Self {
        Self {
            source,
            handle: ScheduleHandle::new(initial),
            interval,
        }
    }

    pub fn reader(&self) -> ScheduleReader {
        self.handle.reader()
    }

    pub fn current(&self) -> Arc<Schedule> {
        self.handle.current()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Fetches once and publishes the result.
    ///
    /// On failure the previous snapshot stays in force.
    pub async fn refresh_once(&self) -> Result<()> {
        match self.source.fetch().await {
            Ok(schedule) => {
                info!(channels = schedule.channel_count(), "Schedule snapshot replaced");
                self.handle.replace(schedule);
                Ok(())
            }
            Err(err) => {
                warn!("Schedule refresh failed, keeping previous snapshot: {}", err);
                Err(err.into())
            }
        }
    }

    /// Refresh loop; returns when `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        debug!(interval = ?self.interval, "Refresh coordinator started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = self.refresh_once() => {}
            }
        }
        debug!("Refresh coordinator stopped");
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }
}

/// All sync loops of a display plus their refresh coordinator.
pub struct ChannelSet {
    tasks: JoinSet<()>,
    cancel: CancellationToken,
    reader: ScheduleReader,
}

impl ChannelSet {
    /// Spawns one sync loop per player (player `i` shows channel `i`) and
    /// the refresh coordinator.
    ///
    /// Loops wait for `ready` before their first load.
    pub fn start(
        players: Vec<Box<dyn MediaPlayer>>,
        coordinator: RefreshCoordinator,
        clock: Arc<dyn WallClock>,
        settings: SyncSettings,
        ready: ReadySignal,
    ) -> Self {
        let cancel = CancellationToken::new();
        let reader = coordinator.reader();
        let mut tasks = JoinSet::new();

        for (channel, player) in players.into_iter().enumerate() {
            let sync_loop = SyncLoop::new(
                channel,
                player,
                coordinator.reader(),
                clock.clone(),
                settings.clone(),
            );
            tasks.spawn(sync_loop.run(ready.clone(), cancel.child_token()));
        }

        tasks.spawn(coordinator.run(cancel.child_token()));

        info!(loops = tasks.len() - 1, "Channel set started");
        Self {
            tasks,
            cancel,
            reader,
        }
    }

    pub fn reader(&self) -> ScheduleReader {
        self.reader.clone()
    }

    /// Cancels every task and waits for them to finish.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        while let Some(result) = self.tasks.join_next().await {
            if let Err(err) = result {
                warn!("Channel task ended abnormally: {}", err);
            }
        }
        info!("Channel set stopped");
    }
}
