#![allow(dead_code)]

use async_trait::async_trait;
use pmoschedule::{Instant, Item, Schedule, ScheduleSource, Seconds, Timetable, WallClock};
use pmosync::{PlaybackController, PlaybackObserver, PlayerState, SimulatedPlayer};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub fn at(h: u32, m: u32, s: u32) -> Instant {
    Instant::new(2024, 5, 1, h, m, s).unwrap()
}

pub fn schedule(channels: Vec<Vec<(&str, Instant, Seconds)>>) -> Schedule {
    Schedule::new(
        channels
            .into_iter()
            .map(|items| {
                Timetable::new(
                    items
                        .into_iter()
                        .map(|(id, start, duration)| Item::new(id, start, duration))
                        .collect(),
                )
            })
            .collect(),
    )
}

/// Wall clock starting at `base` and moving with tokio time.
#[derive(Debug)]
pub struct TestClock {
    base: Instant,
    started: tokio::time::Instant,
}

impl TestClock {
    pub fn new(base: Instant) -> Self {
        Self {
            base,
            started: tokio::time::Instant::now(),
        }
    }
}

impl WallClock for TestClock {
    fn now(&self) -> Instant {
        self.base
            .add_seconds(self.started.elapsed().as_secs() as Seconds)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Load(String, Seconds),
    Seek(Seconds),
    Resume,
}

/// Simulated player recording every command; can be made unresponsive, or
/// refuse its next `load`.
#[derive(Debug, Clone)]
pub struct MockPlayer {
    pub inner: Arc<SimulatedPlayer>,
    log: Arc<Mutex<Vec<Command>>>,
    hang: Arc<AtomicBool>,
    refuse_load: Arc<AtomicBool>,
}

impl MockPlayer {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SimulatedPlayer::new("mock")),
            log: Arc::new(Mutex::new(Vec::new())),
            hang: Arc::new(AtomicBool::new(false)),
            refuse_load: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn hanging() -> Self {
        let player = Self::new();
        player.hang.store(true, Ordering::SeqCst);
        player
    }

    pub fn refuse_next_load(&self) {
        self.refuse_load.store(true, Ordering::SeqCst);
    }

    pub fn commands(&self) -> Vec<Command> {
        self.log.lock().unwrap().clone()
    }

    async fn gate(&self) {
        if self.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
    }

    fn record(&self, command: Command) {
        self.log.lock().unwrap().push(command);
    }
}

#[async_trait]
impl PlaybackObserver for MockPlayer {
    async fn state(&self) -> pmosync::Result<PlayerState> {
        self.gate().await;
        self.inner.state().await
    }

    async fn loaded_item_id(&self) -> pmosync::Result<Option<String>> {
        self.gate().await;
        self.inner.loaded_item_id().await
    }

    async fn position(&self) -> pmosync::Result<Seconds> {
        self.gate().await;
        self.inner.position().await
    }
}

#[async_trait]
impl PlaybackController for MockPlayer {
    async fn load(&self, video_id: &str, offset: Seconds) -> pmosync::Result<()> {
        self.gate().await;
        if self.refuse_load.swap(false, Ordering::SeqCst) {
            return Err(pmosync::SyncError::capability("load refused"));
        }
        self.record(Command::Load(video_id.to_string(), offset));
        self.inner.load(video_id, offset).await
    }

    async fn seek(&self, offset: Seconds) -> pmosync::Result<()> {
        self.gate().await;
        self.record(Command::Seek(offset));
        self.inner.seek(offset).await
    }

    async fn resume(&self) -> pmosync::Result<()> {
        self.gate().await;
        self.record(Command::Resume);
        self.inner.resume().await
    }
}

/// Source handing out queued answers, then failing.
pub struct ScriptedSource {
    answers: Mutex<VecDeque<pmoschedule::Result<Schedule>>>,
}

impl ScriptedSource {
    pub fn new(answers: Vec<pmoschedule::Result<Schedule>>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
        }
    }
}

#[async_trait]
impl ScheduleSource for ScriptedSource {
    async fn fetch(&self) -> pmoschedule::Result<Schedule> {
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(pmoschedule::Error::other("no more answers")))
    }
}
