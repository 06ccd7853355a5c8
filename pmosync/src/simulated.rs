//! Headless player used by `pmolive watch` and the tests.
//!
//! Le lecteur n'affiche rien : sa position avance avec l'horloge tokio
//! (donc aussi sous `tokio::time::pause`).

use crate::error::{Result, SyncError};
use crate::player::{PlaybackController, PlaybackObserver, PlayerState};
use async_trait::async_trait;
use pmoschedule::Seconds;
use std::sync::{Mutex, MutexGuard};
use tokio::time::Instant as TokioInstant;

#[derive(Debug)]
struct Transport {
    state: PlayerState,
    video_id: Option<String>,
    /// Position au moment `since`
    base: Seconds,
    since: TokioInstant,
}

impl Transport {
    fn position(&self, rate: f64) -> Seconds {
        match self.state {
            PlayerState::Playing => self.base + self.since.elapsed().as_secs_f64() * rate,
            _ => self.base,
        }
    }

    /// Fige la position courante avant un changement d'état.
    fn freeze(&mut self, rate: f64) {
        self.base = self.position(rate);
        self.since = TokioInstant::now();
    }
}

/// Virtual player whose position follows tokio time.
#[derive(Debug)]
pub struct SimulatedPlayer {
    name: String,
    /// Playback speed, 1.0 is real time
    rate: f64,
    transport: Mutex<Transport>,
}

impl SimulatedPlayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rate: 1.0,
            transport: Mutex::new(Transport {
                state: PlayerState::Unstarted,
                video_id: None,
                base: 0.0,
                since: TokioInstant::now(),
            }),
        }
    }

    /// Simulates a player running faster or slower than real time.
    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = rate;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn lock(&self) -> Result<MutexGuard<'_, Transport>> {
        self.transport
            .lock()
            .map_err(|_| SyncError::capability(format!("{}: transport lock poisoned", self.name)))
    }

    /// Pauses playback, as a user would.
    pub fn pause(&self) -> Result<()> {
        let mut transport = self.lock()?;
        transport.freeze(self.rate);
        if transport.state == PlayerState::Playing {
            transport.state = PlayerState::Paused;
        }
        Ok(())
    }

    /// Puts the player in the buffering state until the next load.
    pub fn set_buffering(&self) -> Result<()> {
        let mut transport = self.lock()?;
        transport.freeze(self.rate);
        transport.state = PlayerState::Buffering;
        Ok(())
    }
}

#[async_trait]
impl PlaybackObserver for SimulatedPlayer {
    async fn state(&self) -> Result<PlayerState> {
        Ok(self.lock()?.state)
    }

    async fn loaded_item_id(&self) -> Result<Option<String>> {
        Ok(self.lock()?.video_id.clone())
    }

    async fn position(&self) -> Result<Seconds> {
        Ok(self.lock()?.position(self.rate))
    }
}

#[async_trait]
impl PlaybackController for SimulatedPlayer {
    async fn load(&self, video_id: &str, offset: Seconds) -> Result<()> {
        let mut transport = self.lock()?;
        transport.video_id = Some(video_id.to_string());
        transport.base = offset;
        transport.since = TokioInstant::now();
        transport.state = PlayerState::Playing;
        tracing::debug!(player = %self.name, video_id, offset, "Simulated load");
        Ok(())
    }

    async fn seek(&self, offset: Seconds) -> Result<()> {
        let mut transport = self.lock()?;
        if transport.video_id.is_none() {
            return Err(SyncError::capability("seek without a loaded video"));
        }
        transport.base = offset;
        transport.since = TokioInstant::now();
        Ok(())
    }

    async fn resume(&self) -> Result<()> {
        let mut transport = self.lock()?;
        if transport.state == PlayerState::Paused {
            transport.since = TokioInstant::now();
            transport.state = PlayerState::Playing;
        }
        Ok(())
    }
}
