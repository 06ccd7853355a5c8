//! # pmosync - Synchronisation des lecteurs sur la grille
//!
//! Chaque canal affiché possède une boucle ([`SyncLoop`]) qui observe son
//! lecteur, calcule où il devrait être avec [`pmoschedule::locate`] et le
//! corrige (rechargement, seek, reprise).
//!
//! Le [`RefreshCoordinator`] remplace périodiquement l'instantané de grille
//! partagé par toutes les boucles ; [`ChannelSet`] démarre et arrête
//! l'ensemble.
//!
//! ## Exemple
//!
//! ```no_run
//! use pmoschedule::{ScheduleClient, SystemClock};
//! use pmosync::{readiness, ChannelSet, MediaPlayer, RefreshCoordinator, SimulatedPlayer, SyncSettings};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let source = Arc::new(ScheduleClient::new()?);
//! let coordinator = RefreshCoordinator::start(source, pmosync::DEFAULT_REFRESH_INTERVAL).await?;
//!
//! let players: Vec<Box<dyn MediaPlayer>> = (0..4)
//!     .map(|i| Box::new(SimulatedPlayer::new(format!("player-{i}"))) as Box<dyn MediaPlayer>)
//!     .collect();
//!
//! let (ready, signal) = readiness();
//! let set = ChannelSet::start(players, coordinator, Arc::new(SystemClock::default()), SyncSettings::default(), signal);
//! ready.signal();
//!
//! tokio::signal::ctrl_c().await?;
//! set.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod coordinator;
pub mod error;
pub mod player;
pub mod readiness;
pub mod simulated;
pub mod sync_loop;

pub use config::{SyncConfigExt, SyncSettings};
pub use coordinator::{
    ChannelSet, RefreshCoordinator, ScheduleHandle, ScheduleReader, DEFAULT_REFRESH_INTERVAL,
};
pub use error::{Result, SyncError};
pub use player::{MediaPlayer, PlaybackController, PlaybackObserver, PlayerState};
pub use readiness::{readiness, Readiness, ReadySignal};
pub use simulated::SimulatedPlayer;
pub use sync_loop::{Decision, Observation, ReloadReason, SkipReason, SyncLoop, SyncState};
