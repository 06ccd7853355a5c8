// pmosync/src/player.rs
use async_trait::async_trait;
use pmoschedule::Seconds;
use std::fmt;

use crate::error::Result;

/// Transport state reported by a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerState {
    /// Nothing loaded yet, position is meaningless
    Unstarted,
    Buffering,
    Paused,
    Playing,
    Ended,
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PlayerState::Unstarted => "UNSTARTED",
            PlayerState::Buffering => "BUFFERING",
            PlayerState::Paused => "PAUSED",
            PlayerState::Playing => "PLAYING",
            PlayerState::Ended => "ENDED",
        };
        f.write_str(label)
    }
}

/// Ce que la boucle de synchro peut lire d'un lecteur.
#[async_trait]
pub trait PlaybackObserver: Send + Sync {
    /// État courant du transport.
    async fn state(&self) -> Result<PlayerState>;

    /// Identifiant de la vidéo chargée, `None` si rien n'est chargé.
    async fn loaded_item_id(&self) -> Result<Option<String>>;

    /// Position dans la vidéo chargée, en secondes.
    async fn position(&self) -> Result<Seconds>;
}

/// Commandes qu'une boucle de synchro envoie à son lecteur.
#[async_trait]
pub trait PlaybackController: Send + Sync {
    /// Charge une vidéo et démarre la lecture à `offset`.
    async fn load(&self, video_id: &str, offset: Seconds) -> Result<()>;

    /// Seek dans la vidéo chargée.
    async fn seek(&self, offset: Seconds) -> Result<()>;

    /// Reprend la lecture après une pause.
    async fn resume(&self) -> Result<()>;
}

/// A player the sync loop can both observe and command.
///
/// Each instance is owned by exactly one sync loop.
pub trait MediaPlayer: PlaybackObserver + PlaybackController {}

impl<T: PlaybackObserver + PlaybackController + ?Sized> MediaPlayer for T {}
